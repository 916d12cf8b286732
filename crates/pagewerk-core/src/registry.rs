// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image registry — the ordered collection of images awaiting conversion.
//
// Registry order is page order. Assets are shared behind `Arc` so that a
// conversion snapshot is a cheap copy of references that later mutation of
// the registry (add, remove, reorder, clear) cannot touch.

use std::ops::Deref;
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

use crate::error::{PagewerkError, Result};
use crate::estimate::{SizeEstimate, estimate};
use crate::types::{AssetId, CompressionConfig, PixelSize};

/// One registered image with its raw encoded bytes.
#[derive(Debug)]
pub struct ImageAsset {
    id: AssetId,
    bytes: Arc<[u8]>,
    display_name: String,
    /// Recorded the first time the image is decoded.
    pixel_size: OnceLock<PixelSize>,
    added_at: DateTime<Utc>,
}

impl ImageAsset {
    pub fn new(bytes: impl Into<Arc<[u8]>>, display_name: impl Into<String>) -> Self {
        Self {
            id: AssetId::new(),
            bytes: bytes.into(),
            display_name: display_name.into(),
            pixel_size: OnceLock::new(),
            added_at: Utc::now(),
        }
    }

    pub fn id(&self) -> AssetId {
        self.id
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn byte_length(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn added_at(&self) -> DateTime<Utc> {
        self.added_at
    }

    /// Pixel dimensions, if the image has been decoded at least once.
    pub fn pixel_size(&self) -> Option<PixelSize> {
        self.pixel_size.get().copied()
    }

    /// Record the decoded pixel dimensions. Later calls are ignored.
    pub fn record_pixel_size(&self, size: PixelSize) {
        let _ = self.pixel_size.set(size);
    }

    /// Acquire a scoped view over the encoded bytes, e.g. for a thumbnail.
    ///
    /// The bytes stay alive while any handle, registry entry, or snapshot
    /// refers to them and are freed when the last one is dropped.
    pub fn preview(&self) -> PreviewHandle {
        PreviewHandle {
            asset: self.id,
            bytes: Arc::clone(&self.bytes),
        }
    }

    /// Number of preview handles currently alive for this asset.
    pub fn live_previews(&self) -> usize {
        Arc::strong_count(&self.bytes) - 1
    }
}

/// Reference-counted view over an asset's encoded bytes.
#[derive(Debug, Clone)]
pub struct PreviewHandle {
    asset: AssetId,
    bytes: Arc<[u8]>,
}

impl PreviewHandle {
    pub fn asset(&self) -> AssetId {
        self.asset
    }
}

impl Deref for PreviewHandle {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Frozen copy of the registry order taken at the start of a conversion.
#[derive(Debug, Clone)]
pub struct RegistrySnapshot {
    assets: Arc<[Arc<ImageAsset>]>,
    taken_at: DateTime<Utc>,
}

impl RegistrySnapshot {
    pub fn assets(&self) -> &[Arc<ImageAsset>] {
        &self.assets
    }

    pub fn ids(&self) -> Vec<AssetId> {
        self.assets.iter().map(|a| a.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }
}

/// Ordered store of image assets; the single source of truth for page order.
#[derive(Debug, Default)]
pub struct ImageRegistry {
    assets: Vec<Arc<ImageAsset>>,
}

impl ImageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an asset at the end and return its id.
    #[instrument(skip_all, fields(name = %asset.display_name(), bytes_len = asset.byte_length()))]
    pub fn add(&mut self, asset: ImageAsset) -> AssetId {
        let id = asset.id();
        self.assets.push(Arc::new(asset));
        debug!(asset_id = %id, position = self.assets.len() - 1, "image registered");
        id
    }

    /// Build an asset from encoded bytes and append it.
    pub fn add_bytes(&mut self, bytes: impl Into<Arc<[u8]>>, display_name: impl Into<String>) -> AssetId {
        self.add(ImageAsset::new(bytes, display_name))
    }

    /// Remove the asset with `id`. Returns `None` if it was not registered.
    pub fn remove(&mut self, id: AssetId) -> Option<Arc<ImageAsset>> {
        let index = self.assets.iter().position(|a| a.id() == id)?;
        let removed = self.assets.remove(index);
        debug!(asset_id = %id, index, "image removed");
        Some(removed)
    }

    /// Move the asset at `from` to `to`, shifting the ones in between
    /// (remove-then-insert splice).
    ///
    /// Indices must be in range; an out-of-range index is rejected and the
    /// order is left unchanged.
    pub fn move_asset(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.assets.len();
        for index in [from, to] {
            if index >= len {
                return Err(PagewerkError::InvalidIndex { index, len });
            }
        }
        let asset = self.assets.remove(from);
        self.assets.insert(to, asset);
        debug!(from, to, "image reordered");
        Ok(())
    }

    /// Drop every registered asset.
    pub fn clear(&mut self) {
        let dropped = self.assets.len();
        self.assets.clear();
        info!(dropped, "registry cleared");
    }

    pub fn get(&self, id: AssetId) -> Option<&Arc<ImageAsset>> {
        self.assets.iter().find(|a| a.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ImageAsset>> {
        self.assets.iter()
    }

    pub fn ids(&self) -> Vec<AssetId> {
        self.assets.iter().map(|a| a.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Capture the current order and asset set.
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            assets: self.assets.iter().cloned().collect(),
            taken_at: Utc::now(),
        }
    }

    /// Advisory output size for the current contents.
    pub fn estimate(&self, config: &CompressionConfig) -> SizeEstimate {
        estimate(self.assets.iter().map(|a| a.as_ref()), config)
    }
}
