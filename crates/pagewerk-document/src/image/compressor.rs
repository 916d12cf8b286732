// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image compressor — downsize and re-encode a registered image as JPEG.
//
// Compression never fails from the caller's point of view: any decode or
// encode error yields the original bytes together with a `Fallback` outcome
// describing what went wrong.

use std::io::Cursor;

use ::image::imageops::FilterType;
use ::image::{DynamicImage, ImageReader};
use pagewerk_core::error::{PagewerkError, Result};
use pagewerk_core::types::{AssetId, PixelSize, Quality};
use pagewerk_core::{ImageAsset, PreviewHandle};
use tracing::{debug, info, instrument, warn};

/// Longest edge, in pixels, of a compressed image.
pub const DEFAULT_MAX_DIMENSION: u32 = 1920;

/// Size cap for a single compressed image.
pub const DEFAULT_MAX_OUTPUT_BYTES: u64 = 1024 * 1024;

/// Quality decrement applied while an encoding exceeds the size cap.
const QUALITY_STEP: u8 = 10;

/// What happened to an asset on its way through the compressor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompressionOutcome {
    /// Re-encoded as JPEG at `quality` (which may be below the requested
    /// quality if the size cap forced it down).
    Compressed {
        quality: Quality,
        original_bytes: u64,
        compressed_bytes: u64,
    },
    /// Re-encoding would not have made the image smaller.
    KeptOriginal,
    /// Compression is switched off for this run.
    Skipped,
    /// Compression failed; the original bytes are used instead.
    Fallback { detail: String },
}

#[derive(Debug, Clone)]
enum ImageData {
    Original(PreviewHandle),
    Encoded(Vec<u8>),
}

/// An image ready for page assembly.
#[derive(Debug, Clone)]
pub struct CompressedAsset {
    asset: AssetId,
    data: ImageData,
    pixel_size: Option<PixelSize>,
    outcome: CompressionOutcome,
}

impl CompressedAsset {
    pub fn asset(&self) -> AssetId {
        self.asset
    }

    /// Encoded bytes to embed.
    pub fn bytes(&self) -> &[u8] {
        match &self.data {
            ImageData::Original(handle) => &**handle,
            ImageData::Encoded(bytes) => bytes.as_slice(),
        }
    }

    /// Pixel dimensions of [`CompressedAsset::bytes`], if they could be decoded.
    pub fn pixel_size(&self) -> Option<PixelSize> {
        self.pixel_size
    }

    pub fn outcome(&self) -> &CompressionOutcome {
        &self.outcome
    }

    /// True when the bytes are the asset's original encoding.
    pub fn is_original(&self) -> bool {
        matches!(self.data, ImageData::Original(_))
    }
}

/// Downsizes and re-encodes images for embedding.
#[derive(Debug, Clone)]
pub struct ImageCompressor {
    max_dimension: u32,
    max_output_bytes: Option<u64>,
}

impl Default for ImageCompressor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DIMENSION, Some(DEFAULT_MAX_OUTPUT_BYTES))
    }
}

impl ImageCompressor {
    pub fn new(max_dimension: u32, max_output_bytes: Option<u64>) -> Self {
        Self {
            max_dimension: max_dimension.max(1),
            max_output_bytes,
        }
    }

    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    /// Compress `asset` at `quality`, falling back to the original bytes on
    /// any failure.
    #[instrument(skip(self, asset), fields(asset_id = %asset.id(), bytes_len = asset.byte_length()))]
    pub fn compress(&self, asset: &ImageAsset, quality: Quality) -> CompressedAsset {
        match self.try_compress(asset.bytes(), quality) {
            Ok(encoded) => {
                asset.record_pixel_size(encoded.source_size);
                if !encoded.resized && encoded.bytes.len() as u64 >= asset.byte_length() {
                    debug!(
                        original = asset.byte_length(),
                        reencoded = encoded.bytes.len(),
                        "Re-encoding did not shrink the image, keeping original"
                    );
                    return CompressedAsset {
                        asset: asset.id(),
                        data: ImageData::Original(asset.preview()),
                        pixel_size: Some(encoded.source_size),
                        outcome: CompressionOutcome::KeptOriginal,
                    };
                }

                info!(
                    from = asset.byte_length(),
                    to = encoded.bytes.len(),
                    quality = encoded.quality.percent(),
                    "Image compressed"
                );
                CompressedAsset {
                    asset: asset.id(),
                    outcome: CompressionOutcome::Compressed {
                        quality: encoded.quality,
                        original_bytes: asset.byte_length(),
                        compressed_bytes: encoded.bytes.len() as u64,
                    },
                    pixel_size: Some(encoded.output_size),
                    data: ImageData::Encoded(encoded.bytes),
                }
            }
            Err(err) => self.fallback(asset, err.to_string()),
        }
    }

    /// Use the original bytes of `asset` after a failed compression.
    pub fn fallback(&self, asset: &ImageAsset, detail: impl Into<String>) -> CompressedAsset {
        let detail = detail.into();
        warn!(
            asset_id = %asset.id(),
            name = asset.display_name(),
            error = %detail,
            "Compression failed, using original bytes"
        );
        CompressedAsset {
            asset: asset.id(),
            data: ImageData::Original(asset.preview()),
            pixel_size: probe_and_record(asset),
            outcome: CompressionOutcome::Fallback { detail },
        }
    }

    /// Pass `asset` through untouched, discovering its pixel size on the way.
    #[instrument(skip(self, asset), fields(asset_id = %asset.id()))]
    pub fn passthrough(&self, asset: &ImageAsset) -> CompressedAsset {
        CompressedAsset {
            asset: asset.id(),
            data: ImageData::Original(asset.preview()),
            pixel_size: probe_and_record(asset),
            outcome: CompressionOutcome::Skipped,
        }
    }

    fn try_compress(&self, bytes: &[u8], quality: Quality) -> Result<Encoded> {
        let decoded = ::image::load_from_memory(bytes).map_err(|err| {
            PagewerkError::Compression(format!("failed to decode image: {}", err))
        })?;
        let source_size = PixelSize::new(decoded.width(), decoded.height());

        let resized = source_size.width > self.max_dimension || source_size.height > self.max_dimension;
        let image = if resized {
            debug!(
                from_w = source_size.width,
                from_h = source_size.height,
                max = self.max_dimension,
                "Downsizing image"
            );
            decoded.resize(self.max_dimension, self.max_dimension, FilterType::Lanczos3)
        } else {
            decoded
        };
        let output_size = PixelSize::new(image.width(), image.height());

        let mut current = quality;
        let mut bytes = encode_jpeg(&image, current)?;
        if let Some(cap) = self.max_output_bytes {
            while bytes.len() as u64 > cap && current.percent() > Quality::MIN {
                let lowered = current.percent().saturating_sub(QUALITY_STEP).max(Quality::MIN);
                current = Quality::new(lowered)?;
                debug!(quality = lowered, size = bytes.len(), cap, "Over size cap, lowering quality");
                bytes = encode_jpeg(&image, current)?;
            }
        }

        Ok(Encoded {
            bytes,
            quality: current,
            source_size,
            output_size,
            resized,
        })
    }
}

struct Encoded {
    bytes: Vec<u8>,
    quality: Quality,
    source_size: PixelSize,
    output_size: PixelSize,
    resized: bool,
}

/// Encode an image as baseline JPEG at `quality`.
pub fn encode_jpeg(image: &DynamicImage, quality: Quality) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let rgb = image.to_rgb8();
    let encoder = ::image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality.percent());
    rgb.write_with_encoder(encoder).map_err(|err| {
        PagewerkError::Compression(format!("JPEG encoding failed: {}", err))
    })?;
    Ok(buffer)
}

/// Read the pixel dimensions from the image header without a full decode.
pub fn probe_dimensions(bytes: &[u8]) -> Option<PixelSize> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format().ok()?;
    let (width, height) = reader.into_dimensions().ok()?;
    Some(PixelSize::new(width, height))
}

fn probe_and_record(asset: &ImageAsset) -> Option<PixelSize> {
    if let Some(known) = asset.pixel_size() {
        return Some(known);
    }
    let size = probe_dimensions(asset.bytes())?;
    asset.record_pixel_size(size);
    Some(size)
}
