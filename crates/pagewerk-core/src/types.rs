// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Pagewerk conversion pipeline.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{PagewerkError, Result};

/// Unique identifier for a registered image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetId(pub Uuid);

impl AssetId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AssetId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pixel dimensions of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Page orientation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Standard page formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageFormat {
    #[default]
    A4,
    Letter,
    Legal,
    A3,
    A5,
}

impl PageFormat {
    /// Portrait dimensions in PostScript points (width, height).
    pub fn dimensions_pt(&self) -> (f32, f32) {
        match self {
            Self::A4 => (595.28, 841.89),
            Self::Letter => (612.0, 792.0),
            Self::Legal => (612.0, 1008.0),
            Self::A3 => (841.89, 1190.55),
            Self::A5 => (419.53, 595.28),
        }
    }
}

/// Concrete page dimensions in points after applying orientation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width_pt: f32,
    pub height_pt: f32,
}

impl PageSize {
    /// Look up the page size for a format in the given orientation.
    pub fn for_format(format: PageFormat, orientation: Orientation) -> Self {
        let (w, h) = format.dimensions_pt();
        match orientation {
            Orientation::Portrait => Self {
                width_pt: w,
                height_pt: h,
            },
            Orientation::Landscape => Self {
                width_pt: h,
                height_pt: w,
            },
        }
    }
}

/// Lossy encoding quality as a percentage.
///
/// The UI offers 10..=100 in steps of 5, but any integer in range is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Quality(u8);

impl Quality {
    pub const MIN: u8 = 10;
    pub const MAX: u8 = 100;

    pub fn new(percent: u8) -> Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&percent) {
            Ok(Self(percent))
        } else {
            Err(PagewerkError::InvalidQuality(percent))
        }
    }

    pub fn percent(&self) -> u8 {
        self.0
    }

    /// Quality on the 0–1 scale used by encoders.
    pub fn as_fraction(&self) -> f32 {
        f32::from(self.0) / 100.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(75)
    }
}

impl TryFrom<u8> for Quality {
    type Error = PagewerkError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Quality> for u8 {
    fn from(quality: Quality) -> Self {
        quality.0
    }
}

/// Document-level settings for a conversion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionConfig {
    orientation: Orientation,
    page_format: PageFormat,
    output_name: String,
}

impl ConversionConfig {
    pub fn new(orientation: Orientation, page_format: PageFormat, output_name: impl Into<String>) -> Self {
        Self {
            orientation,
            page_format,
            output_name: output_name.into(),
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn page_format(&self) -> PageFormat {
        self.page_format
    }

    pub fn output_name(&self) -> &str {
        &self.output_name
    }

    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
    }

    pub fn set_page_format(&mut self, page_format: PageFormat) {
        self.page_format = page_format;
    }

    pub fn set_output_name(&mut self, output_name: impl Into<String>) {
        self.output_name = output_name.into();
    }

    /// Page dimensions implied by format and orientation.
    pub fn page_size(&self) -> PageSize {
        PageSize::for_format(self.page_format, self.orientation)
    }

    /// The delivered file name: `output_name` with `.pdf` appended unless it
    /// already ends with exactly `.pdf`.
    ///
    /// The name must be a single file name: blank names and names containing
    /// path separators are rejected.
    pub fn file_name(&self) -> Result<String> {
        let name = &self.output_name;
        if name.trim().is_empty() || name.contains(['/', '\\', '\0']) || name == ".." {
            return Err(PagewerkError::InvalidName(name.clone()));
        }
        if self.output_name.ends_with(".pdf") {
            Ok(self.output_name.clone())
        } else {
            Ok(format!("{}.pdf", self.output_name))
        }
    }
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self::new(Orientation::Portrait, PageFormat::A4, "converted-images.pdf")
    }
}

/// Image compression and document optimisation switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionConfig {
    quality: Quality,
    compress_enabled: bool,
    optimize_enabled: bool,
}

impl CompressionConfig {
    pub fn new(quality: Quality, compress_enabled: bool, optimize_enabled: bool) -> Self {
        Self {
            quality,
            compress_enabled,
            optimize_enabled,
        }
    }

    /// Both compression and optimisation switched off.
    pub fn disabled() -> Self {
        Self::new(Quality::default(), false, false)
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    pub fn compress_enabled(&self) -> bool {
        self.compress_enabled
    }

    pub fn optimize_enabled(&self) -> bool {
        self.optimize_enabled
    }

    pub fn set_quality(&mut self, quality: Quality) {
        self.quality = quality;
    }

    pub fn set_compress_enabled(&mut self, enabled: bool) {
        self.compress_enabled = enabled;
    }

    pub fn set_optimize_enabled(&mut self, enabled: bool) {
        self.optimize_enabled = enabled;
    }
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self::new(Quality::default(), true, true)
    }
}

/// The final document handed to the delivery collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    pub bytes: Vec<u8>,
    pub name: String,
}

/// Lifecycle states of the conversion orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversionState {
    /// Ready to accept a start request.
    Idle,
    /// A conversion is in flight; further start requests are no-ops.
    Converting,
}
