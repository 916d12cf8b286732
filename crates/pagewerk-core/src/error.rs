// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Pagewerk.

use thiserror::Error;

use crate::types::AssetId;

/// Top-level error type for all Pagewerk operations.
///
/// Only the pre-flight validations, `Assembly`, and `Delivery` ever reach the
/// caller of a conversion. `Compression` and `Optimization` are produced by the
/// document crate but absorbed by the orchestrator, which records them as
/// [`RecoverableError`]s instead.
#[derive(Debug, Error)]
pub enum PagewerkError {
    // -- Pre-flight validation --
    #[error("no images registered")]
    EmptyInput,

    #[error("invalid output name: {0:?}")]
    InvalidName(String),

    #[error("quality {0} outside the supported range 10..=100")]
    InvalidQuality(u8),

    #[error("index {index} out of range for registry of {len} images")]
    InvalidIndex { index: usize, len: usize },

    // -- Pipeline stages --
    #[error("image compression failed: {0}")]
    Compression(String),

    #[error("PDF optimisation failed: {0}")]
    Optimization(String),

    #[error("PDF assembly failed: {0}")]
    Assembly(String),

    #[error("delivery failed: {0}")]
    Delivery(String),

    // -- Codec errors --
    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PagewerkError>;

/// A failure the pipeline recovered from by substituting its input.
///
/// These never fail a conversion; they are logged and listed in the
/// conversion report so callers can surface them if they want to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecoverableError {
    /// The asset was embedded with its original bytes.
    #[error("compression of {asset} fell back to original bytes: {detail}")]
    Compression { asset: AssetId, detail: String },

    /// The unoptimised document was delivered.
    #[error("optimisation fell back to the unoptimised document: {detail}")]
    Optimization { detail: String },
}
