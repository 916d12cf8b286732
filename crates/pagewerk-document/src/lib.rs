// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagewerk-document — Document processing for the Pagewerk converter.
//
// Provides per-image lossy compression with fallback, page geometry, PDF
// assembly (one image per page), structural PDF optimisation, and a small
// PDF inspector used for verification.

pub mod image;
pub mod pdf;

// Re-export the primary structs so callers can use `pagewerk_document::PageAssembler` etc.
pub use image::compressor::{CompressedAsset, CompressionOutcome, ImageCompressor};
pub use pdf::assembler::{PageAssembler, PlacedImage};
pub use pdf::inspect::{ImagePlacement, PdfInspector};
pub use pdf::layout::{PageRect, layout};
pub use pdf::optimizer::{DocumentOptimizer, StructuralOptimizer};
