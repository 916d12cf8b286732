// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — downsizing and lossy re-encoding of registered images.

pub mod compressor;

pub use compressor::ImageCompressor;
