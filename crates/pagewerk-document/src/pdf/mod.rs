// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — page layout, assembly, optimisation, and inspection.

pub mod assembler;
pub mod inspect;
pub mod layout;
pub mod optimizer;

pub use assembler::PageAssembler;
pub use inspect::PdfInspector;
pub use optimizer::{DocumentOptimizer, StructuralOptimizer};
