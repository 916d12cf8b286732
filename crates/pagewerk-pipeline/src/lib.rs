// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagewerk-pipeline — Drives a conversion from registered images to a
// delivered PDF.
//
// The orchestrator owns the single-flight state machine and runs each stage
// (compression, assembly, optimisation) off the async runtime. The finished
// document is handed to a `Delivery` implementation.

pub mod delivery;
pub mod orchestrator;

pub use delivery::{Delivery, DirectoryDelivery, MemoryDelivery};
pub use orchestrator::{ConversionOrchestrator, ConversionReport, PageReport, StartOutcome};
