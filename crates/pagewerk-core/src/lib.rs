// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pagewerk — Core types, error definitions, the image registry, and the
// advisory size estimator shared across all crates.

pub mod config;
pub mod error;
pub mod estimate;
pub mod human_errors;
pub mod registry;
pub mod types;

pub use config::AppConfig;
pub use error::{PagewerkError, RecoverableError};
pub use estimate::{SizeEstimate, estimate};
pub use registry::{ImageAsset, ImageRegistry, PreviewHandle, RegistrySnapshot};
pub use types::*;
