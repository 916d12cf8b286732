// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Advisory output-size estimate.
//
// A fixed heuristic over the registered byte lengths and the compression
// switches. It is not a measurement of compressor output and must never fail.

use serde::{Deserialize, Serialize};

use crate::registry::ImageAsset;
use crate::types::CompressionConfig;

const BYTES_PER_MEGABYTE: f64 = 1_048_576.0;

/// Lower bound on the compression factor regardless of quality.
const MIN_COMPRESSION_FACTOR: f64 = 0.1;

/// Flat reduction credited to structural optimisation.
const OPTIMIZATION_FACTOR: f64 = 0.9;

/// Projected document size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeEstimate {
    pub original_bytes: u64,
    pub estimated_bytes: u64,
}

impl SizeEstimate {
    pub fn original_megabytes(&self) -> f64 {
        self.original_bytes as f64 / BYTES_PER_MEGABYTE
    }

    pub fn estimated_megabytes(&self) -> f64 {
        self.estimated_bytes as f64 / BYTES_PER_MEGABYTE
    }

    /// Whole-percent size reduction, 0 when nothing is registered.
    pub fn reduction_percent(&self) -> u8 {
        if self.original_bytes == 0 {
            return 0;
        }
        let ratio = self.estimated_bytes as f64 / self.original_bytes as f64;
        ((1.0 - ratio) * 100.0).round().clamp(0.0, 100.0) as u8
    }
}

/// Project the output size of converting `assets` under `config`.
pub fn estimate<'a>(
    assets: impl IntoIterator<Item = &'a ImageAsset>,
    config: &CompressionConfig,
) -> SizeEstimate {
    let original_bytes: u64 = assets.into_iter().map(ImageAsset::byte_length).sum();
    estimate_bytes(original_bytes, config)
}

/// Same as [`estimate`] for a precomputed byte total.
pub fn estimate_bytes(original_bytes: u64, config: &CompressionConfig) -> SizeEstimate {
    let compression_factor = if config.compress_enabled() {
        (f64::from(config.quality().percent()) / 100.0).max(MIN_COMPRESSION_FACTOR)
    } else {
        1.0
    };
    let optimization_factor = if config.optimize_enabled() {
        OPTIMIZATION_FACTOR
    } else {
        1.0
    };

    // Exact integer identity when both switches are off.
    let estimated_bytes = if compression_factor == 1.0 && optimization_factor == 1.0 {
        original_bytes
    } else {
        let projected = original_bytes as f64 * compression_factor * optimization_factor;
        (projected.floor() as u64).min(original_bytes)
    };

    SizeEstimate {
        original_bytes,
        estimated_bytes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Quality;

    const TEN_MIB: u64 = 10 * 1_048_576;

    fn config(quality: u8, compress: bool, optimize: bool) -> CompressionConfig {
        CompressionConfig::new(Quality::new(quality).unwrap(), compress, optimize)
    }

    #[test]
    fn quality_fraction_does_not_lose_a_byte() {
        let e = estimate_bytes(100, &config(70, true, false));
        assert_eq!(e.estimated_bytes, 70);
        let e = estimate_bytes(1_000, &config(55, true, false));
        assert_eq!(e.estimated_bytes, 550);
    }

    #[test]
    fn identity_when_everything_disabled() {
        for quality in (10..=100).step_by(5) {
            let e = estimate_bytes(123_456_789, &config(quality, false, false));
            assert_eq!(e.estimated_bytes, e.original_bytes);
        }
    }

    #[test]
    fn half_quality_with_optimisation() {
        let e = estimate_bytes(TEN_MIB, &config(50, true, true));
        assert_eq!(e.original_bytes, 10_485_760);
        assert_eq!(e.estimated_bytes, 4_718_592);
    }

    #[test]
    fn monotone_in_quality() {
        for optimize in [false, true] {
            let mut previous = 0;
            for quality in 10..=100 {
                let e = estimate_bytes(TEN_MIB + 7, &config(quality, true, optimize));
                assert!(e.estimated_bytes >= previous, "q={quality}");
                previous = e.estimated_bytes;
            }
        }
    }

    #[test]
    fn never_exceeds_original_when_enabled() {
        for (compress, optimize) in [(true, false), (false, true), (true, true)] {
            for quality in (10..=100).step_by(5) {
                let e = estimate_bytes(999_999, &config(quality, compress, optimize));
                assert!(e.estimated_bytes <= e.original_bytes);
            }
        }
    }

    #[test]
    fn quality_ignored_when_compression_disabled() {
        let low = estimate_bytes(TEN_MIB, &config(10, false, true));
        let high = estimate_bytes(TEN_MIB, &config(100, false, true));
        assert_eq!(low, high);
        assert_eq!(low.estimated_bytes, 9_437_184);
    }

    #[test]
    fn sums_asset_lengths() {
        let assets = [
            ImageAsset::new(vec![0u8; 1000], "a"),
            ImageAsset::new(vec![0u8; 24], "b"),
        ];
        let e = estimate(assets.iter(), &config(100, true, false));
        assert_eq!(e.original_bytes, 1024);
        assert_eq!(e.estimated_bytes, 1024);
    }

    #[test]
    fn display_helpers() {
        let e = estimate_bytes(TEN_MIB, &config(50, true, true));
        assert_eq!(e.original_megabytes(), 10.0);
        assert_eq!(e.estimated_megabytes(), 4.5);
        assert_eq!(e.reduction_percent(), 55);
        assert_eq!(SizeEstimate::default().reduction_percent(), 0);
    }
}
