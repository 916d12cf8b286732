// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use serde::{Deserialize, Serialize};

use crate::types::{CompressionConfig, ConversionConfig, Quality};

/// Persistent converter settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Page format, orientation, and output name for new conversions.
    pub conversion: ConversionConfig,
    /// Image compression and document optimisation switches.
    pub compression: CompressionConfig,
    /// Upper bound on image compressions running at once.
    pub max_parallel_compressions: usize,
    /// Longest allowed edge, in pixels, of a compressed image.
    pub max_dimension: u32,
    /// Target ceiling for a single compressed image (`None` disables the cap).
    pub max_compressed_bytes: Option<u64>,
    /// Embedding quality used when compression is switched off.
    pub fallback_quality: Quality,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            conversion: ConversionConfig::default(),
            compression: CompressionConfig::default(),
            max_parallel_compressions: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(2),
            max_dimension: 1920,
            max_compressed_bytes: Some(1024 * 1024),
            fallback_quality: Quality::new(80).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_converter_ui() {
        let config = AppConfig::default();
        assert_eq!(config.conversion.output_name(), "converted-images.pdf");
        assert_eq!(config.compression.quality().percent(), 75);
        assert!(config.compression.compress_enabled());
        assert!(config.compression.optimize_enabled());
        assert_eq!(config.max_dimension, 1920);
        assert_eq!(config.fallback_quality.percent(), 80);
        assert!(config.max_parallel_compressions >= 1);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{ "max_dimension": 1024 }"#).unwrap();
        assert_eq!(config.max_dimension, 1024);
        assert_eq!(config.conversion, ConversionConfig::default());
    }

    #[test]
    fn json_round_trip_keeps_enums_lowercase() {
        let json = serde_json::to_string(&AppConfig::default()).unwrap();
        assert!(json.contains(r#""orientation":"portrait""#));
        assert!(json.contains(r#""page_format":"a4""#));
    }
}
