// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Persisted converter settings (`settings.json` in the data directory).

use std::path::{Path, PathBuf};

use pagewerk_core::AppConfig;
use pagewerk_core::error::Result;
use tracing::{debug, info, warn};

const SETTINGS_FILE: &str = "settings.json";

/// Load settings from `data_dir`, or the defaults if the file is missing or
/// unreadable.
pub fn load_settings(data_dir: &Path) -> AppConfig {
    let path = data_dir.join(SETTINGS_FILE);
    let data = match std::fs::read_to_string(&path) {
        Ok(data) => data,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "no saved settings, using defaults");
            return AppConfig::default();
        }
    };
    match serde_json::from_str(&data) {
        Ok(config) => config,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "corrupt settings file, using defaults");
            AppConfig::default()
        }
    }
}

/// Write `config` to `data_dir` as pretty JSON and return the file path.
pub fn persist_settings(data_dir: &Path, config: &AppConfig) -> Result<PathBuf> {
    std::fs::create_dir_all(data_dir)?;
    let path = data_dir.join(SETTINGS_FILE);
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json)?;
    info!(path = %path.display(), "settings saved");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagewerk_core::types::{Orientation, PageFormat, Quality};

    #[test]
    fn missing_file_gives_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(load_settings(tmp.path()), AppConfig::default());
    }

    #[test]
    fn corrupt_file_gives_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(SETTINGS_FILE), "{ not json").unwrap();
        assert_eq!(load_settings(tmp.path()), AppConfig::default());
    }

    #[test]
    fn saved_settings_are_loaded_back() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.conversion.set_orientation(Orientation::Landscape);
        config.conversion.set_page_format(PageFormat::Legal);
        config.conversion.set_output_name("album");
        config.compression.set_quality(Quality::new(55).unwrap());
        config.compression.set_optimize_enabled(false);

        let path = persist_settings(&tmp.path().join("nested"), &config).unwrap();
        assert!(path.ends_with(SETTINGS_FILE));
        assert_eq!(load_settings(&tmp.path().join("nested")), config);
    }
}
