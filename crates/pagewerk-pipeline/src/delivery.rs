// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Delivery — where a finished document goes.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use pagewerk_core::error::{PagewerkError, Result};
use pagewerk_core::types::ConversionResult;
use tracing::{info, instrument};

/// Receives the finished document of a successful conversion.
///
/// Called from a blocking thread, so implementations may do synchronous I/O.
pub trait Delivery: Send + Sync {
    fn deliver(&self, result: &ConversionResult) -> Result<()>;
}

/// Writes each document to `<dir>/<name>`, replacing any existing file.
#[derive(Debug, Clone)]
pub struct DirectoryDelivery {
    dir: PathBuf,
}

impl DirectoryDelivery {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path a document named `name` is written to.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}

impl Delivery for DirectoryDelivery {
    #[instrument(skip_all, fields(name = %result.name, bytes_len = result.bytes.len()))]
    fn deliver(&self, result: &ConversionResult) -> Result<()> {
        let single_component = Path::new(&result.name)
            .file_name()
            .is_some_and(|file| file == result.name.as_str());
        if !single_component {
            return Err(PagewerkError::Delivery(format!(
                "{:?} is not a plain file name",
                result.name
            )));
        }

        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(&result.name);
        std::fs::write(&path, &result.bytes)?;
        info!(path = %path.display(), "PDF written");
        Ok(())
    }
}

/// Keeps delivered documents in memory.
#[derive(Debug, Default)]
pub struct MemoryDelivery {
    delivered: Mutex<Vec<ConversionResult>>,
}

impl MemoryDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything delivered so far, oldest first.
    pub fn delivered(&self) -> Vec<ConversionResult> {
        self.delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last(&self) -> Option<ConversionResult> {
        self.delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Delivery for MemoryDelivery {
    fn deliver(&self, result: &ConversionResult) -> Result<()> {
        self.delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(result.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, bytes: &[u8]) -> ConversionResult {
        ConversionResult {
            bytes: bytes.to_vec(),
            name: name.to_owned(),
        }
    }

    #[test]
    fn directory_delivery_writes_named_file() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("out");
        let delivery = DirectoryDelivery::new(&out);

        delivery.deliver(&result("mydoc.pdf", b"%PDF-1.7 one")).unwrap();
        assert_eq!(std::fs::read(out.join("mydoc.pdf")).unwrap(), b"%PDF-1.7 one");

        // Same name again overwrites.
        delivery.deliver(&result("mydoc.pdf", b"%PDF-1.7 two")).unwrap();
        assert_eq!(std::fs::read(delivery.path_for("mydoc.pdf")).unwrap(), b"%PDF-1.7 two");
    }

    #[test]
    fn directory_delivery_reports_io_failure() {
        let tmp = tempfile::tempdir().unwrap();
        // A regular file where the directory should be.
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();

        let delivery = DirectoryDelivery::new(&blocker);
        assert!(delivery.deliver(&result("a.pdf", b"%PDF")).is_err());
    }

    #[test]
    fn directory_delivery_stays_inside_its_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("out");
        let delivery = DirectoryDelivery::new(&out);

        for name in ["../escape.pdf", "sub/inner.pdf", "..", "/abs.pdf"] {
            let err = delivery.deliver(&result(name, b"%PDF")).unwrap_err();
            assert!(matches!(err, PagewerkError::Delivery(_)), "{name:?}");
        }
        assert!(!tmp.path().join("escape.pdf").exists());
        assert!(!out.exists());
    }

    #[test]
    fn memory_delivery_keeps_order() {
        let delivery = MemoryDelivery::new();
        assert!(delivery.is_empty());

        delivery.deliver(&result("a.pdf", b"1")).unwrap();
        delivery.deliver(&result("b.pdf", b"2")).unwrap();

        let names: Vec<String> = delivery.delivered().into_iter().map(|r| r.name).collect();
        assert_eq!(names, ["a.pdf", "b.pdf"]);
        assert_eq!(delivery.last().unwrap().bytes, b"2");
        assert_eq!(delivery.len(), 2);
    }
}
