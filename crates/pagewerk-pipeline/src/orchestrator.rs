// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Conversion orchestrator — registry snapshot to delivered PDF.
//
// Stages run in order: compress every asset (bounded concurrency), lay out
// each page, assemble, optionally optimise, name, deliver. Compression and
// optimisation failures are absorbed and listed in the report; assembly and
// delivery failures end the run.
//
// At most one conversion runs at a time. The `Converting` state is owned by
// an RAII guard, so every exit path (success, error, panic) returns the
// orchestrator to `Idle`.

use std::sync::{Arc, Mutex, PoisonError};

use pagewerk_core::error::{PagewerkError, Result};
use pagewerk_core::types::{
    AssetId, CompressionConfig, ConversionConfig, ConversionResult, ConversionState, Quality,
};
use pagewerk_core::{AppConfig, ImageRegistry, RecoverableError, RegistrySnapshot};
use pagewerk_document::pdf::layout::place;
use pagewerk_document::{
    CompressedAsset, CompressionOutcome, DocumentOptimizer, ImageCompressor, PageAssembler,
    PageRect, PlacedImage, StructuralOptimizer,
};
use tokio::sync::Semaphore;
use tokio::task;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::delivery::Delivery;

/// Result of a start request.
#[derive(Debug)]
pub enum StartOutcome {
    /// Another conversion was in flight; nothing happened.
    AlreadyRunning,
    /// The document was produced and handed to the delivery sink.
    Delivered(ConversionReport),
}

/// What ended up on one page.
#[derive(Debug, Clone)]
pub struct PageReport {
    pub asset: AssetId,
    pub display_name: String,
    /// Image placement in points.
    pub rect: PageRect,
    /// Whether the image was shrunk to fit the page.
    pub scaled: bool,
    pub outcome: CompressionOutcome,
}

/// Summary of a successful conversion.
#[derive(Debug, Clone)]
pub struct ConversionReport {
    pub result: ConversionResult,
    /// One entry per page, in page order.
    pub pages: Vec<PageReport>,
    /// Failures that were recovered from.
    pub warnings: Vec<RecoverableError>,
}

/// Single-flight driver for the conversion pipeline.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct ConversionOrchestrator {
    state: Arc<Mutex<ConversionState>>,
    last_failure: Arc<Mutex<Option<String>>>,
    compressor: ImageCompressor,
    optimizer: Arc<dyn DocumentOptimizer>,
    delivery: Arc<dyn Delivery>,
    max_parallel: usize,
    fallback_quality: Quality,
}

impl ConversionOrchestrator {
    pub fn new(config: &AppConfig, delivery: Arc<dyn Delivery>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ConversionState::Idle)),
            last_failure: Arc::new(Mutex::new(None)),
            compressor: ImageCompressor::new(config.max_dimension, config.max_compressed_bytes),
            optimizer: Arc::new(StructuralOptimizer),
            delivery,
            max_parallel: config.max_parallel_compressions.max(1),
            fallback_quality: config.fallback_quality,
        }
    }

    /// Replace the structural optimiser.
    pub fn with_optimizer(mut self, optimizer: Arc<dyn DocumentOptimizer>) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn state(&self) -> ConversionState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reason the most recent start request failed, cleared by the next
    /// successful conversion.
    pub fn last_failure(&self) -> Option<String> {
        self.last_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Convert the current contents of `registry` into one PDF.
    ///
    /// The single-flight check, the pre-flight validation and the registry
    /// snapshot all happen before this returns. The returned future owns
    /// everything it needs, so the registry can be edited while it runs
    /// without affecting the conversion. Dropping the future unpolled
    /// releases the `Converting` state.
    pub fn start(
        &self,
        registry: &ImageRegistry,
        conversion: &ConversionConfig,
        compression: &CompressionConfig,
    ) -> impl Future<Output = Result<StartOutcome>> + Send + use<> {
        let span = info_span!("conversion", images = registry.len());
        let armed = span.in_scope(|| self.arm(registry, conversion));
        let this = self.clone();
        let conversion = conversion.clone();
        let compression = *compression;

        async move {
            match armed {
                Ok(Some(armed)) => this.convert(armed, &conversion, &compression).await,
                Ok(None) => Ok(StartOutcome::AlreadyRunning),
                Err(err) => Err(err),
            }
        }
        .instrument(span)
    }

    /// Enter `Converting` and take the snapshot, or explain why not.
    ///
    /// `Ok(None)` means another conversion is in flight.
    fn arm(&self, registry: &ImageRegistry, conversion: &ConversionConfig) -> Result<Option<Armed>> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state == ConversionState::Converting {
            info!("Conversion already running, start request ignored");
            return Ok(None);
        }

        let preflight = if registry.is_empty() {
            Err(PagewerkError::EmptyInput)
        } else {
            conversion.file_name()
        };
        let name = match preflight {
            Ok(name) => name,
            Err(err) => {
                warn!(error = %err, "Conversion rejected");
                self.record_failure(&err);
                return Err(err);
            }
        };

        *state = ConversionState::Converting;
        Ok(Some(Armed {
            guard: ConvertingGuard {
                state: Arc::clone(&self.state),
            },
            snapshot: registry.snapshot(),
            name,
        }))
    }

    async fn convert(
        &self,
        armed: Armed,
        conversion: &ConversionConfig,
        compression: &CompressionConfig,
    ) -> Result<StartOutcome> {
        let Armed {
            guard: _guard,
            snapshot,
            name,
        } = armed;

        info!(
            pages = snapshot.len(),
            name = %name,
            format = ?conversion.page_format(),
            orientation = ?conversion.orientation(),
            "Conversion started"
        );

        match self.run(snapshot, name, conversion, compression).await {
            Ok(report) => {
                self.clear_failure();
                info!(
                    name = %report.result.name,
                    bytes_len = report.result.bytes.len(),
                    warnings = report.warnings.len(),
                    "Conversion delivered"
                );
                Ok(StartOutcome::Delivered(report))
            }
            Err(err) => {
                error!(error = %err, "Conversion failed");
                self.record_failure(&err);
                Err(err)
            }
        }
    }

    async fn run(
        &self,
        snapshot: RegistrySnapshot,
        name: String,
        conversion: &ConversionConfig,
        compression: &CompressionConfig,
    ) -> Result<ConversionReport> {
        let mut warnings = Vec::new();

        let compressed = self.compress_all(&snapshot, compression).await;
        for item in &compressed {
            if let CompressionOutcome::Fallback { detail } = item.outcome() {
                warnings.push(RecoverableError::Compression {
                    asset: item.asset(),
                    detail: detail.clone(),
                });
            }
        }

        let quality = if compression.compress_enabled() {
            compression.quality()
        } else {
            self.fallback_quality
        };
        let mut assembler = PageAssembler::new(conversion.page_size(), quality);
        assembler.set_title(name.trim_end_matches(".pdf"));
        let page_size = assembler.page_size();

        let mut pages = Vec::with_capacity(compressed.len());
        for (index, (asset, item)) in snapshot.assets().iter().zip(&compressed).enumerate() {
            let pixels = item.pixel_size().ok_or_else(|| {
                PagewerkError::Assembly(format!(
                    "page {}: cannot read the dimensions of {:?}",
                    index + 1,
                    asset.display_name()
                ))
            })?;
            let rect = place(page_size, pixels);
            debug!(page = index + 1, asset_id = %asset.id(), ?rect, "Page laid out");
            pages.push(PageReport {
                asset: asset.id(),
                display_name: asset.display_name().to_owned(),
                rect,
                scaled: rect.is_scaled(pixels),
                outcome: item.outcome().clone(),
            });
        }

        let rects: Vec<PageRect> = pages.iter().map(|page| page.rect).collect();

        let raw = task::spawn_blocking(move || {
            let placed: Vec<PlacedImage<'_>> = compressed
                .iter()
                .zip(&rects)
                .map(|(item, rect)| PlacedImage {
                    bytes: item.bytes(),
                    rect: *rect,
                })
                .collect();
            assembler.assemble(&placed)
        })
        .await
        .map_err(|err| PagewerkError::Assembly(format!("assembly task failed: {}", err)))??;

        let bytes = if compression.optimize_enabled() {
            self.optimize(raw, &mut warnings).await
        } else {
            raw
        };

        let result = self.deliver(ConversionResult { bytes, name }).await?;
        Ok(ConversionReport {
            result,
            pages,
            warnings,
        })
    }

    /// Compress every asset of `snapshot`, preserving snapshot order.
    async fn compress_all(
        &self,
        snapshot: &RegistrySnapshot,
        compression: &CompressionConfig,
    ) -> Vec<CompressedAsset> {
        let semaphore = Arc::new(Semaphore::new(self.max_parallel));
        let enabled = compression.compress_enabled();
        let quality = compression.quality();

        let mut handles = Vec::with_capacity(snapshot.len());
        for asset in snapshot.assets() {
            // The semaphore is never closed, so acquisition cannot fail.
            let permit = Arc::clone(&semaphore).acquire_owned().await.ok();
            let asset = Arc::clone(asset);
            let compressor = self.compressor.clone();
            handles.push(task::spawn_blocking(move || {
                let _permit = permit;
                if enabled {
                    compressor.compress(&asset, quality)
                } else {
                    compressor.passthrough(&asset)
                }
            }));
        }

        let mut compressed = Vec::with_capacity(handles.len());
        for (asset, handle) in snapshot.assets().iter().zip(handles) {
            let item = match handle.await {
                Ok(item) => item,
                Err(err) => self
                    .compressor
                    .fallback(asset, format!("compression task failed: {}", err)),
            };
            compressed.push(item);
        }
        compressed
    }

    /// Run the optimiser, keeping `raw` if it fails.
    async fn optimize(&self, raw: Vec<u8>, warnings: &mut Vec<RecoverableError>) -> Vec<u8> {
        let raw: Arc<[u8]> = raw.into();
        let optimizer = Arc::clone(&self.optimizer);
        let input = Arc::clone(&raw);

        let outcome = task::spawn_blocking(move || optimizer.optimize(&input))
            .await
            .map_err(|err| PagewerkError::Optimization(format!("optimisation task failed: {}", err)))
            .and_then(|result| result)
            .and_then(|bytes| {
                if bytes.is_empty() {
                    Err(PagewerkError::Optimization("optimiser returned no output".into()))
                } else {
                    Ok(bytes)
                }
            });

        match outcome {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(error = %err, "Optimisation failed, delivering unoptimised PDF");
                warnings.push(RecoverableError::Optimization {
                    detail: err.to_string(),
                });
                raw.to_vec()
            }
        }
    }

    async fn deliver(&self, result: ConversionResult) -> Result<ConversionResult> {
        let delivery = Arc::clone(&self.delivery);
        task::spawn_blocking(move || delivery.deliver(&result).map(|()| result))
            .await
            .map_err(|err| PagewerkError::Delivery(format!("delivery task failed: {}", err)))?
            .map_err(|err| match err {
                PagewerkError::Delivery(_) => err,
                other => PagewerkError::Delivery(other.to_string()),
            })
    }

    fn record_failure(&self, err: &PagewerkError) {
        *self.last_failure.lock().unwrap_or_else(PoisonError::into_inner) = Some(err.to_string());
    }

    fn clear_failure(&self) {
        *self.last_failure.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// A start request that passed the single-flight and pre-flight checks.
struct Armed {
    guard: ConvertingGuard,
    snapshot: RegistrySnapshot,
    name: String,
}

/// Holds the orchestrator in `Converting`; dropping it returns to `Idle`.
struct ConvertingGuard {
    state: Arc<Mutex<ConversionState>>,
}

impl Drop for ConvertingGuard {
    fn drop(&mut self) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = ConversionState::Idle;
        debug!("Orchestrator idle");
    }
}
