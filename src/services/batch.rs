//! Batch pipeline: renders many payloads with one shared style and packs the
//! results into a single zip archive.
//!
//! Items are processed strictly one after another ([`MAX_CONCURRENT_RENDERS`]
//! is 1). Each item gets a fresh, disposable engine instance that is attached
//! to its own off-screen container and always detached afterwards.
//!
//! [`MAX_CONCURRENT_RENDERS`]: crate::models::MAX_CONCURRENT_RENDERS

use crate::metrics::Metrics;
use crate::models::{BatchItem, BatchJob, Settings, StyleState};
use crate::services::archive::{ArchiveBuilder, ArchiveError};
use crate::services::engine::{
    Container, EngineHandle, ErrorCorrection, ImageFormat, RenderEngine, RenderInstance,
    RenderOptions,
};
use crate::state::StateManager;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::watch;

/// Longest sanitized payload kept in an entry name
pub const MAX_ENTRY_STEM: usize = 50;

static SCHEME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://").expect("Invalid scheme regex"));

static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9.-]").expect("Invalid unsafe character regex"));

/// Errors that end or refuse a batch run
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("No payloads to render")]
    Empty,

    #[error("A batch run is already in progress")]
    AlreadyRunning,

    #[error("Rendering engine is not ready")]
    EngineNotReady,

    #[error("Batch cancelled after {completed} items")]
    Cancelled { completed: usize },

    #[error("Failed to build archive: {0}")]
    Archive(#[from] ArchiveError),
}

/// An item that could not be rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub index: usize,
    pub payload: String,
    pub reason: String,
}

/// Output of a finished run.
#[derive(Debug, Clone)]
pub struct BatchArchive {
    /// `<prefix>-batch-<N>qr.zip`
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Entry names in archive order
    pub entries: Vec<String>,
    pub failures: Vec<ItemFailure>,
}

impl BatchArchive {
    /// Write the archive into `dir` under its file name.
    pub fn save_to(&self, dir: &Utf8Path) -> Result<Utf8PathBuf> {
        if !dir.exists() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir))?;
        }

        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)
            .with_context(|| format!("Failed to write archive: {}", path))?;

        tracing::info!("Saved batch archive to {}", path);
        Ok(path)
    }
}

/// Reduce a payload to a file-name-safe stem.
///
/// Strips a leading `http://` or `https://`, replaces everything outside
/// `[A-Za-z0-9.-]` with `_` and keeps at most [`MAX_ENTRY_STEM`] characters.
pub fn sanitize_payload(payload: &str) -> String {
    let stripped = SCHEME_PATTERN.replace(payload, "");
    let safe = UNSAFE_CHARS.replace_all(&stripped, "_");
    safe.chars().take(MAX_ENTRY_STEM).collect()
}

/// `qr_<index>_<sanitized>.<ext>`, with `index` 1-based.
pub fn entry_name(index: usize, payload: &str, format: ImageFormat) -> String {
    format!(
        "qr_{}_{}.{}",
        index,
        sanitize_payload(payload),
        format.extension()
    )
}

/// `<prefix>-batch-<total>qr.zip`
pub fn archive_name(prefix: &str, total: usize) -> String {
    format!("{}-batch-{}qr.zip", prefix, total)
}

enum ItemOutcome {
    Rendered(Vec<u8>),
    Failed(String),
    Cancelled,
}

// Returns the state to Idle if a run is dropped before reaching a terminal path.
struct RunGuard<'a> {
    pipeline: &'a BatchPipeline,
    armed: bool,
}

impl RunGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            tracing::warn!("Batch run dropped while in progress, returning to idle");
            self.pipeline.state.finish_batch(None);
            self.pipeline.state.reset_batch_state();
            self.pipeline.metrics.record_batch_cancelled();
        }
    }
}

/// Off-screen instance that is detached when it goes out of scope.
struct OffscreenInstance(Box<dyn RenderInstance>);

impl Drop for OffscreenInstance {
    fn drop(&mut self) {
        self.0.detach();
    }
}

// Resolves once cancellation is requested; never if the sender is gone.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    if cancel.wait_for(|requested| *requested).await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Sequential batch renderer.
///
/// Clones share the engine, state and metrics, so a clone can be moved into a
/// spawned task while the original keeps observing.
#[derive(Clone)]
pub struct BatchPipeline {
    engine: EngineHandle,
    state: Arc<StateManager>,
    metrics: Arc<Metrics>,

    settle: Duration,
    format: ImageFormat,
    archive_prefix: String,
    export_margin: u32,
    error_correction: ErrorCorrection,
}

impl BatchPipeline {
    pub fn new(engine: EngineHandle, state: Arc<StateManager>, settings: &Settings) -> Self {
        Self {
            engine,
            state,
            metrics: Arc::new(Metrics::new()),
            settle: settings.batch.settle(),
            format: settings.batch.format,
            archive_prefix: settings.batch.archive_prefix.clone(),
            export_margin: settings.export.logo_margin,
            error_correction: settings.export.error_correction,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn state(&self) -> &Arc<StateManager> {
        &self.state
    }

    /// Render every non-blank payload in `style` and pack the results.
    ///
    /// Per-item failures are recorded in [`BatchArchive::failures`] and do not
    /// stop the run. Refusals (`Empty`, `AlreadyRunning`, `EngineNotReady`)
    /// leave the state untouched. Setting `cancel` to `true` stops the run
    /// before the next item or during the current settle wait. Dropping the
    /// returned future also returns the state to Idle and detaches the
    /// in-flight instance.
    ///
    /// # Arguments
    /// * `payloads` - Raw lines; trimmed, blanks dropped
    /// * `style` - Style snapshot applied to every item, at its export size
    /// * `cancel` - Cancellation signal
    pub async fn run<I, S>(
        &self,
        payloads: I,
        style: &StyleState,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<BatchArchive, BatchError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let Some(mut job) = BatchJob::new(payloads, style.clone()) else {
            self.metrics.record_batch_rejected();
            return Err(BatchError::Empty);
        };

        let Some(engine) = self.engine.engine() else {
            self.metrics.record_batch_rejected();
            return Err(BatchError::EngineNotReady);
        };

        if !self.state.try_begin_batch(job.total()) {
            tracing::warn!("Batch requested while another run is in progress");
            self.metrics.record_batch_rejected();
            return Err(BatchError::AlreadyRunning);
        }
        let guard = RunGuard {
            pipeline: self,
            armed: true,
        };

        tracing::info!(
            "Starting batch of {} items at {}px",
            job.total(),
            style.export_size.get()
        );

        let mut archive = ArchiveBuilder::new();
        let mut failures = Vec::new();

        for position in 0..job.total() {
            if *cancel.borrow() {
                guard.disarm();
                return Err(self.abort(&job));
            }

            let item = job.items()[position].clone();
            self.state.update_progress(item.payload.clone());

            let started = Instant::now();
            match self
                .render_item(engine.as_ref(), &item, job.style(), &mut cancel)
                .await
            {
                ItemOutcome::Rendered(bytes) => {
                    let name = entry_name(item.index, &item.payload, self.format);
                    tracing::debug!("Rendered item {}: {}", item.index, name);

                    archive.add(name.clone(), bytes);
                    job.mark_rendered(position, name);
                    self.metrics.record_item_rendered();
                    self.metrics.record_render_time(started.elapsed());
                    self.state.add_item_result(item.index, item.payload, true);
                }
                ItemOutcome::Failed(reason) => {
                    tracing::warn!(
                        "Failed to render item {} ({}): {}",
                        item.index,
                        item.payload,
                        reason
                    );

                    failures.push(ItemFailure {
                        index: item.index,
                        payload: item.payload.clone(),
                        reason: reason.clone(),
                    });
                    job.mark_failed(position, reason);
                    self.metrics.record_item_failed();
                    self.state.add_item_result(item.index, item.payload, false);
                }
                ItemOutcome::Cancelled => {
                    guard.disarm();
                    return Err(self.abort(&job));
                }
            }
        }

        let entries: Vec<String> = archive.names().map(str::to_string).collect();
        let bytes = match archive.build_async().await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!("Failed to build batch archive: {}", e);
                guard.disarm();
                self.state.finish_batch(None);
                self.state.reset_batch_state();
                return Err(BatchError::Archive(e));
            }
        };

        let file_name = archive_name(&self.archive_prefix, job.total());
        guard.disarm();
        self.state.finish_batch(Some(file_name.clone()));
        self.state.reset_batch_state();
        self.metrics.record_batch_completed();

        tracing::info!(
            "Batch finished: {} rendered, {} failed, archive {} ({} bytes)",
            job.rendered_count(),
            job.failed_count(),
            file_name,
            bytes.len()
        );

        Ok(BatchArchive {
            file_name,
            bytes,
            entries,
            failures,
        })
    }

    fn abort(&self, job: &BatchJob) -> BatchError {
        let completed = job.completed();
        tracing::info!("Batch cancelled after {} of {} items", completed, job.total());

        self.state.finish_batch(None);
        self.state.reset_batch_state();
        self.metrics.record_batch_cancelled();

        BatchError::Cancelled { completed }
    }

    async fn render_item(
        &self,
        engine: &dyn RenderEngine,
        item: &BatchItem,
        style: &StyleState,
        cancel: &mut watch::Receiver<bool>,
    ) -> ItemOutcome {
        let options = RenderOptions::from_style(&item.payload, style, style.export_size.get())
            .with_margin(self.export_margin)
            .with_error_correction(self.error_correction);

        let mut instance = match engine.construct(&options) {
            Ok(instance) => OffscreenInstance(instance),
            Err(e) => return ItemOutcome::Failed(e.to_string()),
        };

        // Detached on drop, also when this future is dropped mid-settle
        self.capture(instance.0.as_mut(), item.index, cancel).await
    }

    async fn capture(
        &self,
        instance: &mut dyn RenderInstance,
        index: usize,
        cancel: &mut watch::Receiver<bool>,
    ) -> ItemOutcome {
        if let Err(e) = instance.append(Container::Offscreen(index)) {
            return ItemOutcome::Failed(e.to_string());
        }

        // Give the engine time to finish drawing before reading pixels back
        tokio::select! {
            _ = tokio::time::sleep(self.settle) => {}
            _ = cancelled(cancel) => return ItemOutcome::Cancelled,
        }

        match instance.raw_data(self.format) {
            Ok(bytes) if bytes.is_empty() => {
                ItemOutcome::Failed("engine returned no data".to_string())
            }
            Ok(bytes) => ItemOutcome::Rendered(bytes),
            Err(e) => ItemOutcome::Failed(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::engine::{MockRenderEngine, MockRenderInstance, RenderError};
    use mockall::predicate::*;

    #[test]
    fn test_sanitize_payload() {
        assert_eq!(sanitize_payload("https://My Site!.com/path"), "My_Site_.com_path");
        assert_eq!(sanitize_payload("http://a.com"), "a.com");
        assert_eq!(sanitize_payload("ftp://a.com"), "ftp___a.com");
        assert_eq!(sanitize_payload(&"x".repeat(80)).len(), MAX_ENTRY_STEM);
    }

    #[test]
    fn test_entry_and_archive_names() {
        assert_eq!(
            entry_name(1, "https://a.com", ImageFormat::Png),
            "qr_1_a.com.png"
        );
        assert_eq!(archive_name("qrypt", 3), "qrypt-batch-3qr.zip");
    }

    fn fast_settings() -> Settings {
        let mut settings = Settings::default();
        settings.batch.settle_ms = 1;
        settings
    }

    #[tokio::test]
    async fn test_instance_detached_on_failure() {
        let mut engine = MockRenderEngine::new();
        engine.expect_construct().times(1).returning(|options| {
            assert_eq!(options.image_margin, 20);
            assert!(options.image.is_none());

            let mut instance = MockRenderInstance::new();
            instance
                .expect_append()
                .with(eq(Container::Offscreen(1)))
                .returning(|_| Ok(()));
            instance
                .expect_raw_data()
                .returning(|_| Err(RenderError::Engine("no canvas".to_string())));
            instance.expect_detach().times(1).returning(|| ());
            Ok(Box::new(instance) as Box<dyn RenderInstance>)
        });

        let state = Arc::new(StateManager::new());
        let pipeline = BatchPipeline::new(
            EngineHandle::with_engine(Arc::new(engine)),
            state.clone(),
            &fast_settings(),
        );
        let (_tx, rx) = watch::channel(false);

        let archive = pipeline
            .run(["https://a.com"], &StyleState::default(), rx)
            .await
            .unwrap();

        assert!(archive.entries.is_empty());
        assert_eq!(archive.failures.len(), 1);
        assert_eq!(archive.failures[0].reason, "Engine error: no canvas");
        assert!(!state.read(|s| s.is_generating));
    }

    #[tokio::test]
    async fn test_not_ready_engine_rejects() {
        let state = Arc::new(StateManager::new());
        let pipeline = BatchPipeline::new(EngineHandle::new(), state.clone(), &fast_settings());
        let (_tx, rx) = watch::channel(false);

        let result = pipeline.run(["a"], &StyleState::default(), rx).await;

        assert!(matches!(result, Err(BatchError::EngineNotReady)));
        assert_eq!(state.snapshot(), Default::default());
    }
}
