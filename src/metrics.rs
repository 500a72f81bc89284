// Performance metrics module
//
// Lightweight counters for batch rendering, logged on demand or at shutdown

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Batch rendering metrics
///
/// Uses atomic operations for thread-safe tracking without locks. One instance
/// is shared by every pipeline run of a process.
#[derive(Debug)]
pub struct Metrics {
    /// Items rendered and added to an archive
    pub items_rendered: AtomicUsize,

    /// Items whose render or export failed
    pub items_failed: AtomicUsize,

    /// Total time spent rendering items, in milliseconds
    pub total_render_time_ms: AtomicU64,

    /// Runs that produced an archive
    pub batches_completed: AtomicU64,

    /// Runs refused because another was in flight or input was empty
    pub batches_rejected: AtomicU64,

    /// Runs cancelled before finishing
    pub batches_cancelled: AtomicU64,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            items_rendered: AtomicUsize::new(0),
            items_failed: AtomicUsize::new(0),
            total_render_time_ms: AtomicU64::new(0),
            batches_completed: AtomicU64::new(0),
            batches_rejected: AtomicU64::new(0),
            batches_cancelled: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_item_rendered(&self) {
        self.items_rendered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_item_failed(&self) {
        self.items_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record render time for one item
    pub fn record_render_time(&self, duration: Duration) {
        self.total_render_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn record_batch_completed(&self) {
        self.batches_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_batch_rejected(&self) {
        self.batches_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_batch_cancelled(&self) {
        self.batches_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Average render time per rendered item in milliseconds
    pub fn avg_render_time_ms(&self) -> f64 {
        let total = self.total_render_time_ms.load(Ordering::Relaxed);
        let count = self.items_rendered.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Batch Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Items: {} rendered, {} failed",
            self.items_rendered.load(Ordering::Relaxed),
            self.items_failed.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Total render time: {:.2}s (avg: {:.2}ms per item)",
            self.total_render_time_ms.load(Ordering::Relaxed) as f64 / 1000.0,
            self.avg_render_time_ms()
        );
        tracing::info!(
            "Batches: {} completed, {} cancelled, {} rejected",
            self.batches_completed.load(Ordering::Relaxed),
            self.batches_cancelled.load(Ordering::Relaxed),
            self.batches_rejected.load(Ordering::Relaxed)
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_items() {
        let metrics = Metrics::new();

        metrics.record_item_rendered();
        metrics.record_item_rendered();
        metrics.record_item_failed();

        assert_eq!(metrics.items_rendered.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.items_failed.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_record_render_time() {
        let metrics = Metrics::new();

        metrics.record_item_rendered();
        metrics.record_render_time(Duration::from_millis(100));
        metrics.record_item_rendered();
        metrics.record_render_time(Duration::from_millis(200));

        assert_eq!(metrics.total_render_time_ms.load(Ordering::Relaxed), 300);
        assert_eq!(metrics.avg_render_time_ms(), 150.0);
    }

    #[test]
    fn test_avg_render_time_without_items() {
        assert_eq!(Metrics::new().avg_render_time_ms(), 0.0);
    }

    #[test]
    fn test_batch_counters() {
        let metrics = Metrics::new();

        metrics.record_batch_completed();
        metrics.record_batch_cancelled();
        metrics.record_batch_rejected();
        metrics.record_batch_rejected();

        assert_eq!(metrics.batches_completed.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.batches_cancelled.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.batches_rejected.load(Ordering::Relaxed), 2);
    }
}
