/// Maximum number of batch items rendered at once.
///
/// **IMPORTANT:** This is fixed at 1. The rendering engine keeps engine-global
/// canvas state that is unsafe to share between concurrent renders, so batch
/// items are processed strictly one after another.
///
/// # See Also
///
/// - [`crate::services::batch::BatchPipeline`] - Processes items sequentially
pub const MAX_CONCURRENT_RENDERS: usize = 1;

/// Observable batch progress.
///
/// `AppState` is wrapped in `Arc<RwLock<AppState>>` by [`crate::state::StateManager`].
/// Never mutate it directly - go through the manager so change events are emitted:
/// - [`read()`](crate::state::StateManager::read) for read-only access
/// - [`update()`](crate::state::StateManager::update) for mutations with change events
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AppState {
    // Runtime state
    pub is_generating: bool,
    pub current_payload: Option<String>,

    // Progress state
    pub progress: usize,
    pub total: usize,

    // Results of the current run
    pub rendered: Vec<String>,
    pub failed: Vec<String>,

    /// Archive file name produced by the last finished run, `None` if it
    /// was cancelled
    pub last_archive: Option<String>,
}

impl AppState {
    /// Progress as a fraction in `0.0..=1.0`, for progress bars.
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.progress as f32 / self.total as f32
        }
    }

    /// Returns (rendered, failed, total).
    pub fn batch_stats(&self) -> (usize, usize, usize) {
        (self.rendered.len(), self.failed.len(), self.total)
    }

    /// Record the outcome of one item and advance progress.
    pub fn add_result(&mut self, payload: String, rendered: bool) {
        if rendered {
            self.rendered.push(payload);
        } else {
            self.failed.push(payload);
        }
        self.progress += 1;
    }

    /// Return to idle with zeroed counters.
    ///
    /// `last_archive` survives so hosts can still offer the download.
    pub fn reset_batch_state(&mut self) {
        self.is_generating = false;
        self.current_payload = None;
        self.progress = 0;
        self.total = 0;
        self.rendered.clear();
        self.failed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state() {
        let state = AppState::default();
        assert!(!state.is_generating);
        assert_eq!(state.fraction(), 0.0);
        assert_eq!(MAX_CONCURRENT_RENDERS, 1);
    }

    #[test]
    fn test_add_result() {
        let mut state = AppState {
            total: 4,
            ..Default::default()
        };
        state.add_result("a".to_string(), true);
        state.add_result("b".to_string(), false);

        assert_eq!(state.batch_stats(), (1, 1, 4));
        assert_eq!(state.progress, 2);
        assert_eq!(state.fraction(), 0.5);
    }

    #[test]
    fn test_reset_keeps_last_archive() {
        let mut state = AppState {
            is_generating: true,
            progress: 3,
            total: 3,
            last_archive: Some("qrypt-batch-3qr.zip".to_string()),
            ..Default::default()
        };
        state.rendered.push("a".to_string());

        state.reset_batch_state();

        assert!(!state.is_generating);
        assert_eq!(state.progress, 0);
        assert_eq!(state.total, 0);
        assert!(state.rendered.is_empty());
        assert_eq!(state.last_archive.as_deref(), Some("qrypt-batch-3qr.zip"));
    }
}
