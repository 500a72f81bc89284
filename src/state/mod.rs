// State management module
//
// This module provides the StateManager which wraps AppState with thread-safe access
// using Arc<RwLock<T>> and emits change events so hosts can follow batch progress.

use crate::models::AppState;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast;

/// Change events emitted when state is modified
///
/// These events let a host follow a batch run without polling the state.
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// A batch run has started
    BatchStarted { total: usize },

    /// Progress has been updated during a batch run
    ProgressUpdated {
        current: usize,
        total: usize,
        current_payload: Option<String>,
    },

    /// An item has been rendered or has failed
    ItemProcessed {
        index: usize,
        payload: String,
        rendered: bool,
    },

    /// A batch run has finished or been cancelled
    BatchFinished {
        rendered: usize,
        failed: usize,
        archive: Option<String>,
    },

    /// State has been reset
    StateReset,
}

/// Thread-safe state manager with event emission
///
/// - Provides thread-safe access to [`AppState`] via `Arc<RwLock<T>>`
/// - Detects state changes and emits [`StateChange`] events
/// - Guards the single-flight batch rule with [`try_begin_batch`](Self::try_begin_batch)
///
/// Clones share the same state and channel.
///
/// # Related Types
///
/// - [`crate::models::AppState`]: The underlying state structure
/// - [`crate::services::batch::BatchPipeline`]: Primary producer of state events
#[derive(Clone)]
pub struct StateManager {
    state: Arc<RwLock<AppState>>,

    /// Broadcast channel for emitting state change events
    state_tx: broadcast::Sender<StateChange>,
}

impl StateManager {
    /// Create a new StateManager with default state
    ///
    /// # Returns
    /// A new StateManager with a broadcast channel buffer of 100 events
    pub fn new() -> Self {
        let (state_tx, _) = broadcast::channel(100);
        Self {
            state: Arc::new(RwLock::new(AppState::default())),
            state_tx,
        }
    }

    // A panic while holding the lock leaves plain data behind, still usable.
    fn read_lock(&self) -> RwLockReadGuard<'_, AppState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_lock(&self) -> RwLockWriteGuard<'_, AppState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Get a cloned snapshot of the current state
    pub fn snapshot(&self) -> AppState {
        self.read_lock().clone()
    }

    /// Execute a function with read access to the state
    ///
    /// # Example
    /// ```ignore
    /// let busy = state_manager.read(|state| state.is_generating);
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&AppState) -> R,
    {
        f(&self.read_lock())
    }

    /// Update the state and emit change events
    ///
    /// # Arguments
    /// * `update_fn` - A function that mutates the state
    ///
    /// # Returns
    /// A vector of StateChange events that were emitted
    pub fn update<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut AppState),
    {
        let mut state = self.write_lock();
        let old_state = state.clone();

        update_fn(&mut state);

        let changes = Self::detect_changes(&old_state, &state);
        drop(state);

        for change in &changes {
            self.emit(change.clone());
        }

        changes
    }

    fn emit(&self, change: StateChange) {
        // No subscribers is fine
        let _ = self.state_tx.send(change);
    }

    /// Subscribe to state change events
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    fn detect_changes(old: &AppState, new: &AppState) -> Vec<StateChange> {
        let mut changes = Vec::new();

        if old.is_generating != new.is_generating {
            if new.is_generating {
                changes.push(StateChange::BatchStarted { total: new.total });
            } else {
                changes.push(StateChange::BatchFinished {
                    rendered: new.rendered.len(),
                    failed: new.failed.len(),
                    archive: new.last_archive.clone(),
                });
            }
        }

        if old.progress != new.progress
            || old.total != new.total
            || old.current_payload != new.current_payload
        {
            changes.push(StateChange::ProgressUpdated {
                current: new.progress,
                total: new.total,
                current_payload: new.current_payload.clone(),
            });
        }

        changes
    }

    /// Enter the Generating state for a run of `total` items.
    ///
    /// The check and the transition happen under one write lock, so two
    /// callers racing here cannot both win.
    ///
    /// # Returns
    /// `false`, with no events, when a run is already in progress
    pub fn try_begin_batch(&self, total: usize) -> bool {
        let mut state = self.write_lock();
        if state.is_generating {
            return false;
        }

        let old_state = state.clone();
        state.reset_batch_state();
        state.is_generating = true;
        state.total = total;

        let changes = Self::detect_changes(&old_state, &state);
        drop(state);

        for change in changes {
            self.emit(change);
        }
        true
    }

    /// Mark `payload` as the item being rendered
    pub fn update_progress(&self, payload: String) -> Vec<StateChange> {
        self.update(|state| {
            state.current_payload = Some(payload);
        })
    }

    /// Record the outcome of item `index` (1-based)
    pub fn add_item_result(
        &self,
        index: usize,
        payload: String,
        rendered: bool,
    ) -> Vec<StateChange> {
        let mut changes = self.update(|state| {
            state.add_result(payload.clone(), rendered);
        });

        let event = StateChange::ItemProcessed {
            index,
            payload,
            rendered,
        };
        self.emit(event.clone());
        changes.push(event);

        changes
    }

    /// Leave the Generating state.
    ///
    /// `archive` is the produced file name, or `None` when the run was cancelled.
    pub fn finish_batch(&self, archive: Option<String>) -> Vec<StateChange> {
        self.update(|state| {
            state.is_generating = false;
            state.current_payload = None;
            state.last_archive = archive;
        })
    }

    /// Reset all batch-related state
    pub fn reset_batch_state(&self) -> Vec<StateChange> {
        let mut changes = self.update(|state| {
            state.reset_batch_state();
        });

        self.emit(StateChange::StateReset);
        changes.push(StateChange::StateReset);

        changes
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}
