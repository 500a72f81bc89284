//! Undo/redo history over [`StyleState`], plus the persisted list of recently
//! used payloads.
//!
//! [`HistoryStore`] keeps `past`/`present`/`future` stacks. The visible
//! `present` changes on every [`set`](HistoryStore::set); the history push is
//! debounced so that a burst of edits (dragging a color picker) produces a
//! single undo step back to the state before the burst.
//!
//! Time comes from an injected [`Clock`]. Hosts drive the pending commit with
//! [`poll`](HistoryStore::poll), typically after sleeping until
//! [`next_deadline`](HistoryStore::next_deadline).

pub mod clock;
pub mod recent;

pub use clock::{Clock, DebounceTimer, ManualClock, SystemClock};
pub use recent::RecentPayloads;

use crate::models::StyleState;
use crate::models::config::HistorySettings;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Maximum number of undo steps kept
pub const MAX_HISTORY: usize = 30;

/// Quiet period after the last `set` before a history entry is committed
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(300);

/// Debounced, bounded undo/redo engine.
pub struct HistoryStore<C: Clock = SystemClock> {
    past: VecDeque<StyleState>,
    present: StyleState,
    future: VecDeque<StyleState>,

    /// Present at the moment the current burst began
    burst_origin: Option<StyleState>,
    timer: DebounceTimer,
    max_entries: usize,
    clock: C,
}

impl HistoryStore<SystemClock> {
    pub fn new(initial: StyleState) -> Self {
        Self::with_clock(initial, SystemClock)
    }
}

impl<C: Clock> HistoryStore<C> {
    /// Create a store with the default window and cap, reading time from `clock`.
    pub fn with_clock(initial: StyleState, clock: C) -> Self {
        Self::with_settings(initial, clock, &HistorySettings::default())
    }

    pub fn with_settings(initial: StyleState, clock: C, settings: &HistorySettings) -> Self {
        Self {
            past: VecDeque::new(),
            present: initial,
            future: VecDeque::new(),
            burst_origin: None,
            timer: DebounceTimer::new(settings.debounce()),
            max_entries: settings.max_entries.max(1),
            clock,
        }
    }

    /// The visible state.
    pub fn present(&self) -> &StyleState {
        &self.present
    }

    /// Move to `next` immediately; schedule the history push.
    ///
    /// Calls inside the debounce window extend the current burst instead of
    /// adding entries.
    pub fn set(&mut self, next: StyleState) {
        // A commit that came due before this call ends the previous burst.
        self.poll();

        let now = self.clock.now();
        if self.burst_origin.is_none() {
            self.burst_origin = Some(self.present.clone());
        }
        self.present = next;
        self.timer.schedule(now);
    }

    /// Commit the pending burst if its window has elapsed.
    ///
    /// Returns `true` when an entry was committed.
    pub fn poll(&mut self) -> bool {
        if self.timer.is_due(self.clock.now()) {
            self.commit();
            true
        } else {
            false
        }
    }

    /// Commit the pending burst now, regardless of the timer.
    pub fn flush(&mut self) -> bool {
        if self.burst_origin.is_some() {
            self.commit();
            true
        } else {
            false
        }
    }

    /// When the pending commit fires, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    pub fn has_pending_commit(&self) -> bool {
        self.burst_origin.is_some()
    }

    fn commit(&mut self) {
        self.timer.cancel();
        let Some(origin) = self.burst_origin.take() else {
            return;
        };

        self.push_past(origin);
        self.future.clear();

        tracing::trace!(
            past = self.past.len(),
            "Committed history entry"
        );
    }

    fn push_past(&mut self, entry: StyleState) {
        self.past.push_back(entry);
        while self.past.len() > self.max_entries {
            self.past.pop_front();
        }
    }

    /// Step back one entry. No-op when there is nothing to undo.
    ///
    /// A pending burst is committed first, so undo inside a burst returns to
    /// the state before the burst.
    pub fn undo(&mut self) -> bool {
        self.flush();

        let Some(previous) = self.past.pop_back() else {
            return false;
        };
        let current = std::mem::replace(&mut self.present, previous);
        self.future.push_front(current);
        true
    }

    /// Step forward one entry. No-op when the future is empty.
    pub fn redo(&mut self) -> bool {
        // Committing a pending burst clears the future, as any new branch does.
        self.flush();

        let Some(next) = self.future.pop_front() else {
            return false;
        };
        let current = std::mem::replace(&mut self.present, next);
        self.push_past(current);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty() || self.burst_origin.is_some()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty() && self.burst_origin.is_none()
    }

    pub fn past_len(&self) -> usize {
        self.past.len()
    }

    pub fn future_len(&self) -> usize {
        self.future.len()
    }

    /// Committed past entries, oldest first.
    pub fn past(&self) -> impl Iterator<Item = &StyleState> {
        self.past.iter()
    }
}
