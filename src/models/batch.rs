use super::style::StyleState;

/// Lifecycle of a single batch item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemStatus {
    Pending,
    Rendered { entry_name: String },
    Failed { reason: String },
}

impl ItemStatus {
    pub fn is_settled(&self) -> bool {
        !matches!(self, ItemStatus::Pending)
    }
}

/// One payload inside a batch job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItem {
    /// 1-based position in the job, used for entry naming
    pub index: usize,
    pub payload: String,
    pub status: ItemStatus,
}

/// An in-flight batch run: payloads, the style snapshot shared by every item,
/// and per-item results.
///
/// Jobs are created at batch start and discarded once the archive is built or
/// the run is cancelled.
#[derive(Debug, Clone)]
pub struct BatchJob {
    style: StyleState,
    items: Vec<BatchItem>,
    completed: usize,
}

impl BatchJob {
    /// Create a job from raw user input.
    ///
    /// Payloads are trimmed and blank lines dropped; returns `None` when
    /// nothing is left to render.
    pub fn new<I, S>(payloads: I, style: StyleState) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let items: Vec<BatchItem> = payloads
            .into_iter()
            .filter_map(|p| {
                let trimmed = p.as_ref().trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            // Numbered after filtering, so blank lines leave no gaps in entry names
            .enumerate()
            .map(|(i, payload)| BatchItem {
                index: i + 1,
                payload,
                status: ItemStatus::Pending,
            })
            .collect();

        if items.is_empty() {
            return None;
        }

        Some(Self {
            style,
            items,
            completed: 0,
        })
    }

    pub fn style(&self) -> &StyleState {
        &self.style
    }

    pub fn items(&self) -> &[BatchItem] {
        &self.items
    }

    pub fn total(&self) -> usize {
        self.items.len()
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn is_finished(&self) -> bool {
        self.completed == self.items.len()
    }

    /// Mark item at `position` (0-based) as rendered.
    pub fn mark_rendered(&mut self, position: usize, entry_name: String) {
        self.settle(position, ItemStatus::Rendered { entry_name });
    }

    /// Mark item at `position` (0-based) as failed.
    pub fn mark_failed(&mut self, position: usize, reason: String) {
        self.settle(position, ItemStatus::Failed { reason });
    }

    fn settle(&mut self, position: usize, status: ItemStatus) {
        if let Some(item) = self.items.get_mut(position) {
            if !item.status.is_settled() {
                self.completed += 1;
            }
            item.status = status;
        }
    }

    pub fn rendered_count(&self) -> usize {
        self.items
            .iter()
            .filter(|i| matches!(i.status, ItemStatus::Rendered { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.items
            .iter()
            .filter(|i| matches!(i.status, ItemStatus::Failed { .. }))
            .count()
    }
}
