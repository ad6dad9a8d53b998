use strata_core::RowKey;
use tokio::sync::broadcast;

/// A new row key was added to the row-key index.
#[derive(Debug, Clone)]
pub struct RowKeyEvent {
    pub metric: String,
    pub row_key: RowKey,
    pub ttl: u32,
}

/// The effective batch size shrank below the submitted event count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchReductionEvent {
    pub limit: usize,
}

/// Typed fan-out channels for index observers.
///
/// Publishing is fire-and-forget: it never blocks the writer, a lagging
/// subscriber drops the oldest events, and zero subscribers is fine.
/// Subscribers reconcile from the stored indexes on restart.
#[derive(Debug, Clone)]
pub struct EventPublishers {
    row_keys: broadcast::Sender<RowKeyEvent>,
    batch_reductions: broadcast::Sender<BatchReductionEvent>,
}

impl EventPublishers {
    pub fn new(capacity: usize) -> Self {
        let (row_keys, _) = broadcast::channel(capacity);
        let (batch_reductions, _) = broadcast::channel(capacity);
        Self {
            row_keys,
            batch_reductions,
        }
    }

    pub fn subscribe_row_keys(&self) -> broadcast::Receiver<RowKeyEvent> {
        self.row_keys.subscribe()
    }

    pub fn subscribe_batch_reductions(&self) -> broadcast::Receiver<BatchReductionEvent> {
        self.batch_reductions.subscribe()
    }

    pub fn publish_row_key(&self, event: RowKeyEvent) {
        let _ = self.row_keys.send(event);
    }

    pub fn publish_batch_reduction(&self, event: BatchReductionEvent) {
        let _ = self.batch_reductions.send(event);
    }
}
