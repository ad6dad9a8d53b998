pub mod batch;
pub mod cache;
pub mod error;
pub mod events;
pub mod ingestor;
pub mod metrics;
pub mod options;
pub mod retry;
pub mod writer;

pub use batch::{FailedBatch, WriteBatch};
pub use cache::DedupCache;
pub use error::{IngestorError, Result};
pub use events::{BatchReductionEvent, EventPublishers, RowKeyEvent};
pub use ingestor::{
    run_background_ingestor, BatchIngestor, BatchIngestorClient, CompletionSender, WriteRequest,
};
pub use options::IngestOptions;
pub use retry::{retry_transport, BackoffPolicy};
pub use writer::{BatchWriter, FAILED_EVENTS_TARGET};
