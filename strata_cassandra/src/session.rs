use std::time::Duration;

use async_trait::async_trait;
use snafu::Snafu;

use crate::statement::MutationBatch;

/// Errors surfaced by a backend session.
///
/// Transport-level unavailability is handed to the caller's backoff layer;
/// everything else feeds the batch-size reduction loop.
#[derive(Debug, Clone, Snafu)]
#[snafu(visibility(pub))]
pub enum SessionError {
    #[snafu(display("no host available: {message}"))]
    NoHostAvailable { message: String },
    #[snafu(display("not enough replicas alive: required {required}, alive {alive}"))]
    Unavailable { required: u32, alive: u32 },
    #[snafu(display("batch too large"))]
    BatchTooLarge,
    #[snafu(display("backend write timed out after {} ms", timeout.as_millis()))]
    Timeout { timeout: Duration },
    #[snafu(display("query failed: {message}"))]
    Query { message: String },
}

impl SessionError {
    /// Whether the cluster was unreachable, as opposed to rejecting the
    /// batch.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::NoHostAvailable { .. } | Self::Unavailable { .. })
    }
}

pub type Result<T, E = SessionError> = std::result::Result<T, E>;

/// Seam to the Cassandra-family cluster.
///
/// A batch either applies completely or not at all; implementations
/// surface driver errors verbatim so the ingestion loop can classify them.
#[async_trait]
pub trait CassandraSession: Send + Sync {
    async fn execute_batch(&self, batch: MutationBatch) -> Result<()>;
}
