use snafu::Snafu;
use strata_cassandra::SessionError;
use strata_core::ModelError;

#[derive(Debug, Clone, Snafu)]
#[snafu(visibility(pub))]
pub enum IngestorError {
    #[snafu(display("backend session error: {source}"))]
    Session { source: SessionError },
    #[snafu(display("data model error: {source}"))]
    Model { source: ModelError },
    #[snafu(display("invalid ingest options: {message}"))]
    Options { message: String },
    #[snafu(display("request channel closed"))]
    ChannelClosed,
}

impl IngestorError {
    /// Transport-level unavailability is owned by the outer backoff loop.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Session { source } if source.is_transport())
    }
}

pub type Result<T, E = IngestorError> = std::result::Result<T, E>;
