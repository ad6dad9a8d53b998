use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use strata_cassandra::MemorySession;
use strata_core::{DataPoint, DataPointEvent, DataPointValue};
use strata_ingestor_core::{
    run_background_ingestor, BackoffPolicy, BatchIngestor, BatchIngestorClient, IngestOptions,
    Result,
};

pub fn test_options() -> IngestOptions {
    IngestOptions {
        write_cluster: "test".to_string(),
        ..Default::default()
    }
}

pub fn fast_backoff() -> BackoffPolicy {
    BackoffPolicy {
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(1),
        max_attempts: 3,
    }
}

pub fn sample_event(metric: &str, timestamp: i64, value: i64) -> DataPointEvent {
    DataPointEvent::new(metric, DataPoint::new(timestamp, DataPointValue::Long(value)))
        .with_tag("host", "a")
}

pub fn spawn_ingestor(
    session: Arc<MemorySession>,
) -> (
    JoinHandle<Result<()>>,
    BatchIngestorClient,
    CancellationToken,
) {
    spawn_ingestor_with(session, test_options())
}

pub fn spawn_ingestor_with(
    session: Arc<MemorySession>,
    options: IngestOptions,
) -> (
    JoinHandle<Result<()>>,
    BatchIngestorClient,
    CancellationToken,
) {
    let ingestor =
        BatchIngestor::with_backoff(session, options, fast_backoff()).expect("ingestor options");
    let client = ingestor.client();
    let ct = CancellationToken::new();
    let task = tokio::spawn(run_background_ingestor(ingestor, ct.clone()));

    (task, client, ct)
}
