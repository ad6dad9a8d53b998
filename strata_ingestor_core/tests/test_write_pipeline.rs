use std::sync::Arc;

use strata_cassandra::{MemorySession, SessionError};
use strata_core::DataPointEvent;
use strata_ingestor_core::IngestorError;

mod common;

use common::{sample_event, spawn_ingestor};

const T: i64 = 1_600_000_000_000;

#[tokio::test]
async fn write_completes_and_stores() {
    let session = Arc::new(MemorySession::new());
    let (task, client, ct) = spawn_ingestor(session.clone());

    client
        .write(vec![sample_event("cpu", T, 1), sample_event("cpu", T + 1, 2)])
        .await
        .unwrap();

    assert_eq!(session.total_data_points(), 2);
    assert_eq!(session.row_key_entries("cpu").len(), 1);

    ct.cancel();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn transport_failure_is_retried_behind_the_callback() {
    let session = Arc::new(MemorySession::new());
    session.fail_next(SessionError::NoHostAvailable {
        message: "no hosts".to_string(),
    });
    let (task, client, ct) = spawn_ingestor(session.clone());

    client.write(vec![sample_event("cpu", T, 1)]).await.unwrap();

    // First submit failed, the backoff retry landed the second.
    assert_eq!(session.batches_executed(), 2);
    assert_eq!(session.total_data_points(), 1);

    ct.cancel();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn exhausted_retries_still_fire_the_completion() {
    let session = Arc::new(MemorySession::new());
    for _ in 0..3 {
        session.fail_next(SessionError::Unavailable {
            required: 2,
            alive: 0,
        });
    }
    let (task, client, ct) = spawn_ingestor(session.clone());

    // The write callback still completes; the events are lost to the
    // backend until the upstream queue redelivers them.
    client.write(vec![sample_event("cpu", T, 1)]).await.unwrap();

    assert_eq!(session.batches_executed(), 3);
    assert_eq!(session.total_data_points(), 0);

    ct.cancel();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn terminal_failure_still_fires_the_completion() {
    let session = Arc::new(MemorySession::new());
    session.fail_next(SessionError::Query {
        message: "boom".to_string(),
    });
    let (task, client, ct) = spawn_ingestor(session.clone());

    let events: Vec<DataPointEvent> = (0..5).map(|i| sample_event("cpu", T + i, i)).collect();
    client.write(events).await.unwrap();

    assert_eq!(session.total_data_points(), 0);

    ct.cancel();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn concurrent_writes_all_complete() {
    let session = Arc::new(MemorySession::new());
    let (task, client, ct) = spawn_ingestor(session.clone());

    let (first, second, third) = tokio::join!(
        client.write(vec![sample_event("cpu", T, 1)]),
        client.write(vec![sample_event("mem", T, 2)]),
        client.write(vec![sample_event("disk", T, 3)]),
    );
    first.unwrap();
    second.unwrap();
    third.unwrap();

    assert_eq!(session.total_data_points(), 3);
    assert_eq!(session.row_key_entries("cpu").len(), 1);
    assert_eq!(session.row_key_entries("mem").len(), 1);
    assert_eq!(session.row_key_entries("disk").len(), 1);

    ct.cancel();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn writes_after_shutdown_fail_with_channel_closed() {
    let session = Arc::new(MemorySession::new());
    let (task, client, ct) = spawn_ingestor(session);

    ct.cancel();
    task.await.unwrap().unwrap();

    let error = client
        .write(vec![sample_event("cpu", T, 1)])
        .await
        .unwrap_err();
    assert!(matches!(error, IngestorError::ChannelClosed));
}
