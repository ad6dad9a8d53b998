use std::sync::Arc;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::error;

use strata_cassandra::CassandraSession;
use strata_core::DataPointEvent;

use crate::error::{ChannelClosedSnafu, Result};
use crate::events::{BatchReductionEvent, EventPublishers, RowKeyEvent};
use crate::options::IngestOptions;
use crate::retry::{retry_transport, BackoffPolicy};
use crate::writer::BatchWriter;

/// Completion callback for one write request; the upstream durable queue
/// advances its read pointer when it fires. Fired exactly once, on success
/// and on terminal failure alike.
pub type CompletionSender = oneshot::Sender<()>;

pub struct WriteRequest {
    pub events: Vec<DataPointEvent>,
    pub completion: CompletionSender,
}

/// Owns the request channel and the shared [`BatchWriter`], and runs up to
/// `max_concurrent_batches` handler tasks at a time.
pub struct BatchIngestor {
    tx: mpsc::Sender<WriteRequest>,
    rx: mpsc::Receiver<WriteRequest>,
    writer: Arc<BatchWriter>,
    publishers: EventPublishers,
    backoff: BackoffPolicy,
    max_concurrent: usize,
}

#[derive(Clone)]
pub struct BatchIngestorClient {
    tx: mpsc::Sender<WriteRequest>,
}

pub async fn run_background_ingestor(
    ingestor: BatchIngestor,
    ct: CancellationToken,
) -> Result<()> {
    ingestor.run(ct).await
}

impl BatchIngestor {
    pub fn new(session: Arc<dyn CassandraSession>, options: IngestOptions) -> Result<Self> {
        Self::with_backoff(session, options, BackoffPolicy::default())
    }

    pub fn with_backoff(
        session: Arc<dyn CassandraSession>,
        options: IngestOptions,
        backoff: BackoffPolicy,
    ) -> Result<Self> {
        options.validate()?;

        let publishers = EventPublishers::new(options.event_channel_capacity);
        let writer = Arc::new(BatchWriter::new(
            session,
            options.clone(),
            publishers.clone(),
        )?);
        let (tx, rx) = mpsc::channel(options.request_queue_depth);

        Ok(Self {
            tx,
            rx,
            writer,
            publishers,
            backoff,
            max_concurrent: options.max_concurrent_batches,
        })
    }

    pub fn client(&self) -> BatchIngestorClient {
        BatchIngestorClient {
            tx: self.tx.clone(),
        }
    }

    pub fn subscribe_row_keys(&self) -> broadcast::Receiver<RowKeyEvent> {
        self.publishers.subscribe_row_keys()
    }

    pub fn subscribe_batch_reductions(&self) -> broadcast::Receiver<BatchReductionEvent> {
        self.publishers.subscribe_batch_reductions()
    }

    pub async fn run(mut self, ct: CancellationToken) -> Result<()> {
        let mut handlers = FuturesUnordered::new();
        let max_concurrent = self.max_concurrent;

        loop {
            tokio::select! {
                _ = ct.cancelled() => {
                    break;
                }
                request = self.rx.recv(), if handlers.len() < max_concurrent => {
                    let Some(request) = request else {
                        break;
                    };

                    let writer = self.writer.clone();
                    let backoff = self.backoff;
                    handlers.push(handle_request(writer, backoff, request));
                }
                _ = handlers.next(), if !handlers.is_empty() => {}
            }
        }

        // Drain in-flight handlers so their completions still fire.
        while handlers.next().await.is_some() {}

        Ok(())
    }
}

async fn handle_request(writer: Arc<BatchWriter>, backoff: BackoffPolicy, request: WriteRequest) {
    let WriteRequest { events, completion } = request;

    if let Err(error) = retry_transport(backoff, || writer.write_events(&events)).await {
        error!(
            %error,
            events = events.len(),
            "giving up on a write after exhausting backend retries"
        );
    }

    let _ = completion.send(());
}

impl BatchIngestorClient {
    /// Sends `events` for ingestion and waits for the completion callback.
    pub async fn write(&self, events: Vec<DataPointEvent>) -> Result<()> {
        let (tx, rx) = oneshot::channel();

        self.tx
            .send(WriteRequest {
                events,
                completion: tx,
            })
            .await
            .or_else(|_| ChannelClosedSnafu {}.fail())?;

        rx.await.or_else(|_| ChannelClosedSnafu {}.fail())
    }
}
