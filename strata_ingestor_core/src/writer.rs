use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use snafu::ResultExt;
use tracing::{error, info, trace, warn, Level};

use strata_cassandra::{CassandraSession, SessionError};
use strata_core::{DataPointEvent, DataPointValue, RowKey, RowSpec, TimedMetric};

use crate::batch::WriteBatch;
use crate::cache::DedupCache;
use crate::error::{ModelSnafu, Result, SessionSnafu};
use crate::events::{BatchReductionEvent, EventPublishers, RowKeyEvent};
use crate::metrics::IngestionMetrics;
use crate::options::IngestOptions;

/// Trace target receiving one JSON record per event when a batch fails
/// terminally. Route it to durable storage to replay undeliverable events.
pub const FAILED_EVENTS_TARGET: &str = "strata::failed_events";

/// Recoverable wire form of an event that could not be delivered. Tags
/// serialize in tag-map order.
#[derive(Serialize)]
struct FailedEventRecord<'a> {
    name: &'a str,
    timestamp: i64,
    value: &'a DataPointValue,
    tags: &'a BTreeMap<String, String>,
    ttl: u32,
}

impl<'a> From<&'a DataPointEvent> for FailedEventRecord<'a> {
    fn from(event: &'a DataPointEvent) -> Self {
        Self {
            name: &event.metric,
            timestamp: event.data_point.timestamp,
            value: &event.data_point.value,
            tags: &event.tags,
            ttl: event.ttl,
        }
    }
}

/// Turns event lists into backend batches: shapes ttls, gates index writes
/// through the shared dedup caches, and shrinks the batch limit until the
/// backend accepts the load or the limit bottoms out.
///
/// One writer is shared by every concurrent handler task; the caches make
/// sure exactly one of them emits the index write for a new row key.
pub struct BatchWriter {
    session: Arc<dyn CassandraSession>,
    options: IngestOptions,
    row_spec: RowSpec,
    row_key_cache: DedupCache<RowKey>,
    metric_name_cache: DedupCache<TimedMetric>,
    publishers: EventPublishers,
    metrics: IngestionMetrics,
}

impl BatchWriter {
    pub fn new(
        session: Arc<dyn CassandraSession>,
        options: IngestOptions,
        publishers: EventPublishers,
    ) -> Result<Self> {
        options.validate()?;
        let row_spec = RowSpec::new(options.row_width_ms).context(ModelSnafu)?;

        Ok(Self {
            row_key_cache: DedupCache::new(options.row_key_cache_capacity),
            metric_name_cache: DedupCache::new(options.metric_name_cache_capacity),
            metrics: IngestionMetrics::default(),
            session,
            options,
            row_spec,
            publishers,
        })
    }

    pub fn row_key_cache(&self) -> &DedupCache<RowKey> {
        &self.row_key_cache
    }

    pub fn metric_name_cache(&self) -> &DedupCache<TimedMetric> {
        &self.metric_name_cache
    }

    pub fn row_spec(&self) -> &RowSpec {
        &self.row_spec
    }

    /// Writes `events` in input order, adapting the batch size to what the
    /// backend accepts.
    ///
    /// Transport-level unavailability rolls the caches back and returns the
    /// error for the caller's backoff loop. Any other submit failure
    /// restarts the whole list with a smaller limit until the limit drops
    /// to `min_batch_limit`; at that point the events are dumped to
    /// [`FAILED_EVENTS_TARGET`] and the call returns `Ok` so the upstream
    /// queue can move on.
    pub async fn write_events(&self, events: &[DataPointEvent]) -> Result<()> {
        let mut divisor = 1;
        let mut limit;

        'attempt: loop {
            limit = events.len() / divisor;
            let mut iter = events.iter();

            while iter.len() > 0 {
                let mut batch =
                    WriteBatch::new(self.session.clone(), self.options.consistency);

                if let Err(error) = self.load_batch(limit, &mut batch, &mut iter) {
                    self.roll_back_caches(batch.new_row_keys(), batch.new_metrics());
                    return Err(error);
                }

                let data_points = batch.data_point_count();
                if let Err(failed) = batch.submit().await {
                    self.roll_back_caches(&failed.new_row_keys, &failed.new_metrics);

                    let error = failed.error;
                    if error.is_transport() {
                        error!(%error, "backend unavailable, handing the events to the backoff layer");
                        return Err(error).context(SessionSnafu);
                    }

                    if matches!(error, SessionError::BatchTooLarge) {
                        warn!(limit, "batch size is too large");
                    } else {
                        error!(%error, "error sending data points");
                    }

                    if limit > self.options.min_batch_limit {
                        divisor += 1;
                        self.metrics.batch_retries.add(1, &[]);
                        info!(
                            limit = events.len() / divisor,
                            "retrying the event list with a smaller batch limit"
                        );
                        continue 'attempt;
                    }

                    error!(%error, events = events.len(), "failed to send data points");
                    self.dump_failed_events(events);
                    self.metrics.failed_events.add(events.len() as u64, &[]);
                    break 'attempt;
                }

                self.metrics.batches_submitted.add(1, &[]);
                self.metrics.data_points_written.add(data_points as u64, &[]);
            }

            break;
        }

        if limit < events.len() {
            self.publishers
                .publish_batch_reduction(BatchReductionEvent { limit });
        }

        Ok(())
    }

    /// Consumes at most `limit` events from the iterator into `batch`.
    /// No await points: the batch is assembled in one go, then submitted.
    fn load_batch(
        &self,
        limit: usize,
        batch: &mut WriteBatch,
        events: &mut std::slice::Iter<'_, DataPointEvent>,
    ) -> Result<()> {
        let mut count = 0;
        while count < limit {
            let Some(event) = events.next() else {
                break;
            };
            count += 1;
            self.load_event(batch, event)?;
        }

        Ok(())
    }

    fn load_event(&self, batch: &mut WriteBatch, event: &DataPointEvent) -> Result<()> {
        let metric = event.metric.as_str();
        if metric.is_empty() {
            warn!(
                data_point = ?event.data_point,
                "adding an empty metric name to the string index"
            );
        }

        let data_point = &event.data_point;

        let mut ttl = i64::from(if self.options.force_default_ttl {
            self.options.default_ttl_secs
        } else {
            event.ttl
        });
        trace!(ttl, "data point ttl (seconds)");

        if ttl == 0 {
            ttl = i64::from(self.options.default_ttl_secs);
        }

        if self.options.align_ttl_with_timestamp {
            let age_secs = (now_millis() - data_point.timestamp) / 1000;
            ttl -= age_secs;
            trace!(ttl, age_secs, "aligned data point ttl (seconds)");
            if ttl <= 0 {
                warn!(
                    metric,
                    tags = ?event.tags,
                    "aligned ttl is not positive, the data point is already expired"
                );
                self.metrics.expired_data_points.add(1, &[]);
                return Ok(());
            }
        }
        let ttl = ttl.min(i64::from(u32::MAX)) as u32;

        let row_time = self.row_spec.row_time(data_point.timestamp);
        let row_key = RowKey::new(
            metric,
            self.options.write_cluster.as_str(),
            row_time,
            data_point.data_type(),
            event.tags.clone(),
        );

        // Index writes only for row keys not seen recently. The cached key
        // and the one built here are value-equal, so either works below.
        if self.row_key_cache.cache_item(row_key.clone()).is_none() {
            // The row key outlives every column in its row by one row width.
            let row_key_ttl = if ttl == 0 {
                0
            } else {
                ttl.saturating_add(self.row_spec.row_width_secs())
            };

            batch.add_row_key(&row_key, row_key_ttl);
            self.publishers.publish_row_key(RowKeyEvent {
                metric: metric.to_string(),
                row_key: row_key.clone(),
                ttl: row_key_ttl,
            });

            let timed = TimedMetric::new(metric, row_time);
            if self.metric_name_cache.cache_item(timed.clone()).is_none() {
                batch.add_metric_name(&timed);
                batch.add_time_index(metric, row_time, row_key_ttl);
            }
        }

        let column = self
            .row_spec
            .column_name(row_time, data_point.timestamp)
            .context(ModelSnafu)?;
        batch.add_data_point(&row_key, column, data_point, ttl);

        Ok(())
    }

    fn roll_back_caches(&self, new_row_keys: &[RowKey], new_metrics: &[TimedMetric]) {
        for metric in new_metrics {
            self.metric_name_cache.remove(metric);
        }
        for row_key in new_row_keys {
            self.row_key_cache.remove(row_key);
        }
    }

    fn dump_failed_events(&self, events: &[DataPointEvent]) {
        if !tracing::enabled!(target: FAILED_EVENTS_TARGET, Level::TRACE) {
            return;
        }

        for event in events {
            match serde_json::to_string(&FailedEventRecord::from(event)) {
                Ok(record) => trace!(target: FAILED_EVENTS_TARGET, "{record}"),
                Err(error) => warn!(
                    %error,
                    metric = %event.metric,
                    "failed to serialize an undeliverable event"
                ),
            }
        }
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or_default()
}
