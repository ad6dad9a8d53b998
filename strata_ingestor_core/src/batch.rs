use std::sync::Arc;

use strata_cassandra::{
    CassandraSession, ConsistencyLevel, Mutation, MutationBatch, SessionError,
};
use strata_core::{DataPoint, RowKey, TimedMetric};

/// Accumulates the four mutation kinds for one backend batch and records
/// which index entries it newly introduced, so a failed submit can undo
/// the corresponding cache insertions.
pub struct WriteBatch {
    session: Arc<dyn CassandraSession>,
    batch: MutationBatch,
    new_row_keys: Vec<RowKey>,
    new_metrics: Vec<TimedMetric>,
    data_points: usize,
}

/// Error payload of a failed submit: the session error plus the index
/// entries this batch introduced, for cache rollback.
#[must_use]
#[derive(Debug)]
pub struct FailedBatch {
    pub error: SessionError,
    pub new_row_keys: Vec<RowKey>,
    pub new_metrics: Vec<TimedMetric>,
}

impl WriteBatch {
    pub fn new(session: Arc<dyn CassandraSession>, consistency: ConsistencyLevel) -> Self {
        Self {
            session,
            batch: MutationBatch::new(consistency),
            new_row_keys: Vec::new(),
            new_metrics: Vec::new(),
            data_points: 0,
        }
    }

    pub fn add_row_key(&mut self, row_key: &RowKey, ttl: u32) {
        self.batch.push(Mutation::RowKeyIndex {
            metric: row_key.metric().to_string(),
            row_key: row_key.to_bytes(),
            ttl,
        });
        self.new_row_keys.push(row_key.clone());
    }

    pub fn add_metric_name(&mut self, metric: &TimedMetric) {
        self.batch.push(Mutation::MetricName {
            metric: metric.name.clone(),
        });
        self.new_metrics.push(metric.clone());
    }

    pub fn add_time_index(&mut self, metric: &str, row_time: i64, ttl: u32) {
        self.batch.push(Mutation::TimeIndex {
            metric: metric.to_string(),
            row_time,
            ttl,
        });
    }

    pub fn add_data_point(&mut self, row_key: &RowKey, column: u32, data_point: &DataPoint, ttl: u32) {
        self.batch.push(Mutation::DataPoint {
            row_key: row_key.to_bytes(),
            column,
            value: data_point.value.to_bytes(),
            ttl,
        });
        self.data_points += 1;
    }

    /// Index entries first introduced by this batch.
    pub fn new_row_keys(&self) -> &[RowKey] {
        &self.new_row_keys
    }

    pub fn new_metrics(&self) -> &[TimedMetric] {
        &self.new_metrics
    }

    pub fn mutation_count(&self) -> usize {
        self.batch.len()
    }

    pub fn data_point_count(&self) -> usize {
        self.data_points
    }

    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }

    /// Executes the batch atomically at the configured consistency,
    /// consuming the builder.
    pub async fn submit(self) -> Result<(), FailedBatch> {
        match self.session.execute_batch(self.batch).await {
            Ok(()) => Ok(()),
            Err(error) => Err(FailedBatch {
                error,
                new_row_keys: self.new_row_keys,
                new_metrics: self.new_metrics,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use strata_cassandra::MemorySession;
    use strata_core::DataPointValue;

    use super::*;

    fn row_key() -> RowKey {
        RowKey::new("cpu", "test", 0, "strata_long", BTreeMap::new())
    }

    #[tokio::test]
    async fn submit_applies_all_mutation_kinds() {
        let session = Arc::new(MemorySession::new());
        let key = row_key();

        let mut batch = WriteBatch::new(session.clone(), ConsistencyLevel::default());
        batch.add_row_key(&key, 120);
        batch.add_metric_name(&TimedMetric::new("cpu", 0));
        batch.add_time_index("cpu", 0, 120);
        batch.add_data_point(&key, 2, &DataPoint::new(1, DataPointValue::Long(42)), 60);

        assert_eq!(batch.mutation_count(), 4);
        assert_eq!(batch.data_point_count(), 1);
        batch.submit().await.unwrap();

        assert_eq!(session.row_key_entries("cpu").len(), 1);
        assert_eq!(session.metric_names(), vec!["cpu".to_string()]);
        assert_eq!(session.time_index_entries("cpu"), vec![(0, 120)]);
        let columns = session.data_point_columns(key.to_bytes().as_ref());
        assert_eq!(columns, vec![(2, DataPointValue::Long(42).to_bytes(), 60)]);
    }

    #[tokio::test]
    async fn failed_submit_hands_back_new_index_entries() {
        let session = Arc::new(MemorySession::new());
        session.fail_next(SessionError::BatchTooLarge);
        let key = row_key();

        let mut batch = WriteBatch::new(session.clone(), ConsistencyLevel::default());
        batch.add_row_key(&key, 0);
        batch.add_metric_name(&TimedMetric::new("cpu", 0));

        let failed = batch.submit().await.unwrap_err();
        assert!(matches!(failed.error, SessionError::BatchTooLarge));
        assert_eq!(failed.new_row_keys, vec![key]);
        assert_eq!(failed.new_metrics, vec![TimedMetric::new("cpu", 0)]);
        assert_eq!(session.row_key_entries("cpu").len(), 0);
    }
}
