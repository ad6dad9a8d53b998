//! In-memory implementation of the backend session.
//!
//! It's primarily intended for testing and development purposes: batches
//! apply atomically against nested ordered maps, failures can be scripted,
//! and an optional statement limit rejects oversized batches the way a
//! real cluster would.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;

use crate::session::{CassandraSession, Result, SessionError};
use crate::statement::{Mutation, MutationBatch};

#[derive(Debug, Clone, PartialEq)]
struct StoredCell {
    value: Bytes,
    ttl: u32,
}

#[derive(Debug, Default)]
struct MemoryState {
    data_points: BTreeMap<Vec<u8>, BTreeMap<u32, StoredCell>>,
    row_key_index: BTreeMap<String, BTreeMap<Vec<u8>, u32>>,
    metric_names: BTreeSet<String>,
    time_index: BTreeMap<String, BTreeMap<i64, u32>>,
    failures: VecDeque<SessionError>,
    batches_executed: u64,
}

#[derive(Debug, Default)]
pub struct MemorySession {
    max_batch_size: Option<usize>,
    state: Mutex<MemoryState>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects batches with more than `max_batch_size` mutations with
    /// [`SessionError::BatchTooLarge`].
    pub fn with_max_batch_size(max_batch_size: usize) -> Self {
        Self {
            max_batch_size: Some(max_batch_size),
            state: Mutex::default(),
        }
    }

    /// Scripts the next `execute_batch` call to fail with `error` before
    /// applying anything. Queued failures are consumed in order.
    pub fn fail_next(&self, error: SessionError) {
        self.lock().failures.push_back(error);
    }

    pub fn batches_executed(&self) -> u64 {
        self.lock().batches_executed
    }

    /// Stored `(column, value, ttl)` cells for a serialized row key, in
    /// column order.
    pub fn data_point_columns(&self, row_key: &[u8]) -> Vec<(u32, Bytes, u32)> {
        self.lock()
            .data_points
            .get(row_key)
            .map(|columns| {
                columns
                    .iter()
                    .map(|(column, cell)| (*column, cell.value.clone(), cell.ttl))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn total_data_points(&self) -> usize {
        self.lock()
            .data_points
            .values()
            .map(|columns| columns.len())
            .sum()
    }

    /// Stored `(row_key, ttl)` index entries for a metric.
    pub fn row_key_entries(&self, metric: &str) -> Vec<(Vec<u8>, u32)> {
        self.lock()
            .row_key_index
            .get(metric)
            .map(|entries| {
                entries
                    .iter()
                    .map(|(row_key, ttl)| (row_key.clone(), *ttl))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn metric_names(&self) -> Vec<String> {
        self.lock().metric_names.iter().cloned().collect()
    }

    /// Stored `(row_time, ttl)` time-index entries for a metric.
    pub fn time_index_entries(&self, metric: &str) -> Vec<(i64, u32)> {
        self.lock()
            .time_index
            .get(metric)
            .map(|entries| entries.iter().map(|(time, ttl)| (*time, *ttl)).collect())
            .unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl CassandraSession for MemorySession {
    async fn execute_batch(&self, batch: MutationBatch) -> Result<()> {
        let mut state = self.lock();
        state.batches_executed += 1;

        if let Some(error) = state.failures.pop_front() {
            return Err(error);
        }

        if let Some(max) = self.max_batch_size {
            if batch.len() > max {
                return Err(SessionError::BatchTooLarge);
            }
        }

        for mutation in batch.mutations {
            match mutation {
                Mutation::DataPoint {
                    row_key,
                    column,
                    value,
                    ttl,
                } => {
                    state
                        .data_points
                        .entry(row_key.to_vec())
                        .or_default()
                        .insert(column, StoredCell { value, ttl });
                }
                Mutation::RowKeyIndex {
                    metric,
                    row_key,
                    ttl,
                } => {
                    state
                        .row_key_index
                        .entry(metric)
                        .or_default()
                        .insert(row_key.to_vec(), ttl);
                }
                Mutation::MetricName { metric } => {
                    state.metric_names.insert(metric);
                }
                Mutation::TimeIndex {
                    metric,
                    row_time,
                    ttl,
                } => {
                    state
                        .time_index
                        .entry(metric)
                        .or_default()
                        .insert(row_time, ttl);
                }
            }
        }

        Ok(())
    }
}
