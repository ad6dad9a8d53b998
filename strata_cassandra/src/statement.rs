use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Consistency level a batch is executed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyLevel {
    One,
    Two,
    Three,
    Quorum,
    All,
    LocalQuorum,
    EachQuorum,
    LocalOne,
}

impl Default for ConsistencyLevel {
    fn default() -> Self {
        Self::Quorum
    }
}

/// One bound statement. A ttl of zero means no expiry.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Data point column insert: `(row_key, column) -> value USING TTL ttl`.
    DataPoint {
        row_key: Bytes,
        column: u32,
        value: Bytes,
        ttl: u32,
    },
    /// Row key index insert: `(metric, row_key) -> () USING TTL ttl`.
    RowKeyIndex {
        metric: String,
        row_key: Bytes,
        ttl: u32,
    },
    /// Metric name index insert.
    MetricName { metric: String },
    /// Time index insert: `(metric, row_time) USING TTL ttl`.
    TimeIndex {
        metric: String,
        row_time: i64,
        ttl: u32,
    },
}

/// An ordered list of mutations the backend applies atomically.
#[derive(Debug, Clone)]
pub struct MutationBatch {
    pub consistency: ConsistencyLevel,
    pub mutations: Vec<Mutation>,
}

impl MutationBatch {
    pub fn new(consistency: ConsistencyLevel) -> Self {
        Self {
            consistency,
            mutations: Vec::new(),
        }
    }

    pub fn push(&mut self, mutation: Mutation) {
        self.mutations.push(mutation);
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }
}
