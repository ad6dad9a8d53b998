use std::collections::BTreeMap;

use bytes::{BufMut, Bytes, BytesMut};

/// Identity of one wide row: metric, target cluster, row bucket, value type
/// tag, and the sorted tag map. Immutable after construction.
///
/// The cluster selects where the row is written and is not part of the wire
/// form; two keys are wire-equal iff their serialized forms are
/// byte-identical.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowKey {
    metric: String,
    cluster: String,
    row_time: i64,
    data_type: String,
    tags: BTreeMap<String, String>,
}

impl RowKey {
    pub fn new(
        metric: impl Into<String>,
        cluster: impl Into<String>,
        row_time: i64,
        data_type: impl Into<String>,
        tags: BTreeMap<String, String>,
    ) -> Self {
        Self {
            metric: metric.into(),
            cluster: cluster.into(),
            row_time,
            data_type: data_type.into(),
            tags,
        }
    }

    pub fn metric(&self) -> &str {
        &self.metric
    }

    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    pub fn row_time(&self) -> i64 {
        self.row_time
    }

    pub fn data_type(&self) -> &str {
        &self.data_type
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    /// Wire form:
    /// `[metric][0x00][data_type][0x00][row_time i64 BE][key 0x00 value 0x00 ...][0x00]`
    /// with tag entries in lexicographic order.
    pub fn to_bytes(&self) -> Bytes {
        let tag_len: usize = self
            .tags
            .iter()
            .map(|(key, value)| key.len() + value.len() + 2)
            .sum();
        let mut buf =
            BytesMut::with_capacity(self.metric.len() + self.data_type.len() + tag_len + 11);

        buf.put_slice(self.metric.as_bytes());
        buf.put_u8(0);
        buf.put_slice(self.data_type.as_bytes());
        buf.put_u8(0);
        buf.put_i64(self.row_time);
        for (key, value) in &self.tags {
            buf.put_slice(key.as_bytes());
            buf.put_u8(0);
            buf.put_slice(value.as_bytes());
            buf.put_u8(0);
        }
        buf.put_u8(0);

        buf.freeze()
    }
}

/// Metric-name-index cache key: a metric name is re-indexed once per row
/// bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TimedMetric {
    pub name: String,
    pub row_time: i64,
}

impl TimedMetric {
    pub fn new(name: impl Into<String>, row_time: i64) -> Self {
        Self {
            name: name.into(),
            row_time,
        }
    }
}
