use std::collections::BTreeMap;

use bytes::Bytes;
use serde::Serialize;

/// Data-store type tag for 64-bit integer values.
pub const LONG_DATA_TYPE: &str = "strata_long";
/// Data-store type tag for 64-bit floating point values.
pub const DOUBLE_DATA_TYPE: &str = "strata_double";
/// Data-store type tag for text values.
pub const STRING_DATA_TYPE: &str = "strata_string";

/// A typed data point value together with its wire serialization.
///
/// The data-store type tag participates in row-key identity, so values of
/// differing types land in separate wide rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DataPointValue {
    Long(i64),
    Double(f64),
    Text(String),
}

impl DataPointValue {
    /// The data-store data type identifying this value's serialization.
    pub fn data_type(&self) -> &'static str {
        match self {
            Self::Long(_) => LONG_DATA_TYPE,
            Self::Double(_) => DOUBLE_DATA_TYPE,
            Self::Text(_) => STRING_DATA_TYPE,
        }
    }

    /// Wire form of the value: big-endian for numbers, UTF-8 for text.
    pub fn to_bytes(&self) -> Bytes {
        match self {
            Self::Long(value) => Bytes::copy_from_slice(&value.to_be_bytes()),
            Self::Double(value) => Bytes::copy_from_slice(&value.to_be_bytes()),
            Self::Text(value) => Bytes::copy_from_slice(value.as_bytes()),
        }
    }
}

/// A single measurement: a millisecond timestamp and a typed value.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPoint {
    pub timestamp: i64,
    pub value: DataPointValue,
}

impl DataPoint {
    pub fn new(timestamp: i64, value: DataPointValue) -> Self {
        Self { timestamp, value }
    }

    pub fn data_type(&self) -> &'static str {
        self.value.data_type()
    }
}

/// A write request for one data point.
///
/// Tags are kept lexicographically sorted. A ttl of zero means "use the
/// configured default". Events are consumed in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPointEvent {
    pub metric: String,
    pub tags: BTreeMap<String, String>,
    pub data_point: DataPoint,
    pub ttl: u32,
}

impl DataPointEvent {
    pub fn new(metric: impl Into<String>, data_point: DataPoint) -> Self {
        Self {
            metric: metric.into(),
            tags: BTreeMap::new(),
            data_point,
            ttl: 0,
        }
    }

    pub fn with_tag(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(name.into(), value.into());
        self
    }

    pub fn with_tags(mut self, tags: BTreeMap<String, String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }
}
