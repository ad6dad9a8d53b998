use serde::{Deserialize, Serialize};
use snafu::ensure;
use strata_cassandra::ConsistencyLevel;
use strata_core::DEFAULT_ROW_WIDTH_MS;

use crate::error::{OptionsSnafu, Result};

/// Ingestion configuration.
///
/// Row-width bounds are enforced by the row spec at construction; the
/// checks here cover everything else.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestOptions {
    /// Data point ttl in seconds applied when the event carries none.
    /// Zero stores without expiry.
    pub default_ttl_secs: u32,
    /// Subtract the data point's age from its ttl so expiration happens at
    /// a timestamp independent of when the write was performed. Points
    /// whose aligned ttl is not positive are dropped.
    pub align_ttl_with_timestamp: bool,
    /// Ignore per-event ttls and always apply the default.
    pub force_default_ttl: bool,
    /// Cluster name written into row keys.
    pub write_cluster: String,
    pub row_width_ms: i64,
    pub row_key_cache_capacity: usize,
    pub metric_name_cache_capacity: usize,
    /// Below this batch limit a failing submit is terminal instead of
    /// retried with a smaller limit.
    pub min_batch_limit: usize,
    pub max_concurrent_batches: usize,
    pub request_queue_depth: usize,
    pub event_channel_capacity: usize,
    pub consistency: ConsistencyLevel,
}

impl IngestOptions {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.row_key_cache_capacity > 0,
            OptionsSnafu {
                message: "row_key_cache_capacity must be positive"
            }
        );
        ensure!(
            self.metric_name_cache_capacity > 0,
            OptionsSnafu {
                message: "metric_name_cache_capacity must be positive"
            }
        );
        ensure!(
            self.min_batch_limit > 0,
            OptionsSnafu {
                message: "min_batch_limit must be positive"
            }
        );
        ensure!(
            self.max_concurrent_batches > 0,
            OptionsSnafu {
                message: "max_concurrent_batches must be positive"
            }
        );
        ensure!(
            self.request_queue_depth > 0,
            OptionsSnafu {
                message: "request_queue_depth must be positive"
            }
        );
        ensure!(
            self.event_channel_capacity > 0,
            OptionsSnafu {
                message: "event_channel_capacity must be positive"
            }
        );
        Ok(())
    }
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            default_ttl_secs: 0,
            align_ttl_with_timestamp: false,
            force_default_ttl: false,
            write_cluster: "default".to_string(),
            row_width_ms: DEFAULT_ROW_WIDTH_MS,
            row_key_cache_capacity: 1024,
            metric_name_cache_capacity: 1024,
            min_batch_limit: 10,
            max_concurrent_batches: 4,
            request_queue_depth: 100,
            event_channel_capacity: 128,
            consistency: ConsistencyLevel::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        IngestOptions::default().validate().unwrap();
    }

    #[test]
    fn zero_capacities_are_rejected() {
        let options = IngestOptions {
            row_key_cache_capacity: 0,
            ..Default::default()
        };
        assert!(options.validate().is_err());

        let options = IngestOptions {
            min_batch_limit: 0,
            ..Default::default()
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn deserializes_with_defaults() {
        let options: IngestOptions =
            serde_json::from_str(r#"{"default_ttl_secs": 60, "consistency": "local_quorum"}"#)
                .unwrap();
        assert_eq!(options.default_ttl_secs, 60);
        assert_eq!(options.consistency, ConsistencyLevel::LocalQuorum);
        assert_eq!(options.row_width_ms, DEFAULT_ROW_WIDTH_MS);
    }
}
