use strata_observability::Counter;

pub struct IngestionMetrics {
    pub data_points_written: Counter<u64>,
    pub batches_submitted: Counter<u64>,
    pub batch_retries: Counter<u64>,
    pub expired_data_points: Counter<u64>,
    pub failed_events: Counter<u64>,
}

impl Default for IngestionMetrics {
    fn default() -> Self {
        let meter = strata_observability::meter("ingestion");
        Self {
            data_points_written: meter
                .u64_counter("ingest.data_points")
                .with_unit("{point}")
                .with_description("data point columns written to the backend")
                .build(),
            batches_submitted: meter
                .u64_counter("ingest.batches")
                .with_unit("{batch}")
                .with_description("mutation batches submitted to the backend")
                .build(),
            batch_retries: meter
                .u64_counter("ingest.batch_retries")
                .with_unit("{retry}")
                .with_description("event lists retried with a reduced batch limit")
                .build(),
            expired_data_points: meter
                .u64_counter("ingest.expired_data_points")
                .with_unit("{point}")
                .with_description("data points dropped because the aligned ttl had expired")
                .build(),
            failed_events: meter
                .u64_counter("ingest.failed_events")
                .with_unit("{event}")
                .with_description("events dumped to the failed-events log")
                .build(),
        }
    }
}
