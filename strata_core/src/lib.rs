pub mod datapoint;
pub mod rowkey;
pub mod rowspec;

pub use datapoint::{DataPoint, DataPointEvent, DataPointValue};
pub use rowkey::{RowKey, TimedMetric};
pub use rowspec::{ModelError, RowSpec, DEFAULT_ROW_WIDTH_MS};
