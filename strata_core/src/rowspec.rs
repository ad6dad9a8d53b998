use snafu::Snafu;

/// Three weeks in milliseconds, the default width of one wide row.
pub const DEFAULT_ROW_WIDTH_MS: i64 = 1_814_400_000;

/// Widest row whose largest in-row column name still fits the wire encoding.
const MAX_ROW_WIDTH_MS: i64 = 1 << 31;

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum ModelError {
    #[snafu(display(
        "row width must be positive and at most {MAX_ROW_WIDTH_MS} ms, got {width}"
    ))]
    InvalidRowWidth { width: i64 },
    #[snafu(display("timestamp {timestamp} is outside the row starting at {row_time}"))]
    TimestampOutsideRow { timestamp: i64, row_time: i64 },
}

/// Maps timestamps to row buckets and in-row column names.
///
/// Column names preserve time order: within one row the encoded name is
/// strictly increasing in the timestamp. The low bit is the value-format
/// flag, zero for the current format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSpec {
    row_width: i64,
}

impl RowSpec {
    pub fn new(row_width_ms: i64) -> Result<Self, ModelError> {
        if row_width_ms <= 0 || row_width_ms > MAX_ROW_WIDTH_MS {
            return InvalidRowWidthSnafu {
                width: row_width_ms,
            }
            .fail();
        }

        Ok(Self {
            row_width: row_width_ms,
        })
    }

    /// Lower bound of the row bucket containing `timestamp`.
    ///
    /// True floor division, so pre-epoch timestamps land in the bucket
    /// below zero.
    pub fn row_time(&self, timestamp: i64) -> i64 {
        timestamp.div_euclid(self.row_width) * self.row_width
    }

    /// In-row column name for `timestamp` within the row starting at
    /// `row_time`.
    ///
    /// Timestamps outside `[row_time, row_time + row_width)` are a
    /// programming error.
    pub fn column_name(&self, row_time: i64, timestamp: i64) -> Result<u32, ModelError> {
        let offset = timestamp - row_time;
        if offset < 0 || offset >= self.row_width {
            return TimestampOutsideRowSnafu {
                timestamp,
                row_time,
            }
            .fail();
        }

        Ok((offset as u32) << 1)
    }

    pub fn row_width_ms(&self) -> i64 {
        self.row_width
    }

    pub fn row_width_secs(&self) -> u32 {
        (self.row_width / 1000) as u32
    }
}

impl Default for RowSpec {
    fn default() -> Self {
        Self {
            row_width: DEFAULT_ROW_WIDTH_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_time_floors_to_bucket() {
        let spec = RowSpec::new(1000).unwrap();
        assert_eq!(spec.row_time(0), 0);
        assert_eq!(spec.row_time(999), 0);
        assert_eq!(spec.row_time(1000), 1000);
        assert_eq!(spec.row_time(1500), 1000);
    }

    #[test]
    fn row_time_floors_below_zero_for_pre_epoch_timestamps() {
        let spec = RowSpec::new(1000).unwrap();
        assert_eq!(spec.row_time(-1), -1000);
        assert_eq!(spec.row_time(-1000), -1000);
        assert_eq!(spec.row_time(-1001), -2000);
    }

    #[test]
    fn column_name_spans_the_row() {
        let spec = RowSpec::default();
        let row_time = spec.row_time(1_600_000_000_000);

        assert_eq!(spec.column_name(row_time, row_time).unwrap(), 0);

        let last = row_time + spec.row_width_ms() - 1;
        assert_eq!(
            spec.column_name(row_time, last).unwrap(),
            ((spec.row_width_ms() - 1) as u32) << 1
        );
    }

    #[test]
    fn column_name_is_strictly_monotonic() {
        let spec = RowSpec::default();
        let row_time = spec.row_time(1_600_000_000_000);

        let mut previous = None;
        for offset in [0, 1, 999, 1000, 86_400_000, spec.row_width_ms() - 1] {
            let column = spec.column_name(row_time, row_time + offset).unwrap();
            if let Some(previous) = previous {
                assert!(column > previous);
            }
            previous = Some(column);
        }
    }

    #[test]
    fn column_name_rejects_timestamps_outside_the_row() {
        let spec = RowSpec::default();
        let row_time = spec.row_time(1_600_000_000_000);

        assert!(matches!(
            spec.column_name(row_time, row_time - 1),
            Err(ModelError::TimestampOutsideRow { .. })
        ));
        assert!(matches!(
            spec.column_name(row_time, row_time + spec.row_width_ms()),
            Err(ModelError::TimestampOutsideRow { .. })
        ));
    }

    #[test]
    fn rejects_unusable_widths() {
        assert!(RowSpec::new(0).is_err());
        assert!(RowSpec::new(-1).is_err());
        assert!(RowSpec::new(i64::MAX).is_err());
        assert!(RowSpec::new(DEFAULT_ROW_WIDTH_MS).is_ok());
    }
}
