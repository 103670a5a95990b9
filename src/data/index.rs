//! Time-range lookup over rows

use tracing::debug;

use super::RowRecord;

/// Find the row active at `time` (seconds).
///
/// Rows without `start` never match. A row with neither `duration` nor
/// `end` has no upper bound. Otherwise the row covers
/// `[start, end ?? start + duration)`. The lowest matching index wins.
#[must_use]
pub fn index_at_time(rows: &[RowRecord], time: f64) -> Option<usize> {
    let found = rows.iter().position(|row| {
        let Some(start) = row.start else {
            return false;
        };
        if start > time {
            return false;
        }
        match (row.end, row.duration) {
            (None, None) => true,
            (Some(end), _) => time < end,
            (None, Some(duration)) => time < start + duration,
        }
    });

    debug!(time, index = ?found, "row lookup");
    found
}
