//! Timestamp helpers shared by records and the device-log excerpt
//! interface.

use chrono::{DateTime, Utc};

/// Current wall-clock time in epoch milliseconds.
pub fn epoch_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Render an epoch-millisecond timestamp in the sortable text format
/// used to bound device-log excerpts: `YYYY-MM-DD HH:MM:SS.mmm`.
pub fn log_line_timestamp(epoch_ms: i64) -> String {
    let ts = DateTime::<Utc>::from_timestamp_millis(epoch_ms).unwrap_or_default();
    ts.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_ms_is_monotonic_enough() {
        let a = epoch_ms();
        let b = epoch_ms();
        assert!(b >= a);
        assert!(a > 1_500_000_000_000); // after mid-2017
    }

    #[test]
    fn log_line_timestamp_formats_known_instant() {
        // 2021-03-02 09:04:05.678 UTC
        assert_eq!(
            log_line_timestamp(1_614_675_845_678),
            "2021-03-02 09:04:05.678"
        );
    }

    #[test]
    fn log_line_timestamps_sort_with_time() {
        let earlier = log_line_timestamp(1_614_675_845_000);
        let later = log_line_timestamp(1_614_675_846_000);
        assert!(earlier < later);
    }
}
