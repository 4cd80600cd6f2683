//! Time labels for progress display

use std::time::Duration;

/// Format a number of seconds as `M:SS`
///
/// Minutes are not padded and are not rolled over into hours, seconds are
/// always two digits. Fractions are truncated; negative and non-finite input
/// renders as `0:00`.
///
/// ```
/// use segue_core::format_time;
///
/// assert_eq!(format_time(5.0), "0:05");
/// assert_eq!(format_time(65.0), "1:05");
/// assert_eq!(format_time(3600.0), "60:00");
/// ```
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };

    format!("{}:{:02}", total / 60, total % 60)
}

/// Format a `Duration` as `M:SS`
pub fn format_duration(duration: Duration) -> String {
    format_time(duration.as_secs_f64())
}
