//! Number and time formatting used by the meter display and text exports.

/// Format a large number with K/M suffix for compact display.
///
/// - Values >= 1,000,000 are formatted as `X.XXM`
/// - Values >= 1,000 are formatted as `X.XXK`
/// - Values below 1,000 are formatted as-is
///
/// Negative values keep their sign and use the same thresholds on the magnitude.
///
/// # Examples
/// ```
/// use tally_types::formatting::format_compact;
/// assert_eq!(format_compact(500), "500");
/// assert_eq!(format_compact(1_500), "1.50K");
/// assert_eq!(format_compact(2_300_000), "2.30M");
/// assert_eq!(format_compact(-1_500), "-1.50K");
/// ```
pub fn format_compact(n: i64) -> String {
    let magnitude = n.unsigned_abs();
    if magnitude >= 1_000_000 {
        format!("{:.2}M", n as f64 / 1_000_000.0)
    } else if magnitude >= 1_000 {
        format!("{:.2}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

/// Format a fraction in `[0, 1]` as a percentage with one decimal place.
///
/// # Examples
/// ```
/// use tally_types::formatting::format_fraction_pct;
/// assert_eq!(format_fraction_pct(0.427), "42.7%");
/// assert_eq!(format_fraction_pct(1.0), "100.0%");
/// ```
pub fn format_fraction_pct(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

/// Format an encounter timer as `MM:SS`.
///
/// Minutes wrap at one hour the same way a stopwatch display does.
///
/// # Examples
/// ```
/// use tally_types::formatting::format_timer;
/// assert_eq!(format_timer(0), "00:00");
/// assert_eq!(format_timer(125), "02:05");
/// assert_eq!(format_timer(3_725), "02:05");
/// ```
pub fn format_timer(secs: i64) -> String {
    let secs = secs.max(0);
    format!("{:02}:{:02}", (secs / 60) % 60, secs % 60)
}
