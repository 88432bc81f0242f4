//! SRT timestamp conversion
//!
//! Timeline timestamps use the SubRip form `HH:MM:SS,mmm`. Internally all
//! timeline positions are fractional seconds (`f64`).

/// Convert an SRT timestamp (`HH:MM:SS,mmm`) to fractional seconds.
///
/// Returns `None` unless the input has exactly four numeric fields separated
/// by `:`, `:` and `,`.
///
/// # Examples
///
/// ```
/// use srtmix_common::time::parse_srt_timestamp;
///
/// assert_eq!(parse_srt_timestamp("00:00:02,500"), Some(2.5));
/// assert_eq!(parse_srt_timestamp("01:02:03,004"), Some(3723.004));
/// assert_eq!(parse_srt_timestamp("00:00:02.500"), None);
/// ```
pub fn parse_srt_timestamp(text: &str) -> Option<f64> {
    let (clock, millis) = text.trim().split_once(',')?;
    let mut fields = clock.split(':');

    let hours: u64 = fields.next()?.parse().ok()?;
    let minutes: u64 = fields.next()?.parse().ok()?;
    let seconds: u64 = fields.next()?.parse().ok()?;
    if fields.next().is_some() {
        return None;
    }
    let millis: u64 = millis.parse().ok()?;

    Some(hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds as f64 + millis as f64 / 1000.0)
}

/// Format fractional seconds as an SRT timestamp (`HH:MM:SS,mmm`).
///
/// Values are rounded to the nearest millisecond; negative values clamp to zero.
///
/// # Examples
///
/// ```
/// use srtmix_common::time::format_srt_timestamp;
///
/// assert_eq!(format_srt_timestamp(2.5), "00:00:02,500");
/// assert_eq!(format_srt_timestamp(3723.004), "01:02:03,004");
/// ```
pub fn format_srt_timestamp(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

/// Format a duration in seconds for log and report summaries (`M:SS.mmm`).
pub fn format_duration(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    format!("{}:{:02}.{:03}", total_ms / 60_000, (total_ms % 60_000) / 1000, total_ms % 1000)
}
