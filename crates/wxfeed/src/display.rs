//! Text formatting for panel labels.

use chrono::{Local, TimeZone};

/// Placeholder shown for a value that cannot be formatted.
pub const MISSING_VALUE: &str = "---";

/// Clock placeholder shown while a channel is disconnected.
pub const MISSING_CLOCK: &str = "--:--:--";

/// Format a reading for display.
///
/// The value is rounded to a multiple of `1 / factor`, then to `precision`
/// significant digits, and finally printed without decimals.
pub fn display_value(value: f64, factor: f64, precision: u32) -> String {
    match round_value(value, factor, precision) {
        // Avoid printing "-0"
        Some(whole) if whole == 0.0 => "0".to_string(),
        Some(whole) => format!("{:.0}", whole),
        None => MISSING_VALUE.to_string(),
    }
}

/// The number [`display_value`] prints, or `None` when it prints a placeholder.
pub fn round_value(value: f64, factor: f64, precision: u32) -> Option<f64> {
    if !value.is_finite() || !factor.is_finite() || factor <= 0.0 {
        return None;
    }

    let stepped = (value * factor).round() / factor;
    Some(round_significant(stepped, precision.max(1)).round())
}

fn round_significant(value: f64, digits: u32) -> f64 {
    if value == 0.0 {
        return 0.0;
    }
    let magnitude = value.abs().log10().floor() as i32;
    let scale = 10f64.powi(digits as i32 - 1 - magnitude);
    (value * scale).round() / scale
}

/// Describe a span given in seconds. Spans over an hour are shown in hours.
pub fn window_label_for(span_secs: f64) -> String {
    let mut amount = (span_secs.max(0.0) / 60.0).round();
    let mut unit = if amount > 1.0 { "minutes" } else { "minute" };

    if amount > 60.0 {
        amount = (amount / 60.0).round();
        unit = if amount > 1.0 { "hours" } else { "hour" };
    }

    format!("(the last {} {})", amount as u64, unit)
}

/// Local wall-clock time of a timestamp, 12-hour, without the AM/PM suffix.
pub fn clock_label(ts: f64) -> String {
    if !ts.is_finite() {
        return MISSING_CLOCK.to_string();
    }
    let secs = ts.floor() as i64;
    let nanos = ((ts - ts.floor()) * 1e9) as u32;
    match Local.timestamp_opt(secs, nanos).single() {
        Some(time) => time.format("%-I:%M:%S").to_string(),
        None => MISSING_CLOCK.to_string(),
    }
}
