//! Human-readable duration rendering
//!
//! Uses the notation of Go's `Duration.String()`:
//! `0s`, `87ns`, `842.5µs`, `15.234ms`, `1.2s`, `1m2.5s`, `2h0m0s`.

use std::fmt::Write as _;
use std::time::Duration;

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Render `duration` in Go notation
pub fn format_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();

    if nanos == 0 {
        return "0s".to_string();
    }

    if nanos < NANOS_PER_SEC {
        return if nanos < NANOS_PER_MICRO {
            format!("{}ns", nanos)
        } else if nanos < NANOS_PER_MILLI {
            format!("{}µs", fixed_point(nanos, NANOS_PER_MICRO, 3))
        } else {
            format!("{}ms", fixed_point(nanos, NANOS_PER_MILLI, 6))
        };
    }

    let total_secs = nanos / NANOS_PER_SEC;
    let hours = total_secs / 3600;
    let minutes = (total_secs / 60) % 60;
    let seconds = fixed_point(nanos % (60 * NANOS_PER_SEC), NANOS_PER_SEC, 9);

    let mut out = String::new();
    if hours > 0 {
        let _ = write!(out, "{}h{}m", hours, minutes);
    } else if minutes > 0 {
        let _ = write!(out, "{}m", minutes);
    }
    let _ = write!(out, "{}s", seconds);
    out
}

/// `value / unit` with up to `digits` fractional digits, trailing zeros dropped
fn fixed_point(value: u128, unit: u128, digits: usize) -> String {
    let whole = value / unit;
    let fraction = value % unit;
    if fraction == 0 {
        return whole.to_string();
    }
    let fraction = format!("{:0width$}", fraction, width = digits);
    format!("{}.{}", whole, fraction.trim_end_matches('0'))
}
