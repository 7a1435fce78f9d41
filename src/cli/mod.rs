//! Command-line interface

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Relay Latency Bench - rank VPN relays by ICMP round-trip time
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "rlb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// List all available countries and exit
    #[arg(short = 'l', long = "list-countries", visible_alias = "lc")]
    pub list_countries: bool,

    /// Only probe relays in these countries (comma-separated codes, e.g. "se,de")
    #[arg(short = 'c', long = "countries", value_name = "CODES")]
    pub countries: Option<String>,

    /// Timeout for each ping, e.g. 500ms, 1s, 1m30s; a bare number is seconds [default: 1s]
    #[arg(short = 't', long, value_name = "DURATION", value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    /// Output CSV file [default: bench_result.csv]
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Relay directory endpoint
    #[arg(long, value_name = "URL", hide_short_help = true)]
    pub api_url: Option<String>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Parse the process arguments, accepting the historical `-lc` spelling
    pub fn parse_args() -> Self {
        Self::parse_from(normalize_legacy_args(std::env::args()))
    }

    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        !self.no_color && supports_color()
    }
}

/// Rewrite single-dash long flags clap cannot parse
///
/// `-lc` would otherwise be read as `-l -c` with `-c` missing its value.
pub fn normalize_legacy_args<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    args.into_iter()
        .filter_map(|arg| match arg.as_str() {
            "-lc" | "-lc=true" => Some("--list-countries".to_string()),
            "-lc=false" => None,
            _ => Some(arg),
        })
        .collect()
}

/// Parse a duration such as `1s`, `250ms`, `1.5s` or `1m30s`
///
/// Units are `ns`, `us`/`µs`, `ms`, `s`, `m` and `h`. A bare integer is
/// taken as seconds. Zero is rejected.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Invalid duration: empty value".to_string());
    }
    if s.starts_with('+') || s.starts_with('-') {
        return Err(format!("Invalid duration: {}", s));
    }

    let duration = if s.bytes().all(|b| b.is_ascii_digit()) {
        let secs = s.parse::<u64>().map_err(|_| format!("Invalid duration: {}", s))?;
        Duration::from_secs(secs)
    } else {
        parse_unit_duration(s)?
    };

    if duration.is_zero() {
        return Err("Duration must be greater than 0".to_string());
    }
    Ok(duration)
}

fn parse_unit_duration(s: &str) -> Result<Duration, String> {
    let invalid = || format!("Invalid duration: {}", s);
    let mut total_nanos: u128 = 0;
    let mut rest = s;

    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(invalid)?;
        let (number, tail) = rest.split_at(number_len);
        if number.is_empty() || number == "." || number.matches('.').count() > 1 {
            return Err(invalid());
        }

        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);
        let unit_nanos: u128 = match unit {
            "ns" => 1,
            "us" | "µs" | "μs" => 1_000,
            "ms" => 1_000_000,
            "s" => 1_000_000_000,
            "m" => 60 * 1_000_000_000,
            "h" => 3_600 * 1_000_000_000,
            _ => return Err(format!("Invalid duration: unknown unit '{}' in {}", unit, s)),
        };

        let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let mut nanos = whole.checked_mul(unit_nanos).ok_or_else(invalid)?;

        if !fraction.is_empty() {
            // digits past 1e-18 of a unit are below nanosecond precision
            let fraction = &fraction[..fraction.len().min(18)];
            let digits: u128 = fraction.parse().map_err(|_| invalid())?;
            let scale = 10u128
                .checked_pow(fraction.len() as u32)
                .ok_or_else(invalid)?;
            let fraction_nanos = digits.checked_mul(unit_nanos).ok_or_else(invalid)? / scale;
            nanos = nanos.checked_add(fraction_nanos).ok_or_else(invalid)?;
        }

        total_nanos = total_nanos.checked_add(nanos).ok_or_else(invalid)?;

        rest = tail;
    }

    let secs = u64::try_from(total_nanos / 1_000_000_000).map_err(|_| invalid())?;
    Ok(Duration::new(secs, (total_nanos % 1_000_000_000) as u32))
}

/// Check if the terminal supports color output
fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    cfg!(unix)
}
