//! CSV report writer

use crate::error::{AppError, Result};
use crate::models::ProbeResult;
use crate::output::duration::format_duration;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// Header row of the report
pub const REPORT_HEADER: [&str; 4] = ["Server", "Country", "City", "Ping"];

/// Order results by ascending round-trip time
///
/// The sort is stable: relays with equal times keep their directory order.
pub fn sort_by_latency(results: &mut [ProbeResult]) {
    results.sort_by_key(|result| result.ping_duration);
}

/// Writes ranked probe results as CSV
pub struct ReportWriter;

impl ReportWriter {
    /// Create the report at `path` and write `results` in the given order
    ///
    /// The file must not exist yet; the orchestrator resolves collisions
    /// before probing starts, so finding one here is an I/O error.
    pub fn write(path: &Path, results: &[ProbeResult]) -> Result<()> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| AppError::io(format!("Failed to create {}: {}", path.display(), e)))?;

        Self::write_to(file, results)
    }

    /// Write the header and one row per result to `writer`
    pub fn write_to<W: Write>(writer: W, results: &[ProbeResult]) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(REPORT_HEADER)?;

        for result in results {
            let ping = format_duration(result.ping_duration);
            csv_writer.write_record([
                result.relay.hostname.as_str(),
                result.relay.country_name.as_str(),
                result.relay.city_name.as_str(),
                ping.as_str(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}
