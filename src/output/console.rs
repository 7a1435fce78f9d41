//! Console rendering: country table, progress line and the overwrite prompt

use crate::error::{AppError, Result};
use colored::Colorize;
use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::path::Path;

/// `word` with an `s` appended unless `count` is exactly one
pub fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{}s", word)
    }
}

/// Console formatter honoring the color setting
#[derive(Debug, Clone, Copy)]
pub struct Console {
    use_color: bool,
}

impl Console {
    pub fn new(use_color: bool) -> Self {
        Self { use_color }
    }

    /// Render the `code | name` table of available countries
    pub fn format_country_table(&self, countries: &BTreeMap<String, String>) -> String {
        let width = countries
            .keys()
            .map(|code| code.chars().count())
            .max()
            .unwrap_or(0)
            .max("Code".len());

        let noun = if countries.len() == 1 { "country" } else { "countries" };
        let mut out = format!("{} available {}\n", countries.len(), noun);

        let header = format!("{:<width$} | {}", "Code", "Name", width = width);
        if self.use_color {
            out.push_str(&format!("{}\n", header.bold()));
        } else {
            out.push_str(&format!("{}\n", header));
        }

        for (code, name) in countries {
            out.push_str(&format!("{:<width$} | {}\n", code, name, width = width));
        }
        out
    }

    /// Overwrite the progress line in place
    pub fn write_progress<W: Write>(&self, out: &mut W, processed: usize) -> Result<()> {
        write!(out, "\r{} {} processed", processed, pluralize("server", processed))?;
        out.flush()?;
        Ok(())
    }

    /// Headline shown once the report is on disk
    pub fn format_summary(&self, path: &Path, written: usize) -> String {
        let message = format!(
            "Results written to {} ({} {})",
            path.display(),
            written,
            pluralize("server", written)
        );
        if self.use_color {
            message.green().to_string()
        } else {
            message
        }
    }
}

/// Ask whether an existing report may be removed
///
/// Only a line reading `y` (surrounding whitespace ignored) confirms;
/// anything else, including an empty line or end of input, declines.
pub fn confirm_overwrite<R, W>(path: &Path, input: &mut R, output: &mut W) -> Result<bool>
where
    R: BufRead,
    W: Write,
{
    writeln!(output, "Output file {} already exists", path.display())?;
    writeln!(output, "Remove the existing file? (y/N)")?;
    output.flush()?;

    let mut answer = String::new();
    input
        .read_line(&mut answer)
        .map_err(|e| AppError::io(format!("Failed to read input: {}", e)))?;

    Ok(answer.trim() == "y")
}
