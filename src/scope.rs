//! Country scope filtering
//!
//! A scope is built from the comma-separated `--countries` value. Each
//! element is trimmed; matching against a relay's country code is exact and
//! case-sensitive. An empty scope selects every relay.

use crate::models::RelayRecord;
use serde::{Deserialize, Serialize};

/// Set of country codes selecting which relays get probed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryScope {
    codes: Vec<String>,
    /// 0-based positions of elements that were empty after trimming
    invalid_positions: Vec<usize>,
}

impl CountryScope {
    /// Scope that selects every relay
    pub fn unscoped() -> Self {
        Self::default()
    }

    /// Build a scope from the raw flag value
    ///
    /// Empty elements (`"us,,de"`, `"us, "`) are recorded in
    /// [`invalid_positions`](Self::invalid_positions) and kept as entries.
    /// They never equal a real country code, so they select nothing, and a
    /// scope made only of empty elements selects no relay at all rather than
    /// silently widening to every relay.
    pub fn parse(raw: &str) -> Self {
        if raw.is_empty() {
            return Self::unscoped();
        }

        let mut invalid_positions = Vec::new();
        let codes = raw
            .split(',')
            .enumerate()
            .map(|(position, code)| {
                let code = code.trim();
                if code.is_empty() {
                    invalid_positions.push(position);
                }
                code.to_string()
            })
            .collect();

        Self { codes, invalid_positions }
    }

    /// True when no scope was given
    pub fn is_unscoped(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    pub fn invalid_positions(&self) -> &[usize] {
        &self.invalid_positions
    }

    /// Whether a relay in `country_code` is selected
    pub fn includes(&self, country_code: &str) -> bool {
        self.is_unscoped() || self.codes.iter().any(|code| code == country_code)
    }

    /// Whether `relay` is selected
    pub fn in_scope(&self, relay: &RelayRecord) -> bool {
        self.includes(&relay.country_code)
    }

    /// Keep the selected relays, preserving directory order
    pub fn select(&self, relays: Vec<RelayRecord>) -> Vec<RelayRecord> {
        relays.into_iter().filter(|relay| self.in_scope(relay)).collect()
    }
}
