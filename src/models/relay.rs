//! Relay directory records and probe results

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::time::Duration;

/// A single relay as published by the provider's directory
///
/// Identity is the pair of `hostname` and `ipv4_address`; the other fields
/// are descriptive. String fields default to empty when the directory omits
/// them, the address is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayRecord {
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub country_code: String,
    #[serde(default)]
    pub country_name: String,
    #[serde(default)]
    pub city_code: String,
    #[serde(default)]
    pub city_name: String,
    #[serde(rename = "ipv4_addr_in")]
    pub ipv4_address: Ipv4Addr,
}

/// Country fields of a relay entry, decoded from the same endpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CountryRecord {
    #[serde(default)]
    pub country_code: String,
    #[serde(default)]
    pub country_name: String,
}

/// Collapse per-relay country records into a code to name table
///
/// Keyed by code, so iteration yields codes in ascending order. When one
/// code appears with different names, the last record wins.
pub fn country_index<I>(records: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = CountryRecord>,
{
    records
        .into_iter()
        .map(|record| (record.country_code, record.country_name))
        .collect()
}

/// A relay that answered its echo request within the timeout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub relay: RelayRecord,
    pub ping_duration: Duration,
}

impl ProbeResult {
    pub fn new(relay: RelayRecord, ping_duration: Duration) -> Self {
        Self { relay, ping_duration }
    }
}
