//! Data models and structures for the relay latency benchmark

pub mod config;
pub mod relay;

// Re-export main model types
pub use config::Config;
pub use relay::{country_index, CountryRecord, ProbeResult, RelayRecord};
