//! Relay Latency Bench
//!
//! Queries a VPN provider's public relay directory, measures ICMP round-trip
//! time to every relay in scope, one relay at a time, and writes the relays
//! that answered to a CSV report ranked by latency.

pub mod app;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod models;
pub mod output;
pub mod probe;
pub mod scope;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use models::{Config, CountryRecord, ProbeResult, RelayRecord};
pub use scope::CountryScope;

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_API_URL: &str = "https://api.mullvad.net/www/relays/wireguard";
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);
    pub const MAX_TIMEOUT: Duration = Duration::from_secs(300);
    pub const DEFAULT_OUTPUT_FILE: &str = "bench_result.csv";
    pub const DEFAULT_ENABLE_COLOR: bool = true;
    /// Whole-request timeout for the directory fetch
    pub const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
}
