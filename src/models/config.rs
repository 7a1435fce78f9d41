//! Configuration data model and validation

use crate::defaults;
use crate::error::{AppError, Result};
use crate::scope::CountryScope;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration
///
/// Built once at startup by [`crate::config::load_config`] and handed to
/// every component by reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// List countries and exit instead of benchmarking
    #[serde(default)]
    pub list_countries: bool,

    /// Countries whose relays get probed
    #[serde(default)]
    pub country_scope: CountryScope,

    /// Per-probe timeout
    #[serde(default = "default_timeout")]
    pub timeout: Duration,

    /// CSV report location
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,

    /// Relay directory endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,

    /// Enable debug output
    #[serde(default)]
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            list_countries: false,
            country_scope: CountryScope::unscoped(),
            timeout: default_timeout(),
            output_path: default_output_path(),
            api_url: default_api_url(),
            enable_color: default_enable_color(),
            verbose: false,
            debug: false,
        }
    }
}

impl Config {
    /// Validate the configuration and return the first problem found
    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(AppError::config("Timeout must be greater than 0"));
        }

        if self.timeout > defaults::MAX_TIMEOUT {
            return Err(AppError::config(format!(
                "Timeout cannot exceed {} seconds",
                defaults::MAX_TIMEOUT.as_secs()
            )));
        }

        if self.output_path.as_os_str().is_empty() {
            return Err(AppError::config("Output file name cannot be empty"));
        }

        let parsed = url::Url::parse(&self.api_url)
            .map_err(|e| AppError::config(format!("Invalid relay API URL '{}': {}", self.api_url, e)))?;
        if parsed.scheme() != "https" && parsed.scheme() != "http" {
            return Err(AppError::config(format!(
                "Relay API URL must use http or https: {}",
                self.api_url
            )));
        }

        Ok(())
    }
}

fn default_timeout() -> Duration {
    defaults::DEFAULT_TIMEOUT
}

fn default_output_path() -> PathBuf {
    PathBuf::from(defaults::DEFAULT_OUTPUT_FILE)
}

fn default_api_url() -> String {
    defaults::DEFAULT_API_URL.to_string()
}

fn default_enable_color() -> bool {
    defaults::DEFAULT_ENABLE_COLOR
}
