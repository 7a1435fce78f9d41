//! Environment variable handling and .env file management

use crate::cli::parse_duration;
use crate::error::{AppError, Result};
use crate::models::Config;
use crate::scope::CountryScope;
use std::path::{Path, PathBuf};

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load .env file if it exists
    pub fn load_env_file(debug: bool) -> Result<()> {
        if Path::new(".env").exists() {
            dotenv::from_filename(".env")?;

            if debug {
                println!("Loaded configuration from .env file");
            }
        } else if debug {
            println!("No .env file found, using defaults and CLI arguments");
        }

        Ok(())
    }

    /// Merge variables resolved through `lookup` into `config`
    pub fn apply_vars<F>(config: &mut Config, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        for (key, _, _) in Self::get_supported_env_vars() {
            if let Some(value) = lookup(key) {
                Self::validate_env_var(key, &value)?;
                Self::apply_var(config, key, &value)?;
            }
        }
        Ok(())
    }

    fn apply_var(config: &mut Config, key: &str, value: &str) -> Result<()> {
        match key {
            "RELAY_API_URL" => config.api_url = value.trim().to_string(),
            "RELAY_COUNTRIES" => config.country_scope = CountryScope::parse(value),
            "PROBE_TIMEOUT" => {
                config.timeout = parse_duration(value)
                    .map_err(|e| AppError::config(format!("Invalid PROBE_TIMEOUT value '{}': {}", value, e)))?;
            }
            "OUTPUT_FILE" => config.output_path = PathBuf::from(value.trim()),
            "ENABLE_COLOR" => {
                config.enable_color = value.trim().parse::<bool>()
                    .map_err(|e| AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", value, e)))?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Validate environment variable format before parsing
    pub fn validate_env_var(key: &str, value: &str) -> Result<()> {
        match key {
            "RELAY_API_URL" => {
                url::Url::parse(value.trim())
                    .map_err(|e| AppError::config(format!("Invalid RELAY_API_URL value '{}': {}", value, e)))?;
            }
            "PROBE_TIMEOUT" => {
                parse_duration(value)
                    .map_err(|e| AppError::config(format!("Invalid PROBE_TIMEOUT value '{}': {}", value, e)))?;
            }
            "OUTPUT_FILE" => {
                if value.trim().is_empty() {
                    return Err(AppError::config("OUTPUT_FILE cannot be empty"));
                }
            }
            "ENABLE_COLOR" => {
                value.trim().parse::<bool>()
                    .map_err(|e| AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", value, e)))?;
            }
            _ => {
                // RELAY_COUNTRIES accepts anything, empty codes are reported later
            }
        }

        Ok(())
    }

    /// Get list of all supported environment variables with descriptions
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("RELAY_API_URL", "Relay directory endpoint", "https://api.mullvad.net/www/relays/wireguard"),
            ("RELAY_COUNTRIES", "Comma-separated country codes to probe", "se,de,nl"),
            ("PROBE_TIMEOUT", "Timeout for each ping", "1s"),
            ("OUTPUT_FILE", "CSV report path", "bench_result.csv"),
            ("ENABLE_COLOR", "Enable colored output", "true"),
        ]
    }

    /// Display environment variable help
    pub fn display_env_help() -> String {
        let mut help = String::new();
        help.push_str("Supported Environment Variables:\n\n");

        for (var, description, example) in Self::get_supported_env_vars() {
            help.push_str(&format!("  {:<16} {}\n", var, description));
            help.push_str(&format!("  {:<16} Example: {}\n\n", "", example));
        }

        help.push_str("Configuration Priority (highest to lowest):\n");
        help.push_str("  1. Command-line arguments\n");
        help.push_str("  2. Environment variables\n");
        help.push_str("  3. .env file values\n");
        help.push_str("  4. Default values\n");

        help
    }
}
