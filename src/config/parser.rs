//! Configuration parsing from CLI arguments and environment variables

use crate::{
    cli::Cli,
    config::env::EnvManager,
    error::Result,
    models::Config,
    output::format_duration,
    scope::CountryScope,
};

/// Configuration parser that combines CLI arguments with environment variables
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    /// Create a new configuration parser with CLI arguments
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Parse and build the complete configuration
    pub fn parse(&self) -> Result<Config> {
        EnvManager::load_env_file(self.cli.debug)?;
        self.parse_with_env(|key| std::env::var(key).ok())
    }

    /// Build the configuration against an explicit environment
    pub fn parse_with_env<F>(&self, lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        EnvManager::apply_vars(&mut config, lookup)?;
        self.apply_cli_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Apply CLI argument overrides to configuration
    fn apply_cli_overrides(&self, config: &mut Config) {
        config.list_countries = self.cli.list_countries;

        if let Some(ref countries) = self.cli.countries {
            config.country_scope = CountryScope::parse(countries);
        }

        if let Some(timeout) = self.cli.timeout {
            config.timeout = timeout;
        }

        if let Some(ref output) = self.cli.output {
            config.output_path = output.clone();
        }

        if let Some(ref api_url) = self.cli.api_url {
            config.api_url = api_url.clone();
        }

        if !self.cli.use_colors() {
            config.enable_color = false;
        }

        // CLI-only switches
        config.verbose = self.cli.verbose;
        config.debug = self.cli.debug;
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    ConfigParser::new(cli).parse()
}

/// Display configuration summary for debug purposes
pub fn display_config_summary(config: &Config) -> String {
    let mut summary = Vec::new();

    summary.push(format!("Relay API: {}", config.api_url));
    if config.country_scope.is_unscoped() {
        summary.push("Countries: all".to_string());
    } else {
        summary.push(format!("Countries: {}", config.country_scope.codes().join(", ")));
    }
    summary.push(format!("Timeout: {}", format_duration(config.timeout)));
    summary.push(format!("Output: {}", config.output_path.display()));
    summary.push(format!("Color Output: {}", config.enable_color));
    summary.push(format!("Verbose: {}", config.verbose));
    summary.push(format!("Debug: {}", config.debug));

    summary.join("\n")
}
