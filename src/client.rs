//! Relay directory client


use crate::{
    defaults,
    error::{AppError, Result},
    logging::Logger,
    models::{Config, CountryRecord, RelayRecord},
};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};

/// Source of relay and country listings
///
/// Both calls hit the same listing; they differ only in how much of each
/// entry is decoded. Failures are fatal to the run, nothing is retried.
#[async_trait]
pub trait RelayDirectory: Send + Sync {
    /// Every relay in the directory, in directory order
    async fn fetch_relays(&self) -> Result<Vec<RelayRecord>>;

    /// Country code and name of every relay, duplicates included
    async fn fetch_countries(&self) -> Result<Vec<CountryRecord>>;
}

/// Directory client speaking to the provider's public HTTP API
pub struct HttpRelayDirectory {
    client: Client,
    url: String,
    logger: Logger,
}

impl HttpRelayDirectory {
    /// Create a client for the endpoint at `url`
    pub fn new(url: impl Into<String>, request_timeout: Duration, logger: Logger) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
            logger,
        })
    }

    /// Create a client for the configured endpoint
    pub fn from_config(config: &Config, logger: &Logger) -> Result<Self> {
        Self::new(
            config.api_url.clone(),
            defaults::HTTP_REQUEST_TIMEOUT,
            logger.named("DIRECTORY"),
        )
    }

    /// GET the listing and decode it as a JSON array of `T`
    async fn get_listing<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        let start_time = Instant::now();

        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::http_request(format!(
                "{} responded with {}",
                self.url, status
            )));
        }

        let body = response.bytes().await?;
        let records: Vec<T> = serde_json::from_slice(&body)?;

        self.logger
            .info("Fetched relay directory")
            .field("url", &self.url)
            .field("entries", records.len())
            .field("bytes", body.len())
            .field("elapsed_ms", start_time.elapsed().as_millis() as u64)
            .log();

        Ok(records)
    }
}

#[async_trait]
impl RelayDirectory for HttpRelayDirectory {
    async fn fetch_relays(&self) -> Result<Vec<RelayRecord>> {
        self.get_listing().await
    }

    async fn fetch_countries(&self) -> Result<Vec<CountryRecord>> {
        self.get_listing().await
    }
}
