//! Detail page fetcher.
//!
//! Issues one bounded GET per card. Failures are classified and logged here
//! and never escape as errors; retrying is the coordinator's job.

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

use crate::error::Result;
use crate::models::{CardId, FetchConfig};
use crate::utils::http::{card_url, create_async_client};

/// A single fetch attempt for one card page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Returns the page body, or `None` if the attempt failed.
    async fn fetch(&self, id: CardId) -> Option<String>;
}

/// Why a fetch attempt produced no page.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    #[error("request timed out")]
    Timeout,

    #[error("status {0}")]
    Http(u16),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("unexpected request error: {0}")]
    Other(String),
}

impl FetchFailure {
    /// Classify a reqwest error.
    pub fn classify(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_status() {
            Self::Http(error.status().map_or(500, |s| s.as_u16()))
        } else if error.is_connect() {
            Self::Connection(error.to_string())
        } else {
            Self::Other(format!("{error:?}"))
        }
    }

    fn log(&self, url: &str) {
        match self {
            Self::Timeout => log::warn!("Timeout occurred: {url}"),
            Self::Http(status) => log::error!("HTTP error: {url} -> status {status}"),
            Self::Connection(detail) => log::error!("Connection error: {url} -> {detail}"),
            Self::Other(detail) => log::error!("Unexpected request error: {url} -> {detail}"),
        }
    }
}

/// Fetches card detail pages over HTTP.
pub struct HttpFetcher {
    client: Client,
    base_url: String,
}

impl HttpFetcher {
    /// Create a fetcher with a client built from `config`.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        Ok(Self::with_client(
            create_async_client(config)?,
            &config.base_url,
        ))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn url_for(&self, id: CardId) -> String {
        card_url(&self.base_url, id)
    }

    /// Fetch a page, keeping the failure class.
    pub async fn fetch_page(&self, id: CardId) -> std::result::Result<String, FetchFailure> {
        let url = self.url_for(id);
        log::debug!("Request start: {url}");

        let body = self
            .get_text(&url)
            .await
            .map_err(|e| FetchFailure::classify(&e))?;

        log::debug!("Request succeeded: {url} ({} bytes)", body.len());
        Ok(body)
    }

    async fn get_text(&self, url: &str) -> reqwest::Result<String> {
        self.client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, id: CardId) -> Option<String> {
        match self.fetch_page(id).await {
            Ok(body) => Some(body),
            Err(failure) => {
                failure.log(&self.url_for(id));
                None
            }
        }
    }
}
