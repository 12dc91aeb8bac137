//! Outbound HTTP fetch of the sensor endpoint.

use crate::error::{BridgeError, FetchError};
use async_trait::async_trait;
use log::debug;

/// Where the poller gets its response bodies from.
#[async_trait]
pub trait ReadingSource: Send + Sync + 'static {
    /// Fetch one response body. Called once per poll tick.
    async fn fetch_body(&self) -> Result<String, FetchError>;
}

/// Plain GET against a single URL: no timeout, no retry.
pub struct HttpReadingSource {
    client: reqwest::Client,
    url: Option<String>,
}

impl HttpReadingSource {
    /// Create a source for `url`. A missing URL is accepted; every fetch then fails.
    pub fn new(url: Option<String>) -> Result<Self, BridgeError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("http-sensor-bridge/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(BridgeError::HttpClient)?;
        Ok(Self { client, url })
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }
}

#[async_trait]
impl ReadingSource for HttpReadingSource {
    async fn fetch_body(&self) -> Result<String, FetchError> {
        let url = self.url.as_deref().ok_or(FetchError::MissingUrl)?;

        debug!("[HTTP] GET {}", url);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.text().await?;
        debug!("[HTTP] {} returned {} bytes", url, body.len());
        Ok(body)
    }
}
