//! Document retrieval: download the submitted URL into memory.
//!
//! The whole body is buffered; vocabulary PDFs are small and the extractor
//! needs the complete file anyway. A fresh client is built per call so each
//! job owns its own connection.

use crate::config::Settings;
use crate::error::Vocab2PostError;
use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use std::time::Duration;
use tracing::{debug, info};

/// Something that can turn a URL into document bytes.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, Vocab2PostError>;
}

/// HTTP GET with a bounded timeout and a browser-like User-Agent.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl HttpFetcher {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            timeout_secs: settings.fetch_timeout_secs,
            user_agent: settings.user_agent.clone(),
        }
    }
}

/// Check if the input string looks like an HTTP(S) URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, Vocab2PostError> {
        info!("Downloading document from: {}", url);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
            .map_err(|e| Vocab2PostError::Fetch {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let response = client
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|e| self.request_error(url, e))?;

        if !response.status().is_success() {
            return Err(Vocab2PostError::Fetch {
                url: url.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.request_error(url, e))?;

        debug!("Downloaded {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }
}

impl HttpFetcher {
    fn request_error(&self, url: &str, e: reqwest::Error) -> Vocab2PostError {
        if e.is_timeout() {
            Vocab2PostError::FetchTimeout {
                url: url.to_string(),
                secs: self.timeout_secs,
            }
        } else {
            Vocab2PostError::Fetch {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    }
}
