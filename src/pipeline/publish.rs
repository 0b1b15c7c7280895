//! Publishing: create a post through the WordPress REST API.
//!
//! Authentication uses an application password sent as HTTP Basic
//! credentials. The response body is returned as-is; only the status code
//! decides success.

use crate::config::Settings;
use crate::error::Vocab2PostError;
use crate::output::Passage;
use crate::pipeline::llm::truncate;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

/// Something that can publish a passage and return the CMS response.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, passage: &Passage) -> Result<serde_json::Value, Vocab2PostError>;
}

/// Body of a create-post request.
#[derive(Debug, Serialize)]
pub struct PostRequest<'a> {
    pub title: &'a str,
    pub content: &'a str,
    pub status: &'static str,
}

impl<'a> PostRequest<'a> {
    /// A post that goes live immediately.
    pub fn published(passage: &'a Passage) -> Self {
        Self {
            title: &passage.title,
            content: &passage.content,
            status: "publish",
        }
    }
}

/// WordPress `wp/v2/posts` client.
#[derive(Clone)]
pub struct WordPressPublisher {
    pub endpoint: String,
    pub user: String,
    pub app_password: String,
    pub timeout_secs: u64,
}

impl WordPressPublisher {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            endpoint: settings.wp_url.clone(),
            user: settings.wp_user.clone(),
            app_password: settings.wp_app_password.clone(),
            timeout_secs: settings.publish_timeout_secs,
        }
    }

    /// `Authorization` header value for the configured credentials.
    pub fn authorization(&self) -> String {
        basic_auth(&self.user, &self.app_password)
    }
}

/// `Basic base64(user:password)`.
pub fn basic_auth(user: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{user}:{password}")))
}

#[async_trait]
impl Publisher for WordPressPublisher {
    async fn publish(&self, passage: &Passage) -> Result<serde_json::Value, Vocab2PostError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
            .map_err(|e| Vocab2PostError::Internal(format!("http client: {e}")))?;

        let response = client
            .post(&self.endpoint)
            .header(reqwest::header::AUTHORIZATION, self.authorization())
            .json(&PostRequest::published(passage))
            .send()
            .await
            .map_err(|e| Vocab2PostError::Publish {
                status: None,
                detail: if e.is_timeout() {
                    format!("timed out after {}s", self.timeout_secs)
                } else {
                    e.to_string()
                },
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Vocab2PostError::Publish {
                status: Some(status.as_u16()),
                detail: truncate(&body, 300),
            });
        }

        let body: serde_json::Value =
            response.json().await.map_err(|e| Vocab2PostError::Publish {
                status: Some(status.as_u16()),
                detail: format!("response is not JSON: {e}"),
            })?;

        info!("Published '{}' (HTTP {})", passage.title, status.as_u16());
        debug!("CMS response: {}", body);
        Ok(body)
    }
}
