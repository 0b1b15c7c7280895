//! Generative-text service access.
//!
//! Every stage that talks to a model goes through [`CompletionBackend`]:
//! one user-role prompt in, the model's free text out. Parsing that text is
//! the caller's job (see [`crate::pipeline::json`]), and prompt wording lives
//! in [`crate::prompts`].
//!
//! Two backends exist:
//!
//! - [`MessagesBackend`] posts directly to a messages-style endpoint
//!   (`{model, messages, max_tokens}` in, content blocks out). This is the
//!   default and works with Anthropic and compatible gateways.
//! - [`ProviderBackend`] wraps an `edgequake_llm` provider, selected by name
//!   via `AI_PROVIDER`, for deployments on OpenAI, Gemini, Ollama and the rest.
//!
//! Calls are not retried; a failed call fails the job.

use crate::config::Settings;
use crate::error::Vocab2PostError;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Version header required by messages-style endpoints.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// A generative-text service: prompt in, free text out.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, Vocab2PostError>;
}

/// Build the backend described by `settings`.
///
/// A named `ai_provider` takes precedence over the messages endpoint.
pub fn backend_from_settings(
    settings: &Settings,
) -> Result<Arc<dyn CompletionBackend>, Vocab2PostError> {
    if let Some(ref name) = settings.ai_provider {
        let provider = ProviderFactory::create_llm_provider(name, &settings.model).map_err(|e| {
            Vocab2PostError::InvalidConfig(format!("LLM provider '{name}' is not configured: {e}"))
        })?;
        return Ok(Arc::new(ProviderBackend::new(
            provider,
            settings.max_tokens,
            settings.generation_timeout_secs,
        )));
    }

    let api_key = settings
        .ai_api_key
        .clone()
        .ok_or_else(|| Vocab2PostError::InvalidConfig("AI_API_KEY must be set".into()))?;
    Ok(Arc::new(MessagesBackend {
        endpoint: settings.ai_api_url.clone(),
        api_key,
        model: settings.model.clone(),
        max_tokens: settings.max_tokens,
        timeout_secs: settings.generation_timeout_secs,
    }))
}

// ── Messages endpoint ────────────────────────────────────────────────────

/// Direct HTTP client for a messages-style completion endpoint.
///
/// The key goes out both as `x-api-key` (Anthropic) and as a Bearer token
/// (compatible gateways).
#[derive(Clone)]
pub struct MessagesBackend {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: usize,
    pub timeout_secs: u64,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    messages: Vec<RequestMessage<'a>>,
    max_tokens: usize,
}

#[derive(Debug, Serialize)]
struct RequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl MessagesResponse {
    /// Text of the first `text` block. Reasoning models put a `thinking`
    /// block first, so position alone is not enough.
    fn first_text(self) -> Option<String> {
        self.content
            .into_iter()
            .find(|b| b.kind == "text")
            .and_then(|b| b.text)
    }
}

#[async_trait]
impl CompletionBackend for MessagesBackend {
    async fn complete(&self, prompt: &str) -> Result<String, Vocab2PostError> {
        let start = Instant::now();
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
            .map_err(|e| Vocab2PostError::Internal(format!("http client: {e}")))?;

        let body = MessagesRequest {
            model: &self.model,
            messages: vec![RequestMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.max_tokens,
        };

        let response = client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Vocab2PostError::GenerationTimeout {
                        secs: self.timeout_secs,
                    }
                } else {
                    Vocab2PostError::Generation {
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Vocab2PostError::Generation {
                message: format!("HTTP {status}: {}", truncate(&text, 300)),
            });
        }

        let parsed: MessagesResponse =
            response.json().await.map_err(|e| Vocab2PostError::Generation {
                message: format!("malformed response envelope: {e}"),
            })?;
        let text = parsed.first_text().ok_or_else(|| Vocab2PostError::Generation {
            message: "response contained no text block".into(),
        })?;

        debug!(
            "{}: {} prompt chars → {} reply chars in {:?}",
            self.model,
            prompt.len(),
            text.len(),
            start.elapsed()
        );
        Ok(text)
    }
}

// ── edgequake-llm provider ───────────────────────────────────────────────

/// Backend that delegates to an `edgequake_llm` provider.
pub struct ProviderBackend {
    provider: Arc<dyn LLMProvider>,
    options: CompletionOptions,
    timeout_secs: u64,
}

impl ProviderBackend {
    pub fn new(provider: Arc<dyn LLMProvider>, max_tokens: usize, timeout_secs: u64) -> Self {
        Self {
            provider,
            options: CompletionOptions {
                max_tokens: Some(max_tokens),
                ..Default::default()
            },
            timeout_secs,
        }
    }
}

#[async_trait]
impl CompletionBackend for ProviderBackend {
    async fn complete(&self, prompt: &str) -> Result<String, Vocab2PostError> {
        let messages = vec![ChatMessage::user(prompt)];
        let call = self.provider.chat(&messages, Some(&self.options));
        let response = tokio::time::timeout(Duration::from_secs(self.timeout_secs), call)
            .await
            .map_err(|_| Vocab2PostError::GenerationTimeout {
                secs: self.timeout_secs,
            })?
            .map_err(|e| Vocab2PostError::Generation {
                message: e.to_string(),
            })?;

        debug!(
            "{} input tokens, {} output tokens",
            response.prompt_tokens, response.completion_tokens
        );
        Ok(response.content)
    }
}

/// Cut `s` to at most `max` characters for log and error messages.
pub(crate) fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}\u{2026}", &s[..idx]),
        None => s.to_string(),
    }
}
