//! Process-wide settings for the vocab2post service.
//!
//! Everything the pipeline needs from its environment lives in one
//! [`Settings`] value: CMS endpoint and credentials, generative-service
//! endpoint and key, timeouts and pipeline variant. It is built once at
//! startup via [`SettingsBuilder`] and handed to each collaborator when it
//! is constructed; nothing reads the environment after that.
//!
//! # Example
//! ```rust
//! use vocab2post::Settings;
//!
//! let settings = Settings::builder()
//!     .wp_url("https://blog.example.com/wp-json/wp/v2/posts")
//!     .wp_user("editor")
//!     .wp_app_password("abcd efgh ijkl")
//!     .ai_api_key("sk-test")
//!     .build()
//!     .unwrap();
//! assert_eq!(settings.port, 8940);
//! ```

use crate::error::Vocab2PostError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default messages-style generative endpoint.
pub const DEFAULT_AI_API_URL: &str = "https://api.anthropic.com/v1/messages";

/// Default model identifier sent to the generative service.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Browser-like identification sent when downloading documents. Some hosts
/// refuse requests from unknown clients.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Settings for the whole service.
#[derive(Clone)]
pub struct Settings {
    /// Full URL of the CMS posts endpoint, e.g. `https://host/wp-json/wp/v2/posts`.
    pub wp_url: String,
    pub wp_user: String,
    /// WordPress application password (not the account password).
    pub wp_app_password: String,

    /// Key for the messages endpoint. Optional when `ai_provider` is set.
    pub ai_api_key: Option<String>,
    /// Messages-style endpoint. Default: [`DEFAULT_AI_API_URL`].
    pub ai_api_url: String,
    /// edgequake-llm provider name ("openai", "gemini", "ollama", …).
    /// When set, generation goes through that provider instead of `ai_api_url`.
    pub ai_provider: Option<String>,
    /// Model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,
    /// Output-token bound per generative call. Default: 4096.
    pub max_tokens: usize,

    /// Listen address for the webhook server. Default: 127.0.0.1.
    pub host: String,
    /// Listen port. Default: 8940.
    pub port: u16,

    /// Document download timeout in seconds. Default: 60.
    pub fetch_timeout_secs: u64,
    /// Generative-service call timeout in seconds. Default: 120.
    pub generation_timeout_secs: u64,
    /// CMS publish timeout in seconds. Default: 30.
    pub publish_timeout_secs: u64,
    /// User-Agent header for document downloads.
    pub user_agent: String,

    /// How the word list is derived from the extracted text. Default: heuristic.
    pub vocabulary_strategy: VocabularyStrategy,
    /// Partition the word list into groups and publish one post per group.
    /// Default: false (one post for the whole list).
    pub group_words: bool,
    /// Upper bound on the size of a word group. Default: 10.
    pub max_group_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            wp_url: String::new(),
            wp_user: String::new(),
            wp_app_password: String::new(),
            ai_api_key: None,
            ai_api_url: DEFAULT_AI_API_URL.to_string(),
            ai_provider: None,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 4096,
            host: "127.0.0.1".to_string(),
            port: 8940,
            fetch_timeout_secs: 60,
            generation_timeout_secs: 120,
            publish_timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            vocabulary_strategy: VocabularyStrategy::default(),
            group_words: false,
            max_group_size: 10,
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("wp_url", &self.wp_url)
            .field("wp_user", &self.wp_user)
            .field("wp_app_password", &"<redacted>")
            .field("ai_api_key", &self.ai_api_key.as_ref().map(|_| "<redacted>"))
            .field("ai_api_url", &self.ai_api_url)
            .field("ai_provider", &self.ai_provider)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("generation_timeout_secs", &self.generation_timeout_secs)
            .field("publish_timeout_secs", &self.publish_timeout_secs)
            .field("vocabulary_strategy", &self.vocabulary_strategy)
            .field("group_words", &self.group_words)
            .field("max_group_size", &self.max_group_size)
            .finish()
    }
}

impl Settings {
    /// Create a new builder for `Settings`.
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder {
            settings: Self::default(),
        }
    }

    /// `host:port` string for binding the webhook server.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Builder for [`Settings`].
#[derive(Debug)]
pub struct SettingsBuilder {
    settings: Settings,
}

impl SettingsBuilder {
    pub fn wp_url(mut self, url: impl Into<String>) -> Self {
        self.settings.wp_url = url.into();
        self
    }

    pub fn wp_user(mut self, user: impl Into<String>) -> Self {
        self.settings.wp_user = user.into();
        self
    }

    pub fn wp_app_password(mut self, password: impl Into<String>) -> Self {
        self.settings.wp_app_password = password.into();
        self
    }

    pub fn ai_api_key(mut self, key: impl Into<String>) -> Self {
        self.settings.ai_api_key = Some(key.into());
        self
    }

    pub fn ai_api_url(mut self, url: impl Into<String>) -> Self {
        self.settings.ai_api_url = url.into();
        self
    }

    pub fn ai_provider(mut self, name: impl Into<String>) -> Self {
        self.settings.ai_provider = Some(name.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.settings.model = model.into();
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.settings.max_tokens = n;
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.settings.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.settings.port = port;
        self
    }

    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.settings.fetch_timeout_secs = secs;
        self
    }

    pub fn generation_timeout_secs(mut self, secs: u64) -> Self {
        self.settings.generation_timeout_secs = secs;
        self
    }

    pub fn publish_timeout_secs(mut self, secs: u64) -> Self {
        self.settings.publish_timeout_secs = secs;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.settings.user_agent = ua.into();
        self
    }

    pub fn vocabulary_strategy(mut self, strategy: VocabularyStrategy) -> Self {
        self.settings.vocabulary_strategy = strategy;
        self
    }

    pub fn group_words(mut self, v: bool) -> Self {
        self.settings.group_words = v;
        self
    }

    pub fn max_group_size(mut self, n: usize) -> Self {
        self.settings.max_group_size = n;
        self
    }

    /// Build the settings, validating constraints.
    pub fn build(self) -> Result<Settings, Vocab2PostError> {
        let s = &self.settings;
        for (name, value) in [
            ("WP_URL", &s.wp_url),
            ("WP_USER", &s.wp_user),
            ("WP_APP_PASSWORD", &s.wp_app_password),
        ] {
            if value.trim().is_empty() {
                return Err(Vocab2PostError::InvalidConfig(format!("{name} must be set")));
            }
        }
        let has_key = s.ai_api_key.as_deref().is_some_and(|k| !k.trim().is_empty());
        let has_provider = s.ai_provider.as_deref().is_some_and(|p| !p.trim().is_empty());
        if !has_key && !has_provider {
            return Err(Vocab2PostError::InvalidConfig(
                "either AI_API_KEY or AI_PROVIDER must be set".into(),
            ));
        }
        self.build_for_extraction()
    }

    /// Build settings for fetch, extract and vocabulary only.
    ///
    /// CMS and AI credentials are not required; a generative backend built
    /// from the result still rejects a missing key.
    pub fn build_for_extraction(self) -> Result<Settings, Vocab2PostError> {
        let s = &self.settings;
        if s.fetch_timeout_secs == 0 || s.generation_timeout_secs == 0 || s.publish_timeout_secs == 0
        {
            return Err(Vocab2PostError::InvalidConfig(
                "timeouts must be at least 1 second".into(),
            ));
        }
        if s.max_group_size == 0 {
            return Err(Vocab2PostError::InvalidConfig(
                "max group size must be ≥ 1".into(),
            ));
        }
        Ok(self.settings)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How the word list is derived from extracted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VocabularyStrategy {
    /// `<number> <word>` lines only. Deterministic. (default)
    #[default]
    Heuristic,
    /// Ask the generative service to pick the words out.
    Generative,
}

impl FromStr for VocabularyStrategy {
    type Err = Vocab2PostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "heuristic" | "regex" => Ok(Self::Heuristic),
            "generative" | "ai" | "llm" => Ok(Self::Generative),
            other => Err(Vocab2PostError::InvalidConfig(format!(
                "unknown vocabulary strategy '{other}' (expected heuristic or generative)"
            ))),
        }
    }
}
