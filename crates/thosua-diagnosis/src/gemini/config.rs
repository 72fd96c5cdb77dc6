//! Gemini transport configuration

use crate::error::{Error, Result};
use crate::util::mask_api_key;
use std::fmt;
use std::time::Duration;

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default Gemini model
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Default budget for text (chat) calls
pub const DEFAULT_CHAT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default budget for image (vision) calls: larger payloads, slower processing
pub const DEFAULT_VISION_TIMEOUT: Duration = Duration::from_secs(60);

/// Environment variables holding the API key, in precedence order
pub const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_API_KEY"];

/// First non-empty key among [`API_KEY_VARS`], read through `lookup`.
///
/// Shared by [`GeminiConfig::from_env`] and the application config loader so
/// both agree on precedence.
pub fn api_key_from(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    API_KEY_VARS
        .iter()
        .filter_map(|&name| lookup(name))
        .map(|key| key.trim().to_string())
        .find(|key| !key.is_empty())
}

/// Timeout class of a call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallClass {
    /// Text-only prompt
    Chat,
    /// Prompt carrying an image payload
    Vision,
}

impl CallClass {
    /// Name for logs
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Vision => "vision",
        }
    }
}

/// Bounded retry for transient transport failures.
///
/// The default performs no retries: failures surface immediately and the
/// caller decides whether to try again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// No retries
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Delay before retry number `attempt` (0-based)
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Gemini transport configuration
#[derive(Clone)]
pub struct GeminiConfig {
    /// API key, appended as `?key=` to the endpoint URL
    pub api_key: String,
    /// Base URL
    pub base_url: String,
    /// Model name
    pub model: String,
    /// Timeout for text calls
    pub chat_timeout: Duration,
    /// Timeout for image calls
    pub vision_timeout: Duration,
    /// Retry policy for transient failures
    pub retry: RetryPolicy,
}

// SECURITY: Custom Debug implementation to mask credentials
impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &mask_api_key(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("chat_timeout", &self.chat_timeout)
            .field("vision_timeout", &self.vision_timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

impl GeminiConfig {
    /// Create a new configuration with an API key
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            chat_timeout: DEFAULT_CHAT_TIMEOUT,
            vision_timeout: DEFAULT_VISION_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Reads `GEMINI_API_KEY` (or `GOOGLE_API_KEY`), and optionally
    /// `GEMINI_BASE_URL` and `GEMINI_MODEL`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = api_key_from(&lookup)
            .ok_or_else(|| Error::NotConfigured(API_KEY_VARS.join(" or ")))?;

        let mut config = Self::new(api_key);
        if let Some(base_url) = lookup("GEMINI_BASE_URL") {
            config.base_url = base_url;
        }
        if let Some(model) = lookup("GEMINI_MODEL") {
            config.model = model;
        }
        Ok(config)
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the text call timeout
    #[must_use]
    pub fn with_chat_timeout(mut self, timeout: Duration) -> Self {
        self.chat_timeout = timeout;
        self
    }

    /// Set the image call timeout
    #[must_use]
    pub fn with_vision_timeout(mut self, timeout: Duration) -> Self {
        self.vision_timeout = timeout;
        self
    }

    /// Set the retry policy
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Timeout budget for a call class
    #[must_use]
    pub fn timeout_for(&self, call: CallClass) -> Duration {
        match call {
            CallClass::Chat => self.chat_timeout,
            CallClass::Vision => self.vision_timeout,
        }
    }

    /// Full `generateContent` URL, including the key. Never log this.
    pub(crate) fn endpoint_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url.trim_end_matches('/'),
            self.model,
            self.api_key
        )
    }
}
