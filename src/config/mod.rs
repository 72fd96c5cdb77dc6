//! Application configuration types
//!
//! Deserialized from the layered sources in [`loader`].

pub mod loader;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thosua_diagnosis::util::{check_api_key, mask_api_key, KeyProblem};
use thosua_diagnosis::{GeminiConfig, RetryPolicy, TechnicianRoster, TechnicianSummary};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub gemini: GeminiSettings,
    /// Recommended technicians; empty means the built-in roster
    #[serde(default)]
    pub technicians: Vec<TechnicianSummary>,
}

impl AppConfig {
    pub fn roster(&self) -> TechnicianRoster {
        TechnicianRoster::new(self.technicians.clone())
    }
}

/// `[gemini]` section
#[derive(Clone, Serialize, Deserialize)]
pub struct GeminiSettings {
    /// Blank means "take it from GEMINI_API_KEY / GOOGLE_API_KEY" (see [`loader`])
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_chat_timeout_secs")]
    pub chat_timeout_secs: u64,
    #[serde(default = "default_vision_timeout_secs")]
    pub vision_timeout_secs: u64,
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
}

fn default_base_url() -> String {
    thosua_diagnosis::gemini::DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    thosua_diagnosis::gemini::DEFAULT_MODEL.to_string()
}

fn default_chat_timeout_secs() -> u64 {
    thosua_diagnosis::gemini::DEFAULT_CHAT_TIMEOUT.as_secs()
}

fn default_vision_timeout_secs() -> u64 {
    thosua_diagnosis::gemini::DEFAULT_VISION_TIMEOUT.as_secs()
}

fn default_retry_base_delay_ms() -> u64 {
    500
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            model: default_model(),
            chat_timeout_secs: default_chat_timeout_secs(),
            vision_timeout_secs: default_vision_timeout_secs(),
            max_retries: 0,
            retry_base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}

// SECURITY: Custom Debug implementation to mask credentials
impl fmt::Debug for GeminiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiSettings")
            .field("api_key", &mask_api_key(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("chat_timeout_secs", &self.chat_timeout_secs)
            .field("vision_timeout_secs", &self.vision_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_base_delay_ms", &self.retry_base_delay_ms)
            .finish()
    }
}

impl GeminiSettings {
    /// Key after layering, `None` when blank
    pub fn api_key(&self) -> Option<&str> {
        Some(self.api_key.trim()).filter(|key| !key.is_empty())
    }

    /// Build the transport configuration
    pub fn to_gemini_config(&self) -> Result<GeminiConfig> {
        let Some(api_key) = self.api_key() else {
            bail!("Gemini API key not configured. Set GEMINI_API_KEY or [gemini] api_key.");
        };

        Ok(GeminiConfig::new(api_key)
            .with_base_url(&self.base_url)
            .with_model(&self.model)
            .with_chat_timeout(Duration::from_secs(self.chat_timeout_secs))
            .with_vision_timeout(Duration::from_secs(self.vision_timeout_secs))
            .with_retry(RetryPolicy {
                max_retries: self.max_retries,
                base_delay: Duration::from_millis(self.retry_base_delay_ms),
            }))
    }
}

pub struct ConfigValidator;

impl ConfigValidator {
    /// Upper bound on configured retries
    const MAX_RETRIES: u32 = 5;

    /// Every problem found, empty when the configuration is usable
    pub fn validate(config: &AppConfig) -> Vec<String> {
        let gemini = &config.gemini;
        let mut issues = Vec::new();

        match gemini.api_key().map(check_api_key) {
            Some(Ok(())) => {}
            Some(Err(problem)) => issues.push(problem.to_string()),
            None => issues.push(KeyProblem::Missing.to_string()),
        }
        if let Err(e) = Self::validate_base_url(&gemini.base_url) {
            issues.push(e);
        }
        if gemini.chat_timeout_secs == 0 {
            issues.push("gemini.chat_timeout_secs cannot be 0".to_string());
        }
        if gemini.vision_timeout_secs == 0 {
            issues.push("gemini.vision_timeout_secs cannot be 0".to_string());
        }
        if gemini.max_retries > Self::MAX_RETRIES {
            issues.push(format!(
                "gemini.max_retries is {}, maximum is {}",
                gemini.max_retries,
                Self::MAX_RETRIES
            ));
        }
        for technician in &config.technicians {
            if !(0.0..=5.0).contains(&technician.rating) {
                issues.push(format!(
                    "Technician '{}' has rating {} (expected 0-5)",
                    technician.name, technician.rating
                ));
            }
        }
        issues
    }

    pub fn validate_base_url(url: &str) -> Result<(), String> {
        if url.starts_with("https://") || url.starts_with("http://") {
            Ok(())
        } else {
            Err(format!(
                "Invalid gemini.base_url '{}'. Must start with http:// or https://",
                url
            ))
        }
    }
}
