//! HTTP transport for the Gemini `generateContent` endpoint

use super::config::{CallClass, GeminiConfig};
use super::security::{describe_api_error, redact_key};
use super::types::GenerateContentRequest;
use crate::error::{Error, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Issues a model call and classifies the outcome.
///
/// Implementations return the raw 2xx body unmodified; interpreting the
/// model's text is the normalizer's job.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Send one `generateContent` request
    async fn generate(&self, call: CallClass, request: &GenerateContentRequest) -> Result<String>;
}

/// Gemini REST transport
pub struct GeminiTransport {
    client: Client,
    config: GeminiConfig,
}

impl GeminiTransport {
    /// Create a new transport
    pub fn new(config: GeminiConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(Error::NotConfigured("Gemini API key is empty".to_string()));
        }

        // Timeouts are applied per request, by call class
        let client = Client::builder()
            .build()
            .map_err(|e| Error::Network(e.without_url().to_string()))?;

        Ok(Self { client, config })
    }

    /// Single attempt, no retry.
    async fn send_once(&self, call: CallClass, request: &GenerateContentRequest) -> Result<String> {
        let timeout = self.config.timeout_for(call);
        // SECURITY: Don't log the full URL (contains the API key)
        debug!(
            model = %self.config.model,
            call = call.as_str(),
            timeout_ms = timeout.as_millis() as u64,
            "Sending generateContent request"
        );

        let response = self
            .client
            .post(self.config.endpoint_url())
            .header("content-type", "application/json")
            .timeout(timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| classify_send_error(e, timeout))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| classify_send_error(e, timeout))?;

        if status.is_success() {
            return Ok(body);
        }

        warn!(status = %status, "Gemini API error response");

        if status.as_u16() == 429 {
            return Err(Error::RateLimit);
        }
        // SECURITY: Don't expose raw HTTP response body
        let description = describe_api_error(status.as_u16(), &body);
        if status.is_server_error() {
            return Err(Error::ServerError(description));
        }
        Err(Error::Api(description))
    }
}

#[async_trait::async_trait]
impl Transport for GeminiTransport {
    #[instrument(skip(self, request), fields(call = call.as_str(), model = %self.config.model))]
    async fn generate(&self, call: CallClass, request: &GenerateContentRequest) -> Result<String> {
        let retry = self.config.retry;
        let mut attempt = 0;

        loop {
            match self.send_once(call, request).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_transient() && attempt < retry.max_retries => {
                    let delay = retry.delay_for(attempt);
                    warn!(
                        attempt = attempt + 1,
                        max_retries = retry.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Gemini call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Map a reqwest failure onto the transport taxonomy.
fn classify_send_error(error: reqwest::Error, timeout: Duration) -> Error {
    if error.is_timeout() {
        return Error::Timeout(timeout.as_millis() as u64);
    }
    // The request URL carries the key; drop it before the message goes anywhere
    Error::Network(redact_key(&error.without_url().to_string()))
}
