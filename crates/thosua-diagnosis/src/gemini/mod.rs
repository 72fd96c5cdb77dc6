//! Gemini - Google Gemini `generateContent` transport
//!
//! Wire types, configuration and the reqwest-based transport.

mod config;
mod security;
mod transport;
pub mod types;


pub use config::{
    api_key_from, CallClass, GeminiConfig, RetryPolicy, DEFAULT_BASE_URL, DEFAULT_CHAT_TIMEOUT, DEFAULT_MODEL,
    DEFAULT_VISION_TIMEOUT, API_KEY_VARS,
};
#[cfg(test)]
pub use transport::MockTransport;
pub use transport::{GeminiTransport, Transport};
