//! Error types for thosua-diagnosis
//!
//! Everything except `NotConfigured` and `Io` belongs to the transport
//! family: the call never produced a usable model reply. Malformed replies
//! are not errors at this level, the normalizer recovers them locally.

use thiserror::Error;

/// Diagnosis error type
#[derive(Debug, Error)]
pub enum Error {
    /// Endpoint or credentials not configured
    #[error("not configured: {0}")]
    NotConfigured(String),

    /// Connection failure or unreadable response body
    #[error("network error: {0}")]
    Network(String),

    /// Call exceeded its timeout budget
    #[error("timeout after {0}ms")]
    Timeout(u64),

    /// HTTP 429 from the endpoint
    #[error("rate limit exceeded")]
    RateLimit,

    /// HTTP 5xx from the endpoint
    #[error("server error: {0}")]
    ServerError(String),

    /// Any other non-2xx response
    #[error("api error: {0}")]
    Api(String),

    /// Local input could not be read (e.g. a photo file)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error is a transport failure the caller may retry.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        !matches!(self, Self::NotConfigured(_) | Self::Io(_))
    }

    /// Whether a bounded retry could plausibly succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Timeout(_) | Self::RateLimit | Self::ServerError(_)
        )
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
