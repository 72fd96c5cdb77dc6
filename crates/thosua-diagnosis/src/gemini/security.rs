//! Gemini error replies, reduced to what a customer may see
//!
//! Upstream error bodies can echo the request URL (and with it the key),
//! quota project ids or stack details. Only a short Vietnamese description
//! plus the HTTP code leaves this module; the raw detail is logged at
//! `debug` and dropped.

use super::types::GeminiError;
use crate::util::truncate_safe;
use tracing::{debug, warn};

/// Longest upstream message quoted back for a rejected request
const MAX_QUOTED_BYTES: usize = 200;

/// Coarse reason a call was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ApiFailure {
    /// Key missing, invalid or lacking permission
    Credentials,
    /// Quota or rate limit
    Quota,
    /// Configured model does not exist
    UnknownModel,
    /// Request shape refused (bad argument, image too large, ...)
    Rejected,
    /// Upstream outage
    Unavailable,
}

impl ApiFailure {
    /// Classify from the HTTP code, the gRPC-style `status` and the message.
    ///
    /// Gemini reports a bad key as `INVALID_ARGUMENT`, so the message is
    /// checked for credential wording before the status is trusted.
    pub(crate) fn classify(http_status: u16, status: &str, message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("api key")
            || lower.contains("apikey")
            || lower.contains("key=")
            || lower.contains("unauthorized")
            || lower.contains("permission denied")
        {
            return Self::Credentials;
        }

        match (status, http_status) {
            ("UNAUTHENTICATED" | "PERMISSION_DENIED", _) | (_, 401 | 403) => Self::Credentials,
            ("RESOURCE_EXHAUSTED", _) | (_, 429) => Self::Quota,
            ("NOT_FOUND", _) | (_, 404) => Self::UnknownModel,
            ("INTERNAL" | "UNAVAILABLE" | "DEADLINE_EXCEEDED", _) => Self::Unavailable,
            (_, code) if code >= 500 => Self::Unavailable,
            _ if lower.contains("quota") => Self::Quota,
            _ => Self::Rejected,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Self::Credentials => "Khóa API Gemini không hợp lệ hoặc chưa được cấp quyền",
            Self::Quota => "Dịch vụ chẩn đoán đã hết hạn mức, vui lòng thử lại sau",
            Self::UnknownModel => "Không tìm thấy mô hình Gemini đã cấu hình",
            Self::Rejected => "Yêu cầu chẩn đoán bị từ chối",
            Self::Unavailable => "Dịch vụ chẩn đoán tạm thời gián đoạn",
        }
    }
}

/// User-facing description of a non-2xx `generateContent` reply.
pub(crate) fn describe_api_error(http_status: u16, body: &str) -> String {
    let (status, message) = match serde_json::from_str::<GeminiError>(body) {
        Ok(error) => {
            warn!(
                error_status = %error.error.status,
                error_code = error.error.code,
                "Gemini API error detail"
            );
            (error.error.status, error.error.message)
        }
        Err(_) => (String::new(), String::new()),
    };
    debug!(detail = %redact_key(&message), "Gemini error message");

    let failure = ApiFailure::classify(http_status, &status, &message);
    match failure {
        // Argument errors are the only ones whose wording helps the user
        ApiFailure::Rejected if !message.is_empty() => format!(
            "{} (HTTP {}): {}",
            failure.describe(),
            http_status,
            truncate_safe(&redact_key(&message), MAX_QUOTED_BYTES)
        ),
        _ => format!("{} (HTTP {})", failure.describe(), http_status),
    }
}

/// Replace every `key=<value>` query parameter value with `***`.
pub(crate) fn redact_key(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find("key=") {
        let (head, tail) = rest.split_at(pos + "key=".len());
        out.push_str(head);
        out.push_str("***");
        let end = tail
            .find(|c: char| c == '&' || c == ')' || c == '"' || c.is_whitespace())
            .unwrap_or(tail.len());
        rest = &tail[end..];
    }
    out.push_str(rest);
    out
}
