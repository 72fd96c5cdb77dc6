//! Repair assistant chat
//!
//! Free-form questions about appliance problems, answered under a fixed
//! system instruction. Uses the chat timeout class.

use crate::error::Result;
use crate::gemini::{CallClass, Transport};
use crate::normalize::extract_reply;
use crate::prompt::{build_chat_request, ChatMessage};
use std::sync::Arc;
use tracing::{instrument, warn};

/// Reply used when the model returns no usable text
pub const FALLBACK_REPLY: &str =
    "Xin lỗi, tôi chưa thể trả lời câu hỏi này. Bạn vui lòng thử lại hoặc mô tả chi tiết hơn nhé.";

/// Chat assistant for repair questions
#[derive(Clone)]
pub struct RepairAssistant {
    transport: Arc<dyn Transport>,
}

impl RepairAssistant {
    /// Create an assistant
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Ask a question given the prior conversation
    #[instrument(skip(self, history, message), fields(turns = history.len()))]
    pub async fn ask(&self, history: &[ChatMessage], message: &str) -> Result<String> {
        let request = build_chat_request(history, message);
        let body = self.transport.generate(CallClass::Chat, &request).await?;

        Ok(extract_reply(&body).unwrap_or_else(|| {
            warn!("Assistant reply empty or malformed");
            FALLBACK_REPLY.to_string()
        }))
    }
}
