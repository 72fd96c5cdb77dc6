//! Request builder
//!
//! Turns a [`DiagnosisInput`] (or an assistant conversation) into a
//! `generateContent` request. Prompts and sampling parameters are fixed;
//! callers cannot tune them per request.

use crate::gemini::types::{Content, GenerateContentRequest, GenerationConfig, InlineData, Part};
use crate::gemini::CallClass;
use crate::input::DiagnosisInput;
use serde::{Deserialize, Serialize};

/// Sampling for diagnosis calls: low temperature keeps the JSON shape stable
pub const DIAGNOSIS_GENERATION: GenerationConfig = GenerationConfig {
    temperature: 0.4,
    top_k: 32,
    top_p: 1.0,
    max_output_tokens: 2048,
};

/// Sampling for assistant chat calls
pub const CHAT_GENERATION: GenerationConfig = GenerationConfig {
    temperature: 0.7,
    top_k: 40,
    top_p: 0.95,
    max_output_tokens: 1024,
};

/// JSON the model must return when it cannot diagnose the input
pub const FALLBACK_JSON: &str = r#"{"category": "Không xác định", "problem": "Không thể phân tích vấn đề", "severity": "Không xác định", "solution": "Vui lòng mô tả chi tiết hơn hoặc chụp ảnh rõ hơn để được chẩn đoán chính xác.", "estimatedCost": "Liên hệ để báo giá"}"#;

const RESPONSE_CONTRACT: &str = r#"Trả lời DUY NHẤT bằng một đối tượng JSON với đúng các khóa sau:
{
  "category": "loại thiết bị (ví dụ: Máy Giặt, Tủ Lạnh, Điều Hòa, Máy Nước Nóng, Lò Vi Sóng, Tivi)",
  "problem": "mô tả ngắn gọn vấn đề",
  "severity": "Thấp | Trung Bình | Cao",
  "solution": "hướng dẫn khắc phục hoặc khuyến nghị gọi thợ",
  "estimatedCost": "khoảng chi phí ước tính, ví dụ 200,000đ - 500,000đ"
}"#;

const SYSTEM_PERSONA: &str = "Bạn là trợ lý ảo của Thợ Sửa, nền tảng đặt thợ sửa chữa thiết bị gia dụng. \
Trả lời bằng tiếng Việt, ngắn gọn và thân thiện. Chỉ tư vấn về sửa chữa, bảo dưỡng và sử dụng an toàn \
thiết bị gia dụng. Với sự cố nguy hiểm (rò điện, rò gas, cháy nổ), luôn khuyên người dùng ngắt nguồn và \
gọi thợ chuyên nghiệp. Không đưa ra báo giá chắc chắn; chỉ nêu khoảng giá tham khảo.";

/// Instructional prompt for a text description
#[must_use]
pub fn text_prompt(description: &str) -> String {
    format!(
        "Bạn là chuyên gia chẩn đoán sự cố thiết bị gia dụng.\n\
         Khách hàng mô tả vấn đề như sau: \"{description}\"\n\n\
         {RESPONSE_CONTRACT}\n\n\
         Nếu mô tả không rõ ràng hoặc không liên quan đến thiết bị gia dụng, trả về chính xác JSON sau:\n\
         {FALLBACK_JSON}"
    )
}

/// Instructional prompt accompanying a photo
#[must_use]
pub fn image_prompt() -> String {
    format!(
        "Bạn là chuyên gia chẩn đoán sự cố thiết bị gia dụng.\n\
         Hãy phân tích hình ảnh thiết bị đính kèm, xác định loại thiết bị và sự cố có thể gặp.\n\n\
         {RESPONSE_CONTRACT}\n\n\
         Nếu hình ảnh không rõ hoặc không phải thiết bị gia dụng, trả về chính xác JSON sau:\n\
         {FALLBACK_JSON}"
    )
}

/// Timeout class for an input
#[must_use]
pub fn call_class(input: &DiagnosisInput) -> CallClass {
    match input {
        DiagnosisInput::Text { .. } => CallClass::Chat,
        DiagnosisInput::Image { .. } => CallClass::Vision,
    }
}

/// Build the model request for a diagnosis
#[must_use]
pub fn build_diagnosis_request(input: &DiagnosisInput) -> GenerateContentRequest {
    let parts = match input {
        DiagnosisInput::Text { description } => vec![Part::Text {
            text: text_prompt(description),
        }],
        DiagnosisInput::Image { mime_type, .. } => vec![
            Part::Text {
                text: image_prompt(),
            },
            Part::InlineData {
                inline_data: InlineData {
                    mime_type: mime_type.clone(),
                    data: input.base64_data().unwrap_or_default(),
                },
            },
        ],
    };

    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts,
        }],
        system_instruction: None,
        generation_config: Some(DIAGNOSIS_GENERATION),
    }
}

/// Speaker of an assistant conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Customer
    User,
    /// Assistant
    Model,
}

impl ChatRole {
    /// Wire role name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
        }
    }
}

/// One turn of an assistant conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Speaker
    pub role: ChatRole,
    /// Text
    pub content: String,
}

impl ChatMessage {
    /// Customer turn
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    /// Assistant turn
    #[must_use]
    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            content: content.into(),
        }
    }
}

/// Build an assistant request from prior turns plus the new message
#[must_use]
pub fn build_chat_request(history: &[ChatMessage], message: &str) -> GenerateContentRequest {
    let mut contents: Vec<Content> = history
        .iter()
        .filter(|turn| !turn.content.trim().is_empty())
        .map(|turn| Content::text(Some(turn.role.as_str()), turn.content.clone()))
        .collect();
    contents.push(Content::text(Some(ChatRole::User.as_str()), message));

    GenerateContentRequest {
        contents,
        system_instruction: Some(Content::text(None, SYSTEM_PERSONA)),
        generation_config: Some(CHAT_GENERATION),
    }
}
