//! Diagnosis input types
//!
//! A diagnosis starts from either a free-text description or a photo of the
//! appliance. Validating that the description is non-empty or that the photo
//! decodes is left to the caller.

use crate::error::Result;
use base64::Engine as _;
use std::fmt;
use std::path::Path;

/// MIME type used for `.png` sources
pub const MIME_PNG: &str = "image/png";

/// MIME type used for every other image source
pub const MIME_JPEG: &str = "image/jpeg";

/// What the customer submitted for diagnosis
#[derive(Clone, PartialEq, Eq)]
pub enum DiagnosisInput {
    /// Free-text problem description
    Text {
        /// Customer's description of the issue
        description: String,
    },
    /// Photo of the appliance
    Image {
        /// Raw image bytes (encoded to base64 on the wire)
        bytes: Vec<u8>,
        /// MIME type sent alongside the bytes
        mime_type: String,
    },
}

impl DiagnosisInput {
    /// Create a text input
    #[must_use]
    pub fn text(description: impl Into<String>) -> Self {
        Self::Text {
            description: description.into(),
        }
    }

    /// Create an image input, inferring the MIME type from `source_name`.
    ///
    /// Only the file name is inspected: `.png` maps to `image/png` and
    /// everything else is sent as `image/jpeg`. The bytes are not sniffed.
    #[must_use]
    pub fn image(bytes: Vec<u8>, source_name: &str) -> Self {
        Self::Image {
            bytes,
            mime_type: mime_type_for(source_name).to_string(),
        }
    }

    /// Read a photo from disk.
    pub async fn image_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        Ok(Self::image(bytes, &path.to_string_lossy()))
    }

    /// Variant name, safe for logs
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Image { .. } => "image",
        }
    }

    /// Base64 payload for image inputs
    #[must_use]
    pub fn base64_data(&self) -> Option<String> {
        match self {
            Self::Image { bytes, .. } => {
                Some(base64::engine::general_purpose::STANDARD.encode(bytes))
            }
            Self::Text { .. } => None,
        }
    }
}

// Descriptions are customer content and image payloads are large; keep both out of logs.
impl fmt::Debug for DiagnosisInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text { description } => f
                .debug_struct("Text")
                .field("description_len", &description.chars().count())
                .finish(),
            Self::Image { bytes, mime_type } => f
                .debug_struct("Image")
                .field("bytes", &bytes.len())
                .field("mime_type", mime_type)
                .finish(),
        }
    }
}

/// MIME type from a source file name
#[must_use]
pub fn mime_type_for(source_name: &str) -> &'static str {
    if source_name.to_ascii_lowercase().ends_with(".png") {
        MIME_PNG
    } else {
        MIME_JPEG
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_type_from_name() {
        assert_eq!(mime_type_for("may-giat.png"), MIME_PNG);
        assert_eq!(mime_type_for("IMG_0042.PNG"), MIME_PNG);
        assert_eq!(mime_type_for("tu-lanh.jpg"), MIME_JPEG);
        assert_eq!(mime_type_for("photo.heic"), MIME_JPEG);
        // name only, no content sniffing
        assert_eq!(mime_type_for("png"), MIME_JPEG);
    }

    #[test]
    fn test_image_input_base64() {
        let input = DiagnosisInput::image(vec![0x89, b'P', b'N', b'G'], "a.png");
        assert_eq!(input.kind(), "image");
        assert_eq!(input.base64_data().as_deref(), Some("iVBORw=="));
        match input {
            DiagnosisInput::Image { mime_type, .. } => assert_eq!(mime_type, MIME_PNG),
            DiagnosisInput::Text { .. } => panic!("Expected image input"),
        }
    }

    #[test]
    fn test_text_input_has_no_payload() {
        let input = DiagnosisInput::text("Máy giặt không vắt được");
        assert_eq!(input.kind(), "text");
        assert!(input.base64_data().is_none());
    }

    #[test]
    fn test_debug_hides_content() {
        let input = DiagnosisInput::text("Tủ lạnh chảy nước");
        let debug_str = format!("{:?}", input);
        assert!(!debug_str.contains("chảy nước"));
        assert!(debug_str.contains("description_len"));
    }

    #[tokio::test]
    async fn test_image_from_missing_path() {
        let err = DiagnosisInput::image_from_path("/nonexistent/thosua/photo.jpg")
            .await
            .unwrap_err();
        assert!(!err.is_transport());
    }
}
