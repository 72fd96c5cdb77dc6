//! Key handling and text helpers shared by the transport and the CLI

use thiserror::Error;

/// Keys this short are never partially shown
const MIN_MASKABLE_CHARS: usize = 12;

/// Characters kept visible at each end of a masked key
const VISIBLE_CHARS: usize = 4;

/// Shortest key accepted by [`check_api_key`]; real Gemini keys are 39 characters
const MIN_KEY_CHARS: usize = 16;

/// Mask an API key for logs and `doctor` output.
///
/// Keeps four characters at each end (enough to tell an `AIza…` Gemini key
/// from a pasted placeholder) and counts characters, not bytes.
///
/// # Examples
/// ```
/// use thosua_diagnosis::util::mask_api_key;
/// assert_eq!(mask_api_key("AIza1234567890abcdef"), "AIza…cdef");
/// assert_eq!(mask_api_key("short"), "****");
/// ```
#[must_use]
pub fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() < MIN_MASKABLE_CHARS {
        return "****".to_string();
    }
    let head: String = chars[..VISIBLE_CHARS].iter().collect();
    let tail: String = chars[chars.len() - VISIBLE_CHARS..].iter().collect();
    format!("{head}…{tail}")
}

/// Truncate to at most `max_bytes` without splitting a UTF-8 character.
#[must_use]
pub fn truncate_safe(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Shape problems with a configured API key
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyProblem {
    /// No key at all
    #[error("Gemini API key is required (GEMINI_API_KEY or [gemini] api_key)")]
    Missing,

    /// Fewer characters than any real key
    #[error("Gemini API key looks truncated ({0} characters)")]
    TooShort(usize),

    /// Copied from a `.env` line with its quotes
    #[error("Gemini API key is wrapped in quotes")]
    Quoted,

    /// Spaces or line breaks inside the key
    #[error("Gemini API key contains whitespace")]
    Whitespace,
}

/// Check that a key is plausibly usable before any request is sent.
pub fn check_api_key(key: &str) -> Result<(), KeyProblem> {
    if key.is_empty() {
        return Err(KeyProblem::Missing);
    }
    if key.starts_with(['"', '\'']) || key.ends_with(['"', '\'']) {
        return Err(KeyProblem::Quoted);
    }
    if key.chars().any(char::is_whitespace) {
        return Err(KeyProblem::Whitespace);
    }
    let len = key.chars().count();
    if len < MIN_KEY_CHARS {
        return Err(KeyProblem::TooShort(len));
    }
    Ok(())
}
