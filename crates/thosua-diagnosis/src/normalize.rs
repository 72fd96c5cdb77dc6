//! Response normalizer
//!
//! Turns the model's reply into a [`DiagnosisResult`] without ever failing:
//!
//! 1. extract the first text part of the first candidate
//! 2. strip Markdown code fences around the JSON
//! 3. parse and check the five required string fields
//! 4. on any failure, substitute [`DiagnosisResult::fallback`]
//! 5. attach the technician roster
//!
//! The model is untrusted. A partial parse is never used; every failure
//! collapses to the same canonical fallback record.

use crate::gemini::types::{GenerateContentResponse, Part};
use crate::result::{DiagnosisResult, Severity};
use crate::technicians::TechnicianRoster;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

const FENCE: &str = "```";

/// Keys every diagnosis reply must carry as strings
pub const REQUIRED_FIELDS: [&str; 5] = ["category", "problem", "severity", "solution", "estimatedCost"];

/// Why a reply could not be used.
///
/// Only logged; [`normalize`] recovers every variant with the fallback record.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// Body is not a `generateContent` response
    #[error("malformed response envelope: {0}")]
    Envelope(String),

    /// No candidate text, or only whitespace
    #[error("response contains no text")]
    NoText,

    /// Text is not valid JSON
    #[error("reply is not JSON: {0}")]
    NotJson(String),

    /// JSON is valid but not an object
    #[error("reply JSON is not an object")]
    NotObject,

    /// Required field absent or null
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// Required field present with a non-string value
    #[error("field is not a string: {0}")]
    WrongType(&'static str),
}

/// Normalize a raw `generateContent` body.
#[must_use]
pub fn normalize(body: &str, roster: &TechnicianRoster) -> DiagnosisResult {
    let parsed = extract_text(body).and_then(|text| parse_diagnosis(strip_fences(&text)));
    finish(parsed, roster)
}

/// Normalize an already-extracted reply text.
#[must_use]
pub fn normalize_text(text: &str, roster: &TechnicianRoster) -> DiagnosisResult {
    finish(parse_diagnosis(strip_fences(text)), roster)
}

fn finish(parsed: Result<DiagnosisResult, ParseError>, roster: &TechnicianRoster) -> DiagnosisResult {
    let result = match parsed {
        Ok(result) => {
            debug!(
                category = %result.category,
                severity = %result.severity,
                "Model reply parsed"
            );
            result
        }
        Err(e) => {
            warn!(error = %e, "Model reply unusable, returning fallback diagnosis");
            DiagnosisResult::fallback()
        }
    };
    result.with_technicians(roster.to_vec())
}

/// First text part of the first candidate.
pub fn extract_text(body: &str) -> Result<String, ParseError> {
    let response: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| ParseError::Envelope(e.to_string()))?;

    let candidate = response.candidates.first().ok_or(ParseError::NoText)?;
    if let Some(reason) = candidate.finish_reason.as_deref() {
        if reason != "STOP" {
            debug!(finish_reason = reason, "Candidate finished early");
        }
    }

    candidate
        .content
        .as_ref()
        .and_then(|content| {
            content.parts.iter().find_map(|part| match part {
                Part::Text { text } => Some(text),
                _ => None,
            })
        })
        .filter(|text| !text.trim().is_empty())
        .cloned()
        .ok_or(ParseError::NoText)
}

/// All text parts of the first candidate joined, for free-form replies.
#[must_use]
pub fn extract_reply(body: &str) -> Option<String> {
    let response: GenerateContentResponse = serde_json::from_str(body).ok()?;
    let content = response.candidates.into_iter().next()?.content?;
    let reply: String = content
        .parts
        .into_iter()
        .filter_map(|part| match part {
            Part::Text { text } => Some(text),
            _ => None,
        })
        .collect();
    let reply = reply.trim();
    (!reply.is_empty()).then(|| reply.to_string())
}

/// Remove Markdown code fences around a JSON reply.
///
/// Text that already opens with `{` is raw JSON and is returned trimmed, so
/// fences quoted inside string values survive. Otherwise the first fence is
/// stripped with its language tag (`json` or any other), along with any prose
/// before it and everything from the closing fence on. Text without a fence
/// is returned trimmed. This is a textual trim, not a Markdown parser.
#[must_use]
pub fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    if trimmed.starts_with('{') {
        return trimmed;
    }
    let Some(start) = trimmed.find(FENCE) else {
        return trimmed;
    };

    let mut body = &trimmed[start + FENCE.len()..];
    match body.split_once('\n') {
        Some((tag, rest)) if is_language_tag(tag) => body = rest,
        _ if starts_with_ignore_case(body, "json") => body = &body["json".len()..],
        _ => {}
    }

    if let Some(end) = body.find(FENCE) {
        body = &body[..end];
    }
    body.trim()
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

fn is_language_tag(line: &str) -> bool {
    line.trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '.'))
}

/// Parse fence-free reply text into a diagnosis (no technicians attached).
pub fn parse_diagnosis(text: &str) -> Result<DiagnosisResult, ParseError> {
    let value: Value = serde_json::from_str(text).map_err(|e| ParseError::NotJson(e.to_string()))?;
    let object = value.as_object().ok_or(ParseError::NotObject)?;

    let field = |key: &'static str| -> Result<String, ParseError> {
        match object.get(key) {
            None | Some(Value::Null) => Err(ParseError::MissingField(key)),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(_) => Err(ParseError::WrongType(key)),
        }
    };

    let [category, problem, severity, solution, estimated_cost] = REQUIRED_FIELDS;
    Ok(DiagnosisResult {
        category: field(category)?,
        problem: field(problem)?,
        severity: Severity::from_label(&field(severity)?),
        solution: field(solution)?,
        estimated_cost: field(estimated_cost)?,
        recommended_technicians: Vec::new(),
    })
}
