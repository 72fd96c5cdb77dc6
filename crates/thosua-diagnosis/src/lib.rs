//! Thợ Sửa Diagnosis - AI-assisted appliance diagnosis
//!
//! This crate turns a customer's description or photo of a broken appliance
//! into a structured diagnosis:
//! - Input: text or image diagnosis input
//! - Prompt: request builder for diagnosis and assistant calls
//! - Gemini: `generateContent` wire types, configuration and HTTP transport
//! - Normalize: model reply → validated `DiagnosisResult`, with fallback
//! - Diagnosis: the end-to-end pipeline
//! - Assistant: free-form repair chat

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod assistant;
pub mod diagnosis;
pub mod error;
pub mod gemini;
pub mod input;
pub mod normalize;
pub mod prompt;
pub mod result;
pub mod technicians;
pub mod util;

pub use assistant::RepairAssistant;
pub use diagnosis::Diagnoser;
pub use error::{Error, Result};
pub use gemini::{CallClass, GeminiConfig, GeminiTransport, RetryPolicy, Transport};
pub use input::DiagnosisInput;
pub use prompt::{ChatMessage, ChatRole};
pub use result::{BookingContext, DiagnosisResult, Severity, TechnicianSummary};
pub use technicians::TechnicianRoster;
