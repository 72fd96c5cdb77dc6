//! Diagnosis result types
//!
//! A [`DiagnosisResult`] is always fully populated. An undetermined
//! diagnosis and a reply that could not be parsed share this shape and are
//! told apart only by sentinel strings.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Sentinel for an undetermined category or severity
pub const UNDETERMINED: &str = "Không xác định";

/// Fallback problem description
pub const FALLBACK_PROBLEM: &str = "Không thể phân tích vấn đề";

/// Fallback remediation guidance
pub const FALLBACK_SOLUTION: &str =
    "Vui lòng mô tả chi tiết hơn hoặc chụp ảnh rõ hơn để được chẩn đoán chính xác.";

/// Sentinel for "contact for quote"
pub const CONTACT_FOR_QUOTE: &str = "Liên hệ để báo giá";

/// Issue severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Thấp
    Low,
    /// Trung Bình
    Medium,
    /// Cao
    High,
    /// Không xác định
    Undetermined,
}

impl Severity {
    /// Canonical label
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Thấp",
            Self::Medium => "Trung Bình",
            Self::High => "Cao",
            Self::Undetermined => UNDETERMINED,
        }
    }

    /// Map a model-provided label onto the closed set.
    ///
    /// A label that opens with a known level as a whole word
    /// ("Trung bình - cần xử lý sớm") maps to that level. Anything else is
    /// `Undetermined`; severity is free text on the wire so this never fails.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        const LEVELS: [(&str, Severity); 10] = [
            ("trung bình", Severity::Medium),
            ("nghiêm trọng", Severity::High),
            ("thấp", Severity::Low),
            ("nhẹ", Severity::Low),
            ("low", Severity::Low),
            ("medium", Severity::Medium),
            ("moderate", Severity::Medium),
            ("cao", Severity::High),
            ("high", Severity::High),
            ("severe", Severity::High),
        ];

        let label = label.trim().to_lowercase();
        LEVELS
            .iter()
            .find(|(level, _)| {
                label.strip_prefix(*level).is_some_and(|rest| {
                    !rest.starts_with(|c: char| c.is_alphanumeric())
                })
            })
            .map_or(Self::Undetermined, |(_, severity)| *severity)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Self::from_label(&label))
    }
}

/// A technician recommended alongside a diagnosis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicianSummary {
    /// Display name
    pub name: String,
    /// Average rating out of 5
    pub rating: f32,
    /// Completed jobs
    pub jobs: u32,
    /// Appliance specialty
    pub specialty: String,
    /// Starting price, display string
    pub price: String,
}

/// Normalized diagnosis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisResult {
    /// Appliance class, or [`UNDETERMINED`]
    pub category: String,
    /// Issue description
    pub problem: String,
    /// Severity
    pub severity: Severity,
    /// Remediation guidance
    pub solution: String,
    /// Human-readable cost range, or [`CONTACT_FOR_QUOTE`]
    pub estimated_cost: String,
    /// Technicians attached after parsing, never produced by the model
    #[serde(default)]
    pub recommended_technicians: Vec<TechnicianSummary>,
}

/// Diagnosis fields forwarded to the booking flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingContext {
    /// Appliance class
    pub category: String,
    /// Issue description
    pub problem: String,
}

impl DiagnosisResult {
    /// The canonical fallback record, without technicians
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            category: UNDETERMINED.to_string(),
            problem: FALLBACK_PROBLEM.to_string(),
            severity: Severity::Undetermined,
            solution: FALLBACK_SOLUTION.to_string(),
            estimated_cost: CONTACT_FOR_QUOTE.to_string(),
            recommended_technicians: Vec::new(),
        }
    }

    /// Attach the recommended technicians
    #[must_use]
    pub fn with_technicians(mut self, technicians: Vec<TechnicianSummary>) -> Self {
        self.recommended_technicians = technicians;
        self
    }

    /// Whether the model (or the fallback) could not identify the appliance
    #[must_use]
    pub fn is_undetermined(&self) -> bool {
        self.category == UNDETERMINED
    }

    /// Category and problem for the booking form
    #[must_use]
    pub fn booking_context(&self) -> BookingContext {
        BookingContext {
            category: self.category.clone(),
            problem: self.problem.clone(),
        }
    }
}
