//! Diagnosis pipeline
//!
//! input → request builder → transport → normalizer → [`DiagnosisResult`].
//! The pipeline holds no per-call state, so one [`Diagnoser`] can serve any
//! number of concurrent requests. Dropping a pending `diagnose` future
//! abandons the HTTP call locally; the endpoint may still process it.

use crate::error::Result;
use crate::gemini::Transport;
use crate::input::DiagnosisInput;
use crate::normalize::normalize;
use crate::prompt::{build_diagnosis_request, call_class};
use crate::result::DiagnosisResult;
use crate::technicians::TechnicianRoster;
use std::sync::Arc;
use tracing::{info, instrument};

/// Runs diagnoses against a model transport
#[derive(Clone)]
pub struct Diagnoser {
    transport: Arc<dyn Transport>,
    roster: TechnicianRoster,
}

impl Diagnoser {
    /// Create a diagnoser
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, roster: TechnicianRoster) -> Self {
        Self { transport, roster }
    }

    /// Technicians attached to every result
    #[must_use]
    pub fn roster(&self) -> &TechnicianRoster {
        &self.roster
    }

    /// Diagnose an appliance problem.
    ///
    /// Transport failures are returned to the caller. An unusable model reply
    /// is not an error: it yields the fallback record.
    #[instrument(
        skip(self, input),
        fields(request_id = %uuid::Uuid::new_v4(), kind = input.kind())
    )]
    pub async fn diagnose(&self, input: &DiagnosisInput) -> Result<DiagnosisResult> {
        let request = build_diagnosis_request(input);
        let body = self.transport.generate(call_class(input), &request).await?;
        let result = normalize(&body, &self.roster);

        info!(
            category = %result.category,
            severity = %result.severity,
            undetermined = result.is_undetermined(),
            "Diagnosis complete"
        );
        Ok(result)
    }
}
