//! Recommended technician roster
//!
//! The roster is attached to every diagnosis by the normalizer. The model
//! never chooses technicians.

use crate::result::TechnicianSummary;

/// Ordered list of technicians recommended with each diagnosis
#[derive(Debug, Clone, PartialEq)]
pub struct TechnicianRoster {
    technicians: Vec<TechnicianSummary>,
}

impl Default for TechnicianRoster {
    fn default() -> Self {
        Self {
            technicians: vec![
                TechnicianSummary {
                    name: "Nguyễn Văn An".to_string(),
                    rating: 4.8,
                    jobs: 156,
                    specialty: "Điện lạnh".to_string(),
                    price: "150,000đ".to_string(),
                },
                TechnicianSummary {
                    name: "Trần Minh Tuấn".to_string(),
                    rating: 4.9,
                    jobs: 203,
                    specialty: "Máy giặt".to_string(),
                    price: "200,000đ".to_string(),
                },
            ],
        }
    }
}

impl TechnicianRoster {
    /// Build a roster from configuration.
    ///
    /// An empty list yields the default roster.
    #[must_use]
    pub fn new(technicians: Vec<TechnicianSummary>) -> Self {
        if technicians.is_empty() {
            return Self::default();
        }
        Self { technicians }
    }

    /// Technicians in recommendation order
    #[must_use]
    pub fn technicians(&self) -> &[TechnicianSummary] {
        &self.technicians
    }

    /// Owned copy for attaching to a result
    #[must_use]
    pub fn to_vec(&self) -> Vec<TechnicianSummary> {
        self.technicians.clone()
    }

    /// Number of technicians
    #[must_use]
    pub fn len(&self) -> usize {
        self.technicians.len()
    }

    /// Always false for rosters built through this type
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.technicians.is_empty()
    }
}
