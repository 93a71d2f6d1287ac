//! Medical diagnosis models.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::validation::{ValidationError, ValidationResult};

coded_enum! {
    /// Severity of a diagnosis.
    Severity {
        Low => "low",
        Medium => "medium",
        High => "high",
        Severe => "severe",
        Critical => "critical",
    }
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Medium
    }
}

/// A diagnosis made during a visit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicalDiagnosis {
    pub id: String,
    pub visit_id: Option<String>,
    pub disease_id: Option<String>,
    pub description: Option<String>,
    pub treatment: Option<String>,
    pub is_approved: bool,
    pub approving_doctor_id: Option<String>,
    pub approval_date: Option<NaiveDateTime>,
    pub severity: Severity,
}

impl MedicalDiagnosis {
    /// Create an unapproved diagnosis for a visit.
    pub fn new(visit_id: impl Into<String>, disease_id: Option<String>) -> Self {
        Self {
            id: super::new_id(),
            visit_id: Some(visit_id.into()),
            disease_id,
            description: None,
            treatment: None,
            is_approved: false,
            approving_doctor_id: None,
            approval_date: None,
            severity: Severity::default(),
        }
    }

    /// Mark as approved by `doctor_id` at `now`.
    pub fn approve(&mut self, doctor_id: impl Into<String>, now: NaiveDateTime) {
        self.is_approved = true;
        self.approving_doctor_id = Some(doctor_id.into());
        self.approval_date = Some(now);
    }

    /// The approval cannot predate the visit.
    pub fn check_approval_date(&self, visit_date: Option<NaiveDateTime>) -> ValidationResult {
        match (self.approval_date, visit_date) {
            (Some(approved), Some(visited)) if approved < visited => {
                Err(ValidationError::ApprovalBeforeVisit)
            }
            _ => Ok(()),
        }
    }
}
