//! Patient visit models and the visit lifecycle guard.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::validation::{ValidationError, ValidationResult};

coded_enum! {
    /// Visit status. `Planned` may move to any other status.
    VisitStatus {
        Planned => "planned",
        Completed => "completed",
        Cancelled => "cancelled",
        Missed => "missed",
    }
}

coded_enum! {
    /// Kind of visit.
    VisitType {
        Primary => "primary",
        Repeat => "repeat",
        Preventive => "preventive",
        Urgent => "urgent",
    }
}

/// A patient visit to a doctor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Visit {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: String,
    /// Mentor of the doctor when the doctor is an intern
    pub mentor_id: Option<String>,
    pub status: VisitStatus,
    /// Planned visit date and time
    pub visit_date: NaiveDateTime,
    /// Stamped once, when the visit is completed
    pub actual_visit_date: Option<NaiveDateTime>,
    pub visit_type: VisitType,
    pub recommendations: Option<String>,
    /// ISO currency code of `cost`
    pub currency: String,
    pub cost: Option<f64>,
}

impl Visit {
    /// Create a planned primary visit.
    pub fn new(
        patient_id: impl Into<String>,
        doctor_id: impl Into<String>,
        visit_date: NaiveDateTime,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            id: super::new_id(),
            patient_id: patient_id.into(),
            doctor_id: doctor_id.into(),
            mentor_id: None,
            status: VisitStatus::Planned,
            visit_date,
            actual_visit_date: None,
            visit_type: VisitType::Primary,
            recommendations: None,
            currency: currency.into(),
            cost: None,
        }
    }

    /// Calendar day of the planned visit.
    pub fn visit_day(&self) -> NaiveDate {
        self.visit_date.date()
    }

    pub fn is_completed(&self) -> bool {
        self.status == VisitStatus::Completed
    }

    /// `Patient Name @ YYYY-MM-DD HH:MM`.
    pub fn display_name(&self, patient_name: Option<&str>) -> String {
        format!(
            "{} @ {}",
            patient_name.unwrap_or("Unknown Patient"),
            self.visit_date.format("%Y-%m-%d %H:%M")
        )
    }

    /// Reject an update that is not allowed in the current state.
    pub fn check_update(&self, update: &VisitUpdate) -> ValidationResult {
        if self.is_completed() && update.touches_identity() {
            return Err(ValidationError::CompletedVisitLocked);
        }
        Ok(())
    }

    /// Apply an already checked update.
    ///
    /// Moving to `Completed` stamps `actual_visit_date` with `now` unless it
    /// was stamped before. The mentor is not touched here; callers recompute
    /// it when the doctor changes.
    pub fn apply_update(&mut self, update: VisitUpdate, now: NaiveDateTime) {
        if let Some(patient_id) = update.patient_id {
            self.patient_id = patient_id;
        }
        if let Some(doctor_id) = update.doctor_id {
            self.doctor_id = doctor_id;
        }
        if let Some(visit_date) = update.visit_date {
            self.visit_date = visit_date;
        }
        if let Some(visit_type) = update.visit_type {
            self.visit_type = visit_type;
        }
        if let Some(recommendations) = update.recommendations {
            self.recommendations = Some(recommendations);
        }
        if let Some(cost) = update.cost {
            self.cost = Some(cost);
        }
        if let Some(status) = update.status {
            if status == VisitStatus::Completed && self.actual_visit_date.is_none() {
                self.actual_visit_date = Some(now);
            }
            self.status = status;
        }
    }
}

/// A partial visit update; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VisitUpdate {
    pub patient_id: Option<String>,
    pub doctor_id: Option<String>,
    pub visit_date: Option<NaiveDateTime>,
    pub status: Option<VisitStatus>,
    pub visit_type: Option<VisitType>,
    pub recommendations: Option<String>,
    pub cost: Option<f64>,
}

impl VisitUpdate {
    pub fn status(status: VisitStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Whether the update writes patient, doctor or visit date.
    pub fn touches_identity(&self) -> bool {
        self.patient_id.is_some() || self.doctor_id.is_some() || self.visit_date.is_some()
    }
}
