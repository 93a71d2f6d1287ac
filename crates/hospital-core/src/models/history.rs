//! Patient doctor assignment history.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One assignment of a doctor to a patient.
///
/// At most one record per patient is active; the others are archived with an
/// end date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientDoctorHistory {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub assign_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub change_reason: Option<String>,
    pub active: bool,
}

impl PatientDoctorHistory {
    /// Create a new active assignment.
    pub fn new(
        patient_id: impl Into<String>,
        doctor_id: impl Into<String>,
        assign_date: NaiveDate,
        change_reason: Option<String>,
    ) -> Self {
        Self {
            id: super::new_id(),
            patient_id: patient_id.into(),
            doctor_id: doctor_id.into(),
            assign_date,
            end_date: None,
            change_reason,
            active: true,
        }
    }

    /// Close this assignment.
    pub fn archive(&mut self, end_date: NaiveDate) {
        self.active = false;
        self.end_date = Some(end_date);
    }
}

/// Whether writing `requested` over `current` changes the assignment.
///
/// Clearing the doctor is a change of the patient record but does not open a
/// new assignment, so it yields `false` here.
pub fn assignment_changes(current: Option<&str>, requested: Option<&str>) -> bool {
    match requested {
        Some(new_doctor) => current != Some(new_doctor),
        None => false,
    }
}
