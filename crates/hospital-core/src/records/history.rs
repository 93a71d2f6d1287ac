//! Doctor assignment history and mass reassignment.

use chrono::NaiveDate;

use super::{Registry, RecordsError, RecordsResult};
use crate::models::{Patient, PatientDoctorHistory, ValidationError, ViewAction};

/// Move a set of patients to a new personal doctor.
#[derive(Debug, Clone, PartialEq)]
pub struct MassReassignment {
    /// Doctor the patients are taken from, used to list candidates
    pub old_doctor_id: Option<String>,
    pub new_doctor_id: String,
    pub patient_ids: Vec<String>,
    /// Defaults to today
    pub change_date: Option<NaiveDate>,
    pub reason: String,
}

/// Outcome of a mass reassignment.
#[derive(Debug, Clone, PartialEq)]
pub struct ReassignOutcome {
    /// Patients that got the new doctor
    pub reassigned: Vec<String>,
    /// Patients already assigned to the new doctor
    pub unchanged: Vec<String>,
    pub action: ViewAction,
}

impl Registry<'_> {
    /// Make `doctor_id` the patient's only active assignment.
    ///
    /// Every other active record of the patient is archived with `date` as
    /// its end date. Callers own the transaction.
    pub(crate) fn record_assignment(
        &self,
        patient_id: &str,
        doctor_id: &str,
        reason: &str,
        date: NaiveDate,
    ) -> RecordsResult<PatientDoctorHistory> {
        let record =
            PatientDoctorHistory::new(patient_id, doctor_id, date, Some(reason.to_string()));
        self.db.insert_history(&record)?;
        let archived = self.db.archive_history_except(patient_id, &record.id, date)?;
        tracing::info!(
            "Assigned doctor {} to patient {} ({} record(s) archived)",
            doctor_id,
            patient_id,
            archived
        );
        Ok(record)
    }

    /// Assignment history of a patient, newest first.
    pub fn patient_history(&self, patient_id: &str) -> RecordsResult<Vec<PatientDoctorHistory>> {
        Ok(self.db.list_history_for_patient(patient_id)?)
    }

    /// Patients currently assigned to `old_doctor_id`; empty without one.
    pub fn eligible_patients(&self, old_doctor_id: Option<&str>) -> RecordsResult<Vec<Patient>> {
        match old_doctor_id {
            Some(id) => Ok(self.db.list_patients_by_doctor(id)?),
            None => Ok(Vec::new()),
        }
    }

    /// Apply a mass reassignment record by record in one transaction.
    pub fn reassign(&self, request: &MassReassignment) -> RecordsResult<ReassignOutcome> {
        if request.reason.trim().is_empty() {
            return Err(ValidationError::Required("Reason").into());
        }
        self.require_doctor(&request.new_doctor_id)?;
        let change_date = request.change_date.unwrap_or_else(|| self.today());

        let tx = self.db.begin()?;
        let mut reassigned = Vec::new();
        let mut unchanged = Vec::new();

        for patient_id in &request.patient_ids {
            let mut patient = self.require_patient(patient_id)?;
            if patient.personal_doctor_id.as_deref() == Some(request.new_doctor_id.as_str()) {
                tracing::debug!("Patient {} already assigned, skipping", patient_id);
                unchanged.push(patient_id.clone());
                continue;
            }

            patient.personal_doctor_id = Some(request.new_doctor_id.clone());
            if !self.db.update_patient(&patient)? {
                return Err(RecordsError::NotFound(format!("Patient {}", patient_id)));
            }
            self.record_assignment(
                patient_id,
                &request.new_doctor_id,
                &request.reason,
                change_date,
            )?;
            reassigned.push(patient_id.clone());
        }

        tx.commit()?;
        tracing::info!(
            "Reassigned {} patient(s) to doctor {}",
            reassigned.len(),
            request.new_doctor_id
        );

        Ok(ReassignOutcome {
            reassigned,
            unchanged,
            action: ViewAction::Close,
        })
    }
}
