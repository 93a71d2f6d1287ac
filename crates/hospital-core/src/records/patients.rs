//! Patient writes with doctor history auditing.

use super::{Registry, RecordsResult};
use crate::models::{
    assignment_changes, ContactPerson, DomainFilter, FilterOp, MedicalDiagnosis, Patient,
    RecordModel, ViewAction, ViewMode,
};

impl Registry<'_> {
    /// Create a patient; an initial doctor opens the first history record.
    pub fn create_patient(&self, patient: Patient) -> RecordsResult<Patient> {
        patient.validate(self.today())?;
        if let Some(doctor_id) = &patient.personal_doctor_id {
            self.require_doctor(doctor_id)?;
        }

        let tx = self.db.begin()?;
        self.db.insert_patient(&patient)?;
        if let Some(doctor_id) = &patient.personal_doctor_id {
            self.record_assignment(
                &patient.id,
                doctor_id,
                &self.config.initial_assignment_reason,
                self.today(),
            )?;
        }
        tx.commit()?;

        tracing::info!("Created patient {}", patient.id);
        Ok(patient)
    }

    /// Update a patient.
    ///
    /// A doctor id different from the stored one opens a new history record
    /// and archives the others. Writing the same doctor, or clearing it,
    /// leaves the history untouched.
    pub fn update_patient(&self, patient: &Patient) -> RecordsResult<()> {
        let stored = self.require_patient(&patient.id)?;
        patient.validate(self.today())?;

        let changes = assignment_changes(
            stored.personal_doctor_id.as_deref(),
            patient.personal_doctor_id.as_deref(),
        );
        if let (true, Some(doctor_id)) = (changes, &patient.personal_doctor_id) {
            self.require_doctor(doctor_id)?;
        }

        let tx = self.db.begin()?;
        self.db.update_patient(patient)?;
        match (changes, &patient.personal_doctor_id) {
            (true, Some(doctor_id)) => {
                self.record_assignment(
                    &patient.id,
                    doctor_id,
                    &self.config.doctor_change_reason,
                    self.today(),
                )?;
            }
            _ => tracing::debug!("Patient {} keeps its doctor assignment", patient.id),
        }
        tx.commit()?;
        Ok(())
    }

    /// Add a contact person; a related patient must have allergies recorded.
    pub fn create_contact_person(&self, contact: ContactPerson) -> RecordsResult<ContactPerson> {
        let patient = match &contact.patient_id {
            Some(id) => Some(self.require_patient(id)?),
            None => None,
        };
        contact.validate(patient.as_ref(), self.today())?;
        self.db.insert_contact_person(&contact)?;
        Ok(contact)
    }

    /// Every diagnosis across the patient's visits.
    pub fn patient_diagnoses(&self, patient_id: &str) -> RecordsResult<Vec<MedicalDiagnosis>> {
        self.require_patient(patient_id)?;
        Ok(self.db.list_diagnoses_for_patient(patient_id)?)
    }

    pub fn patient_visit_count(&self, patient_id: &str) -> RecordsResult<usize> {
        Ok(self.db.list_visits_for_patient(patient_id, None, None)?.len())
    }

    /// Visit list of a patient.
    pub fn patient_visits_action(&self, patient_id: &str) -> RecordsResult<ViewAction> {
        let patient = self.require_patient(patient_id)?;
        Ok(ViewAction::open(
            format!("Visits of {}", patient.full_name()),
            RecordModel::Visit,
            &[ViewMode::List, ViewMode::Form, ViewMode::Calendar],
        )
        .filter(DomainFilter::new("patient_id", FilterOp::Eq, patient.id.clone()))
        .with_context("default_patient_id", patient.id))
    }

    /// New visit form preset with the patient and their personal doctor.
    pub fn patient_new_visit_action(&self, patient_id: &str) -> RecordsResult<ViewAction> {
        let patient = self.require_patient(patient_id)?;
        let mut action = ViewAction::open("New Visit", RecordModel::Visit, &[ViewMode::Form])
            .with_context("default_patient_id", patient.id.clone())
            .in_dialog();
        if let Some(doctor_id) = patient.personal_doctor_id {
            action = action.with_context("default_doctor_id", doctor_id);
        }
        Ok(action)
    }

    /// Allergy warning of a stored patient, if any.
    pub fn allergy_warning(&self, patient_id: &str) -> RecordsResult<Option<String>> {
        Ok(self.require_patient(patient_id)?.allergy_warning())
    }
}
