//! Doctor writes and doctor-centric views.

use super::{Registry, RecordsError, RecordsResult};
use crate::models::{
    Doctor, DomainFilter, FilterOp, RecordModel, ViewAction, ViewMode, VisitStatus,
};

impl Registry<'_> {
    /// Create a doctor after checking the mentor rules.
    pub fn create_doctor(&self, mut doctor: Doctor) -> RecordsResult<Doctor> {
        doctor.set_intern(doctor.is_intern);
        self.validate_doctor(&doctor)?;
        self.db.insert_doctor(&doctor)?;
        tracing::info!("Created doctor {} ({})", doctor.id, doctor.full_name());
        Ok(doctor)
    }

    pub fn update_doctor(&self, doctor: &Doctor) -> RecordsResult<Doctor> {
        let mut doctor = doctor.clone();
        doctor.set_intern(doctor.is_intern);
        self.validate_doctor(&doctor)?;
        if !self.db.update_doctor(&doctor)? {
            return Err(RecordsError::NotFound(format!("Doctor {}", doctor.id)));
        }
        Ok(doctor)
    }

    /// Deactivate a doctor. Fails while planned visits remain.
    pub fn archive_doctor(&self, doctor_id: &str) -> RecordsResult<()> {
        let mut doctor = self.require_doctor(doctor_id)?;
        let planned = self
            .db
            .list_visits_for_doctor(doctor_id, VisitStatus::Planned)?;
        if !planned.is_empty() {
            return Err(RecordsError::State(format!(
                "Doctor {} still has {} planned visit(s)",
                doctor.full_name(),
                planned.len()
            )));
        }
        doctor.active = false;
        self.db.update_doctor(&doctor)?;
        tracing::info!("Archived doctor {}", doctor_id);
        Ok(())
    }

    /// `Full Name (Speciality)` for a stored doctor.
    pub fn doctor_display_name(&self, doctor: &Doctor) -> RecordsResult<String> {
        let speciality = match &doctor.speciality_id {
            Some(id) => self.db.get_speciality(id)?,
            None => None,
        };
        Ok(doctor.display_name(speciality.as_ref().map(|s| s.name.as_str())))
    }

    /// Patients who speak the doctor's language.
    pub fn patients_by_language_action(&self, doctor_id: &str) -> RecordsResult<ViewAction> {
        let doctor = self.require_doctor(doctor_id)?;
        let Some(language) = doctor.person.language_code.clone() else {
            return Err(RecordsError::State(format!(
                "Doctor {} has no communication language set",
                doctor.full_name()
            )));
        };

        Ok(ViewAction::open(
            format!("Patients speaking {}", language),
            RecordModel::Patient,
            &[ViewMode::List, ViewMode::Form],
        )
        .filter(DomainFilter::new("language_code", FilterOp::Eq, language)))
    }

    /// New visit form preset with this doctor.
    pub fn doctor_new_visit_action(&self, doctor_id: &str) -> RecordsResult<ViewAction> {
        let doctor = self.require_doctor(doctor_id)?;
        Ok(
            ViewAction::open("New Visit", RecordModel::Visit, &[ViewMode::Form])
                .with_context("default_doctor_id", doctor.id)
                .in_dialog(),
        )
    }

    fn validate_doctor(&self, doctor: &Doctor) -> RecordsResult<()> {
        let mentor = match &doctor.mentor_id {
            Some(id) if id != &doctor.id => Some(self.require_doctor(id)?),
            _ => None,
        };
        doctor.validate(mentor.as_ref(), self.today())?;
        Ok(())
    }
}
