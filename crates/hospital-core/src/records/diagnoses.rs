//! Diagnosis recording and approval.

use chrono::{Duration, NaiveDateTime};

use super::{Registry, RecordsError, RecordsResult};
use crate::models::{Disease, MedicalDiagnosis, Visit};

impl Registry<'_> {
    /// Record a diagnosis. Visit and disease, when set, must exist.
    pub fn add_diagnosis(&self, diagnosis: MedicalDiagnosis) -> RecordsResult<MedicalDiagnosis> {
        let visit = match &diagnosis.visit_id {
            Some(id) => Some(self.require_visit(id)?),
            None => None,
        };
        if let Some(disease_id) = &diagnosis.disease_id {
            if self.db.get_disease(disease_id)?.is_none() {
                return Err(RecordsError::NotFound(format!("Disease {}", disease_id)));
            }
        }
        diagnosis.check_approval_date(visit.map(|v| v.visit_date))?;
        self.db.insert_diagnosis(&diagnosis)?;
        Ok(diagnosis)
    }

    /// Approve diagnoses on behalf of `acting_user_id`.
    ///
    /// The user must be linked to a doctor. Diagnoses of visits led by an
    /// intern can only be approved by that intern's mentor. Either every
    /// diagnosis is approved or none is.
    pub fn approve_diagnoses(
        &self,
        diagnosis_ids: &[String],
        acting_user_id: &str,
    ) -> RecordsResult<Vec<MedicalDiagnosis>> {
        let approver = match self.db.get_doctor_by_user(acting_user_id)? {
            Some(doctor) => doctor,
            None => {
                tracing::warn!("User {} has no doctor profile, approval rejected", acting_user_id);
                return Err(RecordsError::Permission(
                    "Only doctors can approve diagnoses.".into(),
                ));
            }
        };
        let now = self.now();

        let tx = self.db.begin()?;
        let mut approved = Vec::with_capacity(diagnosis_ids.len());

        for id in diagnosis_ids {
            let mut diagnosis = self
                .db
                .get_diagnosis(id)?
                .ok_or_else(|| RecordsError::NotFound(format!("Diagnosis {}", id)))?;
            let Some(visit_id) = diagnosis.visit_id.clone() else {
                return Err(RecordsError::State(format!(
                    "Diagnosis {} is not linked to a visit",
                    id
                )));
            };
            let visit = self.require_visit(&visit_id)?;
            let attending = self.require_doctor(&visit.doctor_id)?;

            if attending.is_intern && attending.mentor_id.as_deref() != Some(approver.id.as_str()) {
                let mentor_name = match &attending.mentor_id {
                    Some(mentor_id) => self
                        .db
                        .get_doctor(mentor_id)?
                        .map(|m| m.full_name())
                        .unwrap_or_else(|| mentor_id.clone()),
                    None => "no mentor assigned".to_string(),
                };
                tracing::warn!(
                    "Doctor {} tried to approve diagnosis {} of intern {}",
                    approver.id,
                    id,
                    attending.id
                );
                return Err(RecordsError::Permission(format!(
                    "Only the mentor ({}) can approve diagnoses of intern {}.",
                    mentor_name,
                    attending.full_name()
                )));
            }

            diagnosis.approve(&approver.id, now);
            diagnosis.check_approval_date(Some(visit.visit_date))?;
            self.db.update_diagnosis(&diagnosis)?;
            approved.push(diagnosis);
        }

        tx.commit()?;
        tracing::info!(
            "Doctor {} approved {} diagnosis record(s)",
            approver.id,
            approved.len()
        );
        Ok(approved)
    }

    /// Parent of the diagnosed disease, used as its disease type.
    pub fn diagnosis_disease_type(
        &self,
        diagnosis: &MedicalDiagnosis,
    ) -> RecordsResult<Option<Disease>> {
        let Some(disease_id) = &diagnosis.disease_id else {
            return Ok(None);
        };
        let parent_id = self.db.get_disease(disease_id)?.and_then(|d| d.parent_id);
        match parent_id {
            Some(id) => Ok(self.db.get_disease(&id)?),
            None => Ok(None),
        }
    }

    pub fn diagnosis_visit_date(
        &self,
        diagnosis: &MedicalDiagnosis,
    ) -> RecordsResult<Option<NaiveDateTime>> {
        match &diagnosis.visit_id {
            Some(id) => Ok(self.db.get_visit(id)?.map(|v| v.visit_date)),
            None => Ok(None),
        }
    }

    /// Completed visits recent enough to receive new diagnoses.
    pub fn eligible_visits_for_diagnosis(&self) -> RecordsResult<Vec<Visit>> {
        let window = Duration::days(i64::from(self.config.diagnosis_visit_window_days));
        let since = self
            .now()
            .checked_sub_signed(window)
            .unwrap_or(NaiveDateTime::MIN);
        Ok(self.db.list_completed_visits_since(since)?)
    }
}
