//! Visit lifecycle: planning, guarded updates and rescheduling.

use chrono::NaiveDateTime;

use super::{Registry, RecordsResult};
use crate::models::{Doctor, ValidationError, ViewAction, Visit, VisitStatus, VisitUpdate};

/// Move a visit to another date and optionally another doctor.
#[derive(Debug, Clone, PartialEq)]
pub struct RescheduleRequest {
    pub visit_id: String,
    /// Keeps the current doctor when `None`
    pub new_doctor_id: Option<String>,
    pub new_date: NaiveDateTime,
    pub reason: String,
}

/// The cancelled original and its planned replacement.
#[derive(Debug, Clone, PartialEq)]
pub struct Rescheduled {
    pub cancelled: Visit,
    pub planned: Visit,
    pub action: ViewAction,
}

/// Mentor a visit is attended by: the doctor's mentor for interns.
fn mentor_for(doctor: &Doctor) -> Option<String> {
    if doctor.is_intern {
        doctor.mentor_id.clone()
    } else {
        None
    }
}

impl Registry<'_> {
    /// A planned visit in the configured currency.
    pub fn plan_visit(&self, patient_id: &str, doctor_id: &str, visit_date: NaiveDateTime) -> Visit {
        Visit::new(patient_id, doctor_id, visit_date, self.config.currency.clone())
    }

    /// Store a new visit.
    ///
    /// The mentor is derived from the doctor and the one-visit-per-day rule
    /// is checked against stored visits.
    pub fn create_visit(&self, mut visit: Visit) -> RecordsResult<Visit> {
        self.require_patient(&visit.patient_id)?;
        let doctor = self.require_doctor(&visit.doctor_id)?;

        visit.mentor_id = mentor_for(&doctor);
        if visit.currency.trim().is_empty() {
            visit.currency = self.config.currency.clone();
        }
        if visit.is_completed() && visit.actual_visit_date.is_none() {
            visit.actual_visit_date = Some(self.now());
        }
        self.check_same_day(&visit)?;

        self.db.insert_visit(&visit)?;
        tracing::info!("Planned visit {} on {}", visit.id, visit.visit_date);
        Ok(visit)
    }

    /// Apply a patch to a stored visit.
    ///
    /// Completed visits reject patches touching patient, doctor or date.
    /// Completion stamps the actual date once; a doctor change recomputes the
    /// mentor.
    pub fn update_visit(&self, visit_id: &str, update: VisitUpdate) -> RecordsResult<Visit> {
        let stored = self.require_visit(visit_id)?;
        stored.check_update(&update)?;

        if let Some(patient_id) = &update.patient_id {
            self.require_patient(patient_id)?;
        }
        let new_doctor = match &update.doctor_id {
            Some(doctor_id) if doctor_id != &stored.doctor_id => {
                Some(self.require_doctor(doctor_id)?)
            }
            _ => None,
        };
        let identity_changed = update.touches_identity();
        if let Some(visit_date) = update.visit_date {
            for diagnosis in self.db.list_diagnoses_for_visit(visit_id)? {
                diagnosis.check_approval_date(Some(visit_date))?;
            }
        }

        let mut visit = stored;
        visit.apply_update(update, self.now());
        if let Some(doctor) = &new_doctor {
            visit.mentor_id = mentor_for(doctor);
        }
        if identity_changed {
            self.check_same_day(&visit)?;
        }

        self.db.update_visit(&visit)?;
        Ok(visit)
    }

    /// Replace a visit with a planned copy at a new date.
    ///
    /// The original is cancelled and both visits reference each other in
    /// their recommendations.
    pub fn reschedule_visit(&self, request: &RescheduleRequest) -> RecordsResult<Rescheduled> {
        if request.reason.trim().is_empty() {
            return Err(ValidationError::Required("Reschedule reason").into());
        }
        let original = self.require_visit(&request.visit_id)?;
        let doctor_id = request
            .new_doctor_id
            .clone()
            .unwrap_or_else(|| original.doctor_id.clone());

        let tx = self.db.begin()?;

        let mut copy = Visit::new(
            &original.patient_id,
            doctor_id,
            request.new_date,
            original.currency.clone(),
        );
        copy.visit_type = original.visit_type;
        copy.cost = original.cost;
        copy.recommendations = Some(format!("Rescheduled from visit {}", original.id));
        let planned = self.create_visit(copy)?;

        let note = format!("Rescheduled to visit {}: {}", planned.id, request.reason);
        let recommendations = match &original.recommendations {
            Some(existing) if !existing.is_empty() => format!("{}\n{}", existing, note),
            _ => note,
        };
        let cancelled = self.update_visit(
            &original.id,
            VisitUpdate {
                status: Some(VisitStatus::Cancelled),
                recommendations: Some(recommendations),
                ..Default::default()
            },
        )?;

        tx.commit()?;
        tracing::info!("Rescheduled visit {} to {}", cancelled.id, planned.id);

        Ok(Rescheduled {
            cancelled,
            planned,
            action: ViewAction::Close,
        })
    }

    /// Number of diagnoses recorded for a visit.
    pub fn visit_diagnosis_count(&self, visit_id: &str) -> RecordsResult<usize> {
        Ok(self.db.count_diagnoses_for_visit(visit_id)?)
    }

    /// `Patient Name @ YYYY-MM-DD HH:MM` for a stored visit.
    pub fn visit_display_name(&self, visit: &Visit) -> RecordsResult<String> {
        let patient = self.db.get_patient(&visit.patient_id)?;
        Ok(visit.display_name(patient.as_ref().map(|p| p.full_name()).as_deref()))
    }

    fn check_same_day(&self, visit: &Visit) -> RecordsResult<()> {
        let others = self.db.count_same_day_visits(
            &visit.patient_id,
            &visit.doctor_id,
            visit.visit_day(),
            &visit.id,
        )?;
        if others > 0 {
            return Err(ValidationError::DuplicateVisitDay.into());
        }
        Ok(())
    }
}
