//! Persisting generated schedule slots.

use crate::db::Database;
use crate::models::{DoctorSchedule, ValidationError, ViewAction};
use crate::records::{RecordsError, RecordsResult};

use super::request::ScheduleRequest;

/// Slots created by one generation run.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedSchedule {
    pub slots: Vec<DoctorSchedule>,
    pub action: ViewAction,
}

/// Writes generated slots for a doctor.
pub struct ScheduleGenerator<'a> {
    db: &'a Database,
}

impl<'a> ScheduleGenerator<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Validate, expand and store a request in one batch.
    ///
    /// The doctor must exist and hold a speciality. Nothing is written when
    /// no week or weekday matches.
    pub fn generate(&self, request: &ScheduleRequest) -> RecordsResult<GeneratedSchedule> {
        request.validate()?;
        let doctor = self
            .db
            .get_doctor(&request.doctor_id)?
            .ok_or_else(|| RecordsError::NotFound(format!("Doctor {}", request.doctor_id)))?;
        if doctor.speciality_id.is_none() {
            return Err(ValidationError::DoctorWithoutSpeciality.into());
        }

        let slots = request.generate_slots();
        if slots.is_empty() {
            tracing::debug!("No schedule slots generated for doctor {}", doctor.id);
        } else {
            self.db.insert_schedules(&slots)?;
            tracing::info!(
                "Generated {} schedule slot(s) for doctor {}",
                slots.len(),
                doctor.id
            );
        }

        Ok(GeneratedSchedule {
            slots,
            action: ViewAction::Close,
        })
    }
}
