//! Doctor schedule slot models.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::validation::{ValidationError, ValidationResult};

coded_enum! {
    /// What a schedule slot is used for.
    ScheduleType {
        Work => "work",
        Vacation => "vacation",
        Sick => "sick",
        Conference => "conference",
    }
}

/// One schedule slot of a doctor. Times are fractional hours (9.5 = 09:30).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoctorSchedule {
    pub id: String,
    pub doctor_id: String,
    /// ISO weekday, 1 = Monday .. 7 = Sunday
    pub day_of_week: Option<u8>,
    pub date: Option<NaiveDate>,
    pub start_time: f64,
    pub end_time: f64,
    pub schedule_type: ScheduleType,
    pub notes: Option<String>,
}

impl DoctorSchedule {
    /// Create a work slot on a concrete date.
    pub fn work_slot(doctor_id: impl Into<String>, date: NaiveDate, start_time: f64, end_time: f64) -> Self {
        Self {
            id: super::new_id(),
            doctor_id: doctor_id.into(),
            day_of_week: Some(date.weekday().number_from_monday() as u8),
            date: Some(date),
            start_time,
            end_time,
            schedule_type: ScheduleType::Work,
            notes: None,
        }
    }

    /// Slot length in hours.
    pub fn duration_hours(&self) -> f64 {
        self.end_time - self.start_time
    }

    pub fn validate(&self) -> ValidationResult {
        if self.end_time <= self.start_time {
            return Err(ValidationError::EndBeforeStart);
        }
        if matches!(self.day_of_week, Some(d) if !(1..=7).contains(&d)) {
            return Err(ValidationError::InvalidDayOfWeek);
        }
        Ok(())
    }
}

/// Render fractional hours as `HH:MM`.
pub fn format_hours(hours: f64) -> String {
    let total_minutes = (hours * 60.0).round() as i64;
    format!("{:02}:{:02}", total_minutes / 60, total_minutes % 60)
}
