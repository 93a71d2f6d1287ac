//! Weekly recurrence requests and their expansion into slots.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{DoctorSchedule, ValidationError, ValidationResult};

/// Which weeks of the range get slots.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    /// Every week
    #[default]
    Standard,
    /// Weeks with an even ISO week number
    Even,
    /// Weeks with an odd ISO week number
    Odd,
}

impl Recurrence {
    pub fn includes_week(&self, iso_week: u32) -> bool {
        match self {
            Recurrence::Standard => true,
            Recurrence::Even => iso_week % 2 == 0,
            Recurrence::Odd => iso_week % 2 == 1,
        }
    }
}

/// Upper bound for `week_count`, ten years of weeks.
pub const MAX_WEEK_COUNT: u32 = 520;

/// Monday to Friday.
pub const WORKDAYS: [bool; 7] = [true, true, true, true, true, false, false];

/// Parameters for generating a doctor's work slots.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleRequest {
    pub doctor_id: String,
    /// First day of the first week; weeks are counted from here
    pub week_start: NaiveDate,
    pub week_count: u32,
    pub recurrence: Recurrence,
    /// Selected days, Monday first, as offsets from `week_start`
    pub weekdays: [bool; 7],
    pub start_time: f64,
    pub end_time: f64,
    pub break_start: Option<f64>,
    pub break_end: Option<f64>,
}

impl ScheduleRequest {
    /// One standard week, Monday to Friday, without a break.
    pub fn new(doctor_id: impl Into<String>, week_start: NaiveDate, start_time: f64, end_time: f64) -> Self {
        Self {
            doctor_id: doctor_id.into(),
            week_start,
            week_count: 1,
            recurrence: Recurrence::Standard,
            weekdays: WORKDAYS,
            start_time,
            end_time,
            break_start: None,
            break_end: None,
        }
    }

    /// The break, when both bounds are set.
    pub fn break_interval(&self) -> Option<(f64, f64)> {
        match (self.break_start, self.break_end) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }

    pub fn validate(&self) -> ValidationResult {
        if self.week_count == 0 || self.week_count > MAX_WEEK_COUNT {
            return Err(ValidationError::InvalidWeekCount);
        }
        if self.last_day().is_none() {
            return Err(ValidationError::InvalidWeekCount);
        }
        let hours = 0.0..=24.0;
        if !hours.contains(&self.start_time) || !hours.contains(&self.end_time) {
            return Err(ValidationError::InvalidWorkHours);
        }
        if self.end_time <= self.start_time {
            return Err(ValidationError::EndBeforeStart);
        }
        if let Some((break_start, break_end)) = self.break_interval() {
            if break_end <= break_start {
                return Err(ValidationError::BreakEndBeforeStart);
            }
            if !(self.start_time < break_start && break_end < self.end_time) {
                return Err(ValidationError::BreakOutsideWorkingHours);
            }
        }
        Ok(())
    }

    /// Last calendar day the request can touch, `None` past the calendar end.
    fn last_day(&self) -> Option<NaiveDate> {
        self.week_start
            .checked_add_days(Days::new(u64::from(self.week_count) * 7))
    }

    /// Expand the request into work slots, in date order.
    ///
    /// Week `w` is anchored at `week_start + 7w` days and classified by the
    /// ISO week number of that anchor. Assumes `validate` passed; weeks past
    /// the calendar end are dropped.
    pub fn generate_slots(&self) -> Vec<DoctorSchedule> {
        let mut slots = Vec::new();

        for week in 0..self.week_count {
            let Some(anchor) = self
                .week_start
                .checked_add_days(Days::new(u64::from(week) * 7))
            else {
                break;
            };
            let iso_week = anchor.iso_week().week();
            if !self.recurrence.includes_week(iso_week) {
                tracing::debug!("Skipping ISO week {} ({:?} recurrence)", iso_week, self.recurrence);
                continue;
            }

            for (offset, _) in self.weekdays.iter().enumerate().filter(|(_, selected)| **selected) {
                let Some(date) = anchor.checked_add_days(Days::new(offset as u64)) else {
                    break;
                };
                match self.break_interval() {
                    Some((break_start, break_end)) => {
                        slots.push(DoctorSchedule::work_slot(
                            &self.doctor_id,
                            date,
                            self.start_time,
                            break_start,
                        ));
                        slots.push(DoctorSchedule::work_slot(
                            &self.doctor_id,
                            date,
                            break_end,
                            self.end_time,
                        ));
                    }
                    None => slots.push(DoctorSchedule::work_slot(
                        &self.doctor_id,
                        date,
                        self.start_time,
                        self.end_time,
                    )),
                }
            }
        }

        slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScheduleType;

    fn monday() -> NaiveDate {
        // ISO week 2 of 2024
        NaiveDate::from_ymd_opt(2024, 1, 8).unwrap()
    }

    #[test]
    fn test_default_request_is_one_workweek() {
        let request = ScheduleRequest::new("doc", monday(), 9.0, 17.0);
        let slots = request.generate_slots();

        assert_eq!(slots.len(), 5);
        let days: Vec<_> = slots.iter().map(|s| s.day_of_week.unwrap()).collect();
        assert_eq!(days, vec![1, 2, 3, 4, 5]);
        assert!(slots.iter().all(|s| s.schedule_type == ScheduleType::Work));
    }

    #[test]
    fn test_day_of_week_follows_calendar() {
        // Starting on a Wednesday: the "Monday" flag lands on Wednesday.
        let wednesday = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let mut request = ScheduleRequest::new("doc", wednesday, 9.0, 17.0);
        request.weekdays = [true, false, false, false, false, false, false];

        let slots = request.generate_slots();
        assert_eq!(slots[0].date, Some(wednesday));
        assert_eq!(slots[0].day_of_week, Some(3));
    }

    #[test]
    fn test_odd_weeks() {
        let mut request = ScheduleRequest::new("doc", monday(), 9.0, 17.0);
        request.week_count = 4;
        request.recurrence = Recurrence::Odd;

        // Weeks 2, 3, 4, 5: only 3 and 5 are odd.
        let slots = request.generate_slots();
        assert_eq!(slots.len(), 10);
        assert_eq!(slots[0].date, NaiveDate::from_ymd_opt(2024, 1, 15));
    }

    #[test]
    fn test_validation() {
        let mut request = ScheduleRequest::new("doc", monday(), 9.0, 17.0);
        assert!(request.validate().is_ok());

        request.week_count = 0;
        assert_eq!(request.validate(), Err(ValidationError::InvalidWeekCount));
        request.week_count = 1;

        request.break_start = Some(13.0);
        request.break_end = Some(12.0);
        assert_eq!(request.validate(), Err(ValidationError::BreakEndBeforeStart));

        request.break_start = Some(8.0);
        request.break_end = Some(9.5);
        assert_eq!(request.validate(), Err(ValidationError::BreakOutsideWorkingHours));

        request.break_start = Some(9.0);
        request.break_end = Some(10.0);
        assert_eq!(request.validate(), Err(ValidationError::BreakOutsideWorkingHours));

        request.end_time = 9.0;
        assert_eq!(request.validate(), Err(ValidationError::EndBeforeStart));
    }

    #[test]
    fn test_week_count_bounds() {
        let mut request = ScheduleRequest::new("doc", monday(), 9.0, 17.0);
        request.week_count = MAX_WEEK_COUNT;
        assert!(request.validate().is_ok());

        request.week_count = MAX_WEEK_COUNT + 1;
        assert_eq!(request.validate(), Err(ValidationError::InvalidWeekCount));

        request.week_count = u32::MAX;
        request.weekdays = [false; 7];
        assert_eq!(request.validate(), Err(ValidationError::InvalidWeekCount));
    }

    #[test]
    fn test_calendar_end() {
        let mut request = ScheduleRequest::new("doc", NaiveDate::MAX, 9.0, 17.0);
        request.week_count = 2;
        assert_eq!(request.validate(), Err(ValidationError::InvalidWeekCount));
        // Expansion stops at the calendar end instead of overflowing.
        assert!(request.generate_slots().len() <= 1);
    }

    #[test]
    fn test_half_break_is_ignored() {
        let mut request = ScheduleRequest::new("doc", monday(), 9.0, 17.0);
        request.break_start = Some(12.0);
        assert!(request.validate().is_ok());
        assert_eq!(request.generate_slots().len(), 5);
    }
}
