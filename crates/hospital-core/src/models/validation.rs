//! Validation errors raised by domain invariants.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// A record violates a structural invariant.
///
/// Raised before anything is written; the enclosing transaction is rolled back
/// and the message is meant to be shown to the user verbatim.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{0} is required.")]
    Required(&'static str),

    #[error("{field} must be at most {max} characters.")]
    TooLong { field: &'static str, max: usize },

    #[error("Birthday cannot be in the future!")]
    FutureBirthday,

    #[error("Invalid phone number format.")]
    InvalidPhone,

    #[error("Rating must be between 0.00 and 5.00.")]
    RatingOutOfRange,

    #[error("An intern cannot be a mentor.")]
    MentorIsIntern,

    #[error("A doctor cannot be their own mentor.")]
    SelfMentor,

    #[error("End time must be after start time.")]
    EndBeforeStart,

    #[error("Break end time must be after break start time.")]
    BreakEndBeforeStart,

    #[error("Break time must be within working hours.")]
    BreakOutsideWorkingHours,

    #[error("Working hours must be between 0 and 24.")]
    InvalidWorkHours,

    #[error("Week count must be between 1 and 520.")]
    InvalidWeekCount,

    #[error("Day of week must be between 1 (Monday) and 7 (Sunday).")]
    InvalidDayOfWeek,

    #[error("This patient already has a visit with this doctor on the same day.")]
    DuplicateVisitDay,

    #[error("Cannot change date, doctor, or patient on a completed visit.")]
    CompletedVisitLocked,

    #[error("Approval date cannot be earlier than the visit date.")]
    ApprovalBeforeVisit,

    #[error("A disease cannot be its own ancestor.")]
    DiseaseCycle,

    #[error("The related patient must have allergies recorded.")]
    ContactPatientWithoutAllergies,

    #[error("Schedules can only be generated for doctors with a speciality.")]
    DoctorWithoutSpeciality,
}

pub type ValidationResult<T = ()> = Result<T, ValidationError>;

/// Reject blank required text.
pub(crate) fn require(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::Required(field));
    }
    Ok(())
}

/// Reject text longer than the column allows.
pub(crate) fn max_len(field: &'static str, value: Option<&str>, max: usize) -> ValidationResult {
    match value {
        Some(v) if v.chars().count() > max => Err(ValidationError::TooLong { field, max }),
        _ => Ok(()),
    }
}

static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+?[\d\s\-\(\)]{7,20}$").expect("phone pattern compiles")
});

/// Loose phone check: optional leading `+`, then 7 to 20 digits, whitespace,
/// dashes or parentheses.
pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_PATTERN.is_match(phone)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_formats() {
        assert!(is_valid_phone("+380 (44) 123-45-67"));
        assert!(is_valid_phone("1234567"));
        assert!(!is_valid_phone("123456"));
        assert!(!is_valid_phone("call me maybe"));
        assert!(!is_valid_phone("++1234567"));
        assert!(!is_valid_phone("123456789012345678901"));
    }

    #[test]
    fn test_phone_accepts_any_whitespace() {
        assert!(is_valid_phone("050\n1234567"));
        assert!(is_valid_phone("050\x0c1234567"));
        assert!(is_valid_phone("050\t123\r4567"));
    }

    #[test]
    fn test_require_and_max_len() {
        assert_eq!(require("First name", "  "), Err(ValidationError::Required("First name")));
        assert!(require("First name", "Anna").is_ok());
        assert!(max_len("Code", Some("ABCDEFGHIJK"), 10).is_err());
        assert!(max_len("Code", None, 10).is_ok());
    }
}
