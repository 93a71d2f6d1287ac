//! Doctor models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::person::PersonAttributes;
use super::validation::{require, ValidationError, ValidationResult};

/// A doctor record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Doctor {
    pub id: String,
    pub person: PersonAttributes,
    /// System user linked to this doctor (used for approvals)
    pub user_id: Option<String>,
    pub speciality_id: Option<String>,
    pub is_intern: bool,
    /// Supervising doctor; only meaningful for interns
    pub mentor_id: Option<String>,
    /// Unique license number
    pub license_number: String,
    pub license_date: Option<NaiveDate>,
    /// Rating between 0.0 and 5.0
    pub rating: f64,
    pub study_country_code: Option<String>,
    pub active: bool,
}

impl Doctor {
    /// Create a new doctor with required fields.
    pub fn new(person: PersonAttributes, license_number: impl Into<String>) -> Self {
        Self {
            id: super::new_id(),
            person,
            user_id: None,
            speciality_id: None,
            is_intern: false,
            mentor_id: None,
            license_number: license_number.into(),
            license_date: None,
            rating: 0.0,
            study_country_code: None,
            active: true,
        }
    }

    pub fn full_name(&self) -> String {
        self.person.full_name()
    }

    /// `Full Name (Speciality)`, or just the full name without a speciality.
    pub fn display_name(&self, speciality_name: Option<&str>) -> String {
        match speciality_name {
            Some(speciality) => format!("{} ({})", self.full_name(), speciality),
            None => self.full_name(),
        }
    }

    /// Whole 365-day periods since the license was issued.
    pub fn experience_years(&self, today: NaiveDate) -> u32 {
        match self.license_date {
            Some(issued) if issued <= today => ((today - issued).num_days() / 365) as u32,
            _ => 0,
        }
    }

    /// Change the intern flag; a doctor who is no longer an intern has no mentor.
    pub fn set_intern(&mut self, is_intern: bool) {
        self.is_intern = is_intern;
        if !is_intern {
            self.mentor_id = None;
        }
    }

    /// Check field invariants and the mentor rules.
    ///
    /// `mentor` must be the record referenced by `mentor_id`, when set.
    pub fn validate(&self, mentor: Option<&Doctor>, today: NaiveDate) -> ValidationResult {
        self.person.validate(today)?;
        require("License number", &self.license_number)?;

        if !(0.0..=5.0).contains(&self.rating) {
            return Err(ValidationError::RatingOutOfRange);
        }

        if let Some(mentor_id) = &self.mentor_id {
            if mentor_id == &self.id {
                return Err(ValidationError::SelfMentor);
            }
            if mentor.is_some_and(|m| m.is_intern) {
                return Err(ValidationError::MentorIsIntern);
            }
        }

        Ok(())
    }
}
