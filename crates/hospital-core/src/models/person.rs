//! Person attributes shared by doctors, patients and contact persons.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::validation::{is_valid_phone, require, ValidationError, ValidationResult};

coded_enum! {
    /// Gender of a person.
    Gender {
        Male => "male",
        Female => "female",
        Other => "other",
    }
}

/// Name, contact and citizenship fields embedded in every person record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PersonAttributes {
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub gender: Option<Gender>,
    pub birthday: Option<NaiveDate>,
    /// Country of citizenship (ISO code, external reference)
    pub country_code: Option<String>,
    /// Communication language (locale code, external reference)
    pub language_code: Option<String>,
}

impl PersonAttributes {
    /// Create attributes with the required name fields.
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            ..Default::default()
        }
    }

    /// `last first middle`, skipping empty parts.
    pub fn full_name(&self) -> String {
        [
            Some(self.last_name.as_str()),
            Some(self.first_name.as_str()),
            self.middle_name.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }

    /// Whole years from birthday to `today`, zero without a birthday.
    pub fn age_on(&self, today: NaiveDate) -> u32 {
        self.birthday.map_or(0, |birthday| age_between(birthday, today))
    }

    /// Age as of the local calendar day.
    pub fn age(&self) -> u32 {
        self.age_on(chrono::Local::now().date_naive())
    }

    /// Check name, birthday and phone invariants.
    pub fn validate(&self, today: NaiveDate) -> ValidationResult {
        require("First name", &self.first_name)?;
        require("Last name", &self.last_name)?;

        if matches!(self.birthday, Some(b) if b > today) {
            return Err(ValidationError::FutureBirthday);
        }

        if let Some(phone) = self.phone.as_deref().filter(|p| !p.is_empty()) {
            if !is_valid_phone(phone) {
                return Err(ValidationError::InvalidPhone);
            }
        }

        Ok(())
    }
}

/// Whole years between two dates; zero when `to` precedes `from`.
pub fn age_between(from: NaiveDate, to: NaiveDate) -> u32 {
    if to < from {
        return 0;
    }
    let mut years = to.year() - from.year();
    if (to.month(), to.day()) < (from.month(), from.day()) {
        years -= 1;
    }
    years.max(0) as u32
}
