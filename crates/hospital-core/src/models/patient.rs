//! Patient and contact person models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::person::PersonAttributes;
use super::validation::{max_len, ValidationError, ValidationResult};

coded_enum! {
    /// ABO blood group with Rh factor.
    BloodType {
        ONeg => "o_neg",
        OPos => "o_pos",
        ANeg => "a_neg",
        APos => "a_pos",
        BNeg => "b_neg",
        BPos => "b_pos",
        AbNeg => "ab_neg",
        AbPos => "ab_pos",
    }
}

impl BloodType {
    /// Clinical label, e.g. `A(II) Rh+`.
    pub fn label(&self) -> &'static str {
        match self {
            BloodType::ONeg => "O(I) Rh-",
            BloodType::OPos => "O(I) Rh+",
            BloodType::ANeg => "A(II) Rh-",
            BloodType::APos => "A(II) Rh+",
            BloodType::BNeg => "B(III) Rh-",
            BloodType::BPos => "B(III) Rh+",
            BloodType::AbNeg => "AB(IV) Rh-",
            BloodType::AbPos => "AB(IV) Rh+",
        }
    }
}

/// A patient record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub id: String,
    pub person: PersonAttributes,
    /// Attending (personal) doctor; changes are tracked in the doctor history
    pub personal_doctor_id: Option<String>,
    /// Passport data (at most 10 characters)
    pub passport_data: Option<String>,
    pub contact_person_id: Option<String>,
    pub blood_type: Option<BloodType>,
    pub allergies: Option<String>,
    /// Insurance company (external partner reference)
    pub insurance_company: Option<String>,
    pub insurance_policy_number: Option<String>,
}

impl Patient {
    /// Create a new patient with required fields.
    pub fn new(person: PersonAttributes) -> Self {
        Self {
            id: super::new_id(),
            person,
            personal_doctor_id: None,
            passport_data: None,
            contact_person_id: None,
            blood_type: None,
            allergies: None,
            insurance_company: None,
            insurance_policy_number: None,
        }
    }

    pub fn full_name(&self) -> String {
        self.person.full_name()
    }

    pub fn has_allergies(&self) -> bool {
        self.allergies.as_deref().is_some_and(|a| !a.trim().is_empty())
    }

    /// Warning text to surface when allergies are recorded.
    pub fn allergy_warning(&self) -> Option<String> {
        self.allergies
            .as_deref()
            .filter(|a| !a.trim().is_empty())
            .map(|a| format!("This patient has known allergies: {}", a))
    }

    pub fn validate(&self, today: NaiveDate) -> ValidationResult {
        self.person.validate(today)?;
        max_len("Passport data", self.passport_data.as_deref(), 10)
    }
}

/// A contact person for a patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContactPerson {
    pub id: String,
    pub person: PersonAttributes,
    /// Related patient; must have allergies recorded
    pub patient_id: Option<String>,
}

impl ContactPerson {
    pub fn new(person: PersonAttributes) -> Self {
        Self {
            id: super::new_id(),
            person,
            patient_id: None,
        }
    }

    /// `patient` must be the record referenced by `patient_id`, when set.
    pub fn validate(&self, patient: Option<&Patient>, today: NaiveDate) -> ValidationResult {
        self.person.validate(today)?;
        if self.patient_id.is_some() && !patient.is_some_and(Patient::has_allergies) {
            return Err(ValidationError::ContactPatientWithoutAllergies);
        }
        Ok(())
    }
}
