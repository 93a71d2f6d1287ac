//! Catalog models: specialities and diseases.

use serde::{Deserialize, Serialize};

use super::validation::{max_len, require, ValidationResult};

coded_enum! {
    /// How dangerous a disease is.
    DangerLevel {
        Low => "low",
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
}

/// A medical speciality doctors can hold.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Speciality {
    pub id: String,
    pub name: String,
    /// Short unique code (at most 10 characters)
    pub code: String,
    pub description: Option<String>,
    pub active: bool,
}

impl Speciality {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            id: super::new_id(),
            name: name.into(),
            code: code.into(),
            description: None,
            active: true,
        }
    }

    pub fn validate(&self) -> ValidationResult {
        require("Name", &self.name)?;
        require("Code", &self.code)?;
        max_len("Code", Some(&self.code), 10)
    }
}

/// A disease in the self-referencing disease hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Disease {
    pub id: String,
    pub name: String,
    /// Parent disease (disease type); children are found by inverse lookup
    pub parent_id: Option<String>,
    pub code_icd10: Option<String>,
    pub danger_level: Option<DangerLevel>,
    pub is_contagious: bool,
    pub symptoms: Option<String>,
    /// Country codes where the disease spreads
    pub spread_regions: Vec<String>,
}

impl Disease {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: super::new_id(),
            name: name.into(),
            parent_id: None,
            code_icd10: None,
            danger_level: None,
            is_contagious: false,
            symptoms: None,
            spread_regions: Vec::new(),
        }
    }

    /// Builder-style parent assignment.
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn validate(&self) -> ValidationResult {
        require("Name", &self.name)?;
        max_len("ICD-10 code", self.code_icd10.as_deref(), 10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speciality_code_length() {
        let mut speciality = Speciality::new("Cardiology", "CARD");
        assert!(speciality.validate().is_ok());

        speciality.code = "CARDIOLOGY1".into();
        assert!(speciality.validate().is_err());
    }

    #[test]
    fn test_disease_parent() {
        let parent = Disease::new("Respiratory infections");
        let child = Disease::new("Influenza").with_parent(parent.id.clone());
        assert_eq!(child.parent_id.as_deref(), Some(parent.id.as_str()));
        assert!(child.validate().is_ok());
    }

    #[test]
    fn test_danger_level_codes() {
        assert_eq!(DangerLevel::ALL.len(), 4);
        assert_eq!(DangerLevel::from_code("critical"), Some(DangerLevel::Critical));
        assert_eq!(DangerLevel::High.to_string(), "high");
    }
}
