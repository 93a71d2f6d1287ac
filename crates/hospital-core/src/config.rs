//! Runtime configuration for the records services.
//!
//! Resolve a `HospitalConfig` once at startup and hand it to `Registry`;
//! services never read files or environment variables on their own.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Settings shared by every records service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HospitalConfig {
    /// ISO currency code stamped on new visits
    pub currency: String,
    /// History reason for the first doctor assignment
    pub initial_assignment_reason: String,
    /// History reason for a doctor change made by a patient update
    pub doctor_change_reason: String,
    /// How far back completed visits stay eligible for new diagnoses
    pub diagnosis_visit_window_days: u32,
}

/// Longest accepted diagnosis window, one hundred years.
pub const MAX_DIAGNOSIS_WINDOW_DAYS: u32 = 36_500;

impl Default for HospitalConfig {
    fn default() -> Self {
        Self {
            currency: "USD".to_string(),
            initial_assignment_reason: "Initial assignment.".to_string(),
            doctor_change_reason: "Doctor changed by user.".to_string(),
            diagnosis_visit_window_days: 30,
        }
    }
}

impl HospitalConfig {
    /// Load from a JSON file; missing keys take their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.currency.trim().is_empty() {
            return Err(ConfigError::Invalid("currency cannot be empty".into()));
        }
        if !(1..=MAX_DIAGNOSIS_WINDOW_DAYS).contains(&self.diagnosis_visit_window_days) {
            return Err(ConfigError::Invalid(format!(
                "diagnosis_visit_window_days must be between 1 and {}",
                MAX_DIAGNOSIS_WINDOW_DAYS
            )));
        }
        Ok(())
    }
}
