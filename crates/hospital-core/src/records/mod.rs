//! Record services: writes that span several tables or enforce rules the
//! store cannot express.
//!
//! Every operation that writes more than one row runs inside a single
//! transaction on the caller's connection; any error rolls it back.

mod catalog;
mod diagnoses;
mod doctors;
mod history;
mod patients;
mod visits;

pub use history::*;
pub use visits::*;

use chrono::{Local, NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::config::HospitalConfig;
use crate::db::{Database, DbError};
use crate::models::{Doctor, Patient, ValidationError, Visit};

/// Record service errors.
#[derive(Error, Debug)]
pub enum RecordsError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Permission denied: {0}")]
    Permission(String),

    #[error("Invalid state: {0}")]
    State(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type RecordsResult<T> = Result<T, RecordsError>;

/// Entry point for record writes and derived lookups.
pub struct Registry<'a> {
    db: &'a Database,
    config: HospitalConfig,
    now: Option<NaiveDateTime>,
}

impl<'a> Registry<'a> {
    /// Create a registry with the default configuration.
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            config: HospitalConfig::default(),
            now: None,
        }
    }

    pub fn with_config(mut self, config: HospitalConfig) -> Self {
        self.config = config;
        self
    }

    /// Pin the clock; dates and timestamps stamped by the registry use `now`.
    pub fn at(mut self, now: NaiveDateTime) -> Self {
        self.now = Some(now);
        self
    }

    pub fn db(&self) -> &'a Database {
        self.db
    }

    pub fn config(&self) -> &HospitalConfig {
        &self.config
    }

    /// Local wall-clock time, unless pinned.
    pub fn now(&self) -> NaiveDateTime {
        self.now.unwrap_or_else(|| Local::now().naive_local())
    }

    pub fn today(&self) -> NaiveDate {
        self.now().date()
    }

    pub(crate) fn require_doctor(&self, id: &str) -> RecordsResult<Doctor> {
        self.db
            .get_doctor(id)?
            .ok_or_else(|| RecordsError::NotFound(format!("Doctor {}", id)))
    }

    pub(crate) fn require_patient(&self, id: &str) -> RecordsResult<Patient> {
        self.db
            .get_patient(id)?
            .ok_or_else(|| RecordsError::NotFound(format!("Patient {}", id)))
    }

    pub(crate) fn require_visit(&self, id: &str) -> RecordsResult<Visit> {
        self.db
            .get_visit(id)?
            .ok_or_else(|| RecordsError::NotFound(format!("Visit {}", id)))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pinned_clock() {
        let db = Database::open_in_memory().unwrap();
        let registry = fixtures::registry(&db);
        assert_eq!(registry.now(), fixtures::now());
        assert_eq!(registry.today(), fixtures::now().date());
    }

    #[test]
    fn test_missing_records() {
        let db = Database::open_in_memory().unwrap();
        let registry = Registry::new(&db);
        assert!(matches!(
            registry.require_patient("nope"),
            Err(RecordsError::NotFound(msg)) if msg.contains("nope")
        ));
    }
}
