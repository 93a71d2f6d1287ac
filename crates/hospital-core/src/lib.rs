//! Hospital Records Core Library
//!
//! Local records engine for a hospital: doctors and their interns, patients
//! with an audited doctor assignment history, visits, diagnoses, work
//! schedules and exports.
//!
//! # Architecture
//!
//! ```text
//!   Doctor ──mentor──▶ Doctor (intern)
//!     │
//!     ├── Schedule slots ◀── ScheduleGenerator (weekly recurrence)
//!     │
//!     └── Visit ◀──── Patient ──▶ PatientDoctorHistory (one active record)
//!           │
//!           └── MedicalDiagnosis ──approval──▶ mentor / any doctor
//!                     │
//!          ┌──────────┴──────────┐
//!          ▼                     ▼
//!    Disease report        Patient card export
//!                          (JSON / CSV + SHA-256)
//! ```
//!
//! # Modules
//!
//! - [`db`]: SQLite repository, one file per record type
//! - [`models`]: Domain types and structural invariants
//! - [`records`]: Multi-record writes and permission rules
//! - [`schedule`]: Slot generation from weekly recurrence requests
//! - [`export`]: Disease report and patient card export
//! - [`config`]: Runtime settings

pub mod config;
pub mod db;
pub mod export;
pub mod models;
pub mod records;
pub mod schedule;

// Re-export commonly used types
pub use config::HospitalConfig;
pub use db::Database;
pub use export::{DiseaseReportRequest, PatientCardExporter, PatientCardRequest};
pub use models::{
    Disease, Doctor, DoctorSchedule, MedicalDiagnosis, Patient, PatientDoctorHistory,
    PersonAttributes, Speciality, ViewAction, Visit, VisitStatus,
};
pub use records::{RecordsError, Registry};
pub use schedule::{Recurrence, ScheduleGenerator, ScheduleRequest};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveDateTime};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum HospitalError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Config error: {0}")]
    ConfigError(String),
}

impl From<db::DbError> for HospitalError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::NotFound(what) => HospitalError::NotFound(what),
            db::DbError::Constraint(msg) => HospitalError::InvalidInput(msg),
            other => HospitalError::DatabaseError(other.to_string()),
        }
    }
}

impl From<models::ValidationError> for HospitalError {
    fn from(e: models::ValidationError) -> Self {
        HospitalError::InvalidInput(e.to_string())
    }
}

impl From<RecordsError> for HospitalError {
    fn from(e: RecordsError) -> Self {
        match e {
            RecordsError::Database(e) => e.into(),
            RecordsError::Validation(e) => e.into(),
            RecordsError::Permission(msg) => HospitalError::PermissionDenied(msg),
            RecordsError::State(msg) => HospitalError::InvalidState(msg),
            RecordsError::NotFound(what) => HospitalError::NotFound(what),
        }
    }
}

impl From<export::ExportError> for HospitalError {
    fn from(e: export::ExportError) -> Self {
        match e {
            export::ExportError::Database(e) => e.into(),
            export::ExportError::Records(e) => e.into(),
            export::ExportError::Validation(e) => e.into(),
            export::ExportError::Json(e) => e.into(),
        }
    }
}

impl From<config::ConfigError> for HospitalError {
    fn from(e: config::ConfigError) -> Self {
        HospitalError::ConfigError(e.to_string())
    }
}

impl From<serde_json::Error> for HospitalError {
    fn from(e: serde_json::Error) -> Self {
        HospitalError::SerializationError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for HospitalError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        HospitalError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<HospitalCore>, HospitalError> {
    let db = Database::open(&path)?;
    Ok(HospitalCore::wrap(db, HospitalConfig::default()))
}

/// Open a database with settings read from a JSON config file.
#[uniffi::export]
pub fn open_database_with_config(
    path: String,
    config_path: String,
) -> Result<Arc<HospitalCore>, HospitalError> {
    let config = HospitalConfig::from_json_file(&config_path)?;
    let db = Database::open(&path)?;
    Ok(HospitalCore::wrap(db, config))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<HospitalCore>, HospitalError> {
    let db = Database::open_in_memory()?;
    Ok(HospitalCore::wrap(db, HospitalConfig::default()))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
#[derive(uniffi::Object)]
pub struct HospitalCore {
    db: Arc<Mutex<Database>>,
    config: HospitalConfig,
}

impl HospitalCore {
    fn wrap(db: Database, config: HospitalConfig) -> Arc<Self> {
        Arc::new(Self {
            db: Arc::new(Mutex::new(db)),
            config,
        })
    }

    fn registry<'a>(&self, db: &'a Database) -> Registry<'a> {
        Registry::new(db).with_config(self.config.clone())
    }
}

#[uniffi::export]
impl HospitalCore {
    // =========================================================================
    // Catalog Operations
    // =========================================================================

    /// Create a speciality; returns its id.
    pub fn create_speciality(&self, name: String, code: String) -> Result<String, HospitalError> {
        let db = self.db.lock()?;
        let speciality = self.registry(&db).create_speciality(Speciality::new(name, code))?;
        Ok(speciality.id)
    }

    /// Create a disease, optionally under a parent; returns its id.
    pub fn create_disease(
        &self,
        name: String,
        parent_id: Option<String>,
    ) -> Result<String, HospitalError> {
        let db = self.db.lock()?;
        let mut disease = Disease::new(name);
        disease.parent_id = parent_id;
        let disease = self.registry(&db).create_disease(disease)?;
        Ok(disease.id)
    }

    // =========================================================================
    // Doctor Operations
    // =========================================================================

    /// Create a doctor.
    pub fn create_doctor(&self, doctor: FfiDoctor) -> Result<FfiDoctor, HospitalError> {
        let db = self.db.lock()?;
        let created = self.registry(&db).create_doctor(doctor.into())?;
        Ok(created.into())
    }

    /// Get a doctor by ID.
    pub fn get_doctor(&self, doctor_id: String) -> Result<Option<FfiDoctor>, HospitalError> {
        let db = self.db.lock()?;
        let doctor = db.get_doctor(&doctor_id)?;
        Ok(doctor.map(|d| d.into()))
    }

    /// Deactivate a doctor without planned visits.
    pub fn archive_doctor(&self, doctor_id: String) -> Result<(), HospitalError> {
        let db = self.db.lock()?;
        self.registry(&db).archive_doctor(&doctor_id)?;
        Ok(())
    }

    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// Create a patient, recording the initial doctor assignment.
    pub fn create_patient(&self, patient: FfiPatient) -> Result<FfiPatient, HospitalError> {
        let db = self.db.lock()?;
        let created = self.registry(&db).create_patient(patient.try_into()?)?;
        Ok(created.into())
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, patient_id: String) -> Result<Option<FfiPatient>, HospitalError> {
        let db = self.db.lock()?;
        let patient = db.get_patient(&patient_id)?;
        Ok(patient.map(|p| p.into()))
    }

    /// Change or clear a patient's personal doctor.
    pub fn set_personal_doctor(
        &self,
        patient_id: String,
        doctor_id: Option<String>,
    ) -> Result<(), HospitalError> {
        let db = self.db.lock()?;
        let registry = self.registry(&db);
        let mut patient = db
            .get_patient(&patient_id)?
            .ok_or_else(|| HospitalError::NotFound(format!("Patient {}", patient_id)))?;
        patient.personal_doctor_id = doctor_id;
        registry.update_patient(&patient)?;
        Ok(())
    }

    /// Doctor assignment history of a patient.
    pub fn patient_history(
        &self,
        patient_id: String,
    ) -> Result<Vec<FfiHistoryRecord>, HospitalError> {
        let db = self.db.lock()?;
        let history = self.registry(&db).patient_history(&patient_id)?;
        Ok(history.into_iter().map(|h| h.into()).collect())
    }

    /// Move patients to a new doctor; returns how many were reassigned.
    pub fn reassign_patients(
        &self,
        old_doctor_id: Option<String>,
        new_doctor_id: String,
        patient_ids: Vec<String>,
        reason: String,
    ) -> Result<u32, HospitalError> {
        let db = self.db.lock()?;
        let outcome = self.registry(&db).reassign(&records::MassReassignment {
            old_doctor_id,
            new_doctor_id,
            patient_ids,
            change_date: None,
            reason,
        })?;
        Ok(outcome.reassigned.len() as u32)
    }

    // =========================================================================
    // Visit Operations
    // =========================================================================

    /// Plan a visit.
    pub fn plan_visit(
        &self,
        patient_id: String,
        doctor_id: String,
        visit_date: String,
    ) -> Result<FfiVisit, HospitalError> {
        let db = self.db.lock()?;
        let registry = self.registry(&db);
        let visit = registry.plan_visit(&patient_id, &doctor_id, parse_datetime(&visit_date)?);
        Ok(registry.create_visit(visit)?.into())
    }

    /// Set a visit's status.
    pub fn set_visit_status(
        &self,
        visit_id: String,
        status: String,
    ) -> Result<FfiVisit, HospitalError> {
        let status = VisitStatus::from_code(&status)
            .ok_or_else(|| HospitalError::InvalidInput(format!("Unknown visit status: {}", status)))?;
        let db = self.db.lock()?;
        let visit = self
            .registry(&db)
            .update_visit(&visit_id, models::VisitUpdate::status(status))?;
        Ok(visit.into())
    }

    /// Cancel a visit and plan its replacement; returns the new visit.
    pub fn reschedule_visit(
        &self,
        visit_id: String,
        new_doctor_id: Option<String>,
        new_date: String,
        reason: String,
    ) -> Result<FfiVisit, HospitalError> {
        let db = self.db.lock()?;
        let outcome = self.registry(&db).reschedule_visit(&records::RescheduleRequest {
            visit_id,
            new_doctor_id,
            new_date: parse_datetime(&new_date)?,
            reason,
        })?;
        Ok(outcome.planned.into())
    }

    // =========================================================================
    // Diagnosis Operations
    // =========================================================================

    /// Record a diagnosis for a visit.
    pub fn add_diagnosis(
        &self,
        visit_id: String,
        disease_id: Option<String>,
        description: Option<String>,
        treatment: Option<String>,
    ) -> Result<FfiDiagnosis, HospitalError> {
        let db = self.db.lock()?;
        let mut diagnosis = MedicalDiagnosis::new(visit_id, disease_id);
        diagnosis.description = description;
        diagnosis.treatment = treatment;
        Ok(self.registry(&db).add_diagnosis(diagnosis)?.into())
    }

    /// Approve diagnoses as the doctor linked to `acting_user_id`.
    pub fn approve_diagnoses(
        &self,
        diagnosis_ids: Vec<String>,
        acting_user_id: String,
    ) -> Result<Vec<FfiDiagnosis>, HospitalError> {
        let db = self.db.lock()?;
        let approved = self
            .registry(&db)
            .approve_diagnoses(&diagnosis_ids, &acting_user_id)?;
        Ok(approved.into_iter().map(|d| d.into()).collect())
    }

    // =========================================================================
    // Schedule Operations
    // =========================================================================

    /// Generate work slots; returns how many were created.
    pub fn generate_schedule(&self, request: FfiScheduleRequest) -> Result<u32, HospitalError> {
        let request: ScheduleRequest = request.try_into()?;
        let db = self.db.lock()?;
        let generated = ScheduleGenerator::new(&db).generate(&request)?;
        Ok(generated.slots.len() as u32)
    }

    // =========================================================================
    // Export Operations
    // =========================================================================

    /// Run the disease report over an inclusive date range, as JSON.
    pub fn disease_report_json(
        &self,
        date_start: String,
        date_end: String,
    ) -> Result<String, HospitalError> {
        let request = DiseaseReportRequest::new(parse_date(&date_start)?, parse_date(&date_end)?);
        let db = self.db.lock()?;
        let report = request.run(&db)?;
        Ok(serde_json::to_string_pretty(&report)?)
    }

    /// Export a patient card as `json` or `csv`.
    pub fn export_patient_card(
        &self,
        patient_id: String,
        format: String,
    ) -> Result<FfiExportFile, HospitalError> {
        let mut request = PatientCardRequest::new(patient_id);
        request.format = match format.as_str() {
            "json" => export::ExportFormat::Json,
            "csv" => export::ExportFormat::Csv,
            other => {
                return Err(HospitalError::InvalidInput(format!(
                    "Unknown export format: {}",
                    other
                )))
            }
        };
        let db = self.db.lock()?;
        let export = PatientCardExporter::new(&db).export(&request)?;
        Ok(export.file.into())
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, HospitalError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| HospitalError::InvalidInput(format!("Invalid date {:?}: {}", value, e)))
}

/// Accepts `YYYY-MM-DD HH:MM:SS` and ISO 8601 `YYYY-MM-DDTHH:MM:SS`.
fn parse_datetime(value: &str) -> Result<NaiveDateTime, HospitalError> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| value.parse::<NaiveDateTime>())
        .map_err(|e| HospitalError::InvalidInput(format!("Invalid datetime {:?}: {}", value, e)))
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe doctor.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDoctor {
    /// Ignored on create
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub license_number: String,
    pub speciality_id: Option<String>,
    pub user_id: Option<String>,
    pub is_intern: bool,
    pub mentor_id: Option<String>,
    pub active: bool,
}

impl From<Doctor> for FfiDoctor {
    fn from(doctor: Doctor) -> Self {
        Self {
            id: doctor.id,
            first_name: doctor.person.first_name,
            last_name: doctor.person.last_name,
            license_number: doctor.license_number,
            speciality_id: doctor.speciality_id,
            user_id: doctor.user_id,
            is_intern: doctor.is_intern,
            mentor_id: doctor.mentor_id,
            active: doctor.active,
        }
    }
}

impl From<FfiDoctor> for Doctor {
    fn from(ffi: FfiDoctor) -> Self {
        let mut doctor = Doctor::new(
            PersonAttributes::new(ffi.first_name, ffi.last_name),
            ffi.license_number,
        );
        doctor.speciality_id = ffi.speciality_id;
        doctor.user_id = ffi.user_id;
        doctor.is_intern = ffi.is_intern;
        doctor.mentor_id = ffi.mentor_id;
        doctor
    }
}

/// FFI-safe patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    /// Ignored on create
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    /// `YYYY-MM-DD`
    pub birthday: Option<String>,
    pub country_code: Option<String>,
    pub personal_doctor_id: Option<String>,
    pub allergies: Option<String>,
}

impl From<Patient> for FfiPatient {
    fn from(patient: Patient) -> Self {
        Self {
            id: patient.id,
            first_name: patient.person.first_name,
            last_name: patient.person.last_name,
            birthday: patient.person.birthday.map(|d| d.to_string()),
            country_code: patient.person.country_code,
            personal_doctor_id: patient.personal_doctor_id,
            allergies: patient.allergies,
        }
    }
}

impl TryFrom<FfiPatient> for Patient {
    type Error = HospitalError;

    fn try_from(ffi: FfiPatient) -> Result<Self, Self::Error> {
        let mut person = PersonAttributes::new(ffi.first_name, ffi.last_name);
        person.birthday = ffi.birthday.as_deref().map(parse_date).transpose()?;
        person.country_code = ffi.country_code;
        let mut patient = Patient::new(person);
        patient.personal_doctor_id = ffi.personal_doctor_id;
        patient.allergies = ffi.allergies;
        Ok(patient)
    }
}

/// FFI-safe doctor assignment record.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiHistoryRecord {
    pub doctor_id: String,
    pub assign_date: String,
    pub end_date: Option<String>,
    pub change_reason: Option<String>,
    pub active: bool,
}

impl From<PatientDoctorHistory> for FfiHistoryRecord {
    fn from(record: PatientDoctorHistory) -> Self {
        Self {
            doctor_id: record.doctor_id,
            assign_date: record.assign_date.to_string(),
            end_date: record.end_date.map(|d| d.to_string()),
            change_reason: record.change_reason,
            active: record.active,
        }
    }
}

/// FFI-safe visit.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiVisit {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub mentor_id: Option<String>,
    pub status: String,
    pub visit_date: String,
    pub actual_visit_date: Option<String>,
    pub recommendations: Option<String>,
}

impl From<Visit> for FfiVisit {
    fn from(visit: Visit) -> Self {
        Self {
            id: visit.id,
            patient_id: visit.patient_id,
            doctor_id: visit.doctor_id,
            mentor_id: visit.mentor_id,
            status: visit.status.as_str().to_string(),
            visit_date: visit.visit_date.to_string(),
            actual_visit_date: visit.actual_visit_date.map(|d| d.to_string()),
            recommendations: visit.recommendations,
        }
    }
}

/// FFI-safe diagnosis.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDiagnosis {
    pub id: String,
    pub visit_id: Option<String>,
    pub disease_id: Option<String>,
    pub severity: String,
    pub is_approved: bool,
    pub approving_doctor_id: Option<String>,
    pub approval_date: Option<String>,
}

impl From<MedicalDiagnosis> for FfiDiagnosis {
    fn from(diagnosis: MedicalDiagnosis) -> Self {
        Self {
            id: diagnosis.id,
            visit_id: diagnosis.visit_id,
            disease_id: diagnosis.disease_id,
            severity: diagnosis.severity.as_str().to_string(),
            is_approved: diagnosis.is_approved,
            approving_doctor_id: diagnosis.approving_doctor_id,
            approval_date: diagnosis.approval_date.map(|d| d.to_string()),
        }
    }
}

/// FFI-safe schedule generation request.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiScheduleRequest {
    pub doctor_id: String,
    /// `YYYY-MM-DD`
    pub week_start: String,
    pub week_count: u32,
    /// `standard`, `even` or `odd`
    pub recurrence: String,
    /// Seven flags, Monday first
    pub weekdays: Vec<bool>,
    pub start_time: f64,
    pub end_time: f64,
    pub break_start: Option<f64>,
    pub break_end: Option<f64>,
}

impl TryFrom<FfiScheduleRequest> for ScheduleRequest {
    type Error = HospitalError;

    fn try_from(ffi: FfiScheduleRequest) -> Result<Self, Self::Error> {
        let recurrence = match ffi.recurrence.as_str() {
            "standard" => Recurrence::Standard,
            "even" => Recurrence::Even,
            "odd" => Recurrence::Odd,
            other => {
                return Err(HospitalError::InvalidInput(format!(
                    "Unknown recurrence: {}",
                    other
                )))
            }
        };
        let weekdays: [bool; 7] = ffi.weekdays.try_into().map_err(|flags: Vec<bool>| {
            HospitalError::InvalidInput(format!("Expected 7 weekday flags, got {}", flags.len()))
        })?;

        let mut request = ScheduleRequest::new(
            ffi.doctor_id,
            parse_date(&ffi.week_start)?,
            ffi.start_time,
            ffi.end_time,
        );
        request.week_count = ffi.week_count;
        request.recurrence = recurrence;
        request.weekdays = weekdays;
        request.break_start = ffi.break_start;
        request.break_end = ffi.break_end;
        Ok(request)
    }
}

/// FFI-safe export artifact.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiExportFile {
    pub file_name: String,
    pub content: String,
    pub sha256: String,
}

impl From<export::ExportFile> for FfiExportFile {
    fn from(file: export::ExportFile) -> Self {
        Self {
            file_name: file.file_name,
            content: file.content,
            sha256: file.sha256,
        }
    }
}
