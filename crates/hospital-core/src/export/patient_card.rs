//! Patient card export: visit history as a JSON or CSV file.

use std::collections::HashMap;

use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::{checksum, escape_csv, ExportResult};
use crate::db::Database;
use crate::models::{
    MedicalDiagnosis, Patient, RecordModel, Severity, ValidationError, ValidationResult,
    ViewAction, ViewMode, Visit, VisitStatus,
};
use crate::records::RecordsError;

const NOT_AVAILABLE: &str = "N/A";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

/// What to export for one patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientCardRequest {
    pub patient_id: String,
    /// First visit day, inclusive
    pub date_start: Option<NaiveDate>,
    /// Last visit day, inclusive
    pub date_end: Option<NaiveDate>,
    pub include_diagnoses: bool,
    pub include_recommendations: bool,
    pub format: ExportFormat,
}

impl PatientCardRequest {
    /// Full history as JSON, diagnoses and recommendations included.
    pub fn new(patient_id: impl Into<String>) -> Self {
        Self {
            patient_id: patient_id.into(),
            date_start: None,
            date_end: None,
            include_diagnoses: true,
            include_recommendations: true,
            format: ExportFormat::Json,
        }
    }

    pub fn validate(&self) -> ValidationResult {
        if let (Some(start), Some(end)) = (self.date_start, self.date_end) {
            if end < start {
                return Err(ValidationError::EndBeforeStart);
            }
        }
        Ok(())
    }
}

/// A generated export artifact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportFile {
    pub file_name: String,
    pub content: String,
    /// SHA-256 of `content`, hex encoded
    pub sha256: String,
}

/// The file plus the form that offers it for download.
#[derive(Debug, Clone, PartialEq)]
pub struct PatientCardExport {
    pub file: ExportFile,
    pub action: ViewAction,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientInfo {
    pub full_name: String,
    pub birthday: Option<NaiveDate>,
    pub age: u32,
    pub blood_type: Option<String>,
    pub allergies: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VisitInfo {
    pub visit_date: NaiveDateTime,
    pub status: VisitStatus,
    pub cost: Option<f64>,
    pub actual_visit_date: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiagnosisEntry {
    pub disease: Option<String>,
    pub description: Option<String>,
    pub treatment: Option<String>,
    pub severity: Severity,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VisitEntry {
    pub visit_info: VisitInfo,
    pub doctor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnoses: Option<Vec<DiagnosisEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<String>,
}

/// Structured patient card, newest visit first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientCard {
    pub patient_info: PatientInfo,
    pub visits: Vec<VisitEntry>,
}

/// Builds patient cards from the store.
pub struct PatientCardExporter<'a> {
    db: &'a Database,
    today: Option<NaiveDate>,
}

impl<'a> PatientCardExporter<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db, today: None }
    }

    /// Pin the calendar day used for age and file name.
    pub fn on(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Collect the card data for a request.
    pub fn build(&self, request: &PatientCardRequest) -> ExportResult<PatientCard> {
        request.validate()?;
        let patient = self
            .db
            .get_patient(&request.patient_id)?
            .ok_or_else(|| RecordsError::NotFound(format!("Patient {}", request.patient_id)))?;

        let visits = self.db.list_visits_for_patient(
            &patient.id,
            request.date_start,
            request.date_end,
        )?;

        let mut doctor_names: HashMap<String, String> = HashMap::new();
        let mut entries = Vec::with_capacity(visits.len());
        for visit in visits {
            let doctor = match doctor_names.get(&visit.doctor_id) {
                Some(name) => name.clone(),
                None => {
                    let name = self.doctor_name(&visit.doctor_id)?;
                    doctor_names.insert(visit.doctor_id.clone(), name.clone());
                    name
                }
            };
            let diagnoses = if request.include_diagnoses {
                Some(self.diagnosis_entries(&visit)?)
            } else {
                None
            };
            let recommendations = if request.include_recommendations {
                visit.recommendations.clone()
            } else {
                None
            };
            entries.push(VisitEntry {
                visit_info: visit_info(&visit),
                doctor,
                diagnoses,
                recommendations,
            });
        }

        Ok(PatientCard {
            patient_info: self.patient_info(&patient),
            visits: entries,
        })
    }

    /// Render the card in the requested format.
    pub fn export(&self, request: &PatientCardRequest) -> ExportResult<PatientCardExport> {
        let card = self.build(request)?;
        let content = match request.format {
            ExportFormat::Json => serde_json::to_string_pretty(&card)?,
            ExportFormat::Csv => to_csv(&card),
        };
        let file = ExportFile {
            file_name: format!(
                "patient_card_{}_{}.{}",
                request.patient_id,
                self.today().format("%Y-%m-%d"),
                request.format.extension()
            ),
            sha256: checksum(content.as_bytes()),
            content,
        };

        tracing::info!(
            "Exported patient card {} ({} visit(s))",
            file.file_name,
            card.visits.len()
        );

        let action = ViewAction::open(
            "Patient Card Export",
            RecordModel::PatientCardExport,
            &[ViewMode::Form],
        )
        .in_dialog()
        .with_context("file_name", file.file_name.clone())
        .with_context("sha256", file.sha256.clone());

        Ok(PatientCardExport { file, action })
    }

    fn patient_info(&self, patient: &Patient) -> PatientInfo {
        PatientInfo {
            full_name: patient.full_name(),
            birthday: patient.person.birthday,
            age: patient.person.age_on(self.today()),
            blood_type: patient.blood_type.map(|b| b.label().to_string()),
            allergies: patient.allergies.clone(),
        }
    }

    fn doctor_name(&self, doctor_id: &str) -> ExportResult<String> {
        let Some(doctor) = self.db.get_doctor(doctor_id)? else {
            return Ok(NOT_AVAILABLE.to_string());
        };
        let speciality = match &doctor.speciality_id {
            Some(id) => self.db.get_speciality(id)?.map(|s| s.name),
            None => None,
        };
        Ok(doctor.display_name(speciality.as_deref()))
    }

    fn diagnosis_entries(&self, visit: &Visit) -> ExportResult<Vec<DiagnosisEntry>> {
        self.db
            .list_diagnoses_for_visit(&visit.id)?
            .into_iter()
            .map(|diagnosis| self.diagnosis_entry(diagnosis))
            .collect()
    }

    fn diagnosis_entry(&self, diagnosis: MedicalDiagnosis) -> ExportResult<DiagnosisEntry> {
        let disease = match &diagnosis.disease_id {
            Some(id) => self.db.get_disease(id)?.map(|d| d.name),
            None => None,
        };
        Ok(DiagnosisEntry {
            disease,
            description: diagnosis.description,
            treatment: diagnosis.treatment,
            severity: diagnosis.severity,
        })
    }
}

fn visit_info(visit: &Visit) -> VisitInfo {
    VisitInfo {
        visit_date: visit.visit_date,
        status: visit.status,
        cost: visit.cost,
        actual_visit_date: visit.actual_visit_date,
    }
}

/// One row per diagnosis; visits without exported diagnoses get an `N/A` row.
fn to_csv(card: &PatientCard) -> String {
    let mut output = String::from("Patient,VisitDate,Doctor,Diagnosis,Severity,Description,Treatment\n");
    let patient = escape_csv(&card.patient_info.full_name);

    for visit in &card.visits {
        let visit_date = visit.visit_info.visit_date.format(DATETIME_FORMAT).to_string();
        let doctor = escape_csv(&visit.doctor);

        match visit.diagnoses.as_deref() {
            Some(diagnoses) if !diagnoses.is_empty() => {
                for diagnosis in diagnoses {
                    output.push_str(&format!(
                        "{},{},{},{},{},{},{}\n",
                        patient,
                        visit_date,
                        doctor,
                        escape_csv(diagnosis.disease.as_deref().unwrap_or(NOT_AVAILABLE)),
                        diagnosis.severity,
                        escape_csv(diagnosis.description.as_deref().unwrap_or(NOT_AVAILABLE)),
                        escape_csv(diagnosis.treatment.as_deref().unwrap_or(NOT_AVAILABLE)),
                    ));
                }
            }
            _ => {
                output.push_str(&format!(
                    "{},{},{},{na},{na},{na},{na}\n",
                    patient,
                    visit_date,
                    doctor,
                    na = NOT_AVAILABLE
                ));
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BloodType, Disease, Doctor, PersonAttributes, Speciality};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    struct Card {
        db: Database,
        patient: Patient,
        doctor: Doctor,
        disease: Disease,
    }

    fn setup() -> Card {
        let db = Database::open_in_memory().unwrap();
        let speciality = Speciality::new("Cardiology", "CARD");
        db.insert_speciality(&speciality).unwrap();
        let mut doctor = Doctor::new(PersonAttributes::new("Taras", "Bondar"), "LIC-1");
        doctor.speciality_id = Some(speciality.id.clone());
        db.insert_doctor(&doctor).unwrap();

        let mut person = PersonAttributes::new("Maria", "Kovalenko");
        person.birthday = NaiveDate::from_ymd_opt(1990, 6, 1);
        let mut patient = Patient::new(person);
        patient.blood_type = Some(BloodType::APos);
        patient.allergies = Some("Penicillin".into());
        db.insert_patient(&patient).unwrap();

        let disease = Disease::new("Hypertension");
        db.insert_disease(&disease).unwrap();

        Card {
            db,
            patient,
            doctor,
            disease,
        }
    }

    fn visit(card: &Card, day: u32, recommendations: Option<&str>) -> Visit {
        let mut visit = Visit::new(&card.patient.id, &card.doctor.id, at(day), "USD");
        visit.recommendations = recommendations.map(str::to_string);
        card.db.insert_visit(&visit).unwrap();
        visit
    }

    fn diagnose(card: &Card, visit: &Visit, description: &str) {
        let mut diagnosis = MedicalDiagnosis::new(&visit.id, Some(card.disease.id.clone()));
        diagnosis.description = Some(description.to_string());
        card.db.insert_diagnosis(&diagnosis).unwrap();
    }

    #[test]
    fn test_json_card() {
        let card = setup();
        let first = visit(&card, 1, Some("Rest"));
        diagnose(&card, &first, "Elevated pressure");
        visit(&card, 10, None);

        let export = PatientCardExporter::new(&card.db)
            .on(today())
            .export(&PatientCardRequest::new(&card.patient.id))
            .unwrap();

        assert_eq!(
            export.file.file_name,
            format!("patient_card_{}_2024-03-15.json", card.patient.id)
        );
        assert_eq!(export.file.sha256, checksum(export.file.content.as_bytes()));

        let json: serde_json::Value = serde_json::from_str(&export.file.content).unwrap();
        assert_eq!(json["patient_info"]["full_name"], "Kovalenko Maria");
        assert_eq!(json["patient_info"]["age"], 33);
        assert_eq!(json["patient_info"]["blood_type"], "A(II) Rh+");

        let visits = json["visits"].as_array().unwrap();
        assert_eq!(visits.len(), 2);
        // Newest first
        assert_eq!(visits[0]["visit_info"]["visit_date"], "2024-03-10T09:30:00");
        assert_eq!(visits[1]["doctor"], "Bondar Taras (Cardiology)");
        assert_eq!(visits[1]["diagnoses"][0]["disease"], "Hypertension");
        assert_eq!(visits[1]["recommendations"], "Rest");
    }

    #[test]
    fn test_optional_sections_omitted() {
        let card = setup();
        let first = visit(&card, 1, Some("Rest"));
        diagnose(&card, &first, "Elevated pressure");

        let mut request = PatientCardRequest::new(&card.patient.id);
        request.include_diagnoses = false;
        request.include_recommendations = false;

        let built = PatientCardExporter::new(&card.db).on(today()).build(&request).unwrap();
        assert!(built.visits[0].diagnoses.is_none());
        assert!(built.visits[0].recommendations.is_none());

        let json = serde_json::to_value(&built).unwrap();
        assert!(json["visits"][0].get("diagnoses").is_none());
    }

    #[test]
    fn test_csv_rows() {
        let card = setup();
        let first = visit(&card, 1, None);
        diagnose(&card, &first, "Elevated pressure");
        diagnose(&card, &first, "Headache, mild");
        visit(&card, 10, None);

        let mut request = PatientCardRequest::new(&card.patient.id);
        request.format = ExportFormat::Csv;
        let export = PatientCardExporter::new(&card.db).on(today()).export(&request).unwrap();

        assert!(export.file.file_name.ends_with(".csv"));
        let lines: Vec<_> = export.file.content.lines().collect();
        assert_eq!(
            lines[0],
            "Patient,VisitDate,Doctor,Diagnosis,Severity,Description,Treatment"
        );
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[1],
            "Kovalenko Maria,2024-03-10 09:30:00,Bondar Taras (Cardiology),N/A,N/A,N/A,N/A"
        );
        assert!(lines[3].contains("\"Headache, mild\""));
    }

    #[test]
    fn test_date_window() {
        let card = setup();
        visit(&card, 1, None);
        visit(&card, 10, None);

        let mut request = PatientCardRequest::new(&card.patient.id);
        request.date_start = NaiveDate::from_ymd_opt(2024, 3, 5);
        request.date_end = NaiveDate::from_ymd_opt(2024, 3, 10);

        let built = PatientCardExporter::new(&card.db).on(today()).build(&request).unwrap();
        assert_eq!(built.visits.len(), 1);
    }

    #[test]
    fn test_export_action() {
        let card = setup();
        let export = PatientCardExporter::new(&card.db)
            .on(today())
            .export(&PatientCardRequest::new(&card.patient.id))
            .unwrap();

        match &export.action {
            ViewAction::Open { model, .. } => assert_eq!(*model, RecordModel::PatientCardExport),
            ViewAction::Close => panic!("expected open action"),
        }
        assert_eq!(
            export.action.context_value("file_name"),
            Some(&serde_json::json!(export.file.file_name))
        );
    }

    #[test]
    fn test_unknown_patient() {
        let db = Database::open_in_memory().unwrap();
        let result = PatientCardExporter::new(&db).build(&PatientCardRequest::new("missing"));
        assert!(matches!(
            result,
            Err(super::super::ExportError::Records(RecordsError::NotFound(_)))
        ));
    }
}
