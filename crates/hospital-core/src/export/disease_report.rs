//! Diagnosis statistics over a visit date range.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::ExportResult;
use crate::db::{Database, DiagnosisQuery, DiagnosisRow};
use crate::models::{
    DomainFilter, FilterOp, RecordModel, Severity, ValidationError, ValidationResult, ViewAction,
    ViewMode,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    /// Matching diagnoses plus group counts
    #[default]
    Detailed,
    /// Group counts only
    Summary,
}

/// Key diagnoses are counted by.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReportGrouping {
    Doctor,
    #[default]
    Disease,
    /// Calendar month of the visit
    Month,
    /// Patient citizenship
    Country,
}

/// Filters for the disease report. Empty id sets match everything.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiseaseReportRequest {
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
    pub doctor_ids: Vec<String>,
    pub disease_ids: Vec<String>,
    pub country_codes: Vec<String>,
    pub report_type: ReportType,
    /// Counts by disease when unset
    pub group_by: Option<ReportGrouping>,
}

/// One diagnosis line of a detailed report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiseaseReportRow {
    pub diagnosis_id: String,
    pub visit_date: NaiveDateTime,
    pub doctor: String,
    pub disease: Option<String>,
    pub patient_country: Option<String>,
    pub severity: Severity,
    pub is_approved: bool,
}

/// Diagnosis count for one group key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportGroupCount {
    pub key: String,
    pub label: String,
    pub count: usize,
}

/// Executed report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiseaseReport {
    pub report_type: ReportType,
    pub grouping: ReportGrouping,
    /// Empty for summary reports
    pub rows: Vec<DiseaseReportRow>,
    /// Ordered by key
    pub groups: Vec<ReportGroupCount>,
    pub total: usize,
}

const UNDEFINED: &str = "Undefined";

impl DiseaseReportRequest {
    /// A detailed report over `[date_start, date_end]` with no other filter.
    pub fn new(date_start: NaiveDate, date_end: NaiveDate) -> Self {
        Self {
            date_start,
            date_end,
            doctor_ids: Vec::new(),
            disease_ids: Vec::new(),
            country_codes: Vec::new(),
            report_type: ReportType::Detailed,
            group_by: None,
        }
    }

    pub fn validate(&self) -> ValidationResult {
        if self.date_end < self.date_start {
            return Err(ValidationError::EndBeforeStart);
        }
        Ok(())
    }

    /// The repository filter for this request.
    pub fn query(&self) -> DiagnosisQuery {
        DiagnosisQuery {
            date_start: Some(self.date_start),
            date_end: Some(self.date_end),
            doctor_ids: self.doctor_ids.clone(),
            disease_ids: self.disease_ids.clone(),
            country_codes: self.country_codes.clone(),
        }
    }

    /// View over the matching diagnoses, grouped by disease.
    pub fn action(&self) -> ViewAction {
        let mut action = ViewAction::open(
            "Disease Report",
            RecordModel::Diagnosis,
            &[ViewMode::List, ViewMode::Form, ViewMode::Pivot, ViewMode::Graph],
        )
        .filter(DomainFilter::new(
            "visit.visit_date",
            FilterOp::Gte,
            self.date_start.to_string(),
        ))
        .filter(DomainFilter::new(
            "visit.visit_date",
            FilterOp::Lte,
            self.date_end.to_string(),
        ));

        if !self.doctor_ids.is_empty() {
            action = action.filter(DomainFilter::new(
                "visit.doctor_id",
                FilterOp::In,
                self.doctor_ids.clone(),
            ));
        }
        if !self.disease_ids.is_empty() {
            action = action.filter(DomainFilter::new(
                "disease_id",
                FilterOp::In,
                self.disease_ids.clone(),
            ));
        }
        if !self.country_codes.is_empty() {
            action = action.filter(DomainFilter::new(
                "visit.patient.country_code",
                FilterOp::In,
                self.country_codes.clone(),
            ));
        }

        action.with_context("group_by", "disease_id")
    }

    /// Execute the report against the store.
    pub fn run(&self, db: &Database) -> ExportResult<DiseaseReport> {
        self.validate()?;
        let matches = db.query_diagnoses(&self.query())?;
        let grouping = self.group_by.unwrap_or_default();

        let mut counts: BTreeMap<String, (String, usize)> = BTreeMap::new();
        for row in &matches {
            let (key, label) = group_key(row, grouping);
            counts.entry(key).or_insert((label, 0)).1 += 1;
        }
        let groups = counts
            .into_iter()
            .map(|(key, (label, count))| ReportGroupCount { key, label, count })
            .collect();

        let total = matches.len();
        let rows = match self.report_type {
            ReportType::Detailed => matches.into_iter().map(report_row).collect(),
            ReportType::Summary => Vec::new(),
        };

        tracing::info!(
            "Disease report {} to {}: {} diagnosis record(s)",
            self.date_start,
            self.date_end,
            total
        );

        Ok(DiseaseReport {
            report_type: self.report_type,
            grouping,
            rows,
            groups,
            total,
        })
    }
}

fn group_key(row: &DiagnosisRow, grouping: ReportGrouping) -> (String, String) {
    match grouping {
        ReportGrouping::Doctor => (row.doctor_id.clone(), row.doctor_name.clone()),
        ReportGrouping::Disease => match (&row.diagnosis.disease_id, &row.disease_name) {
            (Some(id), Some(name)) => (id.clone(), name.clone()),
            _ => (String::new(), UNDEFINED.to_string()),
        },
        ReportGrouping::Month => {
            let month = row.visit_date.format("%Y-%m").to_string();
            (month.clone(), month)
        }
        ReportGrouping::Country => match &row.patient_country {
            Some(code) => (code.clone(), code.clone()),
            None => (String::new(), UNDEFINED.to_string()),
        },
    }
}

fn report_row(row: DiagnosisRow) -> DiseaseReportRow {
    DiseaseReportRow {
        diagnosis_id: row.diagnosis.id,
        visit_date: row.visit_date,
        doctor: row.doctor_name,
        disease: row.disease_name,
        patient_country: row.patient_country,
        severity: row.diagnosis.severity,
        is_approved: row.diagnosis.is_approved,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Disease, Doctor, MedicalDiagnosis, Patient, PersonAttributes, Visit};

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, month, day).unwrap()
    }

    struct Clinic {
        db: Database,
        doctor: Doctor,
        flu: Disease,
        asthma: Disease,
    }

    fn setup() -> Clinic {
        let db = Database::open_in_memory().unwrap();
        let doctor = Doctor::new(PersonAttributes::new("Olena", "Shevchenko"), "LIC-1");
        db.insert_doctor(&doctor).unwrap();
        let flu = Disease::new("Influenza");
        let asthma = Disease::new("Asthma");
        db.insert_disease(&flu).unwrap();
        db.insert_disease(&asthma).unwrap();
        Clinic {
            db,
            doctor,
            flu,
            asthma,
        }
    }

    fn diagnose(clinic: &Clinic, country: &str, visit_day: NaiveDate, disease: Option<&Disease>) {
        let mut person = PersonAttributes::new("Patient", country);
        person.country_code = Some(country.to_string());
        let patient = Patient::new(person);
        clinic.db.insert_patient(&patient).unwrap();
        let visit = Visit::new(
            &patient.id,
            &clinic.doctor.id,
            visit_day.and_hms_opt(10, 0, 0).unwrap(),
            "USD",
        );
        clinic.db.insert_visit(&visit).unwrap();
        let diagnosis = MedicalDiagnosis::new(&visit.id, disease.map(|d| d.id.clone()));
        clinic.db.insert_diagnosis(&diagnosis).unwrap();
    }

    #[test]
    fn test_action_domain() {
        let mut request = DiseaseReportRequest::new(date(1, 1), date(1, 31));
        request.country_codes = vec!["UA".into()];

        let action = request.action();
        match &action {
            ViewAction::Open {
                model,
                domain,
                view_modes,
                ..
            } => {
                assert_eq!(*model, RecordModel::Diagnosis);
                assert_eq!(view_modes.len(), 4);
                assert_eq!(domain.len(), 3);
                assert_eq!(domain[0].value, serde_json::json!("2024-01-01"));
                assert_eq!(domain[2].field, "visit.patient.country_code");
            }
            ViewAction::Close => panic!("expected open action"),
        }
        assert_eq!(
            action.context_value("group_by"),
            Some(&serde_json::json!("disease_id"))
        );
    }

    #[test]
    fn test_counts_by_disease() {
        let clinic = setup();
        diagnose(&clinic, "UA", date(1, 10), Some(&clinic.flu));
        diagnose(&clinic, "PL", date(1, 12), Some(&clinic.flu));
        diagnose(&clinic, "UA", date(1, 31), Some(&clinic.asthma));
        diagnose(&clinic, "UA", date(1, 15), None);
        diagnose(&clinic, "UA", date(2, 1), Some(&clinic.asthma));

        let report = DiseaseReportRequest::new(date(1, 1), date(1, 31))
            .run(&clinic.db)
            .unwrap();

        assert_eq!(report.total, 4);
        assert_eq!(report.rows.len(), 4);
        let count_of = |label: &str| {
            report
                .groups
                .iter()
                .find(|g| g.label == label)
                .map(|g| g.count)
        };
        assert_eq!(count_of("Influenza"), Some(2));
        assert_eq!(count_of("Asthma"), Some(1));
        assert_eq!(count_of(UNDEFINED), Some(1));
    }

    #[test]
    fn test_summary_by_country() {
        let clinic = setup();
        diagnose(&clinic, "UA", date(1, 10), Some(&clinic.flu));
        diagnose(&clinic, "PL", date(1, 12), Some(&clinic.flu));
        diagnose(&clinic, "UA", date(1, 20), Some(&clinic.asthma));

        let mut request = DiseaseReportRequest::new(date(1, 1), date(1, 31));
        request.report_type = ReportType::Summary;
        request.group_by = Some(ReportGrouping::Country);
        request.disease_ids = vec![clinic.flu.id.clone()];

        let report = request.run(&clinic.db).unwrap();
        assert!(report.rows.is_empty());
        assert_eq!(report.total, 2);
        let keys: Vec<_> = report.groups.iter().map(|g| (g.key.as_str(), g.count)).collect();
        assert_eq!(keys, vec![("PL", 1), ("UA", 1)]);
    }

    #[test]
    fn test_reversed_range_rejected() {
        let clinic = setup();
        let result = DiseaseReportRequest::new(date(2, 1), date(1, 1)).run(&clinic.db);
        assert!(result.is_err());
    }
}
