//! Medical diagnosis database operations.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, OptionalExtension, Row, ToSql};

use super::visits::day_bounds;
use super::{Database, DbResult};
use crate::models::{MedicalDiagnosis, PersonAttributes};

const DIAGNOSIS_COLUMNS: &str = "d.id, d.visit_id, d.disease_id, d.description, d.treatment, \
    d.is_approved, d.approving_doctor_id, d.approval_date, d.severity";

/// Filter for the diagnosis report. Empty sets match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiagnosisQuery {
    /// First visit day, inclusive
    pub date_start: Option<NaiveDate>,
    /// Last visit day, inclusive
    pub date_end: Option<NaiveDate>,
    pub doctor_ids: Vec<String>,
    pub disease_ids: Vec<String>,
    /// Patient citizenship codes
    pub country_codes: Vec<String>,
}

/// A diagnosis joined with the visit, doctor, disease and patient it refers to.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosisRow {
    pub diagnosis: MedicalDiagnosis,
    pub visit_date: NaiveDateTime,
    pub doctor_id: String,
    pub doctor_name: String,
    pub disease_name: Option<String>,
    pub patient_id: String,
    pub patient_country: Option<String>,
}

impl Database {
    /// Insert a new diagnosis.
    pub fn insert_diagnosis(&self, diagnosis: &MedicalDiagnosis) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO diagnoses (
                id, visit_id, disease_id, description, treatment,
                is_approved, approving_doctor_id, approval_date, severity
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                diagnosis.id,
                diagnosis.visit_id,
                diagnosis.disease_id,
                diagnosis.description,
                diagnosis.treatment,
                diagnosis.is_approved,
                diagnosis.approving_doctor_id,
                diagnosis.approval_date,
                diagnosis.severity,
            ],
        )?;
        Ok(())
    }

    /// Update an existing diagnosis.
    pub fn update_diagnosis(&self, diagnosis: &MedicalDiagnosis) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE diagnoses SET
                visit_id = ?2,
                disease_id = ?3,
                description = ?4,
                treatment = ?5,
                is_approved = ?6,
                approving_doctor_id = ?7,
                approval_date = ?8,
                severity = ?9
            WHERE id = ?1
            "#,
            params![
                diagnosis.id,
                diagnosis.visit_id,
                diagnosis.disease_id,
                diagnosis.description,
                diagnosis.treatment,
                diagnosis.is_approved,
                diagnosis.approving_doctor_id,
                diagnosis.approval_date,
                diagnosis.severity,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a diagnosis by ID.
    pub fn get_diagnosis(&self, id: &str) -> DbResult<Option<MedicalDiagnosis>> {
        self.conn
            .query_row(
                &format!("SELECT {DIAGNOSIS_COLUMNS} FROM diagnoses d WHERE d.id = ?"),
                [id],
                diagnosis_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Diagnoses made during a visit.
    pub fn list_diagnoses_for_visit(&self, visit_id: &str) -> DbResult<Vec<MedicalDiagnosis>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {DIAGNOSIS_COLUMNS} FROM diagnoses d WHERE d.visit_id = ? ORDER BY d.rowid"
        ))?;
        let rows = stmt.query_map([visit_id], diagnosis_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Number of diagnoses made during a visit.
    pub fn count_diagnoses_for_visit(&self, visit_id: &str) -> DbResult<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM diagnoses WHERE visit_id = ?",
            [visit_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Every diagnosis of a patient across all visits, newest visit first.
    pub fn list_diagnoses_for_patient(&self, patient_id: &str) -> DbResult<Vec<MedicalDiagnosis>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {DIAGNOSIS_COLUMNS}
            FROM diagnoses d
            JOIN visits v ON v.id = d.visit_id
            WHERE v.patient_id = ?
            ORDER BY v.visit_date DESC, d.rowid
            "#
        ))?;
        let rows = stmt.query_map([patient_id], diagnosis_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Diagnoses matching a report filter, oldest visit first.
    pub fn query_diagnoses(&self, query: &DiagnosisQuery) -> DbResult<Vec<DiagnosisRow>> {
        let start = query.date_start.map(|d| day_bounds(d).0);
        let end = query.date_end.map(|d| day_bounds(d).1);

        let mut sql = format!(
            r#"
            SELECT {DIAGNOSIS_COLUMNS},
                   v.visit_date, v.doctor_id, doc.first_name, doc.last_name, doc.middle_name,
                   dis.name, p.id, p.country_code
            FROM diagnoses d
            JOIN visits v ON v.id = d.visit_id
            JOIN doctors doc ON doc.id = v.doctor_id
            JOIN patients p ON p.id = v.patient_id
            LEFT JOIN diseases dis ON dis.id = d.disease_id
            WHERE 1 = 1
            "#
        );
        let mut values: Vec<&dyn ToSql> = Vec::new();

        if let Some(start) = &start {
            sql.push_str(" AND v.visit_date >= ?");
            values.push(start);
        }
        if let Some(end) = &end {
            sql.push_str(" AND v.visit_date < ?");
            values.push(end);
        }
        for (column, ids) in [
            ("v.doctor_id", &query.doctor_ids),
            ("d.disease_id", &query.disease_ids),
            ("p.country_code", &query.country_codes),
        ] {
            if ids.is_empty() {
                continue;
            }
            let placeholders = vec!["?"; ids.len()].join(", ");
            sql.push_str(&format!(" AND {column} IN ({placeholders})"));
            values.extend(ids.iter().map(|id| id as &dyn ToSql));
        }
        sql.push_str(" ORDER BY v.visit_date, d.rowid");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(values.as_slice(), |row| {
            let doctor = PersonAttributes {
                first_name: row.get(11)?,
                last_name: row.get(12)?,
                middle_name: row.get(13)?,
                ..Default::default()
            };
            Ok(DiagnosisRow {
                diagnosis: diagnosis_from_row(row)?,
                visit_date: row.get(9)?,
                doctor_id: row.get(10)?,
                doctor_name: doctor.full_name(),
                disease_name: row.get(14)?,
                patient_id: row.get(15)?,
                patient_country: row.get(16)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

fn diagnosis_from_row(row: &Row<'_>) -> rusqlite::Result<MedicalDiagnosis> {
    Ok(MedicalDiagnosis {
        id: row.get(0)?,
        visit_id: row.get(1)?,
        disease_id: row.get(2)?,
        description: row.get(3)?,
        treatment: row.get(4)?,
        is_approved: row.get(5)?,
        approving_doctor_id: row.get(6)?,
        approval_date: row.get(7)?,
        severity: row.get(8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Disease, Doctor, Patient, Severity, Visit};

    fn at(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, d)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    struct Fixture {
        db: Database,
        doctor: Doctor,
        flu: Disease,
        visit: Visit,
    }

    fn setup_db() -> Fixture {
        let db = Database::open_in_memory().unwrap();
        let doctor = Doctor::new(PersonAttributes::new("Iryna", "Melnyk"), "LIC-1");
        db.insert_doctor(&doctor).unwrap();

        let mut person = PersonAttributes::new("Maria", "Lysenko");
        person.country_code = Some("UA".into());
        let patient = Patient::new(person);
        db.insert_patient(&patient).unwrap();

        let flu = Disease::new("Influenza");
        db.insert_disease(&flu).unwrap();

        let visit = Visit::new(&patient.id, &doctor.id, at(5), "USD");
        db.insert_visit(&visit).unwrap();

        Fixture {
            db,
            doctor,
            flu,
            visit,
        }
    }

    #[test]
    fn test_insert_update_get() {
        let f = setup_db();

        let mut diagnosis = MedicalDiagnosis::new(&f.visit.id, Some(f.flu.id.clone()));
        diagnosis.severity = Severity::High;
        f.db.insert_diagnosis(&diagnosis).unwrap();

        diagnosis.approve(&f.doctor.id, at(6));
        assert!(f.db.update_diagnosis(&diagnosis).unwrap());

        let retrieved = f.db.get_diagnosis(&diagnosis.id).unwrap().unwrap();
        assert_eq!(retrieved, diagnosis);
        assert_eq!(f.db.count_diagnoses_for_visit(&f.visit.id).unwrap(), 1);
    }

    #[test]
    fn test_visit_cannot_be_deleted_with_diagnoses() {
        let f = setup_db();
        f.db.insert_diagnosis(&MedicalDiagnosis::new(&f.visit.id, None))
            .unwrap();

        let result = f
            .db
            .conn()
            .execute("DELETE FROM visits WHERE id = ?", [&f.visit.id]);
        assert!(result.is_err());
    }

    #[test]
    fn test_query_filters() {
        let f = setup_db();
        f.db.insert_diagnosis(&MedicalDiagnosis::new(&f.visit.id, Some(f.flu.id.clone())))
            .unwrap();
        f.db.insert_diagnosis(&MedicalDiagnosis::new(&f.visit.id, None))
            .unwrap();

        let all = f.db.query_diagnoses(&DiagnosisQuery::default()).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].doctor_name, "Melnyk Iryna");
        assert_eq!(all[0].patient_country.as_deref(), Some("UA"));

        let flu_only = f
            .db
            .query_diagnoses(&DiagnosisQuery {
                disease_ids: vec![f.flu.id.clone()],
                ..Default::default()
            })
            .unwrap();
        assert_eq!(flu_only.len(), 1);
        assert_eq!(flu_only[0].disease_name.as_deref(), Some("Influenza"));

        // The visit day itself is inside an inclusive range ending on it.
        let same_day = f
            .db
            .query_diagnoses(&DiagnosisQuery {
                date_start: Some(at(5).date()),
                date_end: Some(at(5).date()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(same_day.len(), 2);

        let other_country = f
            .db
            .query_diagnoses(&DiagnosisQuery {
                country_codes: vec!["PL".into()],
                ..Default::default()
            })
            .unwrap();
        assert!(other_country.is_empty());
    }
}
