//! Patient doctor history database operations.

use chrono::NaiveDate;
use rusqlite::{params, Row};

use super::{Database, DbResult};
use crate::models::PatientDoctorHistory;

const SELECT_HISTORY: &str = r#"
    SELECT id, patient_id, doctor_id, assign_date, end_date, change_reason, active
    FROM patient_doctor_history
"#;

impl Database {
    /// Insert a history record as-is.
    pub fn insert_history(&self, record: &PatientDoctorHistory) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO patient_doctor_history (
                id, patient_id, doctor_id, assign_date, end_date, change_reason, active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                record.id,
                record.patient_id,
                record.doctor_id,
                record.assign_date,
                record.end_date,
                record.change_reason,
                record.active,
            ],
        )?;
        Ok(())
    }

    /// Archive every active record of a patient except `keep_id`.
    ///
    /// Returns the number of archived records.
    pub fn archive_history_except(
        &self,
        patient_id: &str,
        keep_id: &str,
        end_date: NaiveDate,
    ) -> DbResult<usize> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE patient_doctor_history
            SET active = 0, end_date = ?3
            WHERE patient_id = ?1 AND active = 1 AND id != ?2
            "#,
            params![patient_id, keep_id, end_date],
        )?;
        Ok(rows_affected)
    }

    /// Full history of a patient, newest assignment first.
    pub fn list_history_for_patient(&self, patient_id: &str) -> DbResult<Vec<PatientDoctorHistory>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SELECT_HISTORY} WHERE patient_id = ? ORDER BY assign_date DESC, rowid DESC"
        ))?;
        let rows = stmt.query_map([patient_id], history_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Active history records of a patient (at most one when the audit holds).
    pub fn list_active_history(&self, patient_id: &str) -> DbResult<Vec<PatientDoctorHistory>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SELECT_HISTORY} WHERE patient_id = ? AND active = 1 ORDER BY assign_date DESC, rowid DESC"
        ))?;
        let rows = stmt.query_map([patient_id], history_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

fn history_from_row(row: &Row<'_>) -> rusqlite::Result<PatientDoctorHistory> {
    Ok(PatientDoctorHistory {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        doctor_id: row.get(2)?,
        assign_date: row.get(3)?,
        end_date: row.get(4)?,
        change_reason: row.get(5)?,
        active: row.get(6)?,
    })
}
