//! Visit database operations.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{named_params, params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::{Visit, VisitStatus};

const SELECT_VISITS: &str = r#"
    SELECT id, patient_id, doctor_id, mentor_id, status, visit_date, actual_visit_date,
           visit_type, recommendations, currency, cost
    FROM visits
"#;

impl Database {
    /// Insert a new visit.
    pub fn insert_visit(&self, visit: &Visit) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO visits (
                id, patient_id, doctor_id, mentor_id, status, visit_date, actual_visit_date,
                visit_type, recommendations, currency, cost
            ) VALUES (
                :id, :patient_id, :doctor_id, :mentor_id, :status, :visit_date, :actual_visit_date,
                :visit_type, :recommendations, :currency, :cost
            )
            "#,
            named_params! {
                ":id": visit.id,
                ":patient_id": visit.patient_id,
                ":doctor_id": visit.doctor_id,
                ":mentor_id": visit.mentor_id,
                ":status": visit.status,
                ":visit_date": visit.visit_date,
                ":actual_visit_date": visit.actual_visit_date,
                ":visit_type": visit.visit_type,
                ":recommendations": visit.recommendations,
                ":currency": visit.currency,
                ":cost": visit.cost,
            },
        )?;
        Ok(())
    }

    /// Update an existing visit.
    pub fn update_visit(&self, visit: &Visit) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE visits SET
                patient_id = :patient_id,
                doctor_id = :doctor_id,
                mentor_id = :mentor_id,
                status = :status,
                visit_date = :visit_date,
                actual_visit_date = :actual_visit_date,
                visit_type = :visit_type,
                recommendations = :recommendations,
                currency = :currency,
                cost = :cost,
                updated_at = datetime('now')
            WHERE id = :id
            "#,
            named_params! {
                ":id": visit.id,
                ":patient_id": visit.patient_id,
                ":doctor_id": visit.doctor_id,
                ":mentor_id": visit.mentor_id,
                ":status": visit.status,
                ":visit_date": visit.visit_date,
                ":actual_visit_date": visit.actual_visit_date,
                ":visit_type": visit.visit_type,
                ":recommendations": visit.recommendations,
                ":currency": visit.currency,
                ":cost": visit.cost,
            },
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a visit by ID.
    pub fn get_visit(&self, id: &str) -> DbResult<Option<Visit>> {
        self.conn
            .query_row(&format!("{SELECT_VISITS} WHERE id = ?"), [id], visit_from_row)
            .optional()
            .map_err(Into::into)
    }

    /// Count other visits of the same patient with the same doctor on `day`.
    pub fn count_same_day_visits(
        &self,
        patient_id: &str,
        doctor_id: &str,
        day: NaiveDate,
        exclude_id: &str,
    ) -> DbResult<usize> {
        let (start, end) = day_bounds(day);
        let count: i64 = self.conn.query_row(
            r#"
            SELECT COUNT(*) FROM visits
            WHERE patient_id = ?1 AND doctor_id = ?2 AND id != ?3
              AND visit_date >= ?4 AND visit_date < ?5
            "#,
            params![patient_id, doctor_id, exclude_id, start, end],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Visits of a patient, newest first, optionally restricted to an
    /// inclusive date window.
    pub fn list_visits_for_patient(
        &self,
        patient_id: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> DbResult<Vec<Visit>> {
        let start = from.map(|d| day_bounds(d).0);
        let end = to.map(|d| day_bounds(d).1);
        let mut stmt = self.conn.prepare(&format!(
            r#"{SELECT_VISITS}
            WHERE patient_id = ?1
              AND (?2 IS NULL OR visit_date >= ?2)
              AND (?3 IS NULL OR visit_date < ?3)
            ORDER BY visit_date DESC"#
        ))?;
        let rows = stmt.query_map(params![patient_id, start, end], visit_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Visits of a doctor in a given status, newest first.
    pub fn list_visits_for_doctor(&self, doctor_id: &str, status: VisitStatus) -> DbResult<Vec<Visit>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SELECT_VISITS} WHERE doctor_id = ?1 AND status = ?2 ORDER BY visit_date DESC"
        ))?;
        let rows = stmt.query_map(params![doctor_id, status], visit_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Completed visits planned at or after `since`, newest first.
    pub fn list_completed_visits_since(&self, since: NaiveDateTime) -> DbResult<Vec<Visit>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SELECT_VISITS} WHERE status = ?1 AND visit_date >= ?2 ORDER BY visit_date DESC"
        ))?;
        let rows = stmt.query_map(params![VisitStatus::Completed, since], visit_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

/// `[day 00:00:00, next day 00:00:00)`.
pub fn day_bounds(day: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let start = day.and_time(chrono::NaiveTime::MIN);
    (start, start + chrono::Duration::days(1))
}

fn visit_from_row(row: &Row<'_>) -> rusqlite::Result<Visit> {
    Ok(Visit {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        doctor_id: row.get(2)?,
        mentor_id: row.get(3)?,
        status: row.get(4)?,
        visit_date: row.get(5)?,
        actual_visit_date: row.get(6)?,
        visit_type: row.get(7)?,
        recommendations: row.get(8)?,
        currency: row.get(9)?,
        cost: row.get(10)?,
    })
}
