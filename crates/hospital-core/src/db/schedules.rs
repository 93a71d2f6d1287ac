//! Doctor schedule database operations.

use chrono::NaiveDate;
use rusqlite::{params, Row};

use super::{Database, DbResult};
use crate::models::DoctorSchedule;

impl Database {
    /// Insert schedule slots in one batch.
    pub fn insert_schedules(&self, slots: &[DoctorSchedule]) -> DbResult<()> {
        let tx = self.begin()?;
        {
            let mut stmt = self.conn.prepare(
                r#"
                INSERT INTO doctor_schedules (
                    id, doctor_id, day_of_week, date, start_time, end_time, schedule_type, notes
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )?;
            for slot in slots {
                stmt.execute(params![
                    slot.id,
                    slot.doctor_id,
                    slot.day_of_week,
                    slot.date,
                    slot.start_time,
                    slot.end_time,
                    slot.schedule_type,
                    slot.notes,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Slots of a doctor, ordered by date and start time.
    pub fn list_schedules_for_doctor(&self, doctor_id: &str) -> DbResult<Vec<DoctorSchedule>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, doctor_id, day_of_week, date, start_time, end_time, schedule_type, notes
            FROM doctor_schedules
            WHERE doctor_id = ?
            ORDER BY date, start_time
            "#,
        )?;
        let rows = stmt.query_map([doctor_id], schedule_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Slots of a doctor within an inclusive date range.
    pub fn list_schedules_between(
        &self,
        doctor_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<Vec<DoctorSchedule>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, doctor_id, day_of_week, date, start_time, end_time, schedule_type, notes
            FROM doctor_schedules
            WHERE doctor_id = ?1 AND date >= ?2 AND date <= ?3
            ORDER BY date, start_time
            "#,
        )?;
        let rows = stmt.query_map(params![doctor_id, from, to], schedule_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

fn schedule_from_row(row: &Row<'_>) -> rusqlite::Result<DoctorSchedule> {
    Ok(DoctorSchedule {
        id: row.get(0)?,
        doctor_id: row.get(1)?,
        day_of_week: row.get(2)?,
        date: row.get(3)?,
        start_time: row.get(4)?,
        end_time: row.get(5)?,
        schedule_type: row.get(6)?,
        notes: row.get(7)?,
    })
}
