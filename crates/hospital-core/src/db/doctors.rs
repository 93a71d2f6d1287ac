//! Doctor database operations.

use rusqlite::{named_params, OptionalExtension, Row};

use super::{
    person_from_row, person_params, unique_violation, Database, DbResult, PERSON_ASSIGNMENTS,
    PERSON_COLUMNS, PERSON_VALUES,
};
use crate::models::Doctor;

const DOCTOR_UNIQUE: &str = "License number must be unique!";

impl Database {
    /// Insert a new doctor.
    pub fn insert_doctor(&self, doctor: &Doctor) -> DbResult<()> {
        let sql = format!(
            r#"
            INSERT INTO doctors (
                id, {PERSON_COLUMNS}, user_id, speciality_id, is_intern, mentor_id,
                license_number, license_date, rating, study_country_code, active
            ) VALUES (
                :id, {PERSON_VALUES}, :user_id, :speciality_id, :is_intern, :mentor_id,
                :license_number, :license_date, :rating, :study_country_code, :active
            )
            "#
        );

        let mut params = person_params(&doctor.person);
        params.extend_from_slice(named_params! {
            ":id": doctor.id,
            ":user_id": doctor.user_id,
            ":speciality_id": doctor.speciality_id,
            ":is_intern": doctor.is_intern,
            ":mentor_id": doctor.mentor_id,
            ":license_number": doctor.license_number,
            ":license_date": doctor.license_date,
            ":rating": doctor.rating,
            ":study_country_code": doctor.study_country_code,
            ":active": doctor.active,
        });

        self.conn
            .execute(&sql, params.as_slice())
            .map_err(|e| unique_violation(e, DOCTOR_UNIQUE))?;
        Ok(())
    }

    /// Update an existing doctor.
    pub fn update_doctor(&self, doctor: &Doctor) -> DbResult<bool> {
        let sql = format!(
            r#"
            UPDATE doctors SET
                {PERSON_ASSIGNMENTS},
                user_id = :user_id,
                speciality_id = :speciality_id,
                is_intern = :is_intern,
                mentor_id = :mentor_id,
                license_number = :license_number,
                license_date = :license_date,
                rating = :rating,
                study_country_code = :study_country_code,
                active = :active,
                updated_at = datetime('now')
            WHERE id = :id
            "#
        );

        let mut params = person_params(&doctor.person);
        params.extend_from_slice(named_params! {
            ":id": doctor.id,
            ":user_id": doctor.user_id,
            ":speciality_id": doctor.speciality_id,
            ":is_intern": doctor.is_intern,
            ":mentor_id": doctor.mentor_id,
            ":license_number": doctor.license_number,
            ":license_date": doctor.license_date,
            ":rating": doctor.rating,
            ":study_country_code": doctor.study_country_code,
            ":active": doctor.active,
        });

        let rows_affected = self
            .conn
            .execute(&sql, params.as_slice())
            .map_err(|e| unique_violation(e, DOCTOR_UNIQUE))?;
        Ok(rows_affected > 0)
    }

    /// Get a doctor by ID.
    pub fn get_doctor(&self, id: &str) -> DbResult<Option<Doctor>> {
        self.conn
            .query_row(
                &format!("{} WHERE id = ?", select_doctors()),
                [id],
                doctor_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Find the doctor linked to a system user.
    pub fn get_doctor_by_user(&self, user_id: &str) -> DbResult<Option<Doctor>> {
        self.conn
            .query_row(
                &format!("{} WHERE user_id = ? ORDER BY last_name LIMIT 1", select_doctors()),
                [user_id],
                doctor_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Interns supervised by a mentor.
    pub fn list_interns(&self, mentor_id: &str) -> DbResult<Vec<Doctor>> {
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE mentor_id = ? ORDER BY last_name, first_name",
            select_doctors()
        ))?;
        let rows = stmt.query_map([mentor_id], doctor_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// List active doctors.
    pub fn list_doctors(&self) -> DbResult<Vec<Doctor>> {
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE active = 1 ORDER BY last_name, first_name",
            select_doctors()
        ))?;
        let rows = stmt.query_map([], doctor_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

fn select_doctors() -> String {
    format!(
        r#"
        SELECT id, {PERSON_COLUMNS}, user_id, speciality_id, is_intern, mentor_id,
               license_number, license_date, rating, study_country_code, active
        FROM doctors
        "#
    )
}

fn doctor_from_row(row: &Row<'_>) -> rusqlite::Result<Doctor> {
    Ok(Doctor {
        id: row.get("id")?,
        person: person_from_row(row)?,
        user_id: row.get("user_id")?,
        speciality_id: row.get("speciality_id")?,
        is_intern: row.get("is_intern")?,
        mentor_id: row.get("mentor_id")?,
        license_number: row.get("license_number")?,
        license_date: row.get("license_date")?,
        rating: row.get("rating")?,
        study_country_code: row.get("study_country_code")?,
        active: row.get("active")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbError;
    use crate::models::{Gender, PersonAttributes};
    use chrono::NaiveDate;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn doctor(first: &str, license: &str) -> Doctor {
        Doctor::new(PersonAttributes::new(first, "Melnyk"), license)
    }

    #[test]
    fn test_insert_and_get() {
        let db = setup_db();

        let mut doc = doctor("Iryna", "LIC-100");
        doc.person.gender = Some(Gender::Female);
        doc.person.birthday = NaiveDate::from_ymd_opt(1980, 4, 2);
        doc.rating = 4.5;
        doc.user_id = Some("user-7".into());
        db.insert_doctor(&doc).unwrap();

        let retrieved = db.get_doctor(&doc.id).unwrap().unwrap();
        assert_eq!(retrieved, doc);

        let by_user = db.get_doctor_by_user("user-7").unwrap().unwrap();
        assert_eq!(by_user.id, doc.id);
    }

    #[test]
    fn test_duplicate_license_rejected() {
        let db = setup_db();
        db.insert_doctor(&doctor("Iryna", "LIC-100")).unwrap();

        let result = db.insert_doctor(&doctor("Pavlo", "LIC-100"));
        assert!(matches!(result, Err(DbError::Constraint(msg)) if msg.contains("License")));
    }

    #[test]
    fn test_interns_listed_by_mentor() {
        let db = setup_db();
        let mentor = doctor("Iryna", "LIC-100");
        db.insert_doctor(&mentor).unwrap();

        let mut intern = doctor("Pavlo", "LIC-200");
        intern.is_intern = true;
        intern.mentor_id = Some(mentor.id.clone());
        db.insert_doctor(&intern).unwrap();

        let interns = db.list_interns(&mentor.id).unwrap();
        assert_eq!(interns.len(), 1);
        assert_eq!(interns[0].id, intern.id);
    }

    #[test]
    fn test_update_doctor() {
        let db = setup_db();
        let mut doc = doctor("Iryna", "LIC-100");
        db.insert_doctor(&doc).unwrap();

        doc.active = false;
        doc.rating = 3.0;
        assert!(db.update_doctor(&doc).unwrap());

        let retrieved = db.get_doctor(&doc.id).unwrap().unwrap();
        assert!(!retrieved.active);
        assert!(db.list_doctors().unwrap().is_empty());
    }
}
