//! Patient and contact person database operations.

use rusqlite::{named_params, params, OptionalExtension, Row};

use super::{
    person_from_row, person_params, Database, DbResult, PERSON_ASSIGNMENTS, PERSON_COLUMNS,
    PERSON_VALUES,
};
use crate::models::{ContactPerson, Patient};

impl Database {
    /// Insert a new patient.
    ///
    /// This is the raw write; doctor history is maintained by the records layer.
    pub fn insert_patient(&self, patient: &Patient) -> DbResult<()> {
        let sql = format!(
            r#"
            INSERT INTO patients (
                id, {PERSON_COLUMNS}, personal_doctor_id, passport_data, contact_person_id,
                blood_type, allergies, insurance_company, insurance_policy_number
            ) VALUES (
                :id, {PERSON_VALUES}, :personal_doctor_id, :passport_data, :contact_person_id,
                :blood_type, :allergies, :insurance_company, :insurance_policy_number
            )
            "#
        );

        let mut params = person_params(&patient.person);
        params.extend_from_slice(named_params! {
            ":id": patient.id,
            ":personal_doctor_id": patient.personal_doctor_id,
            ":passport_data": patient.passport_data,
            ":contact_person_id": patient.contact_person_id,
            ":blood_type": patient.blood_type,
            ":allergies": patient.allergies,
            ":insurance_company": patient.insurance_company,
            ":insurance_policy_number": patient.insurance_policy_number,
        });

        self.conn.execute(&sql, params.as_slice())?;
        Ok(())
    }

    /// Update an existing patient.
    pub fn update_patient(&self, patient: &Patient) -> DbResult<bool> {
        let sql = format!(
            r#"
            UPDATE patients SET
                {PERSON_ASSIGNMENTS},
                personal_doctor_id = :personal_doctor_id,
                passport_data = :passport_data,
                contact_person_id = :contact_person_id,
                blood_type = :blood_type,
                allergies = :allergies,
                insurance_company = :insurance_company,
                insurance_policy_number = :insurance_policy_number,
                updated_at = datetime('now')
            WHERE id = :id
            "#
        );

        let mut params = person_params(&patient.person);
        params.extend_from_slice(named_params! {
            ":id": patient.id,
            ":personal_doctor_id": patient.personal_doctor_id,
            ":passport_data": patient.passport_data,
            ":contact_person_id": patient.contact_person_id,
            ":blood_type": patient.blood_type,
            ":allergies": patient.allergies,
            ":insurance_company": patient.insurance_company,
            ":insurance_policy_number": patient.insurance_policy_number,
        });

        let rows_affected = self.conn.execute(&sql, params.as_slice())?;
        Ok(rows_affected > 0)
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, id: &str) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                &format!("{} WHERE id = ?", select_patients()),
                [id],
                patient_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Patients whose personal doctor is `doctor_id`.
    pub fn list_patients_by_doctor(&self, doctor_id: &str) -> DbResult<Vec<Patient>> {
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE personal_doctor_id = ? ORDER BY last_name, first_name",
            select_patients()
        ))?;
        let rows = stmt.query_map([doctor_id], patient_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Patients speaking a given language.
    pub fn list_patients_by_language(&self, language_code: &str) -> DbResult<Vec<Patient>> {
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE language_code = ? ORDER BY last_name, first_name",
            select_patients()
        ))?;
        let rows = stmt.query_map([language_code], patient_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Search patients by last or first name (prefix match).
    pub fn search_patients(&self, query: &str, limit: usize) -> DbResult<Vec<Patient>> {
        let pattern = format!("{}%", query);
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE last_name LIKE ?1 OR first_name LIKE ?1 ORDER BY last_name, first_name LIMIT ?2",
            select_patients()
        ))?;
        let rows = stmt.query_map(params![pattern, limit as i64], patient_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// List all patients.
    pub fn list_patients(&self) -> DbResult<Vec<Patient>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} ORDER BY last_name, first_name", select_patients()))?;
        let rows = stmt.query_map([], patient_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    // =========================================================================
    // Contact persons
    // =========================================================================

    /// Insert a new contact person.
    pub fn insert_contact_person(&self, contact: &ContactPerson) -> DbResult<()> {
        let sql = format!(
            "INSERT INTO contact_persons (id, {PERSON_COLUMNS}, patient_id) VALUES (:id, {PERSON_VALUES}, :patient_id)"
        );

        let mut params = person_params(&contact.person);
        params.extend_from_slice(named_params! {
            ":id": contact.id,
            ":patient_id": contact.patient_id,
        });

        self.conn.execute(&sql, params.as_slice())?;
        Ok(())
    }

    /// Get a contact person by ID.
    pub fn get_contact_person(&self, id: &str) -> DbResult<Option<ContactPerson>> {
        self.conn
            .query_row(
                &format!("SELECT id, {PERSON_COLUMNS}, patient_id FROM contact_persons WHERE id = ?"),
                [id],
                |row| {
                    Ok(ContactPerson {
                        id: row.get("id")?,
                        person: person_from_row(row)?,
                        patient_id: row.get("patient_id")?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }
}

fn select_patients() -> String {
    format!(
        r#"
        SELECT id, {PERSON_COLUMNS}, personal_doctor_id, passport_data, contact_person_id,
               blood_type, allergies, insurance_company, insurance_policy_number
        FROM patients
        "#
    )
}

fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: row.get("id")?,
        person: person_from_row(row)?,
        personal_doctor_id: row.get("personal_doctor_id")?,
        passport_data: row.get("passport_data")?,
        contact_person_id: row.get("contact_person_id")?,
        blood_type: row.get("blood_type")?,
        allergies: row.get("allergies")?,
        insurance_company: row.get("insurance_company")?,
        insurance_policy_number: row.get("insurance_policy_number")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BloodType, PersonAttributes};

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn patient(first: &str, last: &str) -> Patient {
        Patient::new(PersonAttributes::new(first, last))
    }

    #[test]
    fn test_insert_and_get() {
        let db = setup_db();

        let mut p = patient("Maria", "Lysenko");
        p.blood_type = Some(BloodType::APos);
        p.allergies = Some("penicillin".into());
        p.person.language_code = Some("uk_UA".into());
        db.insert_patient(&p).unwrap();

        let retrieved = db.get_patient(&p.id).unwrap().unwrap();
        assert_eq!(retrieved, p);
    }

    #[test]
    fn test_update_patient() {
        let db = setup_db();
        let mut p = patient("Maria", "Lysenko");
        db.insert_patient(&p).unwrap();

        p.insurance_company = Some("Acme Insurance".into());
        p.insurance_policy_number = Some("POL-1".into());
        assert!(db.update_patient(&p).unwrap());

        let retrieved = db.get_patient(&p.id).unwrap().unwrap();
        assert_eq!(retrieved.insurance_policy_number.as_deref(), Some("POL-1"));
    }

    #[test]
    fn test_search_patients() {
        let db = setup_db();
        db.insert_patient(&patient("Maria", "Lysenko")).unwrap();
        db.insert_patient(&patient("Mykola", "Lytvyn")).unwrap();
        db.insert_patient(&patient("Olha", "Savchenko")).unwrap();

        let results = db.search_patients("Ly", 10).unwrap();
        assert_eq!(results.len(), 2);

        let results = db.search_patients("Olha", 10).unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_patients_by_language() {
        let db = setup_db();
        let mut p1 = patient("Maria", "Lysenko");
        p1.person.language_code = Some("uk_UA".into());
        let mut p2 = patient("John", "Smith");
        p2.person.language_code = Some("en_US".into());
        db.insert_patient(&p1).unwrap();
        db.insert_patient(&p2).unwrap();

        let ukrainian = db.list_patients_by_language("uk_UA").unwrap();
        assert_eq!(ukrainian.len(), 1);
        assert_eq!(ukrainian[0].id, p1.id);
    }

    #[test]
    fn test_contact_person_roundtrip() {
        let db = setup_db();
        let p = patient("Maria", "Lysenko");
        db.insert_patient(&p).unwrap();

        let mut contact = ContactPerson::new(PersonAttributes::new("Oleh", "Lysenko"));
        contact.patient_id = Some(p.id.clone());
        contact.person.phone = Some("+380501112233".into());
        db.insert_contact_person(&contact).unwrap();

        let retrieved = db.get_contact_person(&contact.id).unwrap().unwrap();
        assert_eq!(retrieved, contact);
    }
}
