//! Speciality and disease database operations.

use rusqlite::{named_params, params, OptionalExtension, Row};

use super::{unique_violation, Database, DbResult};
use crate::models::{Disease, Speciality};

impl Database {
    // =========================================================================
    // Specialities
    // =========================================================================

    /// Insert a new speciality.
    pub fn insert_speciality(&self, speciality: &Speciality) -> DbResult<()> {
        self.conn
            .execute(
                r#"
                INSERT INTO specialities (id, name, code, description, active)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    speciality.id,
                    speciality.name,
                    speciality.code,
                    speciality.description,
                    speciality.active,
                ],
            )
            .map_err(|e| unique_violation(e, "Speciality code must be unique!"))?;
        Ok(())
    }

    /// Get a speciality by ID.
    pub fn get_speciality(&self, id: &str) -> DbResult<Option<Speciality>> {
        self.conn
            .query_row(
                "SELECT id, name, code, description, active FROM specialities WHERE id = ?",
                [id],
                |row| {
                    Ok(Speciality {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        code: row.get(2)?,
                        description: row.get(3)?,
                        active: row.get(4)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    // =========================================================================
    // Diseases
    // =========================================================================

    /// Insert a new disease with its spread regions.
    pub fn insert_disease(&self, disease: &Disease) -> DbResult<()> {
        let tx = self.begin()?;
        self.conn.execute(
            r#"
            INSERT INTO diseases (
                id, name, parent_id, code_icd10, danger_level, is_contagious, symptoms
            ) VALUES (:id, :name, :parent_id, :code_icd10, :danger_level, :is_contagious, :symptoms)
            "#,
            named_params! {
                ":id": disease.id,
                ":name": disease.name,
                ":parent_id": disease.parent_id,
                ":code_icd10": disease.code_icd10,
                ":danger_level": disease.danger_level,
                ":is_contagious": disease.is_contagious,
                ":symptoms": disease.symptoms,
            },
        )?;
        self.replace_spread_regions(&disease.id, &disease.spread_regions)?;
        tx.commit()?;
        Ok(())
    }

    /// Update an existing disease and its spread regions.
    pub fn update_disease(&self, disease: &Disease) -> DbResult<bool> {
        let tx = self.begin()?;
        let rows_affected = self.conn.execute(
            r#"
            UPDATE diseases SET
                name = :name,
                parent_id = :parent_id,
                code_icd10 = :code_icd10,
                danger_level = :danger_level,
                is_contagious = :is_contagious,
                symptoms = :symptoms
            WHERE id = :id
            "#,
            named_params! {
                ":id": disease.id,
                ":name": disease.name,
                ":parent_id": disease.parent_id,
                ":code_icd10": disease.code_icd10,
                ":danger_level": disease.danger_level,
                ":is_contagious": disease.is_contagious,
                ":symptoms": disease.symptoms,
            },
        )?;
        if rows_affected > 0 {
            self.replace_spread_regions(&disease.id, &disease.spread_regions)?;
        }
        tx.commit()?;
        Ok(rows_affected > 0)
    }

    fn replace_spread_regions(&self, disease_id: &str, regions: &[String]) -> DbResult<()> {
        self.conn.execute(
            "DELETE FROM disease_spread_regions WHERE disease_id = ?",
            [disease_id],
        )?;
        let mut stmt = self.conn.prepare(
            "INSERT OR IGNORE INTO disease_spread_regions (disease_id, country_code) VALUES (?, ?)",
        )?;
        for region in regions {
            stmt.execute([disease_id, region.as_str()])?;
        }
        Ok(())
    }

    /// Get a disease by ID.
    pub fn get_disease(&self, id: &str) -> DbResult<Option<Disease>> {
        let disease = self
            .conn
            .query_row(
                r#"
                SELECT id, name, parent_id, code_icd10, danger_level, is_contagious, symptoms
                FROM diseases
                WHERE id = ?
                "#,
                [id],
                disease_from_row,
            )
            .optional()?;

        match disease {
            Some(mut disease) => {
                disease.spread_regions = self.spread_regions(&disease.id)?;
                Ok(Some(disease))
            }
            None => Ok(None),
        }
    }

    /// Direct children of a disease.
    pub fn list_child_diseases(&self, parent_id: &str) -> DbResult<Vec<Disease>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, name, parent_id, code_icd10, danger_level, is_contagious, symptoms
            FROM diseases
            WHERE parent_id = ?
            ORDER BY name
            "#,
        )?;

        let rows = stmt.query_map([parent_id], disease_from_row)?;
        let mut diseases = Vec::new();
        for row in rows {
            let mut disease = row?;
            disease.spread_regions = self.spread_regions(&disease.id)?;
            diseases.push(disease);
        }
        Ok(diseases)
    }

    /// Ancestor chain of a disease, nearest parent first.
    ///
    /// Stops at the first repeated ID so a corrupt hierarchy cannot loop.
    pub fn disease_ancestors(&self, id: &str) -> DbResult<Vec<String>> {
        let mut ancestors: Vec<String> = Vec::new();
        let mut current = id.to_string();

        while let Some(parent) = self
            .conn
            .query_row(
                "SELECT parent_id FROM diseases WHERE id = ?",
                [&current],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?
            .flatten()
        {
            if parent == id || ancestors.contains(&parent) {
                break;
            }
            ancestors.push(parent.clone());
            current = parent;
        }

        Ok(ancestors)
    }

    fn spread_regions(&self, disease_id: &str) -> DbResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT country_code FROM disease_spread_regions WHERE disease_id = ? ORDER BY country_code",
        )?;
        let rows = stmt.query_map([disease_id], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

fn disease_from_row(row: &Row<'_>) -> rusqlite::Result<Disease> {
    Ok(Disease {
        id: row.get(0)?,
        name: row.get(1)?,
        parent_id: row.get(2)?,
        code_icd10: row.get(3)?,
        danger_level: row.get(4)?,
        is_contagious: row.get(5)?,
        symptoms: row.get(6)?,
        spread_regions: Vec::new(),
    })
}
