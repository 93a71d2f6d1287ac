//! Speciality and disease writes.

use super::{Registry, RecordsError, RecordsResult};
use crate::models::{Disease, Speciality, ValidationError};

impl Registry<'_> {
    pub fn create_speciality(&self, speciality: Speciality) -> RecordsResult<Speciality> {
        speciality.validate()?;
        self.db.insert_speciality(&speciality)?;
        Ok(speciality)
    }

    /// Create a disease; the parent, when set, must exist.
    pub fn create_disease(&self, disease: Disease) -> RecordsResult<Disease> {
        disease.validate()?;
        self.check_disease_parent(&disease)?;
        self.db.insert_disease(&disease)?;
        Ok(disease)
    }

    /// Update a disease, rejecting a parent that would close a cycle.
    pub fn update_disease(&self, disease: &Disease) -> RecordsResult<()> {
        disease.validate()?;
        self.check_disease_parent(disease)?;
        if !self.db.update_disease(disease)? {
            return Err(RecordsError::NotFound(format!("Disease {}", disease.id)));
        }
        Ok(())
    }

    fn check_disease_parent(&self, disease: &Disease) -> RecordsResult<()> {
        let Some(parent_id) = &disease.parent_id else {
            return Ok(());
        };
        if parent_id == &disease.id {
            return Err(ValidationError::DiseaseCycle.into());
        }
        if self.db.get_disease(parent_id)?.is_none() {
            return Err(RecordsError::NotFound(format!("Disease {}", parent_id)));
        }
        if self.db.disease_ancestors(parent_id)?.contains(&disease.id) {
            return Err(ValidationError::DiseaseCycle.into());
        }
        Ok(())
    }
}
