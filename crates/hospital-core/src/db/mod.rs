//! Database layer for the hospital records core.

mod schema;
mod catalog;
mod doctors;
mod patients;
mod history;
mod schedules;
mod visits;
mod diagnoses;

pub use diagnoses::{DiagnosisQuery, DiagnosisRow};
pub use schema::*;
pub use visits::day_bounds;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::{Connection, Row, ToSql, Transaction};
use std::path::Path;
use thiserror::Error;

use crate::models::{
    BloodType, DangerLevel, Gender, PersonAttributes, ScheduleType, Severity, VisitStatus,
    VisitType,
};

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize schema.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Begin a transaction on the shared connection.
    ///
    /// Every `Database` method called before `commit` runs inside it; dropping
    /// the scope without committing rolls everything back. Inside an already
    /// open transaction this joins the outer one.
    pub fn begin(&self) -> DbResult<TxScope<'_>> {
        if !self.conn.is_autocommit() {
            return Ok(TxScope { tx: None });
        }
        Ok(TxScope {
            tx: Some(self.conn.unchecked_transaction()?),
        })
    }
}

/// A transaction, or a no-op when joined to an outer transaction.
pub struct TxScope<'a> {
    tx: Option<Transaction<'a>>,
}

impl TxScope<'_> {
    /// Commit if this scope owns the transaction.
    pub fn commit(self) -> DbResult<()> {
        if let Some(tx) = self.tx {
            tx.commit()?;
        }
        Ok(())
    }
}

/// Map a UNIQUE violation to a readable constraint error.
pub(crate) fn unique_violation(err: rusqlite::Error, message: &str) -> DbError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            DbError::Constraint(message.to_string())
        }
        _ => DbError::Sqlite(err),
    }
}

/// Store coded enums as their text code.
macro_rules! sql_code {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl ToSql for $ty {
                fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                    Ok(ToSqlOutput::from(self.as_str()))
                }
            }

            impl FromSql for $ty {
                fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                    let code = value.as_str()?;
                    <$ty>::from_code(code).ok_or_else(|| {
                        FromSqlError::Other(
                            format!("Unknown {} code: {}", stringify!($ty), code).into(),
                        )
                    })
                }
            }
        )+
    };
}

sql_code!(
    Gender,
    BloodType,
    DangerLevel,
    ScheduleType,
    VisitStatus,
    VisitType,
    Severity,
);

/// Person columns shared by the doctor, patient and contact tables.
pub(crate) const PERSON_COLUMNS: &str =
    "first_name, last_name, middle_name, phone, email, gender, birthday, country_code, language_code";

/// Named placeholders matching `PERSON_COLUMNS`.
pub(crate) const PERSON_VALUES: &str =
    ":first_name, :last_name, :middle_name, :phone, :email, :gender, :birthday, :country_code, :language_code";

/// `column = :column` assignments for `PERSON_COLUMNS`.
pub(crate) const PERSON_ASSIGNMENTS: &str = "first_name = :first_name, last_name = :last_name, \
    middle_name = :middle_name, phone = :phone, email = :email, gender = :gender, \
    birthday = :birthday, country_code = :country_code, language_code = :language_code";

/// Named parameters for the person columns.
pub(crate) fn person_params(person: &PersonAttributes) -> Vec<(&'static str, &dyn ToSql)> {
    vec![
        (":first_name", &person.first_name as &dyn ToSql),
        (":last_name", &person.last_name as &dyn ToSql),
        (":middle_name", &person.middle_name as &dyn ToSql),
        (":phone", &person.phone as &dyn ToSql),
        (":email", &person.email as &dyn ToSql),
        (":gender", &person.gender as &dyn ToSql),
        (":birthday", &person.birthday as &dyn ToSql),
        (":country_code", &person.country_code as &dyn ToSql),
        (":language_code", &person.language_code as &dyn ToSql),
    ]
}

/// Read the person columns of a row.
pub(crate) fn person_from_row(row: &Row<'_>) -> rusqlite::Result<PersonAttributes> {
    Ok(PersonAttributes {
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        middle_name: row.get("middle_name")?,
        phone: row.get("phone")?,
        email: row.get("email")?,
        gender: row.get("gender")?,
        birthday: row.get("birthday")?,
        country_code: row.get("country_code")?,
        language_code: row.get("language_code")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn test_schema_initialized() {
        let db = Database::open_in_memory().unwrap();

        // Check that tables exist
        let tables: Vec<String> = db
            .conn()
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        for table in [
            "specialities",
            "diseases",
            "doctors",
            "doctor_schedules",
            "patients",
            "contact_persons",
            "patient_doctor_history",
            "visits",
            "diagnoses",
        ] {
            assert!(tables.contains(&table.to_string()), "missing table {}", table);
        }
    }

    #[test]
    fn test_rollback_on_drop() {
        let db = Database::open_in_memory().unwrap();
        {
            let _tx = db.begin().unwrap();
            db.conn()
                .execute(
                    "INSERT INTO specialities (id, name, code) VALUES ('s1', 'Surgery', 'SURG')",
                    [],
                )
                .unwrap();
        }
        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM specialities", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_file_backed_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hospital.db");

        {
            let db = Database::open(&path).unwrap();
            db.conn()
                .execute(
                    "INSERT INTO specialities (id, name, code) VALUES ('s1', 'Surgery', 'SURG')",
                    [],
                )
                .unwrap();
        }

        let db = Database::open(&path).unwrap();
        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM specialities", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
