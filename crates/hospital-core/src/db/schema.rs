//! SQLite schema definition.

/// Complete database schema for the hospital records core.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Catalog
-- ============================================================================

CREATE TABLE IF NOT EXISTS specialities (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    code TEXT NOT NULL UNIQUE CHECK (length(code) <= 10),
    description TEXT,
    active INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS diseases (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    parent_id TEXT REFERENCES diseases(id) ON DELETE RESTRICT,
    code_icd10 TEXT CHECK (code_icd10 IS NULL OR length(code_icd10) <= 10),
    danger_level TEXT CHECK (danger_level IN ('low', 'medium', 'high', 'critical')),
    is_contagious INTEGER NOT NULL DEFAULT 0,
    symptoms TEXT
);

CREATE INDEX IF NOT EXISTS idx_diseases_parent ON diseases(parent_id);

-- Many-to-many: disease <-> country code
CREATE TABLE IF NOT EXISTS disease_spread_regions (
    disease_id TEXT NOT NULL REFERENCES diseases(id) ON DELETE CASCADE,
    country_code TEXT NOT NULL,
    PRIMARY KEY (disease_id, country_code)
);

-- ============================================================================
-- Doctors
-- ============================================================================

CREATE TABLE IF NOT EXISTS doctors (
    id TEXT PRIMARY KEY,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    middle_name TEXT,
    phone TEXT,
    email TEXT,
    gender TEXT CHECK (gender IN ('male', 'female', 'other')),
    birthday TEXT,
    country_code TEXT,
    language_code TEXT,
    user_id TEXT,
    speciality_id TEXT REFERENCES specialities(id),
    is_intern INTEGER NOT NULL DEFAULT 0,
    mentor_id TEXT REFERENCES doctors(id),
    license_number TEXT NOT NULL UNIQUE,
    license_date TEXT,
    rating REAL NOT NULL DEFAULT 0 CHECK (rating >= 0 AND rating <= 5),
    study_country_code TEXT,
    active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_doctors_user ON doctors(user_id);
CREATE INDEX IF NOT EXISTS idx_doctors_mentor ON doctors(mentor_id);

CREATE TABLE IF NOT EXISTS doctor_schedules (
    id TEXT PRIMARY KEY,
    doctor_id TEXT NOT NULL REFERENCES doctors(id) ON DELETE CASCADE,
    day_of_week INTEGER CHECK (day_of_week BETWEEN 1 AND 7),
    date TEXT,
    start_time REAL NOT NULL,
    end_time REAL NOT NULL,
    schedule_type TEXT NOT NULL DEFAULT 'work'
        CHECK (schedule_type IN ('work', 'vacation', 'sick', 'conference')),
    notes TEXT,
    CHECK (end_time > start_time)
);

CREATE INDEX IF NOT EXISTS idx_schedules_doctor_date ON doctor_schedules(doctor_id, date);

-- ============================================================================
-- Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    id TEXT PRIMARY KEY,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    middle_name TEXT,
    phone TEXT,
    email TEXT,
    gender TEXT CHECK (gender IN ('male', 'female', 'other')),
    birthday TEXT,
    country_code TEXT,
    language_code TEXT,
    personal_doctor_id TEXT REFERENCES doctors(id),
    passport_data TEXT CHECK (passport_data IS NULL OR length(passport_data) <= 10),
    contact_person_id TEXT REFERENCES contact_persons(id),
    blood_type TEXT,
    allergies TEXT,
    insurance_company TEXT,
    insurance_policy_number TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_patients_doctor ON patients(personal_doctor_id);
CREATE INDEX IF NOT EXISTS idx_patients_language ON patients(language_code);

CREATE TABLE IF NOT EXISTS contact_persons (
    id TEXT PRIMARY KEY,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    middle_name TEXT,
    phone TEXT,
    email TEXT,
    gender TEXT CHECK (gender IN ('male', 'female', 'other')),
    birthday TEXT,
    country_code TEXT,
    language_code TEXT,
    patient_id TEXT REFERENCES patients(id) ON DELETE SET NULL
);

-- Doctor assignment history (one active row per patient, kept by the audit)
CREATE TABLE IF NOT EXISTS patient_doctor_history (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES patients(id) ON DELETE CASCADE,
    doctor_id TEXT NOT NULL REFERENCES doctors(id),
    assign_date TEXT NOT NULL,
    end_date TEXT,
    change_reason TEXT,
    active INTEGER NOT NULL DEFAULT 1
);

CREATE INDEX IF NOT EXISTS idx_history_patient ON patient_doctor_history(patient_id, active);

-- ============================================================================
-- Visits and Diagnoses
-- ============================================================================

CREATE TABLE IF NOT EXISTS visits (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES patients(id),
    doctor_id TEXT NOT NULL REFERENCES doctors(id),
    mentor_id TEXT REFERENCES doctors(id),
    status TEXT NOT NULL DEFAULT 'planned'
        CHECK (status IN ('planned', 'completed', 'cancelled', 'missed')),
    visit_date TEXT NOT NULL,
    actual_visit_date TEXT,
    visit_type TEXT NOT NULL DEFAULT 'primary'
        CHECK (visit_type IN ('primary', 'repeat', 'preventive', 'urgent')),
    recommendations TEXT,
    currency TEXT NOT NULL,
    cost REAL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_visits_patient_doctor ON visits(patient_id, doctor_id, visit_date);
CREATE INDEX IF NOT EXISTS idx_visits_status ON visits(status);

CREATE TABLE IF NOT EXISTS diagnoses (
    id TEXT PRIMARY KEY,
    visit_id TEXT REFERENCES visits(id) ON DELETE RESTRICT,
    disease_id TEXT REFERENCES diseases(id),
    description TEXT,
    treatment TEXT,
    is_approved INTEGER NOT NULL DEFAULT 0,
    approving_doctor_id TEXT REFERENCES doctors(id),
    approval_date TEXT,
    severity TEXT NOT NULL DEFAULT 'medium'
        CHECK (severity IN ('low', 'medium', 'high', 'severe', 'critical'))
);

CREATE INDEX IF NOT EXISTS idx_diagnoses_visit ON diagnoses(visit_id);
CREATE INDEX IF NOT EXISTS idx_diagnoses_disease ON diagnoses(disease_id);
"#;
