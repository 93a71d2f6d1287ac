//! Visit lifecycle integration tests.

use chrono::{NaiveDate, NaiveDateTime};

use hospital_core::db::Database;
use hospital_core::models::{
    Doctor, MedicalDiagnosis, Patient, PersonAttributes, ValidationError, VisitStatus,
    VisitUpdate,
};
use hospital_core::records::{RecordsError, Registry, RescheduleRequest};

fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

struct Clinic {
    doctor: Doctor,
    other: Doctor,
    patient: Patient,
}

fn clinic(registry: &Registry<'_>) -> Clinic {
    let doctor = registry
        .create_doctor(Doctor::new(PersonAttributes::new("Yurii", "Tkachenko"), "LIC-1"))
        .unwrap();
    let other = registry
        .create_doctor(Doctor::new(PersonAttributes::new("Oksana", "Lytvyn"), "LIC-2"))
        .unwrap();
    let patient = registry
        .create_patient(Patient::new(PersonAttributes::new("Roman", "Kravets")))
        .unwrap();
    Clinic {
        doctor,
        other,
        patient,
    }
}

#[test]
fn test_completion_locks_identity_fields() {
    let db = Database::open_in_memory().unwrap();
    let registry = Registry::new(&db).at(at(10, 12));
    let clinic = clinic(&registry);

    let visit = registry
        .create_visit(registry.plan_visit(&clinic.patient.id, &clinic.doctor.id, at(10, 9)))
        .unwrap();
    assert_eq!(visit.status, VisitStatus::Planned);
    assert!(visit.actual_visit_date.is_none());

    let completed = registry
        .update_visit(&visit.id, VisitUpdate::status(VisitStatus::Completed))
        .unwrap();
    assert_eq!(completed.actual_visit_date, Some(at(10, 12)));

    for update in [
        VisitUpdate {
            doctor_id: Some(clinic.other.id.clone()),
            ..Default::default()
        },
        VisitUpdate {
            visit_date: Some(at(11, 9)),
            ..Default::default()
        },
        VisitUpdate {
            patient_id: Some(clinic.patient.id.clone()),
            ..Default::default()
        },
    ] {
        let result = registry.update_visit(&visit.id, update);
        assert!(matches!(
            result,
            Err(RecordsError::Validation(ValidationError::CompletedVisitLocked))
        ));
    }

    // Non-identity fields stay editable.
    let annotated = registry
        .update_visit(
            &visit.id,
            VisitUpdate {
                recommendations: Some("Follow-up in two weeks".into()),
                cost: Some(450.0),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(annotated.cost, Some(450.0));
    assert_eq!(annotated.actual_visit_date, Some(at(10, 12)));
}

#[test]
fn test_moving_visit_keeps_approval_after_visit() {
    let db = Database::open_in_memory().unwrap();
    let registry = Registry::new(&db).at(at(15, 10));
    let mut approver = Doctor::new(PersonAttributes::new("Iryna", "Moroz"), "LIC-9");
    approver.user_id = Some("u-approver".into());
    registry.create_doctor(approver).unwrap();
    let clinic = clinic(&registry);

    let visit = registry
        .create_visit(registry.plan_visit(&clinic.patient.id, &clinic.doctor.id, at(14, 9)))
        .unwrap();
    let diagnosis = registry
        .add_diagnosis(MedicalDiagnosis::new(&visit.id, None))
        .unwrap();
    registry
        .approve_diagnoses(&[diagnosis.id.clone()], "u-approver")
        .unwrap();

    let moved_past_approval = registry.update_visit(
        &visit.id,
        VisitUpdate {
            visit_date: Some(at(20, 10)),
            ..Default::default()
        },
    );
    assert!(matches!(
        moved_past_approval,
        Err(RecordsError::Validation(ValidationError::ApprovalBeforeVisit))
    ));
    assert_eq!(db.get_visit(&visit.id).unwrap().unwrap().visit_date, at(14, 9));

    let moved_earlier = registry
        .update_visit(
            &visit.id,
            VisitUpdate {
                visit_date: Some(at(14, 11)),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(moved_earlier.visit_date, at(14, 11));
}

#[test]
fn test_completion_stamp_is_kept() {
    let db = Database::open_in_memory().unwrap();
    let registry = Registry::new(&db).at(at(10, 12));
    let clinic = clinic(&registry);

    let visit = registry
        .create_visit(registry.plan_visit(&clinic.patient.id, &clinic.doctor.id, at(10, 9)))
        .unwrap();
    registry
        .update_visit(&visit.id, VisitUpdate::status(VisitStatus::Completed))
        .unwrap();

    let later = Registry::new(&db).at(at(12, 8));
    let reopened = later
        .update_visit(&visit.id, VisitUpdate::status(VisitStatus::Missed))
        .unwrap();
    let completed = later
        .update_visit(&reopened.id, VisitUpdate::status(VisitStatus::Completed))
        .unwrap();
    assert_eq!(completed.actual_visit_date, Some(at(10, 12)));
}

#[test]
fn test_same_day_rule_is_per_doctor() {
    let db = Database::open_in_memory().unwrap();
    let registry = Registry::new(&db).at(at(1, 8));
    let clinic = clinic(&registry);

    registry
        .create_visit(registry.plan_visit(&clinic.patient.id, &clinic.doctor.id, at(10, 9)))
        .unwrap();
    registry
        .create_visit(registry.plan_visit(&clinic.patient.id, &clinic.other.id, at(10, 11)))
        .unwrap();
    let duplicate = registry.create_visit(registry.plan_visit(
        &clinic.patient.id,
        &clinic.doctor.id,
        at(10, 23),
    ));
    assert!(matches!(
        duplicate,
        Err(RecordsError::Validation(ValidationError::DuplicateVisitDay))
    ));
}

#[test]
fn test_reschedule_round_trip() {
    let db = Database::open_in_memory().unwrap();
    let registry = Registry::new(&db).at(at(1, 8));
    let clinic = clinic(&registry);

    let visit = registry
        .create_visit(registry.plan_visit(&clinic.patient.id, &clinic.doctor.id, at(10, 9)))
        .unwrap();
    let outcome = registry
        .reschedule_visit(&RescheduleRequest {
            visit_id: visit.id.clone(),
            new_doctor_id: None,
            new_date: at(14, 9),
            reason: "Patient request".into(),
        })
        .unwrap();

    assert_eq!(outcome.cancelled.status, VisitStatus::Cancelled);
    assert_eq!(outcome.planned.status, VisitStatus::Planned);
    assert_eq!(outcome.planned.doctor_id, clinic.doctor.id);
    assert!(outcome.planned.actual_visit_date.is_none());

    let visits = db.list_visits_for_patient(&clinic.patient.id, None, None).unwrap();
    assert_eq!(visits.len(), 2);
    assert_eq!(visits[0].id, outcome.planned.id);
}

#[test]
fn test_archive_doctor_with_planned_visits() {
    let db = Database::open_in_memory().unwrap();
    let registry = Registry::new(&db).at(at(1, 8));
    let clinic = clinic(&registry);

    let visit = registry
        .create_visit(registry.plan_visit(&clinic.patient.id, &clinic.doctor.id, at(10, 9)))
        .unwrap();
    assert!(matches!(
        registry.archive_doctor(&clinic.doctor.id),
        Err(RecordsError::State(_))
    ));

    registry
        .update_visit(&visit.id, VisitUpdate::status(VisitStatus::Cancelled))
        .unwrap();
    registry.archive_doctor(&clinic.doctor.id).unwrap();
    assert!(!db.get_doctor(&clinic.doctor.id).unwrap().unwrap().active);
}

#[test]
fn test_file_backed_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hospital.db");

    let visit_id = {
        let db = Database::open(&path).unwrap();
        let registry = Registry::new(&db).at(at(1, 8));
        let clinic = clinic(&registry);
        registry
            .create_visit(registry.plan_visit(&clinic.patient.id, &clinic.doctor.id, at(10, 9)))
            .unwrap()
            .id
    };

    let db = Database::open(&path).unwrap();
    let visit = db.get_visit(&visit_id).unwrap().unwrap();
    assert_eq!(visit.visit_date, at(10, 9));
    assert_eq!(visit.currency, "USD");
}
