use super::common::*;
use crate::tenancy::Role;
use crate::workflows::domain::{CohortId, CohortStatus, CourseId};
use crate::workflows::{NewCohort, NewCourse, WorkflowError};

#[test]
fn cohort_walks_forward_and_cannot_reopen_enrollment() {
    let (service, _) = build_service();
    let admin = admin();
    let cohort = open_cohort(&service, &admin, "CARE", 10);
    assert_eq!(cohort.status, CohortStatus::EnrollmentOpen);

    let closed = service
        .close_enrollment(&admin, &cohort.id)
        .expect("close enrollment");
    assert_eq!(closed.status, CohortStatus::EnrollmentClosed);

    match service.open_enrollment(&admin, &cohort.id) {
        Err(WorkflowError::InvalidState(err)) => {
            assert_eq!(err.current, "ENROLLMENT_CLOSED");
        }
        other => panic!("expected invalid state, got {other:?}"),
    }
    let stored = service.get_cohort(&admin, &cohort.id).expect("cohort");
    assert_eq!(stored.status, CohortStatus::EnrollmentClosed);

    service.start_training(&admin, &cohort.id).expect("training");
    service
        .start_cohort_vetting(&admin, &cohort.id)
        .expect("vetting may start before assessment");
    service
        .start_assessment(&admin, &cohort.id)
        .expect("assessment may follow vetting");
    service.complete_cohort(&admin, &cohort.id).expect("complete");
    let archived = service.archive_cohort(&admin, &cohort.id).expect("archive");
    assert_eq!(archived.status, CohortStatus::Archived);
}

#[test]
fn draft_cohorts_cannot_skip_publication() {
    let (service, _) = build_service();
    let admin = admin();
    let course = service
        .create_course(
            &admin,
            NewCourse {
                code: "WELD".to_string(),
                title: "Welding".to_string(),
                duration_weeks: None,
            },
        )
        .expect("course");
    let cohort = service
        .create_cohort(
            &admin,
            NewCohort {
                course_id: course.id,
                name: "Welding autumn".to_string(),
                max_capacity: 4,
                planned_sessions: 0,
                starts_on: None,
                ends_on: None,
            },
        )
        .expect("cohort");

    assert!(matches!(
        service.open_enrollment(&admin, &cohort.id),
        Err(WorkflowError::InvalidState(_))
    ));
    assert!(matches!(
        service.archive_cohort(&admin, &cohort.id),
        Err(WorkflowError::InvalidState(_))
    ));
}

#[test]
fn only_admins_change_cohort_status() {
    let (service, _) = build_service();
    let cohort = open_cohort(&service, &admin(), "CARE", 10);

    match service.close_enrollment(&recruiter(), &cohort.id) {
        Err(WorkflowError::Forbidden { role, .. }) => assert_eq!(role, "RECRUITER"),
        other => panic!("expected forbidden, got {other:?}"),
    }
}

#[test]
fn cohort_creation_validates_input() {
    let (service, _) = build_service();
    let admin = admin();

    let zero_capacity = service.create_cohort(
        &admin,
        NewCohort {
            course_id: CourseId("crs-missing".to_string()),
            name: "Empty".to_string(),
            max_capacity: 0,
            planned_sessions: 0,
            starts_on: None,
            ends_on: None,
        },
    );
    assert!(matches!(zero_capacity, Err(WorkflowError::Validation(_))));

    let unknown_course = service.create_cohort(
        &admin,
        NewCohort {
            course_id: CourseId("crs-missing".to_string()),
            name: "Orphan".to_string(),
            max_capacity: 3,
            planned_sessions: 0,
            starts_on: None,
            ends_on: None,
        },
    );
    assert!(matches!(
        unknown_course,
        Err(WorkflowError::NotFound("course"))
    ));
}

#[test]
fn course_codes_are_unique_per_tenant() {
    let (service, _) = build_service();
    let request = |code: &str| NewCourse {
        code: code.to_string(),
        title: "Hospitality".to_string(),
        duration_weeks: Some(8),
    };

    service.create_course(&admin(), request("HOSP")).expect("first");
    assert!(matches!(
        service.create_course(&admin(), request("hosp")),
        Err(WorkflowError::Conflict(_))
    ));

    let other_admin = scope(OTHER_TENANT, "admin-9", Role::Admin);
    service
        .create_course(&other_admin, request("HOSP"))
        .expect("other tenants may reuse codes");
}

#[test]
fn cohorts_are_invisible_across_tenants() {
    let (service, _) = build_service();
    let cohort = open_cohort(&service, &admin(), "CARE", 10);
    let outsider = scope(OTHER_TENANT, "admin-9", Role::Admin);

    assert!(matches!(
        service.get_cohort(&outsider, &cohort.id),
        Err(WorkflowError::NotFound("cohort"))
    ));
    assert!(matches!(
        service.close_enrollment(&outsider, &cohort.id),
        Err(WorkflowError::NotFound("cohort"))
    ));
    assert!(service
        .list_cohorts(&outsider, None)
        .expect("list")
        .is_empty());
    assert!(matches!(
        service.get_cohort(&admin(), &CohortId("coh-unknown".to_string())),
        Err(WorkflowError::NotFound(_))
    ));
}

#[test]
fn list_cohorts_filters_by_status() {
    let (service, _) = build_service();
    let admin = admin();
    let open = open_cohort(&service, &admin, "CARE", 10);
    let closed = open_cohort(&service, &admin, "WELD", 10);
    service.close_enrollment(&admin, &closed.id).expect("close");

    let listed = service
        .list_cohorts(&admin, Some(CohortStatus::EnrollmentOpen))
        .expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, open.id);
    assert_eq!(service.list_cohorts(&admin, None).expect("list").len(), 2);
}
