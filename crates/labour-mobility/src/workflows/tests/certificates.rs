use chrono::NaiveDate;
use serde_json::json;

use super::common::*;
use crate::workflows::domain::{CertificateStatus, EnrollmentStatus, TemplateStatus};
use crate::workflows::transitions::NotificationTemplate;
use crate::workflows::{
    CertificateFilter, IssueRequest, NewTemplate, RevocationRequest, WorkflowError,
};

fn issue(enrollment: &crate::workflows::CohortEnrollment) -> IssueRequest {
    IssueRequest {
        enrollment_id: enrollment.id.clone(),
        override_reason: None,
        grade: Some("Distinction".to_string()),
        expiry_date: NaiveDate::from_ymd_opt(2029, 3, 16),
    }
}

#[test]
fn completed_enrollments_get_sequential_numbers() {
    let (service, notifier) = build_service();
    let first = completed_enrollment(&service, "CARE");
    let second = completed_enrollment(&service, "WELD");

    let certificate = service
        .issue_certificate(&admin(), issue(&first))
        .expect("issued");
    assert_eq!(certificate.certificate_number, "CERT-2026-0001");
    assert_eq!(certificate.status, CertificateStatus::Issued);
    assert_eq!(certificate.issue_date, fixed_now());
    assert_eq!(certificate.enrollment_id.as_ref(), Some(&first.id));

    match service.issue_certificate(&trainer(), issue(&first)) {
        Err(WorkflowError::Conflict(_)) => {}
        other => panic!("expected conflict, got {other:?}"),
    }

    let next = service
        .issue_certificate(&trainer(), issue(&second))
        .expect("issued");
    assert_eq!(next.certificate_number, "CERT-2026-0002");
    assert_eq!(
        notifier.templates(),
        vec![
            NotificationTemplate::CertificateIssued,
            NotificationTemplate::CertificateIssued
        ]
    );
}

#[test]
fn unfinished_enrollments_need_an_admin_override() {
    let (service, _) = build_service();
    let admin = admin();
    let cohort = open_cohort(&service, &admin, "CARE", 5);
    let candidate = register(&service, &admin, "Amal Haddad");
    let enrollment = enroll(&service, &admin, &cohort, &candidate, EnrollmentStatus::Enrolled);

    assert!(matches!(
        service.issue_certificate(&admin, issue(&enrollment)),
        Err(WorkflowError::InvalidState(_))
    ));

    let mut overridden = issue(&enrollment);
    overridden.override_reason = Some("Recognised prior learning".to_string());
    assert!(matches!(
        service.issue_certificate(&trainer(), overridden.clone()),
        Err(WorkflowError::Forbidden { .. })
    ));

    let mut blank = issue(&enrollment);
    blank.override_reason = Some("  ".to_string());
    assert!(matches!(
        service.issue_certificate(&admin, blank),
        Err(WorkflowError::Validation(_))
    ));

    let certificate = service
        .issue_certificate(&admin, overridden)
        .expect("override accepted");
    assert!(certificate
        .remarks
        .as_deref()
        .unwrap_or_default()
        .contains("Recognised prior learning"));
}

#[test]
fn revoked_certificates_are_final() {
    let (service, notifier) = build_service();
    let admin = admin();
    let enrollment = completed_enrollment(&service, "CARE");
    let certificate = service
        .issue_certificate(&admin, issue(&enrollment))
        .expect("issued");

    let revoked = service
        .revoke_certificate(
            &admin,
            &certificate.id,
            RevocationRequest {
                reason: Some("Issued in error".to_string()),
            },
        )
        .expect("revoked");
    assert_eq!(revoked.status, CertificateStatus::Revoked);
    assert_eq!(revoked.revoked_at, Some(fixed_now()));
    assert_eq!(revoked.revocation_reason.as_deref(), Some("Issued in error"));

    assert!(matches!(
        service.revoke_certificate(&admin, &certificate.id, RevocationRequest::default()),
        Err(WorkflowError::InvalidState(_))
    ));
    assert!(matches!(
        service.reissue_certificate(&admin, &certificate.id),
        Err(WorkflowError::InvalidState(_))
    ));
    assert_eq!(
        notifier.templates().last(),
        Some(&NotificationTemplate::CertificateRevoked)
    );
}

#[test]
fn reissue_creates_a_detached_copy() {
    let (service, _) = build_service();
    let admin = admin();
    let enrollment = completed_enrollment(&service, "CARE");
    let original = service
        .issue_certificate(&admin, issue(&enrollment))
        .expect("issued");

    let copy = service
        .reissue_certificate(&admin, &original.id)
        .expect("reissued");
    assert_eq!(copy.status, CertificateStatus::Reissued);
    assert_eq!(copy.certificate_number, "CERT-2026-0002");
    assert_eq!(copy.enrollment_id, None);
    assert_eq!(copy.reissued_from.as_ref(), Some(&original.id));
    assert_eq!(copy.candidate_id, original.candidate_id);
    assert_eq!(copy.remarks.as_deref(), Some("Reissued from CERT-2026-0001"));

    let all = service
        .list_certificates(&admin, &CertificateFilter::default())
        .expect("list");
    assert_eq!(all.len(), 2);
    assert_eq!(all[0], original);

    let again = service
        .reissue_certificate(&admin, &copy.id)
        .expect("reissued copies can be reissued");
    assert_eq!(again.certificate_number, "CERT-2026-0003");
}

#[test]
fn activating_a_template_retires_the_previous_one() {
    let (service, _) = build_service();
    let admin = admin();
    let template = |name: &str| NewTemplate {
        name: name.to_string(),
        content: json!({ "layout": name, "signatory": "Programme Director" }),
    };
    let first = service.create_template(&admin, template("classic")).expect("first");
    let second = service.create_template(&admin, template("modern")).expect("second");
    assert_eq!(first.status, TemplateStatus::Draft);

    service.activate_template(&admin, &first.id).expect("activate first");
    let active = service
        .activate_template(&admin, &second.id)
        .expect("activate second");
    assert_eq!(active.activated_at, Some(fixed_now()));

    let templates = service.list_templates(&admin).expect("list");
    let status_of = |id: &crate::workflows::TemplateId| {
        templates
            .iter()
            .find(|template| &template.id == id)
            .map(|template| template.status)
    };
    assert_eq!(status_of(&first.id), Some(TemplateStatus::Inactive));
    assert_eq!(status_of(&second.id), Some(TemplateStatus::Active));

    let enrollment = completed_enrollment(&service, "CARE");
    let certificate = service
        .issue_certificate(&admin, issue(&enrollment))
        .expect("issued");
    assert_eq!(certificate.template_id.as_ref(), Some(&second.id));

    service
        .deactivate_template(&admin, &second.id)
        .expect("deactivate");
    assert!(matches!(
        service.deactivate_template(&admin, &second.id),
        Err(WorkflowError::InvalidState(_))
    ));
    assert!(matches!(
        service.create_template(
            &admin,
            NewTemplate {
                name: "broken".to_string(),
                content: json!(["not", "an", "object"]),
            }
        ),
        Err(WorkflowError::Validation(_))
    ));
}

#[test]
fn certificate_listing_filters_and_respects_roles() {
    let (service, _) = build_service();
    let admin = admin();
    let cohort = open_cohort(&service, &admin, "CARE", 5);
    let (mine, login) = self_registered(&service, "cand-graduate");
    let own = enroll(&service, &admin, &cohort, &mine, EnrollmentStatus::Enrolled);
    service
        .complete_enrollment(&trainer(), &own.id)
        .expect("complete");
    let other = completed_enrollment(&service, "WELD");

    let own_certificate = service
        .issue_certificate(&admin, issue(&own))
        .expect("issued");
    service
        .issue_certificate(&admin, issue(&other))
        .expect("issued");

    let visible = service
        .list_certificates(&login, &CertificateFilter::default())
        .expect("list");
    assert_eq!(visible, vec![own_certificate.clone()]);

    let by_candidate = CertificateFilter {
        candidate_id: Some(mine.id.clone()),
        ..CertificateFilter::default()
    };
    assert_eq!(
        service.list_certificates(&admin, &by_candidate).expect("list").len(),
        1
    );

    let future = CertificateFilter {
        issued_from: NaiveDate::from_ymd_opt(2026, 3, 17),
        ..CertificateFilter::default()
    };
    assert!(service.list_certificates(&admin, &future).expect("list").is_empty());

    let same_day = CertificateFilter {
        issued_from: NaiveDate::from_ymd_opt(2026, 3, 16),
        issued_to: NaiveDate::from_ymd_opt(2026, 3, 16),
        status: Some(CertificateStatus::Issued),
        candidate_id: None,
    };
    assert_eq!(service.list_certificates(&admin, &same_day).expect("list").len(), 2);

    let inverted = CertificateFilter {
        issued_from: NaiveDate::from_ymd_opt(2026, 3, 20),
        issued_to: NaiveDate::from_ymd_opt(2026, 3, 1),
        ..CertificateFilter::default()
    };
    assert!(matches!(
        service.list_certificates(&admin, &inverted),
        Err(WorkflowError::Validation(_))
    ));
}
