use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::config::WorkflowConfig;
use crate::tenancy::{TenantScope, ROLE_HEADER, TENANT_HEADER, USER_HEADER};
use crate::workflows::certificates::IssueRequest;
use crate::workflows::domain::{CertificateStatus, EnrollmentStatus};
use crate::workflows::enrollment::RejectionRequest;
use crate::workflows::router::{
    approve_application_handler, reject_application_handler, OptionalJson,
};
use crate::workflows::service::WorkflowService;
use crate::workflows::store::{
    InMemoryWorkflowStore, StoreError, TenantReader, TenantWriter, WorkflowStore,
};
use crate::workflows::workflow_router;

fn request(method: &str, uri: &str, scope: Option<&TenantScope>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(scope) = scope {
        builder = builder
            .header(TENANT_HEADER, scope.tenant_id().0.as_str())
            .header(USER_HEADER, scope.user_id().0.as_str())
            .header(ROLE_HEADER, scope.role().label());
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Store that answers only after a delay, to exercise the request timeout.
struct SlowStore {
    inner: InMemoryWorkflowStore,
    delay: Duration,
}

impl WorkflowStore for SlowStore {
    fn read<T, E, F>(&self, scope: &TenantScope, work: F) -> Result<T, E>
    where
        F: FnOnce(&dyn TenantReader) -> Result<T, E>,
        E: From<StoreError>,
    {
        std::thread::sleep(self.delay);
        self.inner.read(scope, work)
    }

    fn write<T, E, F>(&self, scope: &TenantScope, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn TenantWriter) -> Result<T, E>,
        E: From<StoreError>,
    {
        std::thread::sleep(self.delay);
        self.inner.write(scope, work)
    }
}

#[tokio::test]
async fn approve_route_enrolls_the_applicant() {
    let (service, notifier) = build_service();
    let admin = admin();
    let cohort = open_cohort(&service, &admin, "CARE", 10);
    let candidate = register(&service, &admin, "Amal Haddad");
    let application = enroll(&service, &admin, &cohort, &candidate, EnrollmentStatus::Applied);
    let router = router_with_service(service);

    let response = router
        .oneshot(request(
            "POST",
            &format!("/api/v1/admin/cohort-applications/{}/approve", application.id),
            Some(&admin),
            None,
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["success"], json!(true));
    assert_eq!(payload["data"]["enrollmentStatus"], json!("ENROLLED"));
    assert_eq!(payload["data"]["approvalDate"], json!("2026-03-16T09:30:00Z"));
    assert_eq!(notifier.sent().len(), 1);
}

#[tokio::test]
async fn missing_identity_headers_are_unauthorized() {
    let (service, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(request("GET", "/api/v1/cohorts", None, None))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["success"], json!(false));
    assert_eq!(payload["error"], json!("Unauthorized"));
}

#[tokio::test]
async fn error_taxonomy_maps_to_status_codes() {
    let (service, _) = build_service();
    let admin = admin();
    let cohort = open_cohort(&service, &admin, "CARE", 1);
    let seated = register(&service, &admin, "Seated Candidate");
    let waiting = register(&service, &admin, "Waiting Candidate");
    enroll(&service, &admin, &cohort, &seated, EnrollmentStatus::Enrolled);
    let router = router_with_service(service);

    let missing = router
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/admin/cohort-applications/enr-missing/approve",
            Some(&admin),
            None,
        ))
        .await
        .expect("route executes");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(read_json_body(missing).await["error"], json!("NotFoundError"));

    let full = router
        .clone()
        .oneshot(request(
            "POST",
            &format!("/api/v1/cohorts/{}/enroll", cohort.id),
            Some(&admin),
            Some(json!({ "candidateId": waiting.id, "enrollmentStatus": "APPROVED" })),
        ))
        .await
        .expect("route executes");
    assert_eq!(full.status(), StatusCode::CONFLICT);
    assert_eq!(
        read_json_body(full).await["error"],
        json!("CapacityExceededError")
    );

    let reopen = router
        .clone()
        .oneshot(request(
            "POST",
            &format!("/api/v1/cohorts/{}/publish", cohort.id),
            Some(&admin),
            None,
        ))
        .await
        .expect("route executes");
    assert_eq!(reopen.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        read_json_body(reopen).await["error"],
        json!("InvalidStateError")
    );

    let forbidden = router
        .oneshot(request(
            "GET",
            "/api/v1/admin/dashboard",
            Some(&recruiter()),
            None,
        ))
        .await
        .expect("route executes");
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn reject_handler_without_body_is_a_validation_error() {
    let (service, _) = build_service();
    let admin = admin();
    let cohort = open_cohort(&service, &admin, "CARE", 10);
    let candidate = register(&service, &admin, "Amal Haddad");
    let application = enroll(&service, &admin, &cohort, &candidate, EnrollmentStatus::Applied);
    let service = Arc::new(service);

    let response = reject_application_handler(
        State(service.clone()),
        admin.clone(),
        Path(application.id.0.clone()),
        OptionalJson(RejectionRequest::default()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert_eq!(payload["error"], json!("ValidationError"));

    let response = approve_application_handler(
        State(service),
        admin,
        Path(application.id.0.clone()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn create_routes_answer_created() {
    let (service, _) = build_service();
    let admin = admin();
    let router = router_with_service(service);

    let response = router
        .oneshot(request(
            "POST",
            "/api/v1/courses",
            Some(&admin),
            Some(json!({ "code": "CARE", "title": "Caregiving", "durationWeeks": 12 })),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["data"]["code"], json!("CARE"));
    assert_eq!(payload["data"]["tenantId"], json!(TENANT));
}

#[tokio::test]
async fn slow_store_times_out_with_gateway_timeout() {
    let config = WorkflowConfig {
        request_timeout_ms: 20,
        ..WorkflowConfig::default()
    };
    let store = SlowStore {
        inner: InMemoryWorkflowStore::new(),
        delay: Duration::from_millis(250),
    };
    let service = WorkflowService::new(
        Arc::new(store),
        Arc::new(MemoryNotifier::default()),
        config,
    );
    let router = workflow_router(Arc::new(service));

    let response = router
        .oneshot(request("GET", "/api/v1/courses", Some(&admin()), None))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(read_json_body(response).await["error"], json!("TimeoutError"));
}

#[tokio::test]
async fn store_outage_hides_details_behind_a_generic_message() {
    let service = WorkflowService::new(
        Arc::new(UnavailableStore),
        Arc::new(MemoryNotifier::default()),
        WorkflowConfig::default(),
    );
    let router = workflow_router(Arc::new(service));

    let response = router
        .oneshot(request("GET", "/api/v1/cohorts", Some(&admin()), None))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let payload = read_json_body(response).await;
    assert_eq!(payload["error"], json!("UnavailableError"));
    assert!(!payload["message"]
        .as_str()
        .unwrap_or_default()
        .contains("database offline"));
}

fn raw_request(uri: &str, scope: &TenantScope, body: &'static str) -> Request<Body> {
    Request::post(uri)
        .header(TENANT_HEADER, scope.tenant_id().0.as_str())
        .header(USER_HEADER, scope.user_id().0.as_str())
        .header(ROLE_HEADER, scope.role().label())
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn undecodable_input_is_reported_in_the_error_envelope() {
    let (service, _) = build_service();
    let admin = admin();
    let cohort = open_cohort(&service, &admin, "WELD", 4);
    let candidate = register(&service, &admin, "Rania Saleh");
    let enrollment = enroll(&service, &admin, &cohort, &candidate, EnrollmentStatus::Enrolled);
    let router = router_with_service(service);

    let cases = [
        request("POST", "/api/v1/certificates", Some(&admin), Some(json!({}))),
        request(
            "POST",
            &format!("/api/v1/enrollments/{}/assessment", enrollment.id),
            Some(&trainer()),
            Some(json!({ "score": 300, "passed": true })),
        ),
        request(
            "GET",
            "/api/v1/certificates?issuedFrom=last-week",
            Some(&admin),
            None,
        ),
        raw_request("/api/v1/cohorts", &admin, "{\"courseId\": "),
    ];

    for case in cases {
        let uri = case.uri().to_string();
        let response = router.clone().oneshot(case).await.expect("route executes");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        assert_eq!(content_type.as_deref(), Some("application/json"), "{uri}");
        let payload = read_json_body(response).await;
        assert_eq!(payload["success"], json!(false), "{uri}");
        assert_eq!(payload["error"], json!("ValidationError"), "{uri}");
    }
}

#[tokio::test]
async fn garbled_revocation_leaves_the_certificate_issued() {
    let (service, _) = build_service();
    let admin = admin();
    let enrollment = completed_enrollment(&service, "PLMB");
    let certificate = service
        .issue_certificate(
            &admin,
            IssueRequest {
                enrollment_id: enrollment.id,
                override_reason: None,
                grade: None,
                expiry_date: None,
            },
        )
        .expect("certificate issued");
    let service = Arc::new(service);
    let router = workflow_router(service.clone());
    let uri = format!("/api/v1/certificates/{}/revoke", certificate.id);

    let garbled = router
        .clone()
        .oneshot(raw_request(&uri, &admin, "{\"reason\": 42"))
        .await
        .expect("route executes");
    assert_eq!(garbled.status(), StatusCode::BAD_REQUEST);
    let wrong_type = router
        .clone()
        .oneshot(raw_request(&uri, &admin, "{\"reason\": 42}"))
        .await
        .expect("route executes");
    assert_eq!(wrong_type.status(), StatusCode::BAD_REQUEST);

    let listed = service
        .list_certificates(&admin, &Default::default())
        .expect("certificates listed");
    assert_eq!(listed[0].status, CertificateStatus::Issued);
    assert_eq!(listed[0].revoked_at, None);

    let without_body = router
        .oneshot(request("POST", &uri, Some(&admin), None))
        .await
        .expect("route executes");
    assert_eq!(without_body.status(), StatusCode::OK);
    assert_eq!(read_json_body(without_body).await["data"]["status"], json!("REVOKED"));
}
