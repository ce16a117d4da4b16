use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::config::WorkflowConfig;
use crate::tenancy::{Role, TenantId, TenantScope, UserId};
use crate::workflows::domain::{Candidate, Cohort, CohortEnrollment, EnrollmentStatus};
use crate::workflows::notify::{Notification, Notifier, NotifyError};
use crate::workflows::service::{Clock, WorkflowService};
use crate::workflows::store::{
    InMemoryWorkflowStore, StoreError, TenantReader, TenantWriter, WorkflowStore,
};
use crate::workflows::transitions::NotificationTemplate;
use crate::workflows::{workflow_router, EnrollRequest, NewCandidate, NewCohort, NewCourse};

pub(super) type TestService = WorkflowService<InMemoryWorkflowStore, MemoryNotifier>;

pub(super) const TENANT: &str = "tenant-amman";
pub(super) const OTHER_TENANT: &str = "tenant-manila";

pub(super) fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 16, 9, 30, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) struct FixedClock(pub(super) DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub(super) fn scope(tenant: &str, user: &str, role: Role) -> TenantScope {
    TenantScope::new(TenantId(tenant.to_string()), UserId(user.to_string()), role)
}

pub(super) fn admin() -> TenantScope {
    scope(TENANT, "admin-1", Role::Admin)
}

pub(super) fn recruiter() -> TenantScope {
    scope(TENANT, "recruiter-1", Role::Recruiter)
}

pub(super) fn trainer() -> TenantScope {
    scope(TENANT, "trainer-1", Role::Trainer)
}

pub(super) fn vetting_officer() -> TenantScope {
    scope(TENANT, "officer-1", Role::VettingOfficer)
}

pub(super) fn build_service() -> (TestService, Arc<MemoryNotifier>) {
    build_service_with(WorkflowConfig::default())
}

pub(super) fn build_service_with(config: WorkflowConfig) -> (TestService, Arc<MemoryNotifier>) {
    let notifier = Arc::new(MemoryNotifier::default());
    let service = WorkflowService::new(
        Arc::new(InMemoryWorkflowStore::new()),
        notifier.clone(),
        config,
    )
    .with_clock(Arc::new(FixedClock(fixed_now())));
    (service, notifier)
}

/// Course plus cohort walked to `ENROLLMENT_OPEN`.
pub(super) fn open_cohort<S, N>(
    service: &WorkflowService<S, N>,
    admin: &TenantScope,
    code: &str,
    capacity: u32,
) -> Cohort
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    let course = service
        .create_course(
            admin,
            NewCourse {
                code: code.to_string(),
                title: format!("{code} caregiver programme"),
                duration_weeks: Some(12),
            },
        )
        .expect("course created");
    let cohort = service
        .create_cohort(
            admin,
            NewCohort {
                course_id: course.id,
                name: format!("{code} spring intake"),
                max_capacity: capacity,
                planned_sessions: 10,
                starts_on: None,
                ends_on: None,
            },
        )
        .expect("cohort created");
    service.publish_cohort(admin, &cohort.id).expect("publish");
    service
        .open_enrollment(admin, &cohort.id)
        .expect("open enrollment")
}

pub(super) fn new_candidate(name: &str) -> NewCandidate {
    NewCandidate {
        full_name: name.to_string(),
        email: format!("{}@example.org", name.to_ascii_lowercase().replace(' ', ".")),
        phone: Some("+962790000000".to_string()),
        nationality: Some("JO".to_string()),
        user_id: None,
        recruiter_id: None,
    }
}

pub(super) fn register<S, N>(service: &WorkflowService<S, N>, admin: &TenantScope, name: &str) -> Candidate
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    service
        .register_candidate(admin, new_candidate(name))
        .expect("candidate registered")
}

/// Candidate profile linked to a login, plus the scope that login would carry.
pub(super) fn self_registered(service: &TestService, user: &str) -> (Candidate, TenantScope) {
    let login = scope(TENANT, user, Role::Candidate);
    let candidate = service
        .register_candidate(&login, new_candidate(user))
        .expect("self registration");
    (candidate, login)
}

pub(super) fn enroll<S, N>(
    service: &WorkflowService<S, N>,
    admin: &TenantScope,
    cohort: &Cohort,
    candidate: &Candidate,
    status: EnrollmentStatus,
) -> CohortEnrollment
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    service
        .enroll_candidate(
            admin,
            &cohort.id,
            EnrollRequest {
                candidate_id: candidate.id.clone(),
                enrollment_status: status,
            },
        )
        .expect("enrollment accepted")
}

pub(super) fn completed_enrollment(service: &TestService, code: &str) -> CohortEnrollment {
    let admin = admin();
    let cohort = open_cohort(service, &admin, code, 5);
    let candidate = register(service, &admin, &format!("{code} Graduate"));
    let enrollment = enroll(service, &admin, &cohort, &candidate, EnrollmentStatus::Enrolled);
    service
        .complete_enrollment(&trainer(), &enrollment.id)
        .expect("completion recorded")
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
}

impl MemoryNotifier {
    pub(super) fn sent(&self) -> Vec<Notification> {
        self.sent.lock().expect("notifier mutex poisoned").clone()
    }

    pub(super) fn templates(&self) -> Vec<NotificationTemplate> {
        self.sent().into_iter().map(|n| n.template).collect()
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .expect("notifier mutex poisoned")
            .push(notification);
        Ok(())
    }
}

pub(super) struct FailingNotifier;

impl Notifier for FailingNotifier {
    fn notify(&self, _notification: Notification) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("smtp relay offline".to_string()))
    }
}

pub(super) struct UnavailableStore;

impl WorkflowStore for UnavailableStore {
    fn read<T, E, F>(&self, _scope: &TenantScope, _work: F) -> Result<T, E>
    where
        F: FnOnce(&dyn TenantReader) -> Result<T, E>,
        E: From<StoreError>,
    {
        Err(StoreError::Unavailable("database offline".to_string()).into())
    }

    fn write<T, E, F>(&self, _scope: &TenantScope, _work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn TenantWriter) -> Result<T, E>,
        E: From<StoreError>,
    {
        Err(StoreError::Unavailable("database offline".to_string()).into())
    }
}

pub(super) fn router_with_service(service: TestService) -> axum::Router {
    workflow_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
