use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequest, FromRequestParts, Path, Query, Request, State,
    },
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, MethodRouter},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use crate::tenancy::{TenantScope, UserId};

use super::candidates::{NewCandidate, PlacementRequest};
use super::certificates::{CertificateFilter, IssueRequest, NewTemplate, RevocationRequest};
use super::cohorts::{NewCohort, NewCourse};
use super::domain::{
    CandidateId, CandidateStatus, CertificateId, CohortId, CohortStatus, EnrollmentId, TemplateId,
    VettingId, VettingStatus,
};
use super::enrollment::{
    AssessmentUpdate, AttendanceUpdate, EnrollRequest, EnrollmentFilter, RejectionRequest,
};
use super::notify::Notifier;
use super::service::{WorkflowError, WorkflowService};
use super::store::WorkflowStore;
use super::transitions::CohortAction;
use super::vetting::{DocumentRequest, VettingApplication, VettingDecision};

type Shared<S, N> = Arc<WorkflowService<S, N>>;

/// Success envelope shared by every workflow endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

impl WorkflowError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            WorkflowError::NotFound(_) => StatusCode::NOT_FOUND,
            WorkflowError::InvalidState(_) | WorkflowError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            WorkflowError::CapacityExceeded { .. } | WorkflowError::Conflict(_) => {
                StatusCode::CONFLICT
            }
            WorkflowError::Forbidden { .. } => StatusCode::FORBIDDEN,
            WorkflowError::Store(_) | WorkflowError::Notify(_) => StatusCode::SERVICE_UNAVAILABLE,
            WorkflowError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            WorkflowError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WorkflowError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if self.is_client_error() {
            self.to_string()
        } else {
            error!(error = %self, code = self.code(), "workflow request failed");
            "the request could not be completed, please retry later".to_string()
        };

        let payload = json!({
            "success": false,
            "error": self.code(),
            "message": message,
        });
        (status, Json(payload)).into_response()
    }
}

/// Run a synchronous service call on the blocking pool, bounded by the configured request
/// timeout. A timed-out call may still finish in the background; its outcome is discarded.
async fn bounded<S, N, T, F>(service: Shared<S, N>, status: StatusCode, work: F) -> Response
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
    T: Serialize + Send + 'static,
    F: FnOnce(&WorkflowService<S, N>) -> Result<T, WorkflowError> + Send + 'static,
{
    let timeout = service.config().request_timeout();
    let task = tokio::task::spawn_blocking(move || work(service.as_ref()));

    let outcome = match tokio::time::timeout(timeout, task).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(join_error)) => Err(WorkflowError::Internal(join_error.to_string())),
        Err(_) => Err(WorkflowError::Timeout(timeout)),
    };

    match outcome {
        Ok(data) => (status, Json(ApiResponse::ok(data))).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Router exposing the workflow operations under `/api/v1`.
pub fn workflow_router<S, N>(service: Shared<S, N>) -> Router
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    let api = Router::new()
        .route(
            "/admin/cohort-applications/:id/approve",
            post(approve_application_handler::<S, N>),
        )
        .route(
            "/admin/cohort-applications/:id/reject",
            post(reject_application_handler::<S, N>),
        )
        .route(
            "/courses",
            post(create_course_handler::<S, N>).get(list_courses_handler::<S, N>),
        )
        .route(
            "/cohorts",
            post(create_cohort_handler::<S, N>).get(list_cohorts_handler::<S, N>),
        )
        .route("/cohorts/:id", get(get_cohort_handler::<S, N>))
        .route("/cohorts/:id/publish", cohort_step::<S, N>(CohortAction::Publish))
        .route(
            "/cohorts/:id/open-enrollment",
            cohort_step::<S, N>(CohortAction::OpenEnrollment),
        )
        .route(
            "/cohorts/:id/close-enrollment",
            cohort_step::<S, N>(CohortAction::CloseEnrollment),
        )
        .route(
            "/cohorts/:id/start-training",
            cohort_step::<S, N>(CohortAction::StartTraining),
        )
        .route(
            "/cohorts/:id/start-assessment",
            cohort_step::<S, N>(CohortAction::StartAssessment),
        )
        .route(
            "/cohorts/:id/start-vetting",
            cohort_step::<S, N>(CohortAction::StartVetting),
        )
        .route("/cohorts/:id/complete", cohort_step::<S, N>(CohortAction::Complete))
        .route("/cohorts/:id/archive", cohort_step::<S, N>(CohortAction::Archive))
        .route("/cohorts/:id/enroll", post(enroll_handler::<S, N>))
        .route("/cohorts/:id/apply", post(apply_handler::<S, N>))
        .route("/cohorts/:id/progress", get(cohort_progress_handler::<S, N>))
        .route("/enrollments", get(list_enrollments_handler::<S, N>))
        .route("/enrollments/:id/withdraw", post(withdraw_handler::<S, N>))
        .route(
            "/enrollments/:id/complete",
            post(complete_enrollment_handler::<S, N>),
        )
        .route("/enrollments/:id/attendance", post(attendance_handler::<S, N>))
        .route("/enrollments/:id/assessment", post(assessment_handler::<S, N>))
        .route(
            "/candidates",
            post(register_candidate_handler::<S, N>).get(list_candidates_handler::<S, N>),
        )
        .route("/candidates/:id", get(get_candidate_handler::<S, N>))
        .route(
            "/candidates/:id/assign-recruiter",
            post(assign_recruiter_handler::<S, N>),
        )
        .route("/candidates/:id/place", post(place_candidate_handler::<S, N>))
        .route(
            "/vetting",
            post(apply_for_vetting_handler::<S, N>).get(list_vetting_handler::<S, N>),
        )
        .route(
            "/vetting/:id/request-documents",
            post(request_documents_handler::<S, N>),
        )
        .route("/vetting/:id/start-review", post(start_review_handler::<S, N>))
        .route("/vetting/:id/clear", post(clear_vetting_handler::<S, N>))
        .route("/vetting/:id/reject", post(reject_vetting_handler::<S, N>))
        .route(
            "/certificates",
            post(issue_certificate_handler::<S, N>).get(list_certificates_handler::<S, N>),
        )
        .route(
            "/certificates/:id/revoke",
            post(revoke_certificate_handler::<S, N>),
        )
        .route(
            "/certificates/:id/reissue",
            post(reissue_certificate_handler::<S, N>),
        )
        .route(
            "/certificate-templates",
            post(create_template_handler::<S, N>).get(list_templates_handler::<S, N>),
        )
        .route(
            "/certificate-templates/:id/activate",
            post(activate_template_handler::<S, N>),
        )
        .route(
            "/certificate-templates/:id/deactivate",
            post(deactivate_template_handler::<S, N>),
        )
        .route("/admin/dashboard", get(admin_dashboard_handler::<S, N>))
        .route("/recruiter/dashboard", get(recruiter_dashboard_handler::<S, N>))
        .route("/employer/dashboard", get(employer_dashboard_handler::<S, N>))
        .route("/candidate/dashboard", get(candidate_dashboard_handler::<S, N>))
        .with_state(service);

    Router::new().nest("/api/v1", api)
}

/// JSON body whose extraction failures come back in the error envelope as `ValidationError`.
pub(crate) struct ApiJson<T>(pub(crate) T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = WorkflowError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Json::<T>::from_request(req, state)
            .await
            .map(|Json(value)| Self(value))
            .map_err(|rejection: JsonRejection| WorkflowError::Validation(rejection.body_text()))
    }
}

/// Query string counterpart of [`ApiJson`].
pub(crate) struct ApiQuery<T>(pub(crate) T);

#[axum::async_trait]
impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = WorkflowError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| Self(value))
            .map_err(|rejection: QueryRejection| WorkflowError::Validation(rejection.body_text()))
    }
}

/// Body that may be omitted entirely. An empty body yields `T::default()`; anything else must
/// be well-formed JSON for `T`, so a garbled request never drives a transition.
pub(crate) struct OptionalJson<T>(pub(crate) T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for OptionalJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Default,
{
    type Rejection = WorkflowError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let declared_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.trim_start().starts_with("application/json"));
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| WorkflowError::Validation(rejection.body_text()))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(T::default()));
        }
        if !declared_json {
            return Err(WorkflowError::Validation(
                "expected request with `Content-Type: application/json`".to_string(),
            ));
        }
        serde_json::from_slice(&bytes)
            .map(Self)
            .map_err(|err| WorkflowError::Validation(format!("invalid JSON body: {err}")))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CohortQuery {
    #[serde(default)]
    pub status: Option<CohortStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CandidateQuery {
    #[serde(default)]
    pub status: Option<CandidateStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VettingQuery {
    #[serde(default)]
    pub status: Option<VettingStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecruiterAssignment {
    pub recruiter_id: UserId,
}

fn cohort_step<S, N>(action: CohortAction) -> MethodRouter<Shared<S, N>>
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    post(
        move |State(service): State<Shared<S, N>>,
              scope: TenantScope,
              Path(id): Path<String>| async move {
            bounded(service, StatusCode::OK, move |service| {
                service.transition_cohort(&scope, &CohortId(id), action)
            })
            .await
        },
    )
}

pub(crate) async fn approve_application_handler<S, N>(
    State(service): State<Shared<S, N>>,
    scope: TenantScope,
    Path(id): Path<String>,
) -> Response
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    bounded(service, StatusCode::OK, move |service| {
        service.approve_application(&scope, &EnrollmentId(id))
    })
    .await
}

pub(crate) async fn reject_application_handler<S, N>(
    State(service): State<Shared<S, N>>,
    scope: TenantScope,
    Path(id): Path<String>,
    OptionalJson(request): OptionalJson<RejectionRequest>,
) -> Response
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    bounded(service, StatusCode::OK, move |service| {
        service.reject_application(&scope, &EnrollmentId(id), request.reason.as_deref())
    })
    .await
}

async fn create_course_handler<S, N>(
    State(service): State<Shared<S, N>>,
    scope: TenantScope,
    ApiJson(request): ApiJson<NewCourse>,
) -> Response
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    bounded(service, StatusCode::CREATED, move |service| {
        service.create_course(&scope, request)
    })
    .await
}

async fn list_courses_handler<S, N>(
    State(service): State<Shared<S, N>>,
    scope: TenantScope,
) -> Response
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    bounded(service, StatusCode::OK, move |service| service.list_courses(&scope)).await
}

async fn create_cohort_handler<S, N>(
    State(service): State<Shared<S, N>>,
    scope: TenantScope,
    ApiJson(request): ApiJson<NewCohort>,
) -> Response
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    bounded(service, StatusCode::CREATED, move |service| {
        service.create_cohort(&scope, request)
    })
    .await
}

async fn list_cohorts_handler<S, N>(
    State(service): State<Shared<S, N>>,
    scope: TenantScope,
    ApiQuery(query): ApiQuery<CohortQuery>,
) -> Response
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    bounded(service, StatusCode::OK, move |service| {
        service.list_cohorts(&scope, query.status)
    })
    .await
}

async fn get_cohort_handler<S, N>(
    State(service): State<Shared<S, N>>,
    scope: TenantScope,
    Path(id): Path<String>,
) -> Response
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    bounded(service, StatusCode::OK, move |service| {
        service.get_cohort(&scope, &CohortId(id))
    })
    .await
}

async fn enroll_handler<S, N>(
    State(service): State<Shared<S, N>>,
    scope: TenantScope,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<EnrollRequest>,
) -> Response
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    bounded(service, StatusCode::CREATED, move |service| {
        service.enroll_candidate(&scope, &CohortId(id), request)
    })
    .await
}

async fn apply_handler<S, N>(
    State(service): State<Shared<S, N>>,
    scope: TenantScope,
    Path(id): Path<String>,
) -> Response
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    bounded(service, StatusCode::CREATED, move |service| {
        service.apply_to_cohort(&scope, &CohortId(id))
    })
    .await
}

async fn cohort_progress_handler<S, N>(
    State(service): State<Shared<S, N>>,
    scope: TenantScope,
    Path(id): Path<String>,
) -> Response
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    bounded(service, StatusCode::OK, move |service| {
        service.cohort_progress(&scope, &CohortId(id))
    })
    .await
}

async fn list_enrollments_handler<S, N>(
    State(service): State<Shared<S, N>>,
    scope: TenantScope,
    ApiQuery(filter): ApiQuery<EnrollmentFilter>,
) -> Response
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    bounded(service, StatusCode::OK, move |service| {
        service.list_enrollments(&scope, &filter)
    })
    .await
}

async fn withdraw_handler<S, N>(
    State(service): State<Shared<S, N>>,
    scope: TenantScope,
    Path(id): Path<String>,
) -> Response
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    bounded(service, StatusCode::OK, move |service| {
        service.withdraw_enrollment(&scope, &EnrollmentId(id))
    })
    .await
}

async fn complete_enrollment_handler<S, N>(
    State(service): State<Shared<S, N>>,
    scope: TenantScope,
    Path(id): Path<String>,
) -> Response
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    bounded(service, StatusCode::OK, move |service| {
        service.complete_enrollment(&scope, &EnrollmentId(id))
    })
    .await
}

async fn attendance_handler<S, N>(
    State(service): State<Shared<S, N>>,
    scope: TenantScope,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<AttendanceUpdate>,
) -> Response
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    bounded(service, StatusCode::OK, move |service| {
        service.record_attendance(&scope, &EnrollmentId(id), update)
    })
    .await
}

async fn assessment_handler<S, N>(
    State(service): State<Shared<S, N>>,
    scope: TenantScope,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<AssessmentUpdate>,
) -> Response
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    bounded(service, StatusCode::OK, move |service| {
        service.record_assessment(&scope, &EnrollmentId(id), update)
    })
    .await
}

async fn register_candidate_handler<S, N>(
    State(service): State<Shared<S, N>>,
    scope: TenantScope,
    ApiJson(request): ApiJson<NewCandidate>,
) -> Response
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    bounded(service, StatusCode::CREATED, move |service| {
        service.register_candidate(&scope, request)
    })
    .await
}

async fn list_candidates_handler<S, N>(
    State(service): State<Shared<S, N>>,
    scope: TenantScope,
    ApiQuery(query): ApiQuery<CandidateQuery>,
) -> Response
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    bounded(service, StatusCode::OK, move |service| {
        service.list_candidates(&scope, query.status)
    })
    .await
}

async fn get_candidate_handler<S, N>(
    State(service): State<Shared<S, N>>,
    scope: TenantScope,
    Path(id): Path<String>,
) -> Response
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    bounded(service, StatusCode::OK, move |service| {
        service.get_candidate(&scope, &CandidateId(id))
    })
    .await
}

async fn assign_recruiter_handler<S, N>(
    State(service): State<Shared<S, N>>,
    scope: TenantScope,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<RecruiterAssignment>,
) -> Response
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    bounded(service, StatusCode::OK, move |service| {
        service.assign_recruiter(&scope, &CandidateId(id), request.recruiter_id)
    })
    .await
}

async fn place_candidate_handler<S, N>(
    State(service): State<Shared<S, N>>,
    scope: TenantScope,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<PlacementRequest>,
) -> Response
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    bounded(service, StatusCode::CREATED, move |service| {
        service.place_candidate(&scope, &CandidateId(id), request)
    })
    .await
}

async fn apply_for_vetting_handler<S, N>(
    State(service): State<Shared<S, N>>,
    scope: TenantScope,
    OptionalJson(request): OptionalJson<VettingApplication>,
) -> Response
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    bounded(service, StatusCode::CREATED, move |service| {
        service.apply_for_vetting(&scope, request)
    })
    .await
}

async fn list_vetting_handler<S, N>(
    State(service): State<Shared<S, N>>,
    scope: TenantScope,
    ApiQuery(query): ApiQuery<VettingQuery>,
) -> Response
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    bounded(service, StatusCode::OK, move |service| {
        service.list_vetting(&scope, query.status)
    })
    .await
}

async fn request_documents_handler<S, N>(
    State(service): State<Shared<S, N>>,
    scope: TenantScope,
    Path(id): Path<String>,
    OptionalJson(request): OptionalJson<DocumentRequest>,
) -> Response
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    bounded(service, StatusCode::OK, move |service| {
        service.request_documents(&scope, &VettingId(id), request)
    })
    .await
}

async fn start_review_handler<S, N>(
    State(service): State<Shared<S, N>>,
    scope: TenantScope,
    Path(id): Path<String>,
) -> Response
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    bounded(service, StatusCode::OK, move |service| {
        service.start_review(&scope, &VettingId(id))
    })
    .await
}

async fn clear_vetting_handler<S, N>(
    State(service): State<Shared<S, N>>,
    scope: TenantScope,
    Path(id): Path<String>,
    OptionalJson(decision): OptionalJson<VettingDecision>,
) -> Response
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    bounded(service, StatusCode::OK, move |service| {
        service.clear_vetting(&scope, &VettingId(id), decision)
    })
    .await
}

async fn reject_vetting_handler<S, N>(
    State(service): State<Shared<S, N>>,
    scope: TenantScope,
    Path(id): Path<String>,
    OptionalJson(decision): OptionalJson<VettingDecision>,
) -> Response
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    bounded(service, StatusCode::OK, move |service| {
        service.reject_vetting(&scope, &VettingId(id), decision)
    })
    .await
}

async fn issue_certificate_handler<S, N>(
    State(service): State<Shared<S, N>>,
    scope: TenantScope,
    ApiJson(request): ApiJson<IssueRequest>,
) -> Response
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    bounded(service, StatusCode::CREATED, move |service| {
        service.issue_certificate(&scope, request)
    })
    .await
}

async fn list_certificates_handler<S, N>(
    State(service): State<Shared<S, N>>,
    scope: TenantScope,
    ApiQuery(filter): ApiQuery<CertificateFilter>,
) -> Response
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    bounded(service, StatusCode::OK, move |service| {
        service.list_certificates(&scope, &filter)
    })
    .await
}

async fn revoke_certificate_handler<S, N>(
    State(service): State<Shared<S, N>>,
    scope: TenantScope,
    Path(id): Path<String>,
    OptionalJson(request): OptionalJson<RevocationRequest>,
) -> Response
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    bounded(service, StatusCode::OK, move |service| {
        service.revoke_certificate(&scope, &CertificateId(id), request)
    })
    .await
}

async fn reissue_certificate_handler<S, N>(
    State(service): State<Shared<S, N>>,
    scope: TenantScope,
    Path(id): Path<String>,
) -> Response
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    bounded(service, StatusCode::CREATED, move |service| {
        service.reissue_certificate(&scope, &CertificateId(id))
    })
    .await
}

async fn create_template_handler<S, N>(
    State(service): State<Shared<S, N>>,
    scope: TenantScope,
    ApiJson(request): ApiJson<NewTemplate>,
) -> Response
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    bounded(service, StatusCode::CREATED, move |service| {
        service.create_template(&scope, request)
    })
    .await
}

async fn list_templates_handler<S, N>(
    State(service): State<Shared<S, N>>,
    scope: TenantScope,
) -> Response
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    bounded(service, StatusCode::OK, move |service| service.list_templates(&scope)).await
}

async fn activate_template_handler<S, N>(
    State(service): State<Shared<S, N>>,
    scope: TenantScope,
    Path(id): Path<String>,
) -> Response
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    bounded(service, StatusCode::OK, move |service| {
        service.activate_template(&scope, &TemplateId(id))
    })
    .await
}

async fn deactivate_template_handler<S, N>(
    State(service): State<Shared<S, N>>,
    scope: TenantScope,
    Path(id): Path<String>,
) -> Response
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    bounded(service, StatusCode::OK, move |service| {
        service.deactivate_template(&scope, &TemplateId(id))
    })
    .await
}

async fn admin_dashboard_handler<S, N>(
    State(service): State<Shared<S, N>>,
    scope: TenantScope,
) -> Response
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    bounded(service, StatusCode::OK, move |service| service.admin_dashboard(&scope)).await
}

async fn recruiter_dashboard_handler<S, N>(
    State(service): State<Shared<S, N>>,
    scope: TenantScope,
) -> Response
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    bounded(service, StatusCode::OK, move |service| {
        service.recruiter_dashboard(&scope)
    })
    .await
}

async fn employer_dashboard_handler<S, N>(
    State(service): State<Shared<S, N>>,
    scope: TenantScope,
) -> Response
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    bounded(service, StatusCode::OK, move |service| {
        service.employer_dashboard(&scope)
    })
    .await
}

async fn candidate_dashboard_handler<S, N>(
    State(service): State<Shared<S, N>>,
    scope: TenantScope,
) -> Response
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    bounded(service, StatusCode::OK, move |service| {
        service.candidate_dashboard(&scope)
    })
    .await
}
