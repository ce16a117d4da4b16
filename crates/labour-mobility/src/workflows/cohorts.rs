use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;

use crate::tenancy::{Role, TenantScope};

use super::domain::{Cohort, CohortId, CohortStatus, Course, CourseId, LifecycleStatus};
use super::notify::Notifier;
use super::service::{require_role, required_text, WorkflowError, WorkflowService};
use super::store::WorkflowStore;
use super::transitions::{self, CohortAction};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCourse {
    pub code: String,
    pub title: String,
    #[serde(default)]
    pub duration_weeks: Option<u16>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCohort {
    pub course_id: CourseId,
    pub name: String,
    pub max_capacity: u32,
    #[serde(default)]
    pub planned_sessions: u32,
    #[serde(default)]
    pub starts_on: Option<NaiveDate>,
    #[serde(default)]
    pub ends_on: Option<NaiveDate>,
}

impl<S, N> WorkflowService<S, N>
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    pub fn create_course(
        &self,
        scope: &TenantScope,
        request: NewCourse,
    ) -> Result<Course, WorkflowError> {
        require_role(scope, &[Role::Admin], "create courses")?;
        let code = required_text(&request.code, "code")?;
        let title = required_text(&request.title, "title")?;
        let now = self.now();

        let course = self.write(scope, |tx| {
            if tx
                .courses()
                .iter()
                .any(|existing| existing.code.eq_ignore_ascii_case(&code))
            {
                return Err(WorkflowError::Conflict(format!(
                    "course code {code} already exists"
                )));
            }

            let course = Course {
                id: CourseId::generate(),
                tenant_id: tx.tenant_id().clone(),
                code,
                title,
                duration_weeks: request.duration_weeks,
                created_at: now,
            };
            tx.put_course(course.clone());
            Ok(course)
        })?;

        info!(tenant = %scope.tenant_id(), course = %course.id, "course created");
        Ok(course)
    }

    pub fn list_courses(&self, scope: &TenantScope) -> Result<Vec<Course>, WorkflowError> {
        self.read(scope, |tx| Ok(tx.courses()))
    }

    pub fn create_cohort(
        &self,
        scope: &TenantScope,
        request: NewCohort,
    ) -> Result<Cohort, WorkflowError> {
        require_role(scope, &[Role::Admin], "create cohorts")?;
        let name = required_text(&request.name, "name")?;
        if request.max_capacity == 0 {
            return Err(WorkflowError::Validation(
                "maxCapacity must be greater than zero".to_string(),
            ));
        }
        if let (Some(start), Some(end)) = (request.starts_on, request.ends_on) {
            if end < start {
                return Err(WorkflowError::Validation(
                    "endsOn must not be before startsOn".to_string(),
                ));
            }
        }
        let now = self.now();

        let cohort = self.write(scope, |tx| {
            tx.course(&request.course_id)
                .ok_or(WorkflowError::NotFound("course"))?;

            let cohort = Cohort {
                id: CohortId::generate(),
                tenant_id: tx.tenant_id().clone(),
                course_id: request.course_id,
                name,
                max_capacity: request.max_capacity,
                planned_sessions: request.planned_sessions,
                starts_on: request.starts_on,
                ends_on: request.ends_on,
                status: CohortStatus::Draft,
                created_at: now,
                updated_at: now,
            };
            tx.put_cohort(cohort.clone());
            Ok(cohort)
        })?;

        info!(tenant = %scope.tenant_id(), cohort = %cohort.id, "cohort drafted");
        Ok(cohort)
    }

    pub fn get_cohort(&self, scope: &TenantScope, id: &CohortId) -> Result<Cohort, WorkflowError> {
        self.read(scope, |tx| tx.cohort(id).ok_or(WorkflowError::NotFound("cohort")))
    }

    pub fn list_cohorts(
        &self,
        scope: &TenantScope,
        status: Option<CohortStatus>,
    ) -> Result<Vec<Cohort>, WorkflowError> {
        self.read(scope, |tx| {
            Ok(tx
                .cohorts()
                .into_iter()
                .filter(|cohort| status.map_or(true, |wanted| cohort.status == wanted))
                .collect())
        })
    }

    pub fn publish_cohort(
        &self,
        scope: &TenantScope,
        id: &CohortId,
    ) -> Result<Cohort, WorkflowError> {
        self.transition_cohort(scope, id, CohortAction::Publish)
    }

    pub fn open_enrollment(
        &self,
        scope: &TenantScope,
        id: &CohortId,
    ) -> Result<Cohort, WorkflowError> {
        self.transition_cohort(scope, id, CohortAction::OpenEnrollment)
    }

    pub fn close_enrollment(
        &self,
        scope: &TenantScope,
        id: &CohortId,
    ) -> Result<Cohort, WorkflowError> {
        self.transition_cohort(scope, id, CohortAction::CloseEnrollment)
    }

    pub fn start_training(
        &self,
        scope: &TenantScope,
        id: &CohortId,
    ) -> Result<Cohort, WorkflowError> {
        self.transition_cohort(scope, id, CohortAction::StartTraining)
    }

    pub fn start_assessment(
        &self,
        scope: &TenantScope,
        id: &CohortId,
    ) -> Result<Cohort, WorkflowError> {
        self.transition_cohort(scope, id, CohortAction::StartAssessment)
    }

    pub fn start_cohort_vetting(
        &self,
        scope: &TenantScope,
        id: &CohortId,
    ) -> Result<Cohort, WorkflowError> {
        self.transition_cohort(scope, id, CohortAction::StartVetting)
    }

    pub fn complete_cohort(
        &self,
        scope: &TenantScope,
        id: &CohortId,
    ) -> Result<Cohort, WorkflowError> {
        self.transition_cohort(scope, id, CohortAction::Complete)
    }

    pub fn archive_cohort(
        &self,
        scope: &TenantScope,
        id: &CohortId,
    ) -> Result<Cohort, WorkflowError> {
        self.transition_cohort(scope, id, CohortAction::Archive)
    }

    /// Validate and apply one lifecycle step as a single read-modify-write.
    pub fn transition_cohort(
        &self,
        scope: &TenantScope,
        id: &CohortId,
        action: CohortAction,
    ) -> Result<Cohort, WorkflowError> {
        require_role(scope, &[Role::Admin], "change cohort status")?;
        let now = self.now();

        let (previous, cohort) = self.write(scope, |tx| {
            let mut cohort = tx.cohort(id).ok_or(WorkflowError::NotFound("cohort"))?;
            let previous = cohort.status;
            cohort.status = transitions::cohort(previous, action)?;
            cohort.updated_at = now;
            tx.put_cohort(cohort.clone());
            Ok((previous, cohort))
        })?;

        info!(
            tenant = %scope.tenant_id(),
            cohort = %cohort.id,
            from = previous.label(),
            to = cohort.status.label(),
            "cohort status changed"
        );
        Ok(cohort)
    }
}
