use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;

use crate::tenancy::{Role, TenantScope};

use super::candidates::{candidate_visible, own_candidate, visible_candidate};
use super::domain::{
    AssessmentResult, Candidate, CohortEnrollment, CohortId, EnrollmentId, EnrollmentStatus,
    LifecycleStatus,
};
use super::notify::{Notification, Notifier};
use super::service::{
    apply_candidate_milestone, require_role, required_text, WorkflowError, WorkflowService,
};
use super::store::{TenantWriter, WorkflowStore};
use super::transitions::{self, CandidateMilestone, EnrollmentAction, SideEffect};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollRequest {
    pub candidate_id: super::domain::CandidateId,
    #[serde(default = "default_enrollment_status")]
    pub enrollment_status: EnrollmentStatus,
}

fn default_enrollment_status() -> EnrollmentStatus {
    EnrollmentStatus::Applied
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RejectionRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceUpdate {
    pub sessions_attended: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssessmentUpdate {
    pub score: u8,
    pub passed: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentFilter {
    #[serde(default)]
    pub cohort_id: Option<CohortId>,
    #[serde(default)]
    pub status: Option<EnrollmentStatus>,
}

fn seats_taken<W>(tx: &W, cohort_id: &CohortId) -> u32
where
    W: TenantWriter + ?Sized,
{
    let taken = tx
        .enrollments()
        .iter()
        .filter(|enrollment| &enrollment.cohort_id == cohort_id && enrollment.status.occupies_seat())
        .count();
    u32::try_from(taken).unwrap_or(u32::MAX)
}

/// Admit `candidate` into the cohort with the requested initial status. Runs inside the
/// caller's transaction so the open-status and capacity checks hold at commit.
fn admit<W>(
    tx: &mut W,
    cohort_id: &CohortId,
    candidate: &Candidate,
    status: EnrollmentStatus,
    now: DateTime<Utc>,
) -> Result<CohortEnrollment, WorkflowError>
where
    W: TenantWriter + ?Sized,
{
    let cohort = tx.cohort(cohort_id).ok_or(WorkflowError::NotFound("cohort"))?;
    transitions::admission(cohort.status)?;

    let duplicate = tx.enrollments().into_iter().any(|existing| {
        &existing.cohort_id == cohort_id
            && existing.candidate_id == candidate.id
            && existing.status.is_active()
    });
    if duplicate {
        return Err(WorkflowError::Conflict(
            "candidate already has an active enrollment in this cohort".to_string(),
        ));
    }

    if seats_taken(&*tx, cohort_id) >= cohort.max_capacity {
        return Err(WorkflowError::CapacityExceeded {
            cohort: cohort.id,
            capacity: cohort.max_capacity,
        });
    }

    let approved = status == EnrollmentStatus::Enrolled;
    let enrollment = CohortEnrollment {
        id: EnrollmentId::generate(),
        tenant_id: tx.tenant_id().clone(),
        cohort_id: cohort.id,
        candidate_id: candidate.id.clone(),
        status,
        application_date: now,
        approval_date: approved.then_some(now),
        rejection_reason: None,
        completion_date: None,
        sessions_attended: 0,
        assessment: None,
        updated_at: now,
    };
    tx.put_enrollment(enrollment.clone());

    if approved {
        apply_candidate_milestone(tx, &candidate.id, CandidateMilestone::EnrollmentApproved, now)?;
    }
    Ok(enrollment)
}

/// Apply the effects of an accepted enrollment transition, returning the notifications to
/// send once the transaction commits.
fn apply_effects<W>(
    tx: &mut W,
    enrollment: &mut CohortEnrollment,
    effects: &[SideEffect],
    now: DateTime<Utc>,
) -> Result<Vec<Notification>, WorkflowError>
where
    W: TenantWriter + ?Sized,
{
    let mut notifications = Vec::new();
    for effect in effects {
        match effect {
            SideEffect::StampApprovalDate => enrollment.approval_date = Some(now),
            SideEffect::StampCompletionDate => enrollment.completion_date = Some(now),
            SideEffect::StampDecisionDate => {}
            SideEffect::AdvanceCandidate(milestone) => {
                apply_candidate_milestone(tx, &enrollment.candidate_id, *milestone, now)?
            }
            SideEffect::Notify(template) => notifications.push(
                Notification::new(
                    *template,
                    enrollment.tenant_id.clone(),
                    enrollment.candidate_id.clone(),
                )
                .detail("enrollmentId", enrollment.id.0.clone())
                .detail("cohortId", enrollment.cohort_id.0.clone()),
            ),
        }
    }
    Ok(notifications)
}

impl<S, N> WorkflowService<S, N>
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    /// Candidate self-service application; the enrollment starts as `APPLIED`.
    pub fn apply_to_cohort(
        &self,
        scope: &TenantScope,
        cohort_id: &CohortId,
    ) -> Result<CohortEnrollment, WorkflowError> {
        require_role(scope, &[Role::Candidate], "apply to cohorts")?;
        let now = self.now();

        let enrollment = self.write(scope, |tx| {
            let candidate = own_candidate(&*tx, scope)?;
            admit(tx, cohort_id, &candidate, EnrollmentStatus::Applied, now)
        })?;

        info!(
            tenant = %scope.tenant_id(),
            cohort = %cohort_id,
            enrollment = %enrollment.id,
            "cohort application received"
        );
        Ok(enrollment)
    }

    /// Operator enrollment, either as an application or directly as `ENROLLED`.
    pub fn enroll_candidate(
        &self,
        scope: &TenantScope,
        cohort_id: &CohortId,
        request: EnrollRequest,
    ) -> Result<CohortEnrollment, WorkflowError> {
        require_role(scope, &[Role::Admin, Role::Recruiter], "enroll candidates")?;
        if !matches!(
            request.enrollment_status,
            EnrollmentStatus::Applied | EnrollmentStatus::Enrolled
        ) {
            return Err(WorkflowError::Validation(format!(
                "enrollmentStatus must be APPLIED or ENROLLED, got {}",
                request.enrollment_status.label()
            )));
        }
        let now = self.now();

        let enrollment = self.write(scope, |tx| {
            let candidate = visible_candidate(&*tx, scope, &request.candidate_id)?;
            admit(tx, cohort_id, &candidate, request.enrollment_status, now)
        })?;

        info!(
            tenant = %scope.tenant_id(),
            cohort = %cohort_id,
            enrollment = %enrollment.id,
            status = enrollment.status.label(),
            "candidate enrolled"
        );
        Ok(enrollment)
    }

    /// Approve a pending cohort application.
    pub fn approve_application(
        &self,
        scope: &TenantScope,
        id: &EnrollmentId,
    ) -> Result<CohortEnrollment, WorkflowError> {
        require_role(scope, &[Role::Admin], "approve cohort applications")?;
        let now = self.now();

        let (enrollment, notifications) = self.write(scope, |tx| {
            let mut enrollment = tx
                .enrollment(id)
                .ok_or(WorkflowError::NotFound("cohort application"))?;
            let transition = transitions::enrollment(enrollment.status, EnrollmentAction::Approve)?;

            let cohort = tx
                .cohort(&enrollment.cohort_id)
                .ok_or(WorkflowError::NotFound("cohort"))?;
            transitions::approval(cohort.status)?;
            if seats_taken(&*tx, &cohort.id) >= cohort.max_capacity {
                return Err(WorkflowError::CapacityExceeded {
                    cohort: cohort.id,
                    capacity: cohort.max_capacity,
                });
            }

            enrollment.status = transition.next;
            enrollment.updated_at = now;
            let notifications = apply_effects(tx, &mut enrollment, &transition.effects, now)?;
            tx.put_enrollment(enrollment.clone());
            Ok((enrollment, notifications))
        })?;

        info!(tenant = %scope.tenant_id(), enrollment = %enrollment.id, "cohort application approved");
        self.dispatch(notifications)?;
        Ok(enrollment)
    }

    /// Reject a pending cohort application. The reason is checked before anything is read.
    pub fn reject_application(
        &self,
        scope: &TenantScope,
        id: &EnrollmentId,
        reason: Option<&str>,
    ) -> Result<CohortEnrollment, WorkflowError> {
        require_role(scope, &[Role::Admin], "reject cohort applications")?;
        let reason = required_text(reason.unwrap_or_default(), "reason")?;
        let now = self.now();

        let (enrollment, notifications) = self.write(scope, |tx| {
            let mut enrollment = tx
                .enrollment(id)
                .ok_or(WorkflowError::NotFound("cohort application"))?;
            let transition = transitions::enrollment(enrollment.status, EnrollmentAction::Reject)?;

            enrollment.status = transition.next;
            enrollment.rejection_reason = Some(reason.clone());
            enrollment.updated_at = now;
            let mut notifications = apply_effects(tx, &mut enrollment, &transition.effects, now)?;
            for notification in &mut notifications {
                notification
                    .details
                    .insert("reason".to_string(), reason.clone());
            }
            tx.put_enrollment(enrollment.clone());
            Ok((enrollment, notifications))
        })?;

        info!(tenant = %scope.tenant_id(), enrollment = %enrollment.id, "cohort application rejected");
        self.dispatch(notifications)?;
        Ok(enrollment)
    }

    pub fn withdraw_enrollment(
        &self,
        scope: &TenantScope,
        id: &EnrollmentId,
    ) -> Result<CohortEnrollment, WorkflowError> {
        require_role(
            scope,
            &[Role::Admin, Role::Recruiter, Role::Candidate],
            "withdraw enrollments",
        )?;
        self.transition_enrollment(scope, id, EnrollmentAction::Withdraw, |_| Ok(()))
    }

    pub fn complete_enrollment(
        &self,
        scope: &TenantScope,
        id: &EnrollmentId,
    ) -> Result<CohortEnrollment, WorkflowError> {
        require_role(scope, &[Role::Admin, Role::Trainer], "complete enrollments")?;
        self.transition_enrollment(scope, id, EnrollmentAction::Complete, |_| Ok(()))
    }

    pub fn record_attendance(
        &self,
        scope: &TenantScope,
        id: &EnrollmentId,
        update: AttendanceUpdate,
    ) -> Result<CohortEnrollment, WorkflowError> {
        require_role(scope, &[Role::Admin, Role::Trainer], "record attendance")?;
        let planned = self.read(scope, |tx| {
            let enrollment = tx
                .enrollment(id)
                .ok_or(WorkflowError::NotFound("cohort enrollment"))?;
            tx.cohort(&enrollment.cohort_id)
                .map(|cohort| cohort.planned_sessions)
                .ok_or(WorkflowError::NotFound("cohort"))
        })?;
        if planned > 0 && update.sessions_attended > planned {
            return Err(WorkflowError::Validation(format!(
                "sessionsAttended cannot exceed the {planned} planned sessions"
            )));
        }

        self.transition_enrollment(scope, id, EnrollmentAction::RecordProgress, |enrollment| {
            enrollment.sessions_attended = update.sessions_attended;
            Ok(())
        })
    }

    pub fn record_assessment(
        &self,
        scope: &TenantScope,
        id: &EnrollmentId,
        update: AssessmentUpdate,
    ) -> Result<CohortEnrollment, WorkflowError> {
        require_role(scope, &[Role::Admin, Role::Trainer], "record assessments")?;
        if update.score > 100 {
            return Err(WorkflowError::Validation(
                "score must be between 0 and 100".to_string(),
            ));
        }

        self.transition_enrollment(scope, id, EnrollmentAction::RecordProgress, |enrollment| {
            enrollment.assessment = Some(AssessmentResult {
                score: update.score,
                passed: update.passed,
            });
            Ok(())
        })
    }

    pub fn list_enrollments(
        &self,
        scope: &TenantScope,
        filter: &EnrollmentFilter,
    ) -> Result<Vec<CohortEnrollment>, WorkflowError> {
        self.read(scope, |tx| {
            let enrollments = tx
                .enrollments()
                .into_iter()
                .filter(|enrollment| {
                    filter
                        .cohort_id
                        .as_ref()
                        .map_or(true, |cohort| &enrollment.cohort_id == cohort)
                })
                .filter(|enrollment| filter.status.map_or(true, |status| enrollment.status == status))
                .filter(|enrollment| {
                    tx.candidate(&enrollment.candidate_id)
                        .is_some_and(|candidate| candidate_visible(tx, scope, &candidate))
                })
                .collect();
            Ok(enrollments)
        })
    }

    fn transition_enrollment<F>(
        &self,
        scope: &TenantScope,
        id: &EnrollmentId,
        action: EnrollmentAction,
        update: F,
    ) -> Result<CohortEnrollment, WorkflowError>
    where
        F: FnOnce(&mut CohortEnrollment) -> Result<(), WorkflowError>,
    {
        let now = self.now();

        let (enrollment, notifications) = self.write(scope, |tx| {
            let mut enrollment = tx
                .enrollment(id)
                .ok_or(WorkflowError::NotFound("cohort enrollment"))?;
            // Role subsets apply to the candidate behind the enrollment.
            visible_candidate(&*tx, scope, &enrollment.candidate_id)
                .map_err(|_| WorkflowError::NotFound("cohort enrollment"))?;

            let transition = transitions::enrollment(enrollment.status, action)?;
            enrollment.status = transition.next;
            enrollment.updated_at = now;
            update(&mut enrollment)?;
            let notifications = apply_effects(tx, &mut enrollment, &transition.effects, now)?;
            tx.put_enrollment(enrollment.clone());
            Ok((enrollment, notifications))
        })?;

        info!(
            tenant = %scope.tenant_id(),
            enrollment = %enrollment.id,
            action = action.label(),
            status = enrollment.status.label(),
            "cohort enrollment updated"
        );
        self.dispatch(notifications)?;
        Ok(enrollment)
    }
}
