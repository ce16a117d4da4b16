use serde::Deserialize;
use tracing::info;

use crate::tenancy::{Role, TenantScope, UserId};

use super::domain::{Candidate, CandidateId, CandidateStatus, Placement, PlacementId};
use super::notify::{Notification, Notifier};
use super::service::{require_role, required_text, WorkflowError, WorkflowService};
use super::store::{TenantReader, WorkflowStore};
use super::transitions::{self, SideEffect};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCandidate {
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub recruiter_id: Option<UserId>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementRequest {
    pub employer_id: UserId,
    pub job_title: String,
}

/// Role-permitted subset: recruiters see their assigned candidates, candidates see
/// themselves, employers see candidates placed with them.
pub(crate) fn candidate_visible<R>(reader: &R, scope: &TenantScope, candidate: &Candidate) -> bool
where
    R: TenantReader + ?Sized,
{
    match scope.role() {
        Role::Admin | Role::Trainer | Role::VettingOfficer => true,
        Role::Recruiter => candidate.recruiter_id.as_ref() == Some(scope.user_id()),
        Role::Candidate => candidate.user_id.as_ref() == Some(scope.user_id()),
        Role::Employer => reader.placements().iter().any(|placement| {
            placement.candidate_id == candidate.id && &placement.employer_id == scope.user_id()
        }),
    }
}

pub(crate) fn visible_candidate<R>(
    reader: &R,
    scope: &TenantScope,
    id: &CandidateId,
) -> Result<Candidate, WorkflowError>
where
    R: TenantReader + ?Sized,
{
    reader
        .candidate(id)
        .filter(|candidate| candidate_visible(reader, scope, candidate))
        .ok_or(WorkflowError::NotFound("candidate"))
}

/// The candidate profile linked to the calling user.
pub(crate) fn own_candidate<R>(reader: &R, scope: &TenantScope) -> Result<Candidate, WorkflowError>
where
    R: TenantReader + ?Sized,
{
    reader
        .candidates()
        .into_iter()
        .find(|candidate| candidate.user_id.as_ref() == Some(scope.user_id()))
        .ok_or(WorkflowError::NotFound("candidate"))
}

impl<S, N> WorkflowService<S, N>
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    pub fn register_candidate(
        &self,
        scope: &TenantScope,
        request: NewCandidate,
    ) -> Result<Candidate, WorkflowError> {
        require_role(
            scope,
            &[Role::Admin, Role::Recruiter, Role::Candidate],
            "register candidates",
        )?;
        let full_name = required_text(&request.full_name, "fullName")?;
        let email = required_text(&request.email, "email")?.to_ascii_lowercase();
        if !email.contains('@') {
            return Err(WorkflowError::Validation(
                "email must be a valid address".to_string(),
            ));
        }

        // Candidates may only register themselves; recruiters own who they register.
        let (user_id, recruiter_id) = match scope.role() {
            Role::Candidate => (Some(scope.user_id().clone()), None),
            Role::Recruiter => (request.user_id, Some(scope.user_id().clone())),
            _ => (request.user_id, request.recruiter_id),
        };
        let now = self.now();

        let candidate = self.write(scope, |tx| {
            let existing = tx.candidates();
            if existing.iter().any(|candidate| candidate.email == email) {
                return Err(WorkflowError::Conflict(format!(
                    "a candidate with email {email} is already registered"
                )));
            }
            if let Some(user) = &user_id {
                if existing
                    .iter()
                    .any(|candidate| candidate.user_id.as_ref() == Some(user))
                {
                    return Err(WorkflowError::Conflict(
                        "user already has a candidate profile".to_string(),
                    ));
                }
            }

            let candidate = Candidate {
                id: CandidateId::generate(),
                tenant_id: tx.tenant_id().clone(),
                user_id,
                full_name,
                email,
                phone: request.phone,
                nationality: request.nationality,
                recruiter_id,
                status: CandidateStatus::Registered,
                registered_at: now,
                updated_at: now,
            };
            tx.put_candidate(candidate.clone());
            Ok(candidate)
        })?;

        info!(tenant = %scope.tenant_id(), candidate = %candidate.id, "candidate registered");
        Ok(candidate)
    }

    pub fn assign_recruiter(
        &self,
        scope: &TenantScope,
        id: &CandidateId,
        recruiter_id: UserId,
    ) -> Result<Candidate, WorkflowError> {
        require_role(scope, &[Role::Admin], "assign recruiters")?;
        required_text(&recruiter_id.0, "recruiterId")?;
        let now = self.now();

        self.write(scope, |tx| {
            let mut candidate = tx.candidate(id).ok_or(WorkflowError::NotFound("candidate"))?;
            candidate.recruiter_id = Some(recruiter_id);
            candidate.updated_at = now;
            tx.put_candidate(candidate.clone());
            Ok(candidate)
        })
    }

    pub fn get_candidate(
        &self,
        scope: &TenantScope,
        id: &CandidateId,
    ) -> Result<Candidate, WorkflowError> {
        self.read(scope, |tx| visible_candidate(tx, scope, id))
    }

    pub fn list_candidates(
        &self,
        scope: &TenantScope,
        status: Option<CandidateStatus>,
    ) -> Result<Vec<Candidate>, WorkflowError> {
        self.read(scope, |tx| {
            Ok(tx
                .candidates()
                .into_iter()
                .filter(|candidate| candidate_visible(tx, scope, candidate))
                .filter(|candidate| status.map_or(true, |wanted| candidate.status == wanted))
                .collect())
        })
    }

    /// Assign a cleared candidate to an employer.
    pub fn place_candidate(
        &self,
        scope: &TenantScope,
        id: &CandidateId,
        request: PlacementRequest,
    ) -> Result<Placement, WorkflowError> {
        require_role(scope, &[Role::Admin, Role::Recruiter], "place candidates")?;
        let job_title = required_text(&request.job_title, "jobTitle")?;
        required_text(&request.employer_id.0, "employerId")?;
        let now = self.now();

        let (placement, notifications) = self.write(scope, |tx| {
            let mut candidate = visible_candidate(&*tx, scope, id)?;
            let transition = transitions::place_candidate(candidate.status)?;
            candidate.status = transition.next;
            candidate.updated_at = now;

            let placement = Placement {
                id: PlacementId::generate(),
                tenant_id: tx.tenant_id().clone(),
                candidate_id: candidate.id.clone(),
                employer_id: request.employer_id,
                job_title,
                placed_at: now,
            };

            let notifications: Vec<_> = transition
                .effects
                .iter()
                .filter_map(|effect| match effect {
                    SideEffect::Notify(template) => Some(
                        Notification::new(*template, tx.tenant_id().clone(), candidate.id.clone())
                            .detail("employerId", placement.employer_id.0.clone())
                            .detail("jobTitle", placement.job_title.clone()),
                    ),
                    _ => None,
                })
                .collect();

            tx.put_candidate(candidate);
            tx.put_placement(placement.clone());
            Ok((placement, notifications))
        })?;

        info!(
            tenant = %scope.tenant_id(),
            candidate = %placement.candidate_id,
            employer = %placement.employer_id,
            "candidate placed"
        );
        self.dispatch(notifications)?;
        Ok(placement)
    }
}
