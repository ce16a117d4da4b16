use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;

use crate::tenancy::{Role, TenantScope};

use super::candidates::{candidate_visible, own_candidate, visible_candidate};
use super::domain::{
    CandidateId, EnrollmentId, EnrollmentStatus, LifecycleStatus, VettingId, VettingRecord,
    VettingStatus,
};
use super::notify::{Notification, Notifier};
use super::service::{
    apply_candidate_milestone, require_role, required_text, WorkflowError, WorkflowService,
};
use super::store::{TenantWriter, WorkflowStore};
use super::transitions::{self, SideEffect, VettingAction};

const REVIEWERS: &[Role] = &[Role::Admin, Role::VettingOfficer];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VettingApplication {
    /// Required for operators; candidates always apply for themselves.
    #[serde(default)]
    pub candidate_id: Option<CandidateId>,
    /// Defaults to the candidate's most recent `ENROLLED` enrollment.
    #[serde(default)]
    pub enrollment_id: Option<EnrollmentId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentRequest {
    #[serde(default)]
    pub documents: Vec<String>,
    #[serde(default)]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VettingDecision {
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

impl<S, N> WorkflowService<S, N>
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    /// Open a vetting record for a candidate holding an `ENROLLED` cohort enrollment.
    pub fn apply_for_vetting(
        &self,
        scope: &TenantScope,
        request: VettingApplication,
    ) -> Result<VettingRecord, WorkflowError> {
        require_role(
            scope,
            &[Role::Admin, Role::Recruiter, Role::Candidate],
            "apply for vetting",
        )?;
        let now = self.now();

        let record = self.write(scope, |tx| {
            let candidate = match (scope.role(), &request.candidate_id) {
                (Role::Candidate, _) => own_candidate(&*tx, scope)?,
                (_, Some(id)) => visible_candidate(&*tx, scope, id)?,
                (_, None) => {
                    return Err(WorkflowError::Validation("candidateId is required".to_string()))
                }
            };

            if tx
                .vetting_records()
                .iter()
                .any(|record| record.candidate_id == candidate.id && record.status.is_active())
            {
                return Err(WorkflowError::Conflict(
                    "candidate already has an active vetting record".to_string(),
                ));
            }

            let mut enrollments: Vec<_> = tx
                .enrollments()
                .into_iter()
                .filter(|enrollment| enrollment.candidate_id == candidate.id)
                .collect();
            let enrollment = match &request.enrollment_id {
                Some(id) => enrollments.into_iter().find(|enrollment| &enrollment.id == id),
                None => {
                    enrollments.sort_by_key(|enrollment| {
                        (enrollment.status == EnrollmentStatus::Enrolled, enrollment.updated_at)
                    });
                    enrollments.pop()
                }
            }
            .ok_or(WorkflowError::NotFound("cohort enrollment"))?;

            let transition = transitions::open_vetting(enrollment.status)?;
            let record = VettingRecord {
                id: VettingId::generate(),
                tenant_id: tx.tenant_id().clone(),
                candidate_id: candidate.id.clone(),
                enrollment_id: enrollment.id,
                status: transition.next,
                documents_requested: Vec::new(),
                reviewer_id: None,
                remarks: None,
                created_at: now,
                decided_at: None,
                updated_at: now,
            };
            for effect in &transition.effects {
                if let SideEffect::AdvanceCandidate(milestone) = effect {
                    apply_candidate_milestone(tx, &candidate.id, *milestone, now)?;
                }
            }
            tx.put_vetting_record(record.clone());
            Ok(record)
        })?;

        info!(
            tenant = %scope.tenant_id(),
            candidate = %record.candidate_id,
            vetting = %record.id,
            "vetting record opened"
        );
        Ok(record)
    }

    pub fn request_documents(
        &self,
        scope: &TenantScope,
        id: &VettingId,
        request: DocumentRequest,
    ) -> Result<VettingRecord, WorkflowError> {
        require_role(scope, REVIEWERS, "request vetting documents")?;
        let documents: Vec<String> = request
            .documents
            .iter()
            .map(|document| document.trim().to_string())
            .filter(|document| !document.is_empty())
            .collect();
        if documents.is_empty() {
            return Err(WorkflowError::Validation(
                "at least one document must be requested".to_string(),
            ));
        }
        let remarks = optional_text(request.remarks);

        self.transition_vetting(scope, id, VettingAction::RequestDocuments, move |record| {
            record.documents_requested = documents;
            if remarks.is_some() {
                record.remarks = remarks;
            }
        })
    }

    pub fn start_review(
        &self,
        scope: &TenantScope,
        id: &VettingId,
    ) -> Result<VettingRecord, WorkflowError> {
        require_role(scope, REVIEWERS, "review vetting records")?;
        self.transition_vetting(scope, id, VettingAction::StartReview, |_| {})
    }

    pub fn clear_vetting(
        &self,
        scope: &TenantScope,
        id: &VettingId,
        decision: VettingDecision,
    ) -> Result<VettingRecord, WorkflowError> {
        require_role(scope, REVIEWERS, "clear vetting records")?;
        let remarks = optional_text(decision.remarks);

        self.transition_vetting(scope, id, VettingAction::Clear, move |record| {
            if remarks.is_some() {
                record.remarks = remarks;
            }
        })
    }

    /// Reject a record under review. A reason is mandatory and becomes the record's remarks.
    pub fn reject_vetting(
        &self,
        scope: &TenantScope,
        id: &VettingId,
        decision: VettingDecision,
    ) -> Result<VettingRecord, WorkflowError> {
        require_role(scope, REVIEWERS, "reject vetting records")?;
        let reason = decision
            .reason
            .as_deref()
            .or(decision.remarks.as_deref())
            .unwrap_or_default();
        let reason = required_text(reason, "reason")?;

        self.transition_vetting(scope, id, VettingAction::Reject, move |record| {
            record.remarks = Some(reason);
        })
    }

    pub fn list_vetting(
        &self,
        scope: &TenantScope,
        status: Option<VettingStatus>,
    ) -> Result<Vec<VettingRecord>, WorkflowError> {
        self.read(scope, |tx| {
            Ok(tx
                .vetting_records()
                .into_iter()
                .filter(|record| status.map_or(true, |wanted| record.status == wanted))
                .filter(|record| {
                    tx.candidate(&record.candidate_id)
                        .is_some_and(|candidate| candidate_visible(tx, scope, &candidate))
                })
                .collect())
        })
    }

    fn transition_vetting<F>(
        &self,
        scope: &TenantScope,
        id: &VettingId,
        action: VettingAction,
        update: F,
    ) -> Result<VettingRecord, WorkflowError>
    where
        F: FnOnce(&mut VettingRecord),
    {
        let now = self.now();

        let (record, notifications) = self.write(scope, |tx| {
            let mut record = tx
                .vetting_record(id)
                .ok_or(WorkflowError::NotFound("vetting record"))?;
            let transition = transitions::vetting(record.status, action)?;

            record.status = transition.next;
            record.reviewer_id = Some(scope.user_id().clone());
            record.updated_at = now;
            update(&mut record);
            let notifications = apply_vetting_effects(tx, &mut record, &transition.effects, now)?;
            tx.put_vetting_record(record.clone());
            Ok((record, notifications))
        })?;

        info!(
            tenant = %scope.tenant_id(),
            vetting = %record.id,
            action = action.label(),
            status = record.status.label(),
            "vetting record updated"
        );
        self.dispatch(notifications)?;
        Ok(record)
    }
}

fn apply_vetting_effects<W>(
    tx: &mut W,
    record: &mut VettingRecord,
    effects: &[SideEffect],
    now: DateTime<Utc>,
) -> Result<Vec<Notification>, WorkflowError>
where
    W: TenantWriter + ?Sized,
{
    let mut notifications = Vec::new();
    for effect in effects {
        match effect {
            SideEffect::StampDecisionDate => record.decided_at = Some(now),
            SideEffect::AdvanceCandidate(milestone) => {
                apply_candidate_milestone(tx, &record.candidate_id, *milestone, now)?
            }
            SideEffect::Notify(template) => {
                let mut notification = Notification::new(
                    *template,
                    record.tenant_id.clone(),
                    record.candidate_id.clone(),
                )
                .detail("vettingId", record.id.0.clone());
                if !record.documents_requested.is_empty() {
                    notification =
                        notification.detail("documents", record.documents_requested.join(", "));
                }
                if let Some(remarks) = &record.remarks {
                    notification = notification.detail("remarks", remarks.clone());
                }
                notifications.push(notification);
            }
            SideEffect::StampApprovalDate | SideEffect::StampCompletionDate => {}
        }
    }
    Ok(notifications)
}
