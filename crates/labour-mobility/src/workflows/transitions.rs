//! Pure status transition validators.
//!
//! Each function maps `(current status, requested action)` to the next status plus the side
//! effects a handler must apply. Nothing here touches storage, so an `Err` always means the
//! entity is left exactly as it was.

use serde::Serialize;

use super::domain::{
    CandidateStatus, CertificateStatus, CohortStatus, EnrollmentStatus, LifecycleStatus,
    TemplateStatus, VettingStatus,
};

/// Rejected transition, carrying enough context for a stable error message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot {action} {entity} in status {current}")]
pub struct InvalidTransition {
    pub entity: &'static str,
    pub current: &'static str,
    pub action: &'static str,
}

impl InvalidTransition {
    fn new<S: LifecycleStatus>(entity: &'static str, current: S, action: &'static str) -> Self {
        Self {
            entity,
            current: current.label(),
            action,
        }
    }
}

/// Accepted transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition<S> {
    pub next: S,
    pub effects: Vec<SideEffect>,
}

impl<S> Transition<S> {
    fn to(next: S) -> Self {
        Self {
            next,
            effects: Vec::new(),
        }
    }

    fn with(mut self, effect: SideEffect) -> Self {
        self.effects.push(effect);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideEffect {
    StampApprovalDate,
    StampCompletionDate,
    StampDecisionDate,
    AdvanceCandidate(CandidateMilestone),
    Notify(NotificationTemplate),
}

/// Workflow events that move a candidate along their own lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateMilestone {
    EnrollmentApproved,
    VettingOpened,
    VettingCleared,
    VettingRejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationTemplate {
    ApplicationApproved,
    ApplicationRejected,
    VettingDocumentsRequested,
    VettingCleared,
    VettingRejected,
    CertificateIssued,
    CertificateRevoked,
    CertificateReissued,
    CandidatePlaced,
}

impl NotificationTemplate {
    pub const fn label(self) -> &'static str {
        match self {
            Self::ApplicationApproved => "cohort_application_approved",
            Self::ApplicationRejected => "cohort_application_rejected",
            Self::VettingDocumentsRequested => "vetting_documents_requested",
            Self::VettingCleared => "vetting_cleared",
            Self::VettingRejected => "vetting_rejected",
            Self::CertificateIssued => "certificate_issued",
            Self::CertificateRevoked => "certificate_revoked",
            Self::CertificateReissued => "certificate_reissued",
            Self::CandidatePlaced => "candidate_placed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CohortAction {
    Publish,
    OpenEnrollment,
    CloseEnrollment,
    StartTraining,
    StartAssessment,
    StartVetting,
    Complete,
    Archive,
}

impl CohortAction {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Publish => "publish",
            Self::OpenEnrollment => "open enrollment for",
            Self::CloseEnrollment => "close enrollment for",
            Self::StartTraining => "start training for",
            Self::StartAssessment => "start assessment for",
            Self::StartVetting => "start vetting for",
            Self::Complete => "complete",
            Self::Archive => "archive",
        }
    }
}

/// Forward-only cohort lifecycle. Assessment and vetting may follow each other once
/// training has started; completion requires one of them to be under way.
pub fn cohort(
    current: CohortStatus,
    action: CohortAction,
) -> Result<CohortStatus, InvalidTransition> {
    use CohortAction as A;
    use CohortStatus as S;

    match (current, action) {
        (S::Draft, A::Publish) => Ok(S::Published),
        (S::Published, A::OpenEnrollment) => Ok(S::EnrollmentOpen),
        (S::EnrollmentOpen, A::CloseEnrollment) => Ok(S::EnrollmentClosed),
        (S::EnrollmentClosed, A::StartTraining) => Ok(S::InTraining),
        (S::InTraining | S::VettingInProgress, A::StartAssessment) => Ok(S::AssessmentInProgress),
        (S::InTraining | S::AssessmentInProgress, A::StartVetting) => Ok(S::VettingInProgress),
        (S::AssessmentInProgress | S::VettingInProgress, A::Complete) => Ok(S::Completed),
        (S::Completed, A::Archive) => Ok(S::Archived),
        (current, action) => Err(InvalidTransition::new("cohort", current, action.label())),
    }
}

/// New enrollments are only admitted while the cohort is open for enrollment.
pub fn admission(current: CohortStatus) -> Result<(), InvalidTransition> {
    match current {
        CohortStatus::EnrollmentOpen => Ok(()),
        other => Err(InvalidTransition::new("cohort", other, "enroll into")),
    }
}

/// Pending applications can still be approved until training is under way; once the cohort
/// moves to assessment the intake is settled.
pub fn approval(current: CohortStatus) -> Result<(), InvalidTransition> {
    match current {
        CohortStatus::EnrollmentOpen | CohortStatus::EnrollmentClosed | CohortStatus::InTraining => {
            Ok(())
        }
        other => Err(InvalidTransition::new(
            "cohort",
            other,
            "approve applications for",
        )),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentAction {
    Approve,
    Reject,
    Withdraw,
    Complete,
    RecordProgress,
}

impl EnrollmentAction {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Withdraw => "withdraw",
            Self::Complete => "complete",
            Self::RecordProgress => "record progress for",
        }
    }
}

pub fn enrollment(
    current: EnrollmentStatus,
    action: EnrollmentAction,
) -> Result<Transition<EnrollmentStatus>, InvalidTransition> {
    use EnrollmentAction as A;
    use EnrollmentStatus as S;

    match (current, action) {
        (S::Applied, A::Approve) => Ok(Transition::to(S::Enrolled)
            .with(SideEffect::StampApprovalDate)
            .with(SideEffect::AdvanceCandidate(
                CandidateMilestone::EnrollmentApproved,
            ))
            .with(SideEffect::Notify(NotificationTemplate::ApplicationApproved))),
        (S::Applied, A::Reject) => Ok(Transition::to(S::Rejected)
            .with(SideEffect::Notify(NotificationTemplate::ApplicationRejected))),
        (S::Applied | S::Enrolled, A::Withdraw) => Ok(Transition::to(S::Withdrawn)),
        (S::Enrolled, A::Complete) => {
            Ok(Transition::to(S::Completed).with(SideEffect::StampCompletionDate))
        }
        (S::Enrolled, A::RecordProgress) => Ok(Transition::to(S::Enrolled)),
        (current, action) => Err(InvalidTransition::new(
            "cohort enrollment",
            current,
            action.label(),
        )),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VettingAction {
    RequestDocuments,
    StartReview,
    Clear,
    Reject,
}

impl VettingAction {
    pub const fn label(self) -> &'static str {
        match self {
            Self::RequestDocuments => "request documents for",
            Self::StartReview => "start review of",
            Self::Clear => "clear",
            Self::Reject => "reject",
        }
    }
}

pub fn vetting(
    current: VettingStatus,
    action: VettingAction,
) -> Result<Transition<VettingStatus>, InvalidTransition> {
    use VettingAction as A;
    use VettingStatus as S;

    match (current, action) {
        (S::Pending | S::InProgress, A::RequestDocuments) => Ok(Transition::to(
            S::PendingDocuments,
        )
        .with(SideEffect::Notify(
            NotificationTemplate::VettingDocumentsRequested,
        ))),
        (S::PendingDocuments, A::StartReview) => Ok(Transition::to(S::InProgress)),
        (S::InProgress, A::Clear) => Ok(Transition::to(S::Cleared)
            .with(SideEffect::StampDecisionDate)
            .with(SideEffect::AdvanceCandidate(CandidateMilestone::VettingCleared))
            .with(SideEffect::Notify(NotificationTemplate::VettingCleared))),
        (S::InProgress, A::Reject) => Ok(Transition::to(S::Rejected)
            .with(SideEffect::StampDecisionDate)
            .with(SideEffect::AdvanceCandidate(
                CandidateMilestone::VettingRejected,
            ))
            .with(SideEffect::Notify(NotificationTemplate::VettingRejected))),
        (current, action) => Err(InvalidTransition::new(
            "vetting record",
            current,
            action.label(),
        )),
    }
}

/// A vetting record is opened against an `ENROLLED` enrollment and starts `PENDING`.
pub fn open_vetting(
    enrollment: EnrollmentStatus,
) -> Result<Transition<VettingStatus>, InvalidTransition> {
    match enrollment {
        EnrollmentStatus::Enrolled => Ok(Transition::to(VettingStatus::Pending).with(
            SideEffect::AdvanceCandidate(CandidateMilestone::VettingOpened),
        )),
        other => Err(InvalidTransition::new(
            "cohort enrollment",
            other,
            "open vetting for",
        )),
    }
}

/// Certificates need a completed enrollment unless an operator overrides it for an
/// enrollment that is still in training.
pub fn certification(
    enrollment: EnrollmentStatus,
    overridden: bool,
) -> Result<(), InvalidTransition> {
    match (enrollment, overridden) {
        (EnrollmentStatus::Completed, _) | (EnrollmentStatus::Enrolled, true) => Ok(()),
        (other, _) => Err(InvalidTransition::new(
            "cohort enrollment",
            other,
            "issue a certificate for",
        )),
    }
}

/// Milestones only ever move a candidate along the happy path; anything else leaves the
/// status where it is.
pub fn advance_candidate(
    current: CandidateStatus,
    milestone: CandidateMilestone,
) -> CandidateStatus {
    use CandidateMilestone as M;
    use CandidateStatus as S;

    match (current, milestone) {
        (S::Registered, M::EnrollmentApproved) => S::Enrolled,
        (S::Enrolled, M::VettingOpened) => S::Vetting,
        (S::Vetting, M::VettingCleared) => S::Cleared,
        (S::Vetting, M::VettingRejected) => S::Enrolled,
        (current, _) => current,
    }
}

pub fn place_candidate(
    current: CandidateStatus,
) -> Result<Transition<CandidateStatus>, InvalidTransition> {
    match current {
        CandidateStatus::Cleared => Ok(Transition::to(CandidateStatus::Placed)
            .with(SideEffect::Notify(NotificationTemplate::CandidatePlaced))),
        other => Err(InvalidTransition::new("candidate", other, "place")),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateAction {
    Revoke,
    Reissue,
}

/// `Revoke` moves the certificate itself; `Reissue` leaves the source untouched and the
/// handler writes a new `REISSUED` row.
pub fn certificate(
    current: CertificateStatus,
    action: CertificateAction,
) -> Result<Transition<CertificateStatus>, InvalidTransition> {
    use CertificateAction as A;
    use CertificateStatus as S;

    match (current, action) {
        (S::Issued, A::Revoke) => Ok(Transition::to(S::Revoked)
            .with(SideEffect::Notify(NotificationTemplate::CertificateRevoked))),
        (S::Issued | S::Reissued, A::Reissue) => Ok(Transition::to(current)
            .with(SideEffect::Notify(NotificationTemplate::CertificateReissued))),
        (current, A::Revoke) => Err(InvalidTransition::new("certificate", current, "revoke")),
        (current, A::Reissue) => Err(InvalidTransition::new("certificate", current, "reissue")),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateAction {
    Activate,
    Deactivate,
}

pub fn template(
    current: TemplateStatus,
    action: TemplateAction,
) -> Result<TemplateStatus, InvalidTransition> {
    use TemplateAction as A;
    use TemplateStatus as S;

    match (current, action) {
        (S::Draft | S::Inactive, A::Activate) => Ok(S::Active),
        (S::Active, A::Deactivate) => Ok(S::Inactive),
        (current, A::Activate) => Err(InvalidTransition::new(
            "certificate template",
            current,
            "activate",
        )),
        (current, A::Deactivate) => Err(InvalidTransition::new(
            "certificate template",
            current,
            "deactivate",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COHORT_ACTIONS: [CohortAction; 8] = [
        CohortAction::Publish,
        CohortAction::OpenEnrollment,
        CohortAction::CloseEnrollment,
        CohortAction::StartTraining,
        CohortAction::StartAssessment,
        CohortAction::StartVetting,
        CohortAction::Complete,
        CohortAction::Archive,
    ];

    #[test]
    fn cohort_happy_path_walks_every_stage() {
        let mut status = CohortStatus::Draft;
        for action in [
            CohortAction::Publish,
            CohortAction::OpenEnrollment,
            CohortAction::CloseEnrollment,
            CohortAction::StartTraining,
            CohortAction::StartAssessment,
            CohortAction::StartVetting,
            CohortAction::Complete,
            CohortAction::Archive,
        ] {
            status = cohort(status, action).expect("forward transition allowed");
        }
        assert_eq!(status, CohortStatus::Archived);
    }

    #[test]
    fn cohort_never_skips_a_stage() {
        assert!(cohort(CohortStatus::Draft, CohortAction::OpenEnrollment).is_err());
        assert!(cohort(CohortStatus::Published, CohortAction::CloseEnrollment).is_err());
        assert!(cohort(CohortStatus::InTraining, CohortAction::Complete).is_err());
        assert!(cohort(CohortStatus::EnrollmentOpen, CohortAction::Archive).is_err());
    }

    #[test]
    fn cohort_statuses_expose_expected_exits() {
        for status in CohortStatus::ALL {
            let allowed: Vec<_> = COHORT_ACTIONS
                .iter()
                .filter(|action| cohort(*status, **action).is_ok())
                .collect();
            match status {
                CohortStatus::InTraining => assert_eq!(allowed.len(), 2),
                CohortStatus::AssessmentInProgress | CohortStatus::VettingInProgress => {
                    assert_eq!(allowed.len(), 2)
                }
                CohortStatus::Archived => assert!(allowed.is_empty()),
                _ => assert_eq!(allowed.len(), 1, "{status:?}"),
            }
        }
    }

    #[test]
    fn reopening_closed_enrollment_is_rejected_with_context() {
        let err = cohort(CohortStatus::EnrollmentClosed, CohortAction::OpenEnrollment)
            .expect_err("cannot reopen");
        assert_eq!(err.current, "ENROLLMENT_CLOSED");
        assert_eq!(
            err.to_string(),
            "cannot open enrollment for cohort in status ENROLLMENT_CLOSED"
        );
    }

    #[test]
    fn approval_stamps_date_and_notifies() {
        let transition = enrollment(EnrollmentStatus::Applied, EnrollmentAction::Approve)
            .expect("applied can be approved");
        assert_eq!(transition.next, EnrollmentStatus::Enrolled);
        assert!(transition.effects.contains(&SideEffect::StampApprovalDate));
        assert!(transition.effects.contains(&SideEffect::Notify(
            NotificationTemplate::ApplicationApproved
        )));
    }

    #[test]
    fn approvals_stop_once_training_is_over() {
        let open: Vec<_> = CohortStatus::ALL
            .iter()
            .copied()
            .filter(|status| approval(*status).is_ok())
            .collect();
        assert_eq!(
            open,
            [
                CohortStatus::EnrollmentOpen,
                CohortStatus::EnrollmentClosed,
                CohortStatus::InTraining
            ]
        );
        let err = approval(CohortStatus::Completed).expect_err("intake settled");
        assert_eq!(
            err.to_string(),
            "cannot approve applications for cohort in status COMPLETED"
        );
    }

    #[test]
    fn only_applied_enrollments_can_be_decided() {
        for status in EnrollmentStatus::ALL {
            if *status == EnrollmentStatus::Applied {
                continue;
            }
            assert!(enrollment(*status, EnrollmentAction::Approve).is_err());
            assert!(enrollment(*status, EnrollmentAction::Reject).is_err());
        }
    }

    #[test]
    fn vetting_documents_loop_then_decision() {
        let mut status = VettingStatus::Pending;
        for action in [
            VettingAction::RequestDocuments,
            VettingAction::StartReview,
            VettingAction::RequestDocuments,
            VettingAction::StartReview,
            VettingAction::Clear,
        ] {
            status = vetting(status, action).expect("allowed").next;
        }
        assert_eq!(status, VettingStatus::Cleared);
    }

    #[test]
    fn vetting_terminal_states_accept_nothing() {
        for terminal in [VettingStatus::Cleared, VettingStatus::Rejected] {
            for action in [
                VettingAction::RequestDocuments,
                VettingAction::StartReview,
                VettingAction::Clear,
                VettingAction::Reject,
            ] {
                assert!(vetting(terminal, action).is_err());
            }
        }
        assert!(vetting(VettingStatus::Pending, VettingAction::Clear).is_err());
    }

    #[test]
    fn vetting_opens_only_for_enrolled_candidates() {
        let opened = open_vetting(EnrollmentStatus::Enrolled).expect("enrolled may open vetting");
        assert_eq!(opened.next, VettingStatus::Pending);
        assert_eq!(
            opened.effects,
            vec![SideEffect::AdvanceCandidate(CandidateMilestone::VettingOpened)]
        );
        assert!(open_vetting(EnrollmentStatus::Applied).is_err());
        assert!(open_vetting(EnrollmentStatus::Withdrawn).is_err());
    }

    #[test]
    fn certification_requires_completion_or_override() {
        assert!(certification(EnrollmentStatus::Completed, false).is_ok());
        assert!(certification(EnrollmentStatus::Enrolled, false).is_err());
        assert!(certification(EnrollmentStatus::Enrolled, true).is_ok());
        let err = certification(EnrollmentStatus::Rejected, true).expect_err("rejected");
        assert_eq!(
            err.to_string(),
            "cannot issue a certificate for cohort enrollment in status REJECTED"
        );
    }

    #[test]
    fn candidate_milestones_only_move_forward_from_expected_status() {
        assert_eq!(
            advance_candidate(CandidateStatus::Registered, CandidateMilestone::EnrollmentApproved),
            CandidateStatus::Enrolled
        );
        assert_eq!(
            advance_candidate(CandidateStatus::Placed, CandidateMilestone::EnrollmentApproved),
            CandidateStatus::Placed
        );
        assert_eq!(
            advance_candidate(CandidateStatus::Vetting, CandidateMilestone::VettingRejected),
            CandidateStatus::Enrolled
        );
        assert!(place_candidate(CandidateStatus::Vetting).is_err());
    }

    #[test]
    fn revoked_certificates_cannot_be_reissued_or_revoked_again() {
        assert!(certificate(CertificateStatus::Revoked, CertificateAction::Reissue).is_err());
        assert!(certificate(CertificateStatus::Revoked, CertificateAction::Revoke).is_err());
        assert!(certificate(CertificateStatus::Reissued, CertificateAction::Revoke).is_err());
        let reissue = certificate(CertificateStatus::Issued, CertificateAction::Reissue)
            .expect("issued certificates can be reissued");
        assert_eq!(reissue.next, CertificateStatus::Issued);
    }

    #[test]
    fn template_activation_cycle() {
        let active = template(TemplateStatus::Draft, TemplateAction::Activate).expect("activate");
        let inactive = template(active, TemplateAction::Deactivate).expect("deactivate");
        assert_eq!(
            template(inactive, TemplateAction::Activate),
            Ok(TemplateStatus::Active)
        );
        assert!(template(TemplateStatus::Draft, TemplateAction::Deactivate).is_err());
    }
}
