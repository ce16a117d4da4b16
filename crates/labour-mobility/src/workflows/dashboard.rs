//! Read-only aggregates per role.
//!
//! Every figure is computed from a single tenant snapshot, so repeated calls with no writes in
//! between return identical payloads.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::tenancy::{Role, TenantScope};

use super::candidates::{candidate_visible, own_candidate};
use super::domain::{
    Candidate, CandidateId, Certificate, CertificateStatus, CohortEnrollment,
    CohortId, CohortStatus, EnrollmentId, EnrollmentStatus, LifecycleStatus, Placement,
    VettingStatus,
};
use super::notify::Notifier;
use super::service::{require_role, WorkflowError, WorkflowService};
use super::store::WorkflowStore;

const RECENT_PLACEMENTS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: &'static str,
    pub count: usize,
}

/// Count `statuses` against the full closed set so absent statuses report zero.
fn count_by<S, I>(statuses: I) -> Vec<StatusCount>
where
    S: LifecycleStatus,
    I: IntoIterator<Item = S>,
{
    let seen: Vec<S> = statuses.into_iter().collect();
    S::ALL
        .iter()
        .map(|status| StatusCount {
            status: status.label(),
            count: seen.iter().filter(|candidate| *candidate == status).count(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminDashboard {
    pub window_days: u32,
    pub candidates_by_status: Vec<StatusCount>,
    pub cohorts_by_status: Vec<StatusCount>,
    pub pending_applications: usize,
    pub vetting_by_status: Vec<StatusCount>,
    pub certificates_issued_in_window: usize,
    pub hires_in_window: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecruiterDashboard {
    pub window_days: u32,
    pub total_candidates: usize,
    pub pipeline_by_status: Vec<StatusCount>,
    pub active_vetting: usize,
    pub hires_in_window: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployerDashboard {
    pub window_days: u32,
    pub hires_in_window: usize,
    pub total_hires: usize,
    pub recent_placements: Vec<Placement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateDashboard {
    pub candidate: Candidate,
    pub enrollments: Vec<CohortEnrollment>,
    pub active_vetting: Option<VettingStatus>,
    pub certificates: Vec<Certificate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
    pub planned_sessions: u32,
    pub average_attended: f64,
    /// Average attended over planned sessions, `0.0` when nothing is planned.
    pub attendance_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentSummary {
    pub assessed: usize,
    pub passed: usize,
    pub average_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortProgress {
    pub cohort_id: CohortId,
    pub status: CohortStatus,
    pub max_capacity: u32,
    pub attendance: AttendanceSummary,
    pub assessment: AssessmentSummary,
    pub enrollments_by_status: Vec<StatusCount>,
    pub vetting_by_status: Vec<StatusCount>,
    pub placements: usize,
    pub certificates_issued: usize,
}

fn mean(values: &[u32]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let total: u64 = values.iter().map(|value| u64::from(*value)).sum();
    Some(total as f64 / values.len() as f64)
}

impl<S, N> WorkflowService<S, N>
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    fn window_start(&self) -> DateTime<Utc> {
        self.now() - self.config().dashboard_window()
    }

    pub fn admin_dashboard(&self, scope: &TenantScope) -> Result<AdminDashboard, WorkflowError> {
        require_role(scope, &[Role::Admin], "view the admin dashboard")?;
        let since = self.window_start();
        let window_days = self.config().dashboard_window_days;

        self.read(scope, |tx| {
            let enrollments = tx.enrollments();
            Ok(AdminDashboard {
                window_days,
                candidates_by_status: count_by(tx.candidates().iter().map(|c| c.status)),
                cohorts_by_status: count_by(tx.cohorts().iter().map(|c| c.status)),
                pending_applications: enrollments
                    .iter()
                    .filter(|enrollment| enrollment.status == EnrollmentStatus::Applied)
                    .count(),
                vetting_by_status: count_by(tx.vetting_records().iter().map(|v| v.status)),
                certificates_issued_in_window: tx
                    .certificates()
                    .iter()
                    .filter(|certificate| certificate.issue_date >= since)
                    .count(),
                hires_in_window: tx
                    .placements()
                    .iter()
                    .filter(|placement| placement.placed_at >= since)
                    .count(),
            })
        })
    }

    /// Pipeline of the candidates assigned to the calling recruiter.
    pub fn recruiter_dashboard(
        &self,
        scope: &TenantScope,
    ) -> Result<RecruiterDashboard, WorkflowError> {
        require_role(scope, &[Role::Recruiter], "view the recruiter dashboard")?;
        let since = self.window_start();
        let window_days = self.config().dashboard_window_days;

        self.read(scope, |tx| {
            let candidates: Vec<_> = tx
                .candidates()
                .into_iter()
                .filter(|candidate| candidate_visible(tx, scope, candidate))
                .collect();
            let ids: BTreeSet<&CandidateId> = candidates.iter().map(|c| &c.id).collect();

            Ok(RecruiterDashboard {
                window_days,
                total_candidates: candidates.len(),
                pipeline_by_status: count_by(candidates.iter().map(|c| c.status)),
                active_vetting: tx
                    .vetting_records()
                    .iter()
                    .filter(|record| ids.contains(&record.candidate_id) && record.status.is_active())
                    .count(),
                hires_in_window: tx
                    .placements()
                    .iter()
                    .filter(|placement| {
                        ids.contains(&placement.candidate_id) && placement.placed_at >= since
                    })
                    .count(),
            })
        })
    }

    pub fn employer_dashboard(
        &self,
        scope: &TenantScope,
    ) -> Result<EmployerDashboard, WorkflowError> {
        require_role(scope, &[Role::Employer], "view the employer dashboard")?;
        let since = self.window_start();
        let window_days = self.config().dashboard_window_days;

        self.read(scope, |tx| {
            let mut placements: Vec<_> = tx
                .placements()
                .into_iter()
                .filter(|placement| &placement.employer_id == scope.user_id())
                .collect();
            placements.sort_by(|a, b| b.placed_at.cmp(&a.placed_at).then_with(|| a.id.cmp(&b.id)));

            Ok(EmployerDashboard {
                window_days,
                hires_in_window: placements
                    .iter()
                    .filter(|placement| placement.placed_at >= since)
                    .count(),
                total_hires: placements.len(),
                recent_placements: placements.into_iter().take(RECENT_PLACEMENTS).collect(),
            })
        })
    }

    pub fn candidate_dashboard(
        &self,
        scope: &TenantScope,
    ) -> Result<CandidateDashboard, WorkflowError> {
        require_role(scope, &[Role::Candidate], "view the candidate dashboard")?;

        self.read(scope, |tx| {
            let candidate = own_candidate(tx, scope)?;
            let enrollments = tx
                .enrollments()
                .into_iter()
                .filter(|enrollment| enrollment.candidate_id == candidate.id)
                .collect();
            let active_vetting = tx
                .vetting_records()
                .into_iter()
                .find(|record| record.candidate_id == candidate.id && record.status.is_active())
                .map(|record| record.status);
            let certificates = tx
                .certificates()
                .into_iter()
                .filter(|certificate| certificate.candidate_id == candidate.id)
                .collect();

            Ok(CandidateDashboard {
                candidate,
                enrollments,
                active_vetting,
                certificates,
            })
        })
    }

    /// Attendance, assessment and downstream outcomes for one cohort.
    pub fn cohort_progress(
        &self,
        scope: &TenantScope,
        id: &CohortId,
    ) -> Result<CohortProgress, WorkflowError> {
        require_role(
            scope,
            &[Role::Admin, Role::Trainer, Role::VettingOfficer],
            "view cohort progress",
        )?;

        self.read(scope, |tx| {
            let cohort = tx.cohort(id).ok_or(WorkflowError::NotFound("cohort"))?;
            let enrollments: Vec<_> = tx
                .enrollments()
                .into_iter()
                .filter(|enrollment| enrollment.cohort_id == cohort.id)
                .collect();
            let seated: Vec<_> = enrollments
                .iter()
                .filter(|enrollment| enrollment.status.occupies_seat())
                .collect();
            let enrollment_ids: BTreeSet<&EnrollmentId> =
                enrollments.iter().map(|enrollment| &enrollment.id).collect();
            let seated_candidates: BTreeSet<&CandidateId> =
                seated.iter().map(|enrollment| &enrollment.candidate_id).collect();

            let attended: Vec<u32> = seated.iter().map(|e| e.sessions_attended).collect();
            let average_attended = mean(&attended).unwrap_or(0.0);
            let attendance_rate = if cohort.planned_sessions == 0 {
                0.0
            } else {
                average_attended / f64::from(cohort.planned_sessions)
            };

            let scores: Vec<u32> = seated
                .iter()
                .filter_map(|enrollment| enrollment.assessment)
                .map(|result| u32::from(result.score))
                .collect();
            let passed = seated
                .iter()
                .filter_map(|enrollment| enrollment.assessment)
                .filter(|result| result.passed)
                .count();

            Ok(CohortProgress {
                cohort_id: cohort.id.clone(),
                status: cohort.status,
                max_capacity: cohort.max_capacity,
                attendance: AttendanceSummary {
                    planned_sessions: cohort.planned_sessions,
                    average_attended,
                    attendance_rate,
                },
                assessment: AssessmentSummary {
                    assessed: scores.len(),
                    passed,
                    average_score: mean(&scores),
                },
                enrollments_by_status: count_by(enrollments.iter().map(|e| e.status)),
                vetting_by_status: count_by(
                    tx.vetting_records()
                        .iter()
                        .filter(|record| enrollment_ids.contains(&record.enrollment_id))
                        .map(|record| record.status),
                ),
                placements: tx
                    .placements()
                    .iter()
                    .filter(|placement| seated_candidates.contains(&placement.candidate_id))
                    .count(),
                certificates_issued: tx
                    .certificates()
                    .iter()
                    .filter(|certificate| {
                        certificate.status != CertificateStatus::Revoked
                            && certificate
                                .enrollment_id
                                .as_ref()
                                .is_some_and(|enrollment| enrollment_ids.contains(enrollment))
                    })
                    .count(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::domain::CandidateStatus;

    #[test]
    fn count_by_reports_every_status() {
        let counts = count_by([CandidateStatus::Enrolled, CandidateStatus::Enrolled]);
        assert_eq!(counts.len(), CandidateStatus::ALL.len());
        assert_eq!(
            counts[1],
            StatusCount {
                status: "ENROLLED",
                count: 2
            }
        );
        assert!(counts
            .iter()
            .filter(|entry| entry.status != "ENROLLED")
            .all(|entry| entry.count == 0));
    }

    #[test]
    fn mean_of_nothing_is_none() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[2, 3]), Some(2.5));
    }
}
