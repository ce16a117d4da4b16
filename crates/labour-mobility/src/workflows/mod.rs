//! Cohort, vetting and certification workflows for labour-mobility programmes.
//!
//! Every operation takes a [`TenantScope`](crate::tenancy::TenantScope) and runs against the
//! injected [`WorkflowStore`]; status changes are validated by the pure functions in
//! [`transitions`] before anything is written.

pub mod candidates;
pub mod certificates;
pub mod cohorts;
pub mod dashboard;
pub mod domain;
pub mod enrollment;
pub mod notify;
pub mod router;
pub mod service;
pub mod store;
pub mod transitions;
pub mod vetting;

#[cfg(test)]
mod tests;

pub use candidates::{NewCandidate, PlacementRequest};
pub use certificates::{CertificateFilter, IssueRequest, NewTemplate, RevocationRequest};
pub use cohorts::{NewCohort, NewCourse};
pub use dashboard::{
    AdminDashboard, CandidateDashboard, CohortProgress, EmployerDashboard, RecruiterDashboard,
    StatusCount,
};
pub use domain::{
    Candidate, CandidateId, CandidateStatus, Certificate, CertificateId, CertificateStatus,
    CertificateTemplate, Cohort, CohortEnrollment, CohortId, CohortStatus, Course, CourseId,
    EnrollmentId, EnrollmentStatus, LifecycleStatus, Placement, TemplateId, TemplateStatus,
    VettingId, VettingRecord, VettingStatus,
};
pub use enrollment::{
    AssessmentUpdate, AttendanceUpdate, EnrollRequest, EnrollmentFilter, RejectionRequest,
};
pub use notify::{Notification, Notifier, NotifyError};
pub use router::{workflow_router, ApiResponse};
pub use service::{Clock, SystemClock, WorkflowError, WorkflowService};
pub use store::{InMemoryWorkflowStore, StoreError, TenantReader, TenantWriter, WorkflowStore};
pub use vetting::{DocumentRequest, VettingApplication, VettingDecision};
