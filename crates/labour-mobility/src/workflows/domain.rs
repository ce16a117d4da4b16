use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::tenancy::{TenantId, UserId};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub(crate) fn generate() -> Self {
                Self(next_id($prefix))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

static ENTITY_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_id(prefix: &str) -> String {
    let id = ENTITY_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{id:06}")
}

entity_id!(CandidateId, "cand");
entity_id!(CourseId, "crs");
entity_id!(CohortId, "coh");
entity_id!(
    /// Identifies a cohort enrollment; cohort applications share the same id space.
    EnrollmentId,
    "enr"
);
entity_id!(VettingId, "vet");
entity_id!(CertificateId, "cert");
entity_id!(TemplateId, "tpl");
entity_id!(PlacementId, "plc");

/// Closed status set shared by the aggregation helpers.
pub trait LifecycleStatus: Copy + Eq + 'static {
    const ALL: &'static [Self];

    fn label(self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CandidateStatus {
    Registered,
    Enrolled,
    Vetting,
    Cleared,
    Placed,
}

impl LifecycleStatus for CandidateStatus {
    const ALL: &'static [Self] = &[
        Self::Registered,
        Self::Enrolled,
        Self::Vetting,
        Self::Cleared,
        Self::Placed,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::Registered => "REGISTERED",
            Self::Enrolled => "ENROLLED",
            Self::Vetting => "VETTING",
            Self::Cleared => "CLEARED",
            Self::Placed => "PLACED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CohortStatus {
    Draft,
    Published,
    EnrollmentOpen,
    EnrollmentClosed,
    InTraining,
    AssessmentInProgress,
    VettingInProgress,
    Completed,
    Archived,
}

impl LifecycleStatus for CohortStatus {
    const ALL: &'static [Self] = &[
        Self::Draft,
        Self::Published,
        Self::EnrollmentOpen,
        Self::EnrollmentClosed,
        Self::InTraining,
        Self::AssessmentInProgress,
        Self::VettingInProgress,
        Self::Completed,
        Self::Archived,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Published => "PUBLISHED",
            Self::EnrollmentOpen => "ENROLLMENT_OPEN",
            Self::EnrollmentClosed => "ENROLLMENT_CLOSED",
            Self::InTraining => "IN_TRAINING",
            Self::AssessmentInProgress => "ASSESSMENT_IN_PROGRESS",
            Self::VettingInProgress => "VETTING_IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Archived => "ARCHIVED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrollmentStatus {
    Applied,
    #[serde(alias = "APPROVED")]
    Enrolled,
    Rejected,
    Withdrawn,
    Completed,
}

impl EnrollmentStatus {
    /// Counts toward the one-per-(candidate, cohort) rule.
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Rejected | Self::Withdrawn)
    }

    /// Holds one of the cohort's `max_capacity` seats.
    pub const fn occupies_seat(self) -> bool {
        matches!(self, Self::Enrolled | Self::Completed)
    }
}

impl LifecycleStatus for EnrollmentStatus {
    const ALL: &'static [Self] = &[
        Self::Applied,
        Self::Enrolled,
        Self::Rejected,
        Self::Withdrawn,
        Self::Completed,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::Applied => "APPLIED",
            Self::Enrolled => "ENROLLED",
            Self::Rejected => "REJECTED",
            Self::Withdrawn => "WITHDRAWN",
            Self::Completed => "COMPLETED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VettingStatus {
    Pending,
    PendingDocuments,
    InProgress,
    Cleared,
    Rejected,
}

impl VettingStatus {
    pub const fn is_active(self) -> bool {
        matches!(
            self,
            Self::Pending | Self::PendingDocuments | Self::InProgress
        )
    }
}

impl LifecycleStatus for VettingStatus {
    const ALL: &'static [Self] = &[
        Self::Pending,
        Self::PendingDocuments,
        Self::InProgress,
        Self::Cleared,
        Self::Rejected,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::PendingDocuments => "PENDING_DOCUMENTS",
            Self::InProgress => "IN_PROGRESS",
            Self::Cleared => "CLEARED",
            Self::Rejected => "REJECTED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CertificateStatus {
    Issued,
    Revoked,
    Reissued,
}

impl LifecycleStatus for CertificateStatus {
    const ALL: &'static [Self] = &[Self::Issued, Self::Revoked, Self::Reissued];

    fn label(self) -> &'static str {
        match self {
            Self::Issued => "ISSUED",
            Self::Revoked => "REVOKED",
            Self::Reissued => "REISSUED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TemplateStatus {
    Draft,
    Active,
    Inactive,
}

impl LifecycleStatus for TemplateStatus {
    const ALL: &'static [Self] = &[Self::Draft, Self::Active, Self::Inactive];

    fn label(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: CandidateId,
    pub tenant_id: TenantId,
    pub user_id: Option<UserId>,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub nationality: Option<String>,
    pub recruiter_id: Option<UserId>,
    pub status: CandidateStatus,
    pub registered_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: CourseId,
    pub tenant_id: TenantId,
    pub code: String,
    pub title: String,
    pub duration_weeks: Option<u16>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cohort {
    pub id: CohortId,
    pub tenant_id: TenantId,
    pub course_id: CourseId,
    pub name: String,
    pub max_capacity: u32,
    pub planned_sessions: u32,
    pub starts_on: Option<NaiveDate>,
    pub ends_on: Option<NaiveDate>,
    pub status: CohortStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Trainer-recorded assessment outcome for one enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResult {
    pub score: u8,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortEnrollment {
    pub id: EnrollmentId,
    pub tenant_id: TenantId,
    pub cohort_id: CohortId,
    pub candidate_id: CandidateId,
    #[serde(rename = "enrollmentStatus")]
    pub status: EnrollmentStatus,
    pub application_date: DateTime<Utc>,
    pub approval_date: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub completion_date: Option<DateTime<Utc>>,
    pub sessions_attended: u32,
    pub assessment: Option<AssessmentResult>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VettingRecord {
    pub id: VettingId,
    pub tenant_id: TenantId,
    pub candidate_id: CandidateId,
    pub enrollment_id: EnrollmentId,
    #[serde(rename = "vettingStatus")]
    pub status: VettingStatus,
    pub documents_requested: Vec<String>,
    pub reviewer_id: Option<UserId>,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub id: CertificateId,
    pub tenant_id: TenantId,
    pub certificate_number: String,
    /// `None` for reissued certificates, which are detached from the original enrollment.
    pub enrollment_id: Option<EnrollmentId>,
    pub candidate_id: CandidateId,
    pub template_id: Option<TemplateId>,
    pub status: CertificateStatus,
    pub issue_date: DateTime<Utc>,
    pub expiry_date: Option<NaiveDate>,
    pub grade: Option<String>,
    pub remarks: Option<String>,
    pub reissued_from: Option<CertificateId>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub revocation_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateTemplate {
    pub id: TemplateId,
    pub tenant_id: TenantId,
    pub name: String,
    pub content: serde_json::Value,
    pub status: TemplateStatus,
    pub created_at: DateTime<Utc>,
    pub activated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub id: PlacementId,
    pub tenant_id: TenantId,
    pub candidate_id: CandidateId,
    pub employer_id: UserId,
    pub job_title: String,
    pub placed_at: DateTime<Utc>,
}

/// Format a certificate number from an allocated per-tenant, per-year sequence.
pub fn certificate_number(year: i32, sequence: u32) -> String {
    format!("CERT-{year}-{sequence:04}")
}

/// Numeric `(year, sequence)` ordering key for a certificate number. `None` for numbers
/// not in the `CERT-<year>-<sequence>` shape, which then sort first.
pub(crate) fn certificate_sort_key(number: &str) -> Option<(i32, u32)> {
    let (year, sequence) = number.strip_prefix("CERT-")?.split_once('-')?;
    Some((year.parse().ok()?, sequence.parse().ok()?))
}
