//! Persistence boundary for workflow entities.
//!
//! Callers never query a global table: they ask the store for a tenant view through a
//! [`TenantScope`] and work inside it. Writes run as a single transaction per request; an
//! `Err` from the closure discards every change made inside it.

mod memory;

pub use memory::InMemoryWorkflowStore;

use crate::tenancy::{TenantId, TenantScope};

use super::domain::{
    Candidate, CandidateId, Certificate, CertificateId, CertificateTemplate, Cohort, CohortEnrollment,
    CohortId, Course, CourseId, EnrollmentId, Placement, TemplateId, VettingId, VettingRecord,
};

/// Read access to one tenant's entities.
pub trait TenantReader {
    fn tenant_id(&self) -> &TenantId;

    fn candidate(&self, id: &CandidateId) -> Option<Candidate>;
    fn candidates(&self) -> Vec<Candidate>;

    fn course(&self, id: &CourseId) -> Option<Course>;
    fn courses(&self) -> Vec<Course>;

    fn cohort(&self, id: &CohortId) -> Option<Cohort>;
    fn cohorts(&self) -> Vec<Cohort>;

    fn enrollment(&self, id: &EnrollmentId) -> Option<CohortEnrollment>;
    fn enrollments(&self) -> Vec<CohortEnrollment>;

    fn vetting_record(&self, id: &VettingId) -> Option<VettingRecord>;
    fn vetting_records(&self) -> Vec<VettingRecord>;

    fn certificate(&self, id: &CertificateId) -> Option<Certificate>;
    fn certificates(&self) -> Vec<Certificate>;

    fn template(&self, id: &TemplateId) -> Option<CertificateTemplate>;
    fn templates(&self) -> Vec<CertificateTemplate>;

    fn placements(&self) -> Vec<Placement>;
}

/// Transactional write access to one tenant's entities.
pub trait TenantWriter: TenantReader {
    fn put_candidate(&mut self, candidate: Candidate);
    fn put_course(&mut self, course: Course);
    fn put_cohort(&mut self, cohort: Cohort);
    fn put_enrollment(&mut self, enrollment: CohortEnrollment);
    fn put_vetting_record(&mut self, record: VettingRecord);
    fn put_certificate(&mut self, certificate: Certificate);
    fn put_template(&mut self, template: CertificateTemplate);
    fn put_placement(&mut self, placement: Placement);

    /// Allocate the next certificate sequence for `year`. Allocation is part of the enclosing
    /// transaction, so two concurrent issuances can never observe the same value.
    fn next_certificate_sequence(&mut self, year: i32) -> u32;
}

/// Handle to the backing store, injected into the workflow service.
pub trait WorkflowStore: Send + Sync {
    fn read<T, E, F>(&self, scope: &TenantScope, work: F) -> Result<T, E>
    where
        F: FnOnce(&dyn TenantReader) -> Result<T, E>,
        E: From<StoreError>;

    fn write<T, E, F>(&self, scope: &TenantScope, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn TenantWriter) -> Result<T, E>,
        E: From<StoreError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
