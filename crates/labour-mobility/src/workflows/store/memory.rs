use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use crate::tenancy::{TenantId, TenantScope};
use crate::workflows::domain::{
    Candidate, CandidateId, Certificate, CertificateId, CertificateTemplate, Cohort, CohortEnrollment,
    CohortId, Course, CourseId, EnrollmentId, Placement, PlacementId, TemplateId, VettingId,
    VettingRecord,
};

use super::{StoreError, TenantReader, TenantWriter, WorkflowStore};

/// Process-local store. A write holds the lock for the whole closure and commits a copy of
/// the tenant's tables only when the closure succeeds, which gives serializable,
/// all-or-nothing transactions.
#[derive(Default, Clone)]
pub struct InMemoryWorkflowStore {
    tenants: Arc<Mutex<HashMap<TenantId, TenantTables>>>,
}

impl InMemoryWorkflowStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WorkflowStore for InMemoryWorkflowStore {
    fn read<T, E, F>(&self, scope: &TenantScope, work: F) -> Result<T, E>
    where
        F: FnOnce(&dyn TenantReader) -> Result<T, E>,
        E: From<StoreError>,
    {
        let guard = self
            .tenants
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))?;

        match guard.get(scope.tenant_id()) {
            Some(tables) => work(tables),
            None => work(&TenantTables::empty(scope.tenant_id().clone())),
        }
    }

    fn write<T, E, F>(&self, scope: &TenantScope, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn TenantWriter) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut guard = self
            .tenants
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))?;

        let mut staged = guard
            .get(scope.tenant_id())
            .cloned()
            .unwrap_or_else(|| TenantTables::empty(scope.tenant_id().clone()));

        let output = work(&mut staged)?;
        guard.insert(scope.tenant_id().clone(), staged);
        Ok(output)
    }
}

#[derive(Debug, Clone)]
struct TenantTables {
    tenant_id: TenantId,
    candidates: BTreeMap<CandidateId, Candidate>,
    courses: BTreeMap<CourseId, Course>,
    cohorts: BTreeMap<CohortId, Cohort>,
    enrollments: BTreeMap<EnrollmentId, CohortEnrollment>,
    vetting: BTreeMap<VettingId, VettingRecord>,
    certificates: BTreeMap<CertificateId, Certificate>,
    templates: BTreeMap<TemplateId, CertificateTemplate>,
    placements: BTreeMap<PlacementId, Placement>,
    certificate_sequences: BTreeMap<i32, u32>,
}

impl TenantTables {
    fn empty(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            candidates: BTreeMap::new(),
            courses: BTreeMap::new(),
            cohorts: BTreeMap::new(),
            enrollments: BTreeMap::new(),
            vetting: BTreeMap::new(),
            certificates: BTreeMap::new(),
            templates: BTreeMap::new(),
            placements: BTreeMap::new(),
            certificate_sequences: BTreeMap::new(),
        }
    }
}

impl TenantReader for TenantTables {
    fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    fn candidate(&self, id: &CandidateId) -> Option<Candidate> {
        self.candidates.get(id).cloned()
    }

    fn candidates(&self) -> Vec<Candidate> {
        self.candidates.values().cloned().collect()
    }

    fn course(&self, id: &CourseId) -> Option<Course> {
        self.courses.get(id).cloned()
    }

    fn courses(&self) -> Vec<Course> {
        self.courses.values().cloned().collect()
    }

    fn cohort(&self, id: &CohortId) -> Option<Cohort> {
        self.cohorts.get(id).cloned()
    }

    fn cohorts(&self) -> Vec<Cohort> {
        self.cohorts.values().cloned().collect()
    }

    fn enrollment(&self, id: &EnrollmentId) -> Option<CohortEnrollment> {
        self.enrollments.get(id).cloned()
    }

    fn enrollments(&self) -> Vec<CohortEnrollment> {
        self.enrollments.values().cloned().collect()
    }

    fn vetting_record(&self, id: &VettingId) -> Option<VettingRecord> {
        self.vetting.get(id).cloned()
    }

    fn vetting_records(&self) -> Vec<VettingRecord> {
        self.vetting.values().cloned().collect()
    }

    fn certificate(&self, id: &CertificateId) -> Option<Certificate> {
        self.certificates.get(id).cloned()
    }

    fn certificates(&self) -> Vec<Certificate> {
        self.certificates.values().cloned().collect()
    }

    fn template(&self, id: &TemplateId) -> Option<CertificateTemplate> {
        self.templates.get(id).cloned()
    }

    fn templates(&self) -> Vec<CertificateTemplate> {
        self.templates.values().cloned().collect()
    }

    fn placements(&self) -> Vec<Placement> {
        self.placements.values().cloned().collect()
    }
}

impl TenantWriter for TenantTables {
    fn put_candidate(&mut self, candidate: Candidate) {
        self.candidates.insert(candidate.id.clone(), candidate);
    }

    fn put_course(&mut self, course: Course) {
        self.courses.insert(course.id.clone(), course);
    }

    fn put_cohort(&mut self, cohort: Cohort) {
        self.cohorts.insert(cohort.id.clone(), cohort);
    }

    fn put_enrollment(&mut self, enrollment: CohortEnrollment) {
        self.enrollments.insert(enrollment.id.clone(), enrollment);
    }

    fn put_vetting_record(&mut self, record: VettingRecord) {
        self.vetting.insert(record.id.clone(), record);
    }

    fn put_certificate(&mut self, certificate: Certificate) {
        self.certificates.insert(certificate.id.clone(), certificate);
    }

    fn put_template(&mut self, template: CertificateTemplate) {
        self.templates.insert(template.id.clone(), template);
    }

    fn put_placement(&mut self, placement: Placement) {
        self.placements.insert(placement.id.clone(), placement);
    }

    fn next_certificate_sequence(&mut self, year: i32) -> u32 {
        let counter = self.certificate_sequences.entry(year).or_insert(0);
        *counter += 1;
        *counter
    }
}
