use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use tracing::info;

use crate::tenancy::{Role, TenantScope};

use super::candidates::candidate_visible;
use super::domain::{
    certificate_number, certificate_sort_key, CandidateId, Certificate, CertificateId,
    CertificateStatus, CertificateTemplate, EnrollmentId, LifecycleStatus, TemplateId,
    TemplateStatus,
};
use super::notify::{Notification, Notifier};
use super::service::{require_role, required_text, WorkflowError, WorkflowService};
use super::store::{TenantReader, WorkflowStore};
use super::transitions::{self, CertificateAction, NotificationTemplate, TemplateAction};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRequest {
    pub enrollment_id: EnrollmentId,
    /// Admin-only escape hatch for enrollments that have not reached `COMPLETED`.
    #[serde(default)]
    pub override_reason: Option<String>,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RevocationRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateFilter {
    #[serde(default)]
    pub status: Option<CertificateStatus>,
    #[serde(default)]
    pub candidate_id: Option<CandidateId>,
    #[serde(default)]
    pub issued_from: Option<NaiveDate>,
    #[serde(default)]
    pub issued_to: Option<NaiveDate>,
}

impl CertificateFilter {
    fn matches(&self, certificate: &Certificate) -> bool {
        let issued_on = certificate.issue_date.date_naive();
        self.status.map_or(true, |status| certificate.status == status)
            && self
                .candidate_id
                .as_ref()
                .map_or(true, |candidate| &certificate.candidate_id == candidate)
            && self.issued_from.map_or(true, |from| issued_on >= from)
            && self.issued_to.map_or(true, |to| issued_on <= to)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTemplate {
    pub name: String,
    #[serde(default)]
    pub content: serde_json::Value,
}

fn active_template<R>(reader: &R) -> Option<CertificateTemplate>
where
    R: TenantReader + ?Sized,
{
    reader
        .templates()
        .into_iter()
        .find(|template| template.status == TemplateStatus::Active)
}

impl<S, N> WorkflowService<S, N>
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    /// Issue the certificate for an enrollment, allocating its number in the same
    /// transaction as the insert.
    pub fn issue_certificate(
        &self,
        scope: &TenantScope,
        request: IssueRequest,
    ) -> Result<Certificate, WorkflowError> {
        require_role(scope, &[Role::Admin, Role::Trainer], "issue certificates")?;
        let override_reason = match request.override_reason.as_deref() {
            Some(reason) => {
                require_role(scope, &[Role::Admin], "override certificate eligibility")?;
                Some(required_text(reason, "overrideReason")?)
            }
            None => None,
        };
        let now = self.now();

        let certificate = self.write(scope, |tx| {
            let enrollment = tx
                .enrollment(&request.enrollment_id)
                .ok_or(WorkflowError::NotFound("cohort enrollment"))?;
            transitions::certification(enrollment.status, override_reason.is_some())?;

            if tx
                .certificates()
                .iter()
                .any(|existing| existing.enrollment_id.as_ref() == Some(&enrollment.id))
            {
                return Err(WorkflowError::Conflict(
                    "a certificate has already been issued for this enrollment".to_string(),
                ));
            }

            let year = now.year();
            let sequence = tx.next_certificate_sequence(year);
            let certificate = Certificate {
                id: CertificateId::generate(),
                tenant_id: tx.tenant_id().clone(),
                certificate_number: certificate_number(year, sequence),
                enrollment_id: Some(enrollment.id),
                candidate_id: enrollment.candidate_id,
                template_id: active_template(&*tx).map(|template| template.id),
                status: CertificateStatus::Issued,
                issue_date: now,
                expiry_date: request.expiry_date,
                grade: request.grade.clone(),
                remarks: override_reason
                    .as_ref()
                    .map(|reason| format!("Issued by operator override: {reason}")),
                reissued_from: None,
                revoked_at: None,
                revocation_reason: None,
            };
            tx.put_certificate(certificate.clone());
            Ok(certificate)
        })?;

        info!(
            tenant = %scope.tenant_id(),
            certificate = %certificate.id,
            number = %certificate.certificate_number,
            "certificate issued"
        );
        self.dispatch(vec![certificate_notification(
            NotificationTemplate::CertificateIssued,
            &certificate,
        )])?;
        Ok(certificate)
    }

    pub fn revoke_certificate(
        &self,
        scope: &TenantScope,
        id: &CertificateId,
        request: RevocationRequest,
    ) -> Result<Certificate, WorkflowError> {
        require_role(scope, &[Role::Admin], "revoke certificates")?;
        let reason = request
            .reason
            .map(|reason| reason.trim().to_string())
            .filter(|reason| !reason.is_empty());
        let now = self.now();

        let (certificate, notifications) = self.write(scope, |tx| {
            let mut certificate = tx
                .certificate(id)
                .ok_or(WorkflowError::NotFound("certificate"))?;
            let transition = transitions::certificate(certificate.status, CertificateAction::Revoke)?;

            certificate.status = transition.next;
            certificate.revoked_at = Some(now);
            certificate.revocation_reason = reason;
            tx.put_certificate(certificate.clone());

            let notifications = notifications_for(&transition.effects, &certificate);
            Ok((certificate, notifications))
        })?;

        info!(tenant = %scope.tenant_id(), certificate = %certificate.id, "certificate revoked");
        self.dispatch(notifications)?;
        Ok(certificate)
    }

    /// Write a fresh `REISSUED` certificate pointing back at `id`. The source row is left as
    /// it was.
    pub fn reissue_certificate(
        &self,
        scope: &TenantScope,
        id: &CertificateId,
    ) -> Result<Certificate, WorkflowError> {
        require_role(scope, &[Role::Admin], "reissue certificates")?;
        let now = self.now();

        let (certificate, notifications) = self.write(scope, |tx| {
            let original = tx
                .certificate(id)
                .ok_or(WorkflowError::NotFound("certificate"))?;
            let transition =
                transitions::certificate(original.status, CertificateAction::Reissue)?;

            let year = now.year();
            let sequence = tx.next_certificate_sequence(year);
            let certificate = Certificate {
                id: CertificateId::generate(),
                tenant_id: tx.tenant_id().clone(),
                certificate_number: certificate_number(year, sequence),
                enrollment_id: None,
                candidate_id: original.candidate_id.clone(),
                template_id: active_template(&*tx)
                    .map(|template| template.id)
                    .or(original.template_id.clone()),
                status: CertificateStatus::Reissued,
                issue_date: now,
                expiry_date: original.expiry_date,
                grade: original.grade.clone(),
                remarks: Some(format!("Reissued from {}", original.certificate_number)),
                reissued_from: Some(original.id.clone()),
                revoked_at: None,
                revocation_reason: None,
            };
            tx.put_certificate(certificate.clone());

            let notifications = notifications_for(&transition.effects, &certificate);
            Ok((certificate, notifications))
        })?;

        info!(
            tenant = %scope.tenant_id(),
            certificate = %certificate.id,
            reissued_from = %id,
            number = %certificate.certificate_number,
            "certificate reissued"
        );
        self.dispatch(notifications)?;
        Ok(certificate)
    }

    pub fn list_certificates(
        &self,
        scope: &TenantScope,
        filter: &CertificateFilter,
    ) -> Result<Vec<Certificate>, WorkflowError> {
        if let (Some(from), Some(to)) = (filter.issued_from, filter.issued_to) {
            if to < from {
                return Err(WorkflowError::Validation(
                    "issuedTo must not be before issuedFrom".to_string(),
                ));
            }
        }

        self.read(scope, |tx| {
            let mut certificates: Vec<_> = tx
                .certificates()
                .into_iter()
                .filter(|certificate| filter.matches(certificate))
                .filter(|certificate| {
                    tx.candidate(&certificate.candidate_id)
                        .is_some_and(|candidate| candidate_visible(tx, scope, &candidate))
                })
                .collect();
            certificates.sort_by(|a, b| {
                certificate_sort_key(&a.certificate_number)
                    .cmp(&certificate_sort_key(&b.certificate_number))
                    .then_with(|| a.issue_date.cmp(&b.issue_date))
                    .then_with(|| a.id.cmp(&b.id))
            });
            Ok(certificates)
        })
    }

    pub fn create_template(
        &self,
        scope: &TenantScope,
        request: NewTemplate,
    ) -> Result<CertificateTemplate, WorkflowError> {
        require_role(scope, &[Role::Admin], "manage certificate templates")?;
        let name = required_text(&request.name, "name")?;
        let content = match request.content {
            serde_json::Value::Null => serde_json::Value::Object(Default::default()),
            content @ serde_json::Value::Object(_) => content,
            _ => {
                return Err(WorkflowError::Validation(
                    "content must be a JSON object".to_string(),
                ))
            }
        };
        let now = self.now();

        let template = self.write(scope, |tx| {
            let template = CertificateTemplate {
                id: TemplateId::generate(),
                tenant_id: tx.tenant_id().clone(),
                name,
                content,
                status: TemplateStatus::Draft,
                created_at: now,
                activated_at: None,
            };
            tx.put_template(template.clone());
            Ok(template)
        })?;

        info!(tenant = %scope.tenant_id(), template = %template.id, "certificate template created");
        Ok(template)
    }

    /// Make `id` the tenant's only `ACTIVE` template.
    pub fn activate_template(
        &self,
        scope: &TenantScope,
        id: &TemplateId,
    ) -> Result<CertificateTemplate, WorkflowError> {
        require_role(scope, &[Role::Admin], "manage certificate templates")?;
        let now = self.now();

        let template = self.write(scope, |tx| {
            let mut template = tx
                .template(id)
                .ok_or(WorkflowError::NotFound("certificate template"))?;
            template.status = transitions::template(template.status, TemplateAction::Activate)?;
            template.activated_at = Some(now);

            if let Some(mut previous) = active_template(&*tx) {
                previous.status =
                    transitions::template(previous.status, TemplateAction::Deactivate)?;
                tx.put_template(previous);
            }
            tx.put_template(template.clone());
            Ok(template)
        })?;

        info!(tenant = %scope.tenant_id(), template = %template.id, "certificate template activated");
        Ok(template)
    }

    pub fn deactivate_template(
        &self,
        scope: &TenantScope,
        id: &TemplateId,
    ) -> Result<CertificateTemplate, WorkflowError> {
        require_role(scope, &[Role::Admin], "manage certificate templates")?;

        let template = self.write(scope, |tx| {
            let mut template = tx
                .template(id)
                .ok_or(WorkflowError::NotFound("certificate template"))?;
            template.status = transitions::template(template.status, TemplateAction::Deactivate)?;
            tx.put_template(template.clone());
            Ok(template)
        })?;

        info!(
            tenant = %scope.tenant_id(),
            template = %template.id,
            status = template.status.label(),
            "certificate template deactivated"
        );
        Ok(template)
    }

    pub fn list_templates(
        &self,
        scope: &TenantScope,
    ) -> Result<Vec<CertificateTemplate>, WorkflowError> {
        require_role(scope, &[Role::Admin, Role::Trainer], "view certificate templates")?;
        self.read(scope, |tx| Ok(tx.templates()))
    }
}

fn certificate_notification(template: NotificationTemplate, certificate: &Certificate) -> Notification {
    Notification::new(
        template,
        certificate.tenant_id.clone(),
        certificate.candidate_id.clone(),
    )
    .detail("certificateId", certificate.id.0.clone())
    .detail("certificateNumber", certificate.certificate_number.clone())
}

fn notifications_for(
    effects: &[transitions::SideEffect],
    certificate: &Certificate,
) -> Vec<Notification> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            transitions::SideEffect::Notify(template) => {
                Some(certificate_notification(*template, certificate))
            }
            _ => None,
        })
        .collect()
}
