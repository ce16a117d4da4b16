use std::collections::BTreeMap;

use serde::Serialize;

use crate::tenancy::TenantId;

use super::domain::CandidateId;
use super::transitions::NotificationTemplate;

/// Outbound candidate notification hook (e-mail, SMS or messaging adapters).
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError>;
}

/// Payload handed to the notifier after a transition commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub template: NotificationTemplate,
    pub tenant_id: TenantId,
    pub candidate_id: CandidateId,
    pub details: BTreeMap<String, String>,
}

impl Notification {
    pub fn new(
        template: NotificationTemplate,
        tenant_id: TenantId,
        candidate_id: CandidateId,
    ) -> Self {
        Self {
            template,
            tenant_id,
            candidate_id,
            details: BTreeMap::new(),
        }
    }

    pub fn detail(mut self, key: &str, value: impl Into<String>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
