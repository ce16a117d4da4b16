use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::config::WorkflowConfig;
use crate::tenancy::{Role, TenantScope};

use super::domain::{CandidateId, CohortId};
use super::notify::{Notification, NotifyError, Notifier};
use super::store::{StoreError, TenantReader, TenantWriter, WorkflowStore};
use super::transitions::{advance_candidate, CandidateMilestone, InvalidTransition};

/// Source of "now" for date stamps and recency windows.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Service composing the injected store and notifier. Operations are grouped by workflow in
/// sibling modules (`cohorts`, `enrollment`, `vetting`, `certificates`, `candidates`,
/// `dashboard`).
pub struct WorkflowService<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
    clock: Arc<dyn Clock>,
    config: WorkflowConfig,
}

impl<S, N> WorkflowService<S, N>
where
    S: WorkflowStore + 'static,
    N: Notifier + 'static,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>, config: WorkflowConfig) -> Self {
        Self {
            store,
            notifier,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Run `work` against the caller's tenant as one all-or-nothing transaction.
    pub(crate) fn write<T, F>(&self, scope: &TenantScope, work: F) -> Result<T, WorkflowError>
    where
        F: FnOnce(&mut dyn TenantWriter) -> Result<T, WorkflowError>,
    {
        self.store.write(scope, work)
    }

    pub(crate) fn read<T, F>(&self, scope: &TenantScope, work: F) -> Result<T, WorkflowError>
    where
        F: FnOnce(&dyn TenantReader) -> Result<T, WorkflowError>,
    {
        self.store.read(scope, work)
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Deliver notifications for a committed transition. Failures surface to the caller;
    /// the committed state is not rolled back.
    pub(crate) fn dispatch(&self, notifications: Vec<Notification>) -> Result<(), WorkflowError> {
        for notification in notifications {
            let template = notification.template.label();
            if let Err(err) = self.notifier.notify(notification) {
                warn!(template, error = %err, "notification delivery failed");
                return Err(err.into());
            }
        }
        Ok(())
    }
}

/// Fail with `Forbidden` unless the caller holds one of `allowed`.
pub(crate) fn require_role(
    scope: &TenantScope,
    allowed: &[Role],
    action: &'static str,
) -> Result<(), WorkflowError> {
    if allowed.contains(&scope.role()) {
        Ok(())
    } else {
        Err(WorkflowError::Forbidden {
            role: scope.role().label(),
            action,
        })
    }
}

/// Trim a free-text field, failing with `Validation` when nothing is left.
pub(crate) fn required_text(value: &str, field: &str) -> Result<String, WorkflowError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(WorkflowError::Validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn apply_candidate_milestone<W>(
    tx: &mut W,
    candidate_id: &CandidateId,
    milestone: CandidateMilestone,
    now: DateTime<Utc>,
) -> Result<(), WorkflowError>
where
    W: TenantWriter + ?Sized,
{
    let mut candidate = tx
        .candidate(candidate_id)
        .ok_or(WorkflowError::NotFound("candidate"))?;
    let next = advance_candidate(candidate.status, milestone);
    if next != candidate.status {
        candidate.status = next;
        candidate.updated_at = now;
        tx.put_candidate(candidate);
    }
    Ok(())
}

/// Error raised by workflow operations.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// Absent or outside the caller's tenant/role subset; the two are indistinguishable.
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    InvalidState(#[from] InvalidTransition),
    #[error("{0}")]
    Validation(String),
    #[error("cohort {cohort} is at capacity ({capacity} seats)")]
    CapacityExceeded { cohort: CohortId, capacity: u32 },
    #[error("{0}")]
    Conflict(String),
    #[error("role {role} may not {action}")]
    Forbidden {
        role: &'static str,
        action: &'static str,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Notify(#[from] NotifyError),
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),
    #[error("internal error: {0}")]
    Internal(String),
}

impl WorkflowError {
    /// Stable machine-readable error name used in API responses.
    pub const fn code(&self) -> &'static str {
        match self {
            WorkflowError::NotFound(_) => "NotFoundError",
            WorkflowError::InvalidState(_) => "InvalidStateError",
            WorkflowError::Validation(_) => "ValidationError",
            WorkflowError::CapacityExceeded { .. } => "CapacityExceededError",
            WorkflowError::Conflict(_) => "ConflictError",
            WorkflowError::Forbidden { .. } => "ForbiddenError",
            WorkflowError::Store(_) | WorkflowError::Notify(_) => "UnavailableError",
            WorkflowError::Timeout(_) => "TimeoutError",
            WorkflowError::Internal(_) => "InternalError",
        }
    }

    /// Whether the failure is the caller's (4xx) rather than the platform's (5xx).
    pub const fn is_client_error(&self) -> bool {
        !matches!(
            self,
            WorkflowError::Store(_)
                | WorkflowError::Notify(_)
                | WorkflowError::Timeout(_)
                | WorkflowError::Internal(_)
        )
    }
}
