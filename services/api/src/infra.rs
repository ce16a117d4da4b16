use chrono::{DateTime, NaiveDate, Utc};
use labour_mobility::workflows::{Clock, Notification, Notifier, NotifyError};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Notification sink for deployments without an outbound channel configured.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        info!(
            template = notification.template.label(),
            tenant = %notification.tenant_id,
            candidate = %notification.candidate_id,
            details = ?notification.details,
            "candidate notification dispatched"
        );
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(crate) struct RecordingNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        let mut guard = self
            .sent
            .lock()
            .map_err(|_| NotifyError::Transport("notification log poisoned".to_string()))?;
        guard.push(notification);
        Ok(())
    }
}

impl RecordingNotifier {
    pub(crate) fn sent(&self) -> Vec<Notification> {
        match self.sent.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// Clock pinned to a single instant, used to replay the demo on a chosen date.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PinnedClock(pub(crate) DateTime<Utc>);

impl Clock for PinnedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
