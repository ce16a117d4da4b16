use crate::cli::ServeArgs;
use crate::infra::{AppState, TracingNotifier};
use crate::routes::with_workflow_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use labour_mobility::config::AppConfig;
use labour_mobility::error::AppError;
use labour_mobility::telemetry;
use labour_mobility::workflows::{InMemoryWorkflowStore, WorkflowService};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry, config.environment)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let service = Arc::new(WorkflowService::new(
        Arc::new(InMemoryWorkflowStore::new()),
        Arc::new(TracingNotifier),
        config.workflow,
    ));

    let app = with_workflow_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        environment = ?config.environment,
        %addr,
        request_timeout_ms = config.workflow.request_timeout_ms,
        "labour mobility workflow service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
