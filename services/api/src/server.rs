use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryRecordRepository};
use crate::routes::with_record_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use ficha_social::config::AppConfig;
use ficha_social::error::AppError;
use ficha_social::records::IntakeRecordService;
use ficha_social::telemetry;
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

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let policy = config.records.policy();
    let repository = Arc::new(InMemoryRecordRepository::default());
    let record_service = Arc::new(IntakeRecordService::new(repository, policy));

    let app = with_record_routes(record_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        local_nationality = %config.records.local_nationality,
        max_page_limit = config.records.max_page_limit,
        "intake record service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
