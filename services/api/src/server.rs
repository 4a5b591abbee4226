use crate::cli::ServeArgs;
use crate::infra::{AppState, DemoFixture, InMemoryTracker};
use crate::routes::with_assignment_routes;
use assignee_ai::config::AppConfig;
use assignee_ai::error::AppError;
use assignee_ai::telemetry;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
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
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let fixture = match args.fixture.take() {
        Some(path) => DemoFixture::from_path(&path)?,
        None => DemoFixture::sample()?,
    };
    info!(
        issues = fixture.issues.len(),
        profiles = fixture.profiles.len(),
        projects = fixture.rosters.len(),
        "seeding in-memory tracker"
    );
    let tracker = InMemoryTracker::new(fixture, Vec::new(), config.assignment.clone());

    let app = with_assignment_routes(tracker.service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        enabled_criteria = config.assignment.default_criteria.enabled_count(),
        "assignment recommendation service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
