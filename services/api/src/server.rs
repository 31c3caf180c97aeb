use crate::cli::ServeArgs;
use crate::infra::{ApiState, AppState, InMemoryQuestionRepository};
use crate::routes::with_assessment_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use grc_assess::config::AppConfig;
use grc_assess::error::AppError;
use grc_assess::telemetry;
use grc_assess::workflows::scoring::CampaignEvaluator;
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

    let api_state = Arc::new(ApiState {
        repository: Arc::new(InMemoryQuestionRepository::default()),
        import: config.import,
        evaluator: CampaignEvaluator::from_config(&config.scoring),
    });

    let app = with_assessment_routes(api_state)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        max_upload_bytes = config.import.max_upload_bytes,
        pass_threshold = config.scoring.pass_threshold,
        "assessment engine ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
