use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::site_router;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use immigratecabo::config::AppConfig;
use immigratecabo::error::AppError;
use immigratecabo::mail::Outbox;
use immigratecabo::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

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

    let outbox = Outbox::from_config(&config.mail)?;
    if outbox.is_none() {
        warn!("mail credentials missing; form submissions will report a configuration error");
    }

    let app = site_router(outbox, &config.mail, &config.site)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        mail_configured = config.mail.is_configured(),
        static_dir = ?config.site.static_dir,
        "immigratecabo site ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
