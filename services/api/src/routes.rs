use crate::infra::{AppState, SiteAssets};
use axum::http::{header, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use immigratecabo::config::{MailConfig, SiteConfig};
use immigratecabo::forms::forms_router;
use immigratecabo::mail::{MailTransport, Outbox};
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::debug;

/// Form endpoints, operational probes and, when configured, the static site.
pub(crate) fn site_router<T>(
    outbox: Option<Outbox<T>>,
    mail: &MailConfig,
    site: &SiteConfig,
) -> Router
where
    T: MailTransport + 'static,
{
    let router = forms_router(outbox, mail)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint));

    match site.static_dir.as_ref() {
        Some(dir) => router
            .fallback(static_asset)
            .layer(Extension(Arc::new(SiteAssets::new(dir.clone())))),
        None => router,
    }
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn static_asset(
    Extension(assets): Extension<Arc<SiteAssets>>,
    method: Method,
    uri: Uri,
) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return StatusCode::NOT_FOUND.into_response();
    }
    let Some(path) = assets.resolve(uri.path()) else {
        debug!(path = %uri.path(), "rejected static path");
        return StatusCode::NOT_FOUND.into_response();
    };

    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            ([(header::CONTENT_TYPE, mime.to_string())], bytes).into_response()
        }
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}
