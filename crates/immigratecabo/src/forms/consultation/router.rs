use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use tracing::error;

use super::domain::ConsultationRequest;
use super::service::{ConsultationError, ConsultationService};
use crate::mail::MailTransport;

pub const CONSULTATION_PATH: &str = "/api/consultation";

#[derive(Debug, Serialize)]
struct ConsultationResponse {
    success: bool,
    message: &'static str,
}

pub fn consultation_router<T>(service: Arc<ConsultationService<T>>) -> Router
where
    T: MailTransport + 'static,
{
    Router::new()
        .route(CONSULTATION_PATH, post(consultation_handler::<T>))
        .with_state(service)
}

async fn consultation_handler<T>(
    State(service): State<Arc<ConsultationService<T>>>,
    payload: Result<Json<ConsultationRequest>, JsonRejection>,
) -> Response
where
    T: MailTransport + 'static,
{
    let outcome = match payload {
        Ok(Json(request)) => service.request(request).await,
        Err(rejection) => Err(ConsultationError::Malformed(rejection.body_text())),
    };

    match outcome {
        Ok(()) => (
            StatusCode::OK,
            Json(ConsultationResponse {
                success: true,
                message: "Consultation request sent successfully",
            }),
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "consultation request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ConsultationResponse {
                    success: false,
                    message: "Failed to send consultation request",
                }),
            )
                .into_response()
        }
    }
}
