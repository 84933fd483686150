use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use tracing::error;

use super::domain::MAX_TOTAL_UPLOAD_BYTES;
use super::service::{IntakeError, IntakeReceipt, IntakeService};
use super::upload::{read_application_form, UploadError, UploadLimits};
use crate::mail::MailTransport;

pub const INTAKE_PATH: &str = "/api/submit-immigration-form";

/// Headroom over the file budget for text fields and multipart framing.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

const TOO_LARGE_MESSAGE: &str =
    "Files too large. Each file must be under 2MB. Total upload under 8MB.";
const TOO_MANY_FILES_MESSAGE: &str = "Too many files. Upload at most 10 documents.";
const CONFIGURATION_MESSAGE: &str = "Email service configuration error. Please contact support.";
const RETRY_MESSAGE: &str = "Failed to submit application. Please try again.";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IntakeResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    documents_received: Option<usize>,
}

impl IntakeResponse {
    fn accepted(receipt: &IntakeReceipt) -> Self {
        Self {
            success: true,
            message: Some(format!(
                "Application submitted! Check your email at {} for confirmation.",
                receipt.applicant_email
            )),
            error: None,
            documents_received: Some(receipt.documents_received),
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
            documents_received: None,
        }
    }
}

/// Router for the application intake endpoint, open to any origin.
pub fn intake_router<T>(service: Arc<IntakeService<T>>) -> Router
where
    T: MailTransport + 'static,
{
    Router::new()
        .route(
            INTAKE_PATH,
            post(submit_handler::<T>)
                .options(preflight_handler)
                .fallback(method_not_allowed),
        )
        .layer(DefaultBodyLimit::max(
            MAX_TOTAL_UPLOAD_BYTES as usize + FORM_OVERHEAD_BYTES,
        ))
        .with_state(service)
}

fn with_cors(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    response
}

pub(crate) async fn preflight_handler() -> Response {
    with_cors(StatusCode::OK.into_response())
}

pub(crate) async fn method_not_allowed() -> Response {
    let body = Json(serde_json::json!({ "error": "Method not allowed" }));
    with_cors((StatusCode::METHOD_NOT_ALLOWED, body).into_response())
}

pub(crate) async fn submit_handler<T>(
    State(service): State<Arc<IntakeService<T>>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response
where
    T: MailTransport + 'static,
{
    let outcome = match multipart {
        Ok(multipart) => match read_application_form(multipart, UploadLimits::default()).await {
            Ok(form) => service.submit(form, Utc::now()).await,
            Err(err) => Err(IntakeError::Upload(err)),
        },
        Err(rejection) => Err(IntakeError::Upload(UploadError::Malformed(
            rejection.body_text(),
        ))),
    };

    let response = match outcome {
        Ok(receipt) => {
            (StatusCode::OK, Json(IntakeResponse::accepted(&receipt))).into_response()
        }
        Err(err) => {
            error!(error = %err, "application submission failed");
            let (status, message) = failure_response(&err);
            (status, Json(IntakeResponse::failed(message))).into_response()
        }
    };
    with_cors(response)
}

fn failure_response(err: &IntakeError) -> (StatusCode, String) {
    match err {
        IntakeError::Validation(validation) => (StatusCode::BAD_REQUEST, validation.to_string()),
        IntakeError::Upload(UploadError::PayloadTooLarge) => {
            (StatusCode::PAYLOAD_TOO_LARGE, TOO_LARGE_MESSAGE.to_string())
        }
        IntakeError::Upload(UploadError::TooManyFiles { .. }) => (
            StatusCode::PAYLOAD_TOO_LARGE,
            TOO_MANY_FILES_MESSAGE.to_string(),
        ),
        IntakeError::Upload(UploadError::EmptyFile { .. }) => (
            StatusCode::BAD_REQUEST,
            "Uploaded files must not be empty.".to_string(),
        ),
        IntakeError::Upload(UploadError::FieldTypeMismatch { field }) => (
            StatusCode::BAD_REQUEST,
            format!("Invalid value submitted for '{field}'."),
        ),
        IntakeError::MailNotConfigured { fallback_contact } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Email service not configured. Please contact us at {fallback_contact}"),
        ),
        IntakeError::MailVerification(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            CONFIGURATION_MESSAGE.to_string(),
        ),
        IntakeError::Upload(UploadError::Malformed(_) | UploadError::Io(_))
        | IntakeError::Attachment(_)
        | IntakeError::Delivery(_) => (StatusCode::INTERNAL_SERVER_ERROR, RETRY_MESSAGE.to_string()),
    }
}
