use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::forms::intake::domain::{DocumentField, SubmittedApplication, UploadedDocument};
use crate::forms::intake::router::INTAKE_PATH;
use crate::forms::intake::service::{IntakeService, IntakeSettings};
use crate::forms::intake::upload::{ApplicationForm, DocumentSet};
use crate::mail::{MailError, MailTransport, OutboundEmail, Outbox};

pub(super) const OFFICE: &str = "office@immigratecabo.com";
pub(super) const BOUNDARY: &str = "----immigratecabo-test-boundary";

/// Mail transport double that records every message it is asked to send.
#[derive(Default)]
pub(super) struct RecordingTransport {
    sent: Mutex<Vec<OutboundEmail>>,
    verify_calls: AtomicUsize,
    reject_credentials: bool,
    fail_send_number: Option<usize>,
}

impl RecordingTransport {
    pub(super) fn rejecting_credentials() -> Self {
        Self {
            reject_credentials: true,
            ..Self::default()
        }
    }

    /// Fail the `n`th send (1-based) after accepting the earlier ones.
    pub(super) fn failing_send(n: usize) -> Self {
        Self {
            fail_send_number: Some(n),
            ..Self::default()
        }
    }

    pub(super) fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().expect("sent mutex poisoned").clone()
    }

    pub(super) fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn verify(&self) -> Result<(), MailError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        if self.reject_credentials {
            return Err(MailError::Verification(
                "535 5.7.8 Username and Password not accepted".to_string(),
            ));
        }
        Ok(())
    }

    async fn send(&self, email: OutboundEmail) -> Result<(), MailError> {
        let mut guard = self.sent.lock().expect("sent mutex poisoned");
        if self.fail_send_number == Some(guard.len() + 1) {
            return Err(MailError::Transport("connection reset by relay".to_string()));
        }
        guard.push(email);
        Ok(())
    }
}

pub(super) fn settings() -> IntakeSettings {
    IntakeSettings {
        fallback_contact: "hello@immigratecabo.com".to_string(),
        attach_documents_to_staff: false,
    }
}

pub(super) fn build_service(
    transport: RecordingTransport,
    settings: IntakeSettings,
) -> (Arc<IntakeService<RecordingTransport>>, Arc<RecordingTransport>) {
    let transport = Arc::new(transport);
    let outbox = Outbox::new(OFFICE, transport.clone());
    let service = Arc::new(IntakeService::new(Some(outbox), settings));
    (service, transport)
}

pub(super) fn unconfigured_service() -> Arc<IntakeService<RecordingTransport>> {
    Arc::new(IntakeService::new(None, settings()))
}

pub(super) fn complete_application() -> SubmittedApplication {
    SubmittedApplication {
        full_name: Some("Ana Ruiz".to_string()),
        email: Some("ana@example.com".to_string()),
        phone: Some("+1 555 0100".to_string()),
        nationality: Some("Canadian".to_string()),
        passport_number: Some("AB123456".to_string()),
        service_type: Some("temporary".to_string()),
        ..SubmittedApplication::default()
    }
}

pub(super) fn spooled_document(
    field: DocumentField,
    filename: &str,
    content_type: &str,
    bytes: &[u8],
) -> UploadedDocument {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(bytes).expect("write temp file");
    UploadedDocument::new(
        field,
        filename.to_string(),
        content_type.to_string(),
        bytes.len() as u64,
        file.into_temp_path(),
    )
}

pub(super) fn form_with(
    application: SubmittedApplication,
    documents: Vec<UploadedDocument>,
) -> ApplicationForm {
    let mut set = DocumentSet::default();
    for document in documents {
        set.push(document);
    }
    ApplicationForm {
        application,
        documents: set,
    }
}

/// Hand-assembled `multipart/form-data` body.
#[derive(Default)]
pub(super) struct MultipartBody {
    bytes: Vec<u8>,
}

impl MultipartBody {
    pub(super) fn text(mut self, name: &str, value: &str) -> Self {
        self.bytes.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub(super) fn file(
        mut self,
        name: &str,
        filename: &str,
        content_type: &str,
        data: &[u8],
    ) -> Self {
        self.bytes.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.bytes.extend_from_slice(data);
        self.bytes.extend_from_slice(b"\r\n");
        self
    }

    pub(super) fn applicant_fields(self) -> Self {
        self.text("fullName", "Ana Ruiz")
            .text("email", "ana@example.com")
            .text("phone", "+1 555 0100")
            .text("nationality", "Canadian")
            .text("passportNumber", "AB123456")
            .text("serviceType", "temporary")
    }

    pub(super) fn into_request(mut self) -> Request<Body> {
        self.bytes
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        Request::post(INTAKE_PATH)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(self.bytes))
            .expect("request builds")
    }
}

pub(super) async fn response_json(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}
