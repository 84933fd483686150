use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use immigratecabo::config::MailConfig;
use immigratecabo::forms::consultation::CONSULTATION_PATH;
use immigratecabo::forms::forms_router;
use immigratecabo::forms::intake::INTAKE_PATH;
use immigratecabo::mail::{MailError, MailTransport, OutboundEmail, Outbox};
use serde_json::Value;
use tower::ServiceExt;

#[derive(Default)]
struct Mailbag {
    delivered: Mutex<Vec<OutboundEmail>>,
}

#[async_trait]
impl MailTransport for Mailbag {
    async fn verify(&self) -> Result<(), MailError> {
        Ok(())
    }

    async fn send(&self, email: OutboundEmail) -> Result<(), MailError> {
        self.delivered.lock().expect("mailbag poisoned").push(email);
        Ok(())
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn consultation_and_intake_share_the_office_outbox() {
    let mailbag = Arc::new(Mailbag::default());
    let outbox = Outbox::new("office@immigratecabo.com", mailbag.clone());
    let router = forms_router(Some(outbox), &MailConfig::default());

    let consultation = router
        .clone()
        .oneshot(
            Request::post(CONSULTATION_PATH)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"name":"Marta","email":"marta@example.com","phone":"555"}"#,
                ))
                .expect("request builds"),
        )
        .await
        .expect("router responds");
    assert_eq!(consultation.status(), StatusCode::OK);

    let preflight = router
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri(INTAKE_PATH)
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");
    assert_eq!(preflight.status(), StatusCode::OK);
    assert_eq!(
        preflight.headers()[header::ACCESS_CONTROL_ALLOW_METHODS],
        "POST, OPTIONS"
    );

    let delivered = mailbag.delivered.lock().expect("mailbag poisoned").clone();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].subject, "New Consultation Request - Marta");
    assert_eq!(delivered[0].reply_to.as_deref(), Some("marta@example.com"));
    assert!(delivered[0]
        .text
        .as_deref()
        .is_some_and(|text| text.contains("Preferred Date: Not specified")));
}

#[tokio::test]
async fn unconfigured_mail_reports_fallback_contact() {
    let mail = MailConfig {
        fallback_contact: "desk@immigratecabo.com".to_string(),
        ..MailConfig::default()
    };
    let router = forms_router::<Mailbag>(None, &mail);

    let boundary = "form-boundary";
    let mut body = String::new();
    for (name, value) in [
        ("fullName", "Marta Diaz"),
        ("email", "marta@example.com"),
        ("serviceType", "permanent"),
    ] {
        body.push_str(&format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    body.push_str(&format!("--{boundary}--\r\n"));

    let response = router
        .oneshot(
            Request::post(INTAKE_PATH)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .expect("request builds"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
    let payload = body_json(response).await;
    assert_eq!(payload["success"], false);
    assert_eq!(
        payload["error"],
        "Email service not configured. Please contact us at desk@immigratecabo.com"
    );
}
