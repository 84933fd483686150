//! Public form endpoints of the site.

mod html;
pub mod consultation;
pub mod intake;

use std::sync::Arc;

use axum::Router;

use crate::config::MailConfig;
use crate::mail::{MailTransport, Outbox};
use consultation::{consultation_router, ConsultationService};
use intake::{intake_router, IntakeService, IntakeSettings};

/// Both form endpoints sharing one outbox.
pub fn forms_router<T>(outbox: Option<Outbox<T>>, mail: &MailConfig) -> Router
where
    T: MailTransport + 'static,
{
    let settings = IntakeSettings {
        fallback_contact: mail.fallback_contact.clone(),
        attach_documents_to_staff: mail.attach_documents_to_staff,
    };
    let intake = Arc::new(IntakeService::new(outbox.clone(), settings));
    let consultation = Arc::new(ConsultationService::new(outbox));

    intake_router(intake).merge(consultation_router(consultation))
}
