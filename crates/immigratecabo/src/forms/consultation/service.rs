use tracing::{error, info};

use super::domain::ConsultationRequest;
use super::templates::consultation_notice;
use crate::mail::{MailError, MailTransport, Outbox};

/// Forwards consultation requests to the business mailbox.
pub struct ConsultationService<T> {
    outbox: Option<Outbox<T>>,
}

impl<T> ConsultationService<T>
where
    T: MailTransport + 'static,
{
    pub fn new(outbox: Option<Outbox<T>>) -> Self {
        Self { outbox }
    }

    pub async fn request(&self, request: ConsultationRequest) -> Result<(), ConsultationError> {
        let Some(outbox) = self.outbox.as_ref() else {
            error!("consultation request received but mail credentials are not configured");
            return Err(ConsultationError::MailNotConfigured);
        };

        outbox
            .transport()
            .send(consultation_notice(outbox.office(), &request))
            .await?;

        info!(
            preferred_date = %request.formatted_preferred_date(),
            "consultation request forwarded"
        );
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConsultationError {
    #[error("malformed consultation request: {0}")]
    Malformed(String),
    #[error("mail credentials are not configured")]
    MailNotConfigured,
    #[error("mail delivery failed: {0}")]
    Delivery(#[from] MailError),
}
