//! Outbound mail: the message model, the transport capability the form
//! pipelines depend on, and the SMTP relay implementation.

pub mod message;
pub mod smtp;

use std::sync::Arc;

use async_trait::async_trait;

pub use message::{Attachment, OutboundEmail};
pub use smtp::{is_mailbox, SmtpMailer};

/// Minimal capability the form pipelines need from a mail relay.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Confirm the relay is reachable and accepts the configured credentials.
    async fn verify(&self) -> Result<(), MailError>;
    async fn send(&self, email: OutboundEmail) -> Result<(), MailError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("invalid mailbox '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },
    #[error("unable to build message: {0}")]
    Build(String),
    #[error("mail relay verification failed: {0}")]
    Verification(String),
    #[error("mail relay unavailable: {0}")]
    Transport(String),
}

/// A transport paired with the business mailbox it sends from and to.
///
/// Absent entirely when no credentials are configured; handlers treat that
/// as a user-visible configuration error.
pub struct Outbox<T> {
    office: String,
    transport: Arc<T>,
}

impl<T> Clone for Outbox<T> {
    fn clone(&self) -> Self {
        Self {
            office: self.office.clone(),
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T> std::fmt::Debug for Outbox<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Outbox")
            .field("office", &self.office)
            .finish_non_exhaustive()
    }
}

impl<T: MailTransport> Outbox<T> {
    pub fn new(office: impl Into<String>, transport: Arc<T>) -> Self {
        Self {
            office: office.into(),
            transport,
        }
    }

    pub fn office(&self) -> &str {
        &self.office
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}
