use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment as MimeAttachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

use super::{MailError, MailTransport, OutboundEmail, Outbox};
use crate::config::{MailConfig, MailCredentials};

/// SMTP submission client (STARTTLS) authenticated with an app password.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    relay: String,
}

impl SmtpMailer {
    pub fn new(host: &str, port: u16, credentials: &MailCredentials) -> Result<Self, MailError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|err| MailError::Transport(err.to_string()))?
            .port(port)
            .credentials(Credentials::new(
                credentials.account.clone(),
                credentials.app_password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            relay: format!("{host}:{port}"),
        })
    }

    pub fn relay(&self) -> &str {
        &self.relay
    }
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("relay", &self.relay)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn verify(&self) -> Result<(), MailError> {
        match self.transport.test_connection().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(MailError::Verification(format!(
                "{} did not accept the connection",
                self.relay
            ))),
            Err(err) => Err(MailError::Verification(err.to_string())),
        }
    }

    async fn send(&self, email: OutboundEmail) -> Result<(), MailError> {
        let message = build_message(email)?;
        let response = self
            .transport
            .send(message)
            .await
            .map_err(|err| MailError::Transport(err.to_string()))?;
        debug!(code = %response.code(), relay = %self.relay, "message accepted by relay");
        Ok(())
    }
}

impl Outbox<SmtpMailer> {
    /// Build the production outbox, or `None` when credentials are missing.
    pub fn from_config(config: &MailConfig) -> Result<Option<Self>, MailError> {
        let Some(credentials) = config.credentials.as_ref() else {
            return Ok(None);
        };

        let mailer = SmtpMailer::new(&config.relay_host, config.relay_port, credentials)?;
        Ok(Some(Outbox::new(
            credentials.account.clone(),
            Arc::new(mailer),
        )))
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address
        .trim()
        .parse::<Mailbox>()
        .map_err(|err| MailError::InvalidAddress {
            address: address.to_string(),
            reason: err.to_string(),
        })
}

/// Whether `address` can be used as a mailbox header value.
pub fn is_mailbox(address: &str) -> bool {
    parse_mailbox(address).is_ok()
}

/// Convert the pipeline's message model into a MIME message.
pub fn build_message(email: OutboundEmail) -> Result<Message, MailError> {
    let OutboundEmail {
        from,
        to,
        reply_to,
        subject,
        html,
        text,
        attachments,
    } = email;

    let mut builder = Message::builder()
        .from(parse_mailbox(&from)?)
        .to(parse_mailbox(&to)?)
        .subject(subject);
    if let Some(reply_to) = reply_to {
        builder = builder.reply_to(parse_mailbox(&reply_to)?);
    }

    let body = match text {
        Some(text) => MultiPart::alternative_plain_html(text, html),
        None => MultiPart::alternative().singlepart(SinglePart::html(html)),
    };

    let message = if attachments.is_empty() {
        builder.multipart(body)
    } else {
        let mut mixed = MultiPart::mixed().multipart(body);
        for attachment in attachments {
            let content_type = ContentType::parse(&attachment.content_type).map_err(|err| {
                MailError::Build(format!(
                    "{} has unusable content type '{}': {err}",
                    attachment.filename, attachment.content_type
                ))
            })?;
            mixed = mixed.singlepart(
                MimeAttachment::new(attachment.filename).body(attachment.content, content_type),
            );
        }
        builder.multipart(mixed)
    };

    message.map_err(|err| MailError::Build(err.to_string()))
}
