use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use super::domain::{attachment_name, format_size_kb, DocumentSummary, ValidationError};
use super::templates::{applicant_confirmation, format_submission_timestamp, staff_notification};
use super::upload::{ApplicationForm, DocumentSet, UploadError};
use crate::mail::{Attachment, MailError, MailTransport, Outbox};

/// Behaviour switches for the intake pipeline.
#[derive(Debug, Clone)]
pub struct IntakeSettings {
    /// Address quoted to users when mail is not configured.
    pub fallback_contact: String,
    /// Send the collected files to staff instead of describing them only.
    pub attach_documents_to_staff: bool,
}

/// Result of a delivered application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeReceipt {
    pub applicant_email: String,
    pub documents_received: usize,
}

/// Validates an application, verifies the relay and emails applicant and staff.
pub struct IntakeService<T> {
    outbox: Option<Outbox<T>>,
    settings: IntakeSettings,
}

impl<T> IntakeService<T>
where
    T: MailTransport + 'static,
{
    pub fn new(outbox: Option<Outbox<T>>, settings: IntakeSettings) -> Self {
        Self { outbox, settings }
    }

    /// Run one submission through validation and delivery.
    ///
    /// Temporary document copies are removed on every path; a removal
    /// failure is logged and otherwise ignored. Delivery is at most once:
    /// if the staff message fails after the applicant message went out,
    /// nothing is retried or recalled.
    pub async fn submit(
        &self,
        form: ApplicationForm,
        submitted_at: DateTime<Utc>,
    ) -> Result<IntakeReceipt, IntakeError> {
        let ApplicationForm {
            application,
            documents,
        } = form;

        let applicant = application.applicant()?;

        let Some(outbox) = self.outbox.as_ref() else {
            error!("application received but mail credentials are not configured");
            return Err(IntakeError::MailNotConfigured {
                fallback_contact: self.settings.fallback_contact.clone(),
            });
        };

        if let Err(err) = outbox.transport().verify().await {
            error!(error = %err, "mail transport verification failed");
            return Err(IntakeError::MailVerification(err));
        }

        let (attachments, summaries) = collect_attachments(documents).await?;
        let submitted = format_submission_timestamp(submitted_at);

        let confirmation =
            applicant_confirmation(outbox.office(), &applicant, &summaries, &submitted);
        outbox
            .transport()
            .send(confirmation)
            .await
            .map_err(IntakeError::Delivery)?;

        let mut notice = staff_notification(
            outbox.office(),
            &applicant,
            &application,
            &summaries,
            &submitted,
        );
        if self.settings.attach_documents_to_staff {
            notice = notice.with_attachments(attachments);
        }
        outbox
            .transport()
            .send(notice)
            .await
            .map_err(IntakeError::Delivery)?;

        info!(
            service = applicant.service.label(),
            documents = summaries.len(),
            "application emails sent"
        );
        debug!(applicant = %applicant.email, "confirmation delivered");

        Ok(IntakeReceipt {
            applicant_email: applicant.email,
            documents_received: summaries.len(),
        })
    }
}

/// Read every spooled document into memory, name it, and drop its temporary copy.
async fn collect_attachments(
    documents: DocumentSet,
) -> Result<(Vec<Attachment>, Vec<DocumentSummary>), IntakeError> {
    let mut attachments = Vec::with_capacity(documents.len());
    let mut summaries = Vec::with_capacity(documents.len());

    for (field, group) in documents.into_groups() {
        let files_in_field = group.len();
        for (index, document) in group.into_iter().enumerate() {
            let filename =
                attachment_name(field, index, files_in_field, document.original_filename());
            let content = tokio::fs::read(document.path())
                .await
                .map_err(IntakeError::Attachment)?;

            summaries.push(DocumentSummary {
                name: filename.clone(),
                size: format_size_kb(document.size()),
                content_type: document.content_type().to_string(),
            });
            attachments.push(Attachment {
                filename,
                content,
                content_type: document.content_type().to_string(),
            });

            if let Err(err) = document.discard() {
                warn!(error = %err, "failed to delete temporary upload");
            }
        }
    }

    Ok((attachments, summaries))
}

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error("mail credentials are not configured")]
    MailNotConfigured { fallback_contact: String },
    #[error("mail relay verification failed: {0}")]
    MailVerification(MailError),
    #[error("unable to read uploaded document: {0}")]
    Attachment(std::io::Error),
    #[error("mail delivery failed: {0}")]
    Delivery(MailError),
}
