use std::collections::BTreeMap;

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use axum::http::StatusCode;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::domain::{
    is_accepted_content_type, DocumentField, SubmittedApplication, UploadedDocument,
    MAX_FILES, MAX_FILE_BYTES, MAX_TOTAL_UPLOAD_BYTES,
};

/// Caps enforced while a submission is streamed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadLimits {
    pub max_file_bytes: u64,
    pub max_total_bytes: u64,
    pub max_files: usize,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_file_bytes: MAX_FILE_BYTES,
            max_total_bytes: MAX_TOTAL_UPLOAD_BYTES,
            max_files: MAX_FILES,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("upload exceeds the configured size limits")]
    PayloadTooLarge,
    #[error("more than {limit} files submitted")]
    TooManyFiles { limit: usize },
    #[error("uploaded file for '{field}' is empty")]
    EmptyFile { field: String },
    #[error("form field '{field}' has the wrong type")]
    FieldTypeMismatch { field: String },
    #[error("malformed multipart body: {0}")]
    Malformed(String),
    #[error("unable to spool upload: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    fn from_multipart(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge
        } else {
            Self::Malformed(err.body_text())
        }
    }
}

/// Everything received in one application submission.
#[derive(Debug, Default)]
pub struct ApplicationForm {
    pub application: SubmittedApplication,
    pub documents: DocumentSet,
}

/// Accepted documents grouped by the form field they arrived under.
#[derive(Debug, Default)]
pub struct DocumentSet {
    by_field: BTreeMap<DocumentField, Vec<UploadedDocument>>,
}

impl DocumentSet {
    pub fn push(&mut self, document: UploadedDocument) {
        self.by_field
            .entry(document.field())
            .or_default()
            .push(document);
    }

    pub fn len(&self) -> usize {
        self.by_field.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn total_bytes(&self) -> u64 {
        self.by_field
            .values()
            .flatten()
            .map(UploadedDocument::size)
            .sum()
    }

    /// Consume the set field by field in [`DocumentField::ALL`] order.
    pub fn into_groups(self) -> impl Iterator<Item = (DocumentField, Vec<UploadedDocument>)> {
        self.by_field.into_iter()
    }
}

/// Stream a multipart submission: text fields into [`SubmittedApplication`],
/// accepted files into temporary storage.
///
/// Files with an unsupported declared type, an unknown field name, or no
/// filename (an untouched file input) are skipped without counting against
/// the limits, as are plain values posted under a file field. A file posted
/// under a text field is rejected.
pub async fn read_application_form(
    mut multipart: Multipart,
    limits: UploadLimits,
) -> Result<ApplicationForm, UploadError> {
    let mut form = ApplicationForm::default();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(UploadError::from_multipart)?
    {
        let name = field.name().unwrap_or_default().to_string();
        let Some(filename) = field.file_name().map(str::to_string) else {
            if DocumentField::from_form_name(&name).is_some() {
                debug!(field = %name, "ignoring text value under file field");
                continue;
            }
            let value = field.text().await.map_err(UploadError::from_multipart)?;
            if !form.application.assign(&name, value) {
                debug!(field = %name, "ignoring unknown form field");
            }
            continue;
        };

        if SubmittedApplication::is_text_field(&name) {
            return Err(UploadError::FieldTypeMismatch { field: name });
        }
        let Some(kind) = DocumentField::from_form_name(&name) else {
            debug!(field = %name, "ignoring file under unknown field");
            continue;
        };
        if filename.is_empty() {
            continue;
        }
        let content_type = field.content_type().unwrap_or_default().to_string();
        if !is_accepted_content_type(&content_type) {
            debug!(field = %name, %content_type, "skipping file with unsupported type");
            continue;
        }
        if form.documents.len() >= limits.max_files {
            return Err(UploadError::TooManyFiles {
                limit: limits.max_files,
            });
        }

        let spooled_so_far = form.documents.total_bytes();
        let document = spool_document(
            &mut field,
            kind,
            filename,
            content_type,
            limits,
            spooled_so_far,
        )
        .await?;
        form.documents.push(document);
    }

    Ok(form)
}

async fn spool_document(
    field: &mut Field<'_>,
    kind: DocumentField,
    filename: String,
    content_type: String,
    limits: UploadLimits,
    spooled_so_far: u64,
) -> Result<UploadedDocument, UploadError> {
    let (file, temp) = NamedTempFile::new()?.into_parts();
    let mut file = tokio::fs::File::from_std(file);
    let mut size: u64 = 0;

    while let Some(chunk) = field.chunk().await.map_err(UploadError::from_multipart)? {
        size += chunk.len() as u64;
        if size > limits.max_file_bytes || spooled_so_far + size > limits.max_total_bytes {
            return Err(UploadError::PayloadTooLarge);
        }
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    drop(file);

    if size == 0 {
        return Err(UploadError::EmptyFile {
            field: kind.label().to_string(),
        });
    }

    Ok(UploadedDocument::new(
        kind,
        filename,
        content_type,
        size,
        temp,
    ))
}
