//! Residency application intake: multipart parsing with upload limits,
//! field validation, and the applicant/staff email pair.

pub mod domain;
pub mod router;
pub mod service;
pub mod templates;
pub mod upload;

#[cfg(test)]
mod tests;

pub use domain::{
    Applicant, DocumentField, DocumentSummary, ServiceType, SubmittedApplication,
    UploadedDocument, ValidationError,
};
pub use router::{intake_router, INTAKE_PATH};
pub use service::{IntakeError, IntakeReceipt, IntakeService, IntakeSettings};
pub use upload::{ApplicationForm, DocumentSet, UploadError, UploadLimits};
