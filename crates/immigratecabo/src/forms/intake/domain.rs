use std::sync::OnceLock;

use regex::Regex;
use tempfile::TempPath;

pub const MAX_FILE_BYTES: u64 = 2 * 1024 * 1024;
pub const MAX_TOTAL_UPLOAD_BYTES: u64 = 8 * 1024 * 1024;
pub const MAX_FILES: usize = 10;

/// Declared content types a document may carry; anything else is skipped.
pub const ACCEPTED_CONTENT_TYPES: [&str; 4] =
    ["application/pdf", "image/jpeg", "image/jpg", "image/png"];

/// Text portion of a residency application, one slot per known form field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmittedApplication {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<String>,
    pub nationality: Option<String>,
    pub passport_number: Option<String>,
    pub passport_expiration: Option<String>,
    pub current_address: Option<String>,
    pub intended_cabo_address: Option<String>,
    pub service_type: Option<String>,
    pub lived_in_mexico_before: Option<String>,
    pub current_visa_status: Option<String>,
    pub income_source: Option<String>,
    pub monthly_income: Option<String>,
    pub has_mexican_family: Option<String>,
    pub employer_name: Option<String>,
    pub job_title: Option<String>,
    pub employer_rfc: Option<String>,
    pub job_start_date: Option<String>,
}

impl SubmittedApplication {
    /// Whether `name` is one of the application's text fields.
    pub fn is_text_field(name: &str) -> bool {
        Self::default().slot(name).is_some()
    }

    /// Store `value` under the form field `name`. The first value wins.
    ///
    /// Returns `false` for names the application does not know.
    pub fn assign(&mut self, name: &str, value: String) -> bool {
        match self.slot(name) {
            Some(slot) => {
                if slot.is_none() {
                    *slot = Some(value);
                }
                true
            }
            None => false,
        }
    }

    fn slot(&mut self, name: &str) -> Option<&mut Option<String>> {
        let slot = match name {
            "fullName" => &mut self.full_name,
            "email" => &mut self.email,
            "phone" => &mut self.phone,
            "dateOfBirth" => &mut self.date_of_birth,
            "nationality" => &mut self.nationality,
            "passportNumber" => &mut self.passport_number,
            "passportExpiration" => &mut self.passport_expiration,
            "currentAddress" => &mut self.current_address,
            "intendedCaboAddress" => &mut self.intended_cabo_address,
            "serviceType" => &mut self.service_type,
            "livedInMexicoBefore" => &mut self.lived_in_mexico_before,
            "currentVisaStatus" => &mut self.current_visa_status,
            "incomeSource" => &mut self.income_source,
            "monthlyIncome" => &mut self.monthly_income,
            "hasMexicanFamily" => &mut self.has_mexican_family,
            "employerName" => &mut self.employer_name,
            "jobTitle" => &mut self.job_title,
            "employerRFC" => &mut self.employer_rfc,
            "jobStartDate" => &mut self.job_start_date,
            _ => return None,
        };
        Some(slot)
    }

    /// Check the required fields and the email shape.
    pub fn applicant(&self) -> Result<Applicant, ValidationError> {
        let (Some(full_name), Some(email), Some(service_type)) = (
            present(&self.full_name),
            present(&self.email),
            present(&self.service_type),
        ) else {
            return Err(ValidationError::MissingRequiredFields);
        };

        if !is_valid_email(email) {
            return Err(ValidationError::InvalidEmail);
        }

        Ok(Applicant {
            full_name: full_name.to_string(),
            email: email.to_string(),
            service: ServiceType::from_code(service_type),
        })
    }

    /// Optional details shown to staff, in form order, skipping blanks.
    pub fn details(&self) -> Vec<(&'static str, &str)> {
        [
            ("Date of Birth", &self.date_of_birth),
            ("Passport Expiration", &self.passport_expiration),
            ("Current Address", &self.current_address),
            ("Intended Cabo Address", &self.intended_cabo_address),
            ("Lived in Mexico Before", &self.lived_in_mexico_before),
            ("Current Visa Status", &self.current_visa_status),
            ("Income Source", &self.income_source),
            ("Monthly Income", &self.monthly_income),
            ("Mexican Family", &self.has_mexican_family),
            ("Employer", &self.employer_name),
            ("Job Title", &self.job_title),
            ("Employer RFC", &self.employer_rfc),
            ("Job Start Date", &self.job_start_date),
        ]
        .into_iter()
        .filter_map(|(label, value)| present(value).map(|value| (label, value)))
        .collect()
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern"))
}

pub fn is_valid_email(candidate: &str) -> bool {
    email_pattern().is_match(candidate)
}

/// Validated identity of the person applying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applicant {
    pub full_name: String,
    pub email: String,
    pub service: ServiceType,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required fields: name, email, and service type are required")]
    MissingRequiredFields,
    #[error("Invalid email address format")]
    InvalidEmail,
}

/// Residency service requested on the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceType {
    Temporary,
    Permanent,
    WorkPermit,
    Renewal,
    Other(String),
}

impl ServiceType {
    pub fn from_code(code: &str) -> Self {
        match code {
            "temporary" => Self::Temporary,
            "permanent" => Self::Permanent,
            "work-permit" => Self::WorkPermit,
            "renewal" => Self::Renewal,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Temporary => "Temporary Residency (1-4 years)",
            Self::Permanent => "Permanent Residency",
            Self::WorkPermit => "Work Permit",
            Self::Renewal => "Residency Renewal",
            Self::Other(code) => code,
        }
    }
}

/// File inputs on the application form, in the order attachments are built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DocumentField {
    PassportPhoto,
    ProofOfIncome,
    Photo,
    BirthCertificate,
    JobOfferLetter,
    AdditionalDocuments,
}

impl DocumentField {
    pub const ALL: [DocumentField; 6] = [
        DocumentField::PassportPhoto,
        DocumentField::ProofOfIncome,
        DocumentField::Photo,
        DocumentField::BirthCertificate,
        DocumentField::JobOfferLetter,
        DocumentField::AdditionalDocuments,
    ];

    pub fn from_form_name(name: &str) -> Option<Self> {
        match name {
            "passportPhoto" => Some(Self::PassportPhoto),
            "proofOfIncome" => Some(Self::ProofOfIncome),
            "photo" => Some(Self::Photo),
            "birthCertificate" => Some(Self::BirthCertificate),
            "jobOfferLetter" => Some(Self::JobOfferLetter),
            "additionalDocuments" => Some(Self::AdditionalDocuments),
            _ => None,
        }
    }

    /// Base name used for the attachment filename.
    pub fn label(self) -> &'static str {
        match self {
            Self::PassportPhoto => "Passport_Photo",
            Self::ProofOfIncome => "Proof_of_Income",
            Self::Photo => "ID_Photo",
            Self::BirthCertificate => "Birth_Certificate",
            Self::JobOfferLetter => "Job_Offer",
            Self::AdditionalDocuments => "Additional_Doc",
        }
    }
}

pub fn is_accepted_content_type(declared: &str) -> bool {
    let essence = declared
        .parse::<mime::Mime>()
        .map(|parsed| parsed.essence_str().to_ascii_lowercase())
        .unwrap_or_default();
    ACCEPTED_CONTENT_TYPES.contains(&essence.as_str())
}

/// A received file spooled to temporary storage.
///
/// The temporary copy is removed when the document is dropped; callers that
/// want to observe removal failures use [`UploadedDocument::discard`].
#[derive(Debug)]
pub struct UploadedDocument {
    field: DocumentField,
    original_filename: String,
    content_type: String,
    size: u64,
    temp: TempPath,
}

impl UploadedDocument {
    pub(crate) fn new(
        field: DocumentField,
        original_filename: String,
        content_type: String,
        size: u64,
        temp: TempPath,
    ) -> Self {
        Self {
            field,
            original_filename,
            content_type,
            size,
            temp,
        }
    }

    pub fn field(&self) -> DocumentField {
        self.field
    }

    pub fn original_filename(&self) -> &str {
        &self.original_filename
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn path(&self) -> &std::path::Path {
        &self.temp
    }

    pub(crate) fn discard(self) -> std::io::Result<()> {
        self.temp.close()
    }
}

/// Text after the last `.`; the whole name when there is no dot.
pub fn file_extension(original_filename: &str) -> &str {
    original_filename
        .rsplit('.')
        .next()
        .unwrap_or(original_filename)
}

/// `<Label>.<ext>` for a lone file, `<Label>_<n>.<ext>` when the field held several.
pub fn attachment_name(
    field: DocumentField,
    index: usize,
    files_in_field: usize,
    original_filename: &str,
) -> String {
    let extension = file_extension(original_filename);
    if files_in_field > 1 {
        format!("{}_{}.{}", field.label(), index + 1, extension)
    } else {
        format!("{}.{}", field.label(), extension)
    }
}

/// Size in KB with one decimal, ties rounded up.
pub fn format_size_kb(bytes: u64) -> String {
    let tenths = (bytes * 10 + 512) / 1024;
    format!("{}.{} KB", tenths / 10, tenths % 10)
}

/// Human-readable entry for one received document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSummary {
    pub name: String,
    pub size: String,
    pub content_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_value_wins_and_unknown_fields_are_reported() {
        let mut application = SubmittedApplication::default();
        assert!(application.assign("fullName", "Ana Ruiz".to_string()));
        assert!(application.assign("fullName", "Someone Else".to_string()));
        assert!(application.assign("employerRFC", "RUAA800101XX1".to_string()));
        assert!(!application.assign("favoriteColor", "teal".to_string()));

        assert_eq!(application.full_name.as_deref(), Some("Ana Ruiz"));
        assert_eq!(application.employer_rfc.as_deref(), Some("RUAA800101XX1"));
        assert!(SubmittedApplication::is_text_field("intendedCaboAddress"));
        assert!(!SubmittedApplication::is_text_field("passportPhoto"));
    }

    #[test]
    fn missing_or_blank_required_fields_are_rejected() {
        let mut application = SubmittedApplication {
            full_name: Some("Ana Ruiz".to_string()),
            email: Some("ana@example.com".to_string()),
            ..SubmittedApplication::default()
        };
        assert_eq!(
            application.applicant(),
            Err(ValidationError::MissingRequiredFields)
        );

        application.service_type = Some(String::new());
        assert_eq!(
            application.applicant(),
            Err(ValidationError::MissingRequiredFields)
        );

        application.service_type = Some("temporary".to_string());
        let applicant = application.applicant().expect("complete application");
        assert_eq!(applicant.service, ServiceType::Temporary);
    }

    #[test]
    fn email_shape_is_enforced() {
        assert!(is_valid_email("ana@example.com"));
        assert!(is_valid_email("a.b+c@sub.example.mx"));
        assert!(!is_valid_email("ana@example"));
        assert!(!is_valid_email("ana example@mail.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ana@@example.com"));

        let application = SubmittedApplication {
            full_name: Some("Ana Ruiz".to_string()),
            email: Some("ana.example.com".to_string()),
            service_type: Some("permanent".to_string()),
            ..SubmittedApplication::default()
        };
        assert_eq!(application.applicant(), Err(ValidationError::InvalidEmail));
    }

    #[test]
    fn service_codes_map_to_labels() {
        assert_eq!(
            ServiceType::from_code("temporary").label(),
            "Temporary Residency (1-4 years)"
        );
        assert_eq!(
            ServiceType::from_code("permanent").label(),
            "Permanent Residency"
        );
        assert_eq!(ServiceType::from_code("work-permit").label(), "Work Permit");
        assert_eq!(ServiceType::from_code("renewal").label(), "Residency Renewal");
        assert_eq!(ServiceType::from_code("other-code").label(), "other-code");
    }

    #[test]
    fn attachment_names_follow_field_labels() {
        assert_eq!(
            attachment_name(DocumentField::PassportPhoto, 0, 1, "scan.final.PDF"),
            "Passport_Photo.PDF"
        );
        assert_eq!(
            attachment_name(DocumentField::AdditionalDocuments, 0, 2, "lease.pdf"),
            "Additional_Doc_1.pdf"
        );
        assert_eq!(
            attachment_name(DocumentField::AdditionalDocuments, 1, 2, "bank.png"),
            "Additional_Doc_2.png"
        );
        assert_eq!(
            attachment_name(DocumentField::Photo, 0, 1, "portrait"),
            "ID_Photo.portrait"
        );
    }

    #[test]
    fn sizes_render_in_kilobytes() {
        assert_eq!(format_size_kb(2560), "2.5 KB");
        assert_eq!(format_size_kb(1024), "1.0 KB");
        assert_eq!(format_size_kb(100), "0.1 KB");
        assert_eq!(format_size_kb(2 * 1024 * 1024), "2048.0 KB");
        assert_eq!(format_size_kb(0), "0.0 KB");
    }

    #[test]
    fn size_ties_round_up() {
        assert_eq!(format_size_kb(256), "0.3 KB");
        assert_eq!(format_size_kb(768), "0.8 KB");
        assert_eq!(format_size_kb(1280), "1.3 KB");
        assert_eq!(format_size_kb(2304), "2.3 KB");
        assert_eq!(format_size_kb(255), "0.2 KB");
    }

    #[test]
    fn content_type_filter_accepts_documents_and_images() {
        assert!(is_accepted_content_type("application/pdf"));
        assert!(is_accepted_content_type("image/JPEG"));
        assert!(is_accepted_content_type("image/jpg"));
        assert!(is_accepted_content_type("image/png; name=scan.png"));
        assert!(!is_accepted_content_type("image/gif"));
        assert!(!is_accepted_content_type("application/octet-stream"));
        assert!(!is_accepted_content_type(""));
    }

    #[test]
    fn details_skip_blank_values() {
        let application = SubmittedApplication {
            income_source: Some("Pension".to_string()),
            employer_name: Some(String::new()),
            job_title: Some("Architect".to_string()),
            ..SubmittedApplication::default()
        };
        assert_eq!(
            application.details(),
            vec![("Income Source", "Pension"), ("Job Title", "Architect")]
        );
    }
}
