//! Consultation requests: a short JSON contact form forwarded to staff.

pub mod domain;
pub mod router;
pub mod service;
pub mod templates;


pub use domain::ConsultationRequest;
pub use router::{consultation_router, CONSULTATION_PATH};
pub use service::{ConsultationError, ConsultationService};
