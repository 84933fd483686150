use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use chrono_tz::America::Mazatlan;

use super::domain::{Applicant, DocumentSummary, SubmittedApplication};
use crate::forms::html::escape_html;
use crate::mail::{is_mailbox, OutboundEmail};

/// Contact line printed in the applicant's confirmation footer.
const SITE_CONTACT_LINE: &str = "hello@immigratecabo.com | +52 624 123 4567";

/// Submission time in Mexican Pacific time, e.g. `Friday, March 14, 2025 at 3:30 PM`.
pub fn format_submission_timestamp(at: DateTime<Utc>) -> String {
    at.with_timezone(&Mazatlan)
        .format("%A, %B %-d, %Y at %-I:%M %p")
        .to_string()
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

pub fn applicant_confirmation(
    from: &str,
    applicant: &Applicant,
    documents: &[DocumentSummary],
    submitted_at: &str,
) -> OutboundEmail {
    let service = escape_html(applicant.service.label());
    let count = documents.len();
    let received_note = if count > 0 {
        format!(" and {count} supporting document{}", plural(count))
    } else {
        String::new()
    };

    let mut html = String::new();
    html.push_str(r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">"#);
    html.push_str(
        r#"<div style="background: linear-gradient(135deg, #4A1E5C 0%, #8B5CF6 100%); padding: 30px; text-align: center; border-radius: 8px 8px 0 0;">"#,
    );
    html.push_str(r#"<h2 style="color: white; margin: 0;">✅ Application Received!</h2>"#);
    html.push_str(r#"<p style="color: #E9D5FF; margin: 10px 0 0 0;">IMMIGRATECABO</p></div>"#);
    html.push_str(r#"<div style="background: #ffffff; padding: 30px; color: #374151;">"#);
    writeln!(html, "<p>Dear {},</p>", escape_html(&applicant.full_name)).expect("greeting");
    writeln!(
        html,
        "<p>Thank you for submitting your <strong>{service}</strong> application! We've successfully received your information{received_note}.</p>"
    )
    .expect("intro");

    html.push_str(
        r#"<div style="background: #D1FAE5; padding: 20px; border-radius: 8px; margin: 25px 0; color: #065F46;">"#,
    );
    html.push_str("<h3 style=\"margin-top: 0;\">✅ What We Received:</h3>");
    writeln!(html, "<p><strong>Service:</strong> {service}</p>").expect("service line");
    writeln!(
        html,
        "<p><strong>Documents:</strong> {count} file{} uploaded</p>",
        plural(count)
    )
    .expect("document line");
    writeln!(
        html,
        "<p><strong>Submission Date:</strong> {}</p></div>",
        escape_html(submitted_at)
    )
    .expect("date line");

    html.push_str(
        r#"<div style="background: #DBEAFE; padding: 20px; border-radius: 8px; margin: 25px 0; color: #1E40AF;">"#,
    );
    html.push_str("<h3 style=\"margin-top: 0;\">📋 What Happens Next:</h3><ol>");
    for step in [
        "Our immigration specialist will review your documents",
        "<strong>We'll contact you within 24 hours</strong> via phone or email",
        "We'll schedule a consultation to discuss your case",
        "We'll prepare your complete INM application packet",
    ] {
        writeln!(html, "<li style=\"margin: 10px 0;\">{step}</li>").expect("next step");
    }
    html.push_str("</ol></div>");
    html.push_str(
        "<p>Best regards,<br><strong style=\"color: #7C3AED;\">The ImmigrateCabo Team</strong></p></div>",
    );
    writeln!(
        html,
        "<div style=\"background: #1F2937; padding: 25px; text-align: center; color: #9CA3AF;\"><p style=\"color: white;\">Your Trusted Immigration Partner in Cabo</p><p>{SITE_CONTACT_LINE}</p></div></div>"
    )
    .expect("footer");

    OutboundEmail::html(
        from,
        applicant.email.as_str(),
        format!(
            "✅ Application Received - {} - ImmigrateCabo",
            applicant.service.label()
        ),
        html,
    )
}

pub fn staff_notification(
    office: &str,
    applicant: &Applicant,
    application: &SubmittedApplication,
    documents: &[DocumentSummary],
    submitted_at: &str,
) -> OutboundEmail {
    let or_not_provided = |value: &Option<String>| {
        value
            .as_deref()
            .filter(|value| !value.is_empty())
            .map(escape_html)
            .unwrap_or_else(|| "Not provided".to_string())
    };
    let email = escape_html(&applicant.email);

    let mut html = String::new();
    html.push_str(r#"<div style="font-family: Arial, sans-serif; max-width: 650px; margin: 0 auto;">"#);
    html.push_str(
        r#"<div style="background: linear-gradient(135deg, #4A1E5C 0%, #8B5CF6 100%); padding: 30px; text-align: center; border-radius: 8px 8px 0 0;">"#,
    );
    html.push_str(r#"<h2 style="color: white; margin: 0;">🛂 New Immigration Application</h2>"#);
    writeln!(
        html,
        "<p style=\"color: #FCD34D; margin: 10px 0 0 0; font-weight: bold;\">{}</p></div>",
        escape_html(applicant.service.label())
    )
    .expect("banner");

    html.push_str(r#"<div style="background: #ffffff; padding: 30px; border: 1px solid #e5e7eb;">"#);
    html.push_str(r#"<div style="background: #F3F4F6; padding: 20px; border-radius: 8px; margin-bottom: 20px;">"#);
    html.push_str("<h3 style=\"margin-top: 0;\">Applicant Information:</h3>");
    writeln!(
        html,
        "<p><strong>Name:</strong> {}</p>",
        escape_html(&applicant.full_name)
    )
    .expect("name");
    writeln!(
        html,
        "<p><strong>Email:</strong> <a href=\"mailto:{email}\">{email}</a></p>"
    )
    .expect("email");
    writeln!(
        html,
        "<p><strong>Phone:</strong> {}</p>",
        or_not_provided(&application.phone)
    )
    .expect("phone");
    writeln!(
        html,
        "<p><strong>Nationality:</strong> {}</p>",
        or_not_provided(&application.nationality)
    )
    .expect("nationality");
    writeln!(
        html,
        "<p><strong>Passport:</strong> {}</p>",
        or_not_provided(&application.passport_number)
    )
    .expect("passport");
    html.push_str("</div>");

    let details = application.details();
    if !details.is_empty() {
        html.push_str(r#"<div style="background: #F9FAFB; padding: 20px; border-radius: 8px; margin-bottom: 20px;">"#);
        html.push_str("<h3 style=\"margin-top: 0;\">Application Details:</h3>");
        for (label, value) in details {
            writeln!(html, "<p><strong>{label}:</strong> {}</p>", escape_html(value))
                .expect("detail");
        }
        html.push_str("</div>");
    }

    html.push_str(r#"<div style="background: #D1FAE5; padding: 20px; border-radius: 8px;">"#);
    writeln!(
        html,
        "<p><strong>Documents Uploaded:</strong> {}</p>",
        documents.len()
    )
    .expect("document count");
    if documents.is_empty() {
        html.push_str("<p>No documents uploaded</p>");
    } else {
        html.push_str("<ul>");
        for document in documents {
            writeln!(
                html,
                "<li style=\"margin: 5px 0; color: #059669;\">📎 <strong>{}</strong> ({})</li>",
                escape_html(&document.name),
                document.size
            )
            .expect("document entry");
        }
        html.push_str("</ul>");
    }
    writeln!(
        html,
        "<p style=\"margin: 15px 0 0 0;\"><strong>Submission Date:</strong> {}</p>",
        escape_html(submitted_at)
    )
    .expect("date");
    html.push_str("</div></div></div>");

    let notice = OutboundEmail::html(
        office,
        office,
        format!(
            "NEW: {} Application - {}",
            applicant.service.label(),
            applicant.full_name
        ),
        html,
    );

    if is_mailbox(&applicant.email) {
        notice.with_reply_to(applicant.email.as_str())
    } else {
        notice
    }
}
