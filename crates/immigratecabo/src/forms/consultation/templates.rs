use std::fmt::Write as _;

use super::domain::ConsultationRequest;
use crate::forms::html::{escape_html, multiline_html};
use crate::mail::{is_mailbox, OutboundEmail};

const NO_MESSAGE: &str = "No message provided";
const FOLLOW_UP_REMINDER: &str = "Please contact this client within 24 hours.";

/// Staff notice for a consultation request, HTML with a plaintext alternative.
pub fn consultation_notice(office: &str, request: &ConsultationRequest) -> OutboundEmail {
    let preferred_date = request.formatted_preferred_date();
    let email = escape_html(&request.email);

    let mut html = String::new();
    html.push_str(r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">"#);
    html.push_str(r#"<h2 style="color: #4A1E5C;">New Consultation Request</h2>"#);
    html.push_str(r#"<div style="background: #F3F4F6; padding: 20px; border-radius: 8px;">"#);
    writeln!(html, "<p><strong>Name:</strong> {}</p>", escape_html(&request.name)).expect("name");
    writeln!(
        html,
        "<p><strong>Email:</strong> <a href=\"mailto:{email}\">{email}</a></p>"
    )
    .expect("email");
    writeln!(html, "<p><strong>Phone:</strong> {}</p>", escape_html(&request.phone))
        .expect("phone");
    writeln!(
        html,
        "<p><strong>Preferred Date:</strong> {}</p>",
        escape_html(&preferred_date)
    )
    .expect("date");
    if let Some(message) = request.message() {
        writeln!(
            html,
            "<p><strong>Message:</strong><br>{}</p>",
            multiline_html(message)
        )
        .expect("message");
    }
    html.push_str("</div>");
    writeln!(
        html,
        "<p style=\"color: #6B7280; font-size: 14px;\">{FOLLOW_UP_REMINDER}</p></div>"
    )
    .expect("reminder");

    let mut text = String::from("New Consultation Request\n\n");
    writeln!(text, "Name: {}", request.name).expect("name");
    writeln!(text, "Email: {}", request.email).expect("email");
    writeln!(text, "Phone: {}", request.phone).expect("phone");
    writeln!(text, "Preferred Date: {preferred_date}").expect("date");
    writeln!(text, "Message: {}", request.message().unwrap_or(NO_MESSAGE)).expect("message");
    write!(text, "\n{FOLLOW_UP_REMINDER}").expect("reminder");

    let notice = OutboundEmail::html(
        office,
        office,
        format!("New Consultation Request - {}", request.name),
        html,
    )
    .with_text(text);

    if is_mailbox(&request.email) {
        notice.with_reply_to(request.email.trim())
    } else {
        notice
    }
}
