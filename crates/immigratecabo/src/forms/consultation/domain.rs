use chrono::{DateTime, NaiveDate};
use serde::Deserialize;

const NOT_SPECIFIED: &str = "Not specified";

/// Body of a consultation request as posted by the site's contact modal.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub preferred_date: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ConsultationRequest {
    /// Preferred date as `Weekday, Month D, YYYY`.
    ///
    /// Accepts a calendar date or an RFC 3339 timestamp; anything else is
    /// passed through unchanged so staff still see what the client typed.
    pub fn formatted_preferred_date(&self) -> String {
        let Some(raw) = self
            .preferred_date
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
        else {
            return NOT_SPECIFIED.to_string();
        };

        let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|at| at.date_naive()));
        match date {
            Some(date) => date.format("%A, %B %-d, %Y").to_string(),
            None => raw.to_string(),
        }
    }

    /// Message text, if the client wrote one.
    pub fn message(&self) -> Option<&str> {
        self.message
            .as_deref()
            .filter(|message| !message.trim().is_empty())
    }
}
