use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::{BillingError, EngineConfig, FiscalYear, Invoice, ValidationError};

use super::schedule::ReportFrequency;
use super::summary::{FiscalSummary, render_summary_html};

/// An outgoing transactional email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    /// Sender override; the mailer's default is used when absent.
    pub from: Option<String>,
}

/// Delivery result reported by the mailer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailOutcome {
    pub success: bool,
    pub error: Option<String>,
}

impl EmailOutcome {
    pub fn sent() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Email delivery collaborator.
pub trait Mailer {
    fn send(&self, message: &EmailMessage) -> EmailOutcome;
}

/// Validate and hand a message to the mailer.
///
/// `to`, `subject` and `html` must be non-empty; a rejected message never
/// reaches the mailer.
pub fn send_report<M: Mailer + ?Sized>(
    mailer: &M,
    message: &EmailMessage,
) -> Result<EmailOutcome, BillingError> {
    let mut errors = Vec::new();
    for (field, value) in [
        ("to", &message.to),
        ("subject", &message.subject),
        ("html", &message.html),
    ] {
        if value.trim().is_empty() {
            errors.push(ValidationError::with_rule(
                field,
                format!("{field} must not be empty"),
                "MAIL-01",
            ));
        }
    }
    if !errors.is_empty() {
        return Err(BillingError::from_validation(&errors));
    }

    let outcome = mailer.send(message);
    if outcome.success {
        info!(to = %message.to, subject = %message.subject, "report email sent");
    } else {
        warn!(
            to = %message.to,
            error = outcome.error.as_deref().unwrap_or("unknown"),
            "report email failed"
        );
    }
    Ok(outcome)
}

/// Build the email for a scheduled report covering the given fiscal year.
pub fn compose_report<'a, I>(
    frequency: ReportFrequency,
    fiscal_year: FiscalYear,
    invoices: I,
    to: impl Into<String>,
    config: &EngineConfig,
) -> EmailMessage
where
    I: IntoIterator<Item = &'a Invoice>,
{
    let summary = FiscalSummary::from_invoices(fiscal_year, invoices);
    EmailMessage {
        to: to.into(),
        subject: format!("{} - FY {}", frequency.title(), fiscal_year),
        html: render_summary_html(&summary, &config.currency),
        from: None,
    }
}
