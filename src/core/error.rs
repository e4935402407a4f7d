use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use super::types::InvoiceStatus;

/// Errors that can occur while pricing, reconciling or reporting on invoices.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BillingError {
    /// One or more validation rules failed before any mutation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A line item violated its numeric preconditions; totals were not produced.
    #[error("invalid line item at index {index}: {reason}")]
    InvalidLine { index: usize, reason: String },

    /// Fiscal-year label is not of the form `YYYY-YYYY` with consecutive years.
    #[error("invalid fiscal year label: {0}")]
    InvalidFiscalYear(String),

    /// The lifecycle state machine does not allow this transition.
    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: InvoiceStatus,
        to: InvoiceStatus,
    },

    /// Referenced invoice or payment does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The invoice changed between read and conditional write.
    #[error("conflict on invoice {invoice_id}: expected version {expected}, found {actual}")]
    Conflict {
        invoice_id: Uuid,
        expected: u64,
        actual: u64,
    },

    /// Payment would push `amount_paid` beyond the invoice total.
    #[error("payment of {attempted} exceeds outstanding balance {outstanding}")]
    Overpayment {
        outstanding: Decimal,
        attempted: Decimal,
    },

    /// Failure reported by the storage collaborator, passed through unchanged.
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration could not be parsed.
    #[error("config error: {0}")]
    Config(String),

    /// Invoice number sequencing error.
    #[error("numbering error: {0}")]
    Numbering(String),
}

impl BillingError {
    /// Whether the caller may retry the same operation unchanged.
    ///
    /// Only compare-and-swap conflicts qualify: re-reading the invoice and
    /// reapplying the payment is safe because nothing was committed.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    pub(crate) fn from_validation(errors: &[ValidationError]) -> Self {
        let msg = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        Self::Validation(msg)
    }
}

/// A single validation error with field path and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dot-separated path to the invalid field (e.g. "items[2].discount_percent").
    pub field: String,
    /// Human-readable error description.
    pub message: String,
    /// Short rule code if applicable (e.g. "LINE-03").
    pub rule: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(rule) = &self.rule {
            write!(f, "[{}] {}: {}", rule, self.field, self.message)
        } else {
            write!(f, "{}: {}", self.field, self.message)
        }
    }
}

impl ValidationError {
    /// Create a validation error without a rule code.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            rule: None,
        }
    }

    /// Create a validation error with a rule code.
    pub fn with_rule(
        field: impl Into<String>,
        message: impl Into<String>,
        rule: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            rule: Some(rule.into()),
        }
    }
}
