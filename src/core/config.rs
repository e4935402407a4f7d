use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[cfg(feature = "config")]
use super::error::BillingError;
use super::fiscal::FiscalYear;
use super::numbering::InvoiceNumberSequence;

/// What reconciliation does with a payment larger than the outstanding balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverpaymentPolicy {
    /// Accept it; the surplus shows up as [`Invoice::credit`](super::Invoice::credit).
    #[default]
    Allow,
    /// Refuse it with [`BillingError::Overpayment`](super::BillingError::Overpayment).
    Reject,
}

/// Engine settings.
///
/// ```toml
/// overpayment = "reject"
/// currency = "INR"
/// number_prefix = "INV-"
/// recent_fiscal_years = 10
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub overpayment: OverpaymentPolicy,
    /// ISO 4217 code used when rendering amounts.
    pub currency: String,
    /// Prefix for [`InvoiceNumberSequence`](super::InvoiceNumberSequence).
    pub number_prefix: String,
    /// How many fiscal years a year selector offers.
    pub recent_fiscal_years: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            overpayment: OverpaymentPolicy::Allow,
            currency: "USD".to_string(),
            number_prefix: "INV-".to_string(),
            recent_fiscal_years: 10,
        }
    }
}

impl EngineConfig {
    /// A fresh numbering sequence for the fiscal year containing `date`.
    pub fn number_sequence(&self, date: NaiveDate) -> InvoiceNumberSequence {
        InvoiceNumberSequence::new(self.number_prefix.clone(), FiscalYear::containing(date))
    }

    /// The fiscal years a selector should offer on `today`, newest first.
    pub fn selectable_fiscal_years(&self, today: NaiveDate) -> Vec<FiscalYear> {
        FiscalYear::recent(today, self.recent_fiscal_years).collect()
    }

    /// Parse settings from TOML; missing keys fall back to defaults.
    #[cfg(feature = "config")]
    pub fn from_toml_str(input: &str) -> Result<Self, BillingError> {
        toml::from_str(input).map_err(|e| BillingError::Config(e.to_string()))
    }
}
