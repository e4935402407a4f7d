use chrono::NaiveDate;

use super::error::BillingError;
use super::fiscal::FiscalYear;

/// Invoice number sequence scoped to a fiscal year.
///
/// Generates invoice numbers in the format `{prefix}{fiscal-year}-{sequential}`,
/// e.g. "INV-2024-2025-001", "INV-2024-2025-002", etc. The counter restarts
/// at 1 when the sequence moves into a later fiscal year.
#[derive(Debug, Clone)]
pub struct InvoiceNumberSequence {
    prefix: String,
    fiscal_year: FiscalYear,
    next_number: u64,
    zero_pad: usize,
}

impl InvoiceNumberSequence {
    /// Create a new sequence starting at 1.
    pub fn new(prefix: impl Into<String>, fiscal_year: FiscalYear) -> Self {
        Self::starting_at(prefix, fiscal_year, 1)
    }

    /// Create a sequence continuing from a given number.
    pub fn starting_at(prefix: impl Into<String>, fiscal_year: FiscalYear, next_number: u64) -> Self {
        Self {
            prefix: prefix.into(),
            fiscal_year,
            next_number,
            zero_pad: 3,
        }
    }

    /// Set zero-padding width (default: 3, so "001").
    pub fn with_padding(mut self, width: usize) -> Self {
        self.zero_pad = width;
        self
    }

    /// Generate the next invoice number.
    pub fn next_number(&mut self) -> String {
        let number = self.peek();
        self.next_number += 1;
        number
    }

    /// Preview the next number without consuming it.
    pub fn peek(&self) -> String {
        format!(
            "{}{}-{:0>width$}",
            self.prefix,
            self.fiscal_year,
            self.next_number,
            width = self.zero_pad
        )
    }

    pub fn fiscal_year(&self) -> FiscalYear {
        self.fiscal_year
    }

    /// Get the next number that will be issued (without prefix/formatting).
    pub fn next_raw(&self) -> u64 {
        self.next_number
    }

    /// Move to a later fiscal year, resetting the counter to 1.
    pub fn advance_to(&mut self, fiscal_year: FiscalYear) -> Result<(), BillingError> {
        if fiscal_year <= self.fiscal_year {
            return Err(BillingError::Numbering(format!(
                "fiscal year {fiscal_year} must be later than current fiscal year {}",
                self.fiscal_year
            )));
        }
        self.fiscal_year = fiscal_year;
        self.next_number = 1;
        Ok(())
    }

    /// Advance if `date` lies in a later fiscal year.
    /// Returns true if the sequence was advanced.
    pub fn auto_advance(&mut self, date: NaiveDate) -> bool {
        let fy = FiscalYear::containing(date);
        if fy > self.fiscal_year {
            self.fiscal_year = fy;
            self.next_number = 1;
            true
        } else {
            false
        }
    }
}
