//! April–March fiscal years.
//!
//! A fiscal year is labelled by the two calendar years it straddles:
//! `"2024-2025"` runs from 2024-04-01 to 2025-03-31, both inclusive.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::error::BillingError;
use super::types::Invoice;

/// First month (1-indexed) of a fiscal year.
pub const FISCAL_YEAR_START_MONTH: u32 = 4;

/// A fiscal year, identified by the calendar year it starts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FiscalYear {
    start_year: i32,
}

impl FiscalYear {
    pub fn new(start_year: i32) -> Self {
        Self { start_year }
    }

    /// The fiscal year `date` falls in.
    pub fn containing(date: NaiveDate) -> Self {
        if date.month() >= FISCAL_YEAR_START_MONTH {
            Self::new(date.year())
        } else {
            Self::new(date.year() - 1)
        }
    }

    pub fn start_year(&self) -> i32 {
        self.start_year
    }

    /// Saturates at `i32::MAX`.
    pub fn end_year(&self) -> i32 {
        self.start_year.saturating_add(1)
    }

    /// 1 April of the start year. Saturates at chrono's supported range.
    pub fn start(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.start_year, FISCAL_YEAR_START_MONTH, 1)
            .unwrap_or(NaiveDate::MIN)
    }

    /// 31 March of the end year. Saturates at chrono's supported range.
    pub fn end(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.end_year(), FISCAL_YEAR_START_MONTH - 1, 31)
            .unwrap_or(NaiveDate::MAX)
    }

    /// Closed-interval check on calendar dates.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start() <= date && date <= self.end()
    }

    pub fn previous(&self) -> Self {
        Self::new(self.start_year.saturating_sub(1))
    }

    pub fn next(&self) -> Self {
        Self::new(self.start_year.saturating_add(1))
    }

    /// `"{start}-{end}"`, e.g. `"2024-2025"`.
    pub fn label(&self) -> String {
        self.to_string()
    }

    /// The fiscal year containing `today` followed by the `n - 1` before it.
    pub fn recent(today: NaiveDate, n: usize) -> impl Iterator<Item = FiscalYear> {
        std::iter::successors(Some(Self::containing(today)), |fy| Some(fy.previous())).take(n)
    }
}

impl fmt::Display for FiscalYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start_year, self.end_year())
    }
}

impl FromStr for FiscalYear {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BillingError::InvalidFiscalYear(s.to_string());

        let (first, second) = s.split_once('-').ok_or_else(invalid)?;
        let start = parse_year(first).ok_or_else(invalid)?;
        let end = parse_year(second).ok_or_else(invalid)?;
        if end != start + 1 {
            return Err(invalid());
        }
        Ok(Self::new(start))
    }
}

fn parse_year(s: &str) -> Option<i32> {
    if s.len() != 4 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl TryFrom<String> for FiscalYear {
    type Error = BillingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FiscalYear> for String {
    fn from(fy: FiscalYear) -> Self {
        fy.label()
    }
}

/// Label of the fiscal year `date` falls in.
pub fn fiscal_year_of(date: NaiveDate) -> String {
    FiscalYear::containing(date).label()
}

/// `(start, end)` dates of a `"Y1-Y2"` label.
pub fn range_of(label: &str) -> Result<(NaiveDate, NaiveDate), BillingError> {
    let fy: FiscalYear = label.parse()?;
    Ok((fy.start(), fy.end()))
}

/// Labels of the current fiscal year and the `n - 1` preceding ones, most
/// recent first.
pub fn recent_labels(today: NaiveDate, n: usize) -> Vec<String> {
    FiscalYear::recent(today, n).map(|fy| fy.label()).collect()
}

/// Invoices whose issue date falls inside `fy`, in input order.
pub fn filter_by_fiscal_year<'a, I>(invoices: I, fy: FiscalYear) -> impl Iterator<Item = &'a Invoice>
where
    I: IntoIterator<Item = &'a Invoice>,
{
    invoices
        .into_iter()
        .filter(move |invoice| fy.contains(invoice.issue_date))
}
