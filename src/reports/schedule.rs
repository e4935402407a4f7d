use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::core::FiscalYear;

/// Automated report preferences stored per organization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    pub enabled: bool,
    /// Destination address; falls back to the organization email upstream.
    pub email: String,
    pub weekly: bool,
    pub monthly: bool,
    #[serde(rename = "semi-annual", alias = "semi_annual")]
    pub semi_annual: bool,
    pub annual: bool,
}

/// How often a report is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportFrequency {
    /// Every Monday.
    Weekly,
    /// First day of each month.
    Monthly,
    /// First day of each fiscal half-year (1 April, 1 October).
    SemiAnnual,
    /// Last day of the fiscal year (31 March).
    Annual,
}

impl ReportFrequency {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Weekly => "Weekly Report",
            Self::Monthly => "Monthly Report",
            Self::SemiAnnual => "Semi-Annual Report",
            Self::Annual => "Financial Year Report",
        }
    }

    /// Whether a report of this frequency is due on `date`.
    pub fn is_due(&self, date: NaiveDate) -> bool {
        match self {
            Self::Weekly => date.weekday() == Weekday::Mon,
            Self::Monthly => date.day() == 1,
            Self::SemiAnnual => date.day() == 1 && matches!(date.month(), 4 | 10),
            Self::Annual => date == FiscalYear::containing(date).end(),
        }
    }
}

/// Reports that should go out on `date`, in frequency order.
pub fn due_reports(settings: &ReportSettings, date: NaiveDate) -> Vec<ReportFrequency> {
    if !settings.enabled {
        return Vec::new();
    }
    [
        (settings.weekly, ReportFrequency::Weekly),
        (settings.monthly, ReportFrequency::Monthly),
        (settings.semi_annual, ReportFrequency::SemiAnnual),
        (settings.annual, ReportFrequency::Annual),
    ]
    .into_iter()
    .filter(|(on, freq)| *on && freq.is_due(date))
    .map(|(_, freq)| freq)
    .collect()
}
