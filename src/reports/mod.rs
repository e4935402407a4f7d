//! Scheduled fiscal-year reports.
//!
//! Decides which reports are due on a given day, summarizes a fiscal year's
//! invoices, renders the summary as an HTML email body, and hands it to a
//! [`Mailer`] supplied by the caller.
//!
//! # Example
//!
//! ```ignore
//! use billdesk::reports::*;
//!
//! for frequency in due_reports(&settings, today) {
//!     let fy = FiscalYear::containing(today);
//!     let message = compose_report(frequency, fy, &invoices, &settings.email, &config);
//!     send_report(&mailer, &message)?;
//! }
//! ```

mod mail;
mod schedule;
mod summary;

pub use mail::{EmailMessage, EmailOutcome, Mailer, compose_report, send_report};
pub use schedule::{ReportFrequency, ReportSettings, due_reports};
pub use summary::{FiscalSummary, StatusCounts, format_money, render_summary_html};
