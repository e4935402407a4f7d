use std::fmt::Write as _;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{FiscalYear, Invoice, InvoiceStatus, filter_by_fiscal_year, round_money};

/// Invoice counts per lifecycle status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub draft: usize,
    pub sent: usize,
    pub paid: usize,
    pub overdue: usize,
    pub cancelled: usize,
}

impl StatusCounts {
    fn bump(&mut self, status: InvoiceStatus) {
        let slot = match status {
            InvoiceStatus::Draft => &mut self.draft,
            InvoiceStatus::Sent => &mut self.sent,
            InvoiceStatus::Paid => &mut self.paid,
            InvoiceStatus::Overdue => &mut self.overdue,
            InvoiceStatus::Cancelled => &mut self.cancelled,
        };
        *slot += 1;
    }

    pub fn get(&self, status: InvoiceStatus) -> usize {
        match status {
            InvoiceStatus::Draft => self.draft,
            InvoiceStatus::Sent => self.sent,
            InvoiceStatus::Paid => self.paid,
            InvoiceStatus::Overdue => self.overdue,
            InvoiceStatus::Cancelled => self.cancelled,
        }
    }
}

/// Money and status overview of one fiscal year.
///
/// Cancelled invoices are counted but contribute nothing to the amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalSummary {
    pub fiscal_year: FiscalYear,
    pub invoice_count: usize,
    pub by_status: StatusCounts,
    pub total_invoiced: Decimal,
    pub total_tax: Decimal,
    pub total_paid: Decimal,
    /// Σ outstanding per invoice; credits on overpaid invoices do not offset it.
    pub total_outstanding: Decimal,
}

impl FiscalSummary {
    pub fn from_invoices<'a, I>(fiscal_year: FiscalYear, invoices: I) -> Self
    where
        I: IntoIterator<Item = &'a Invoice>,
    {
        let mut summary = Self {
            fiscal_year,
            invoice_count: 0,
            by_status: StatusCounts::default(),
            total_invoiced: Decimal::ZERO,
            total_tax: Decimal::ZERO,
            total_paid: Decimal::ZERO,
            total_outstanding: Decimal::ZERO,
        };

        for invoice in filter_by_fiscal_year(invoices, fiscal_year) {
            summary.invoice_count += 1;
            summary.by_status.bump(invoice.status());
            if invoice.status() == InvoiceStatus::Cancelled {
                continue;
            }
            summary.total_invoiced += invoice.total_amount();
            summary.total_tax += invoice.totals().tax_amount;
            summary.total_paid += invoice.amount_paid();
            summary.total_outstanding += invoice.outstanding();
        }

        summary
    }
}

/// Render a summary as an HTML fragment for the report email body.
pub fn render_summary_html(summary: &FiscalSummary, currency: &str) -> String {
    let currency = escape_html(currency);
    let mut out = String::new();

    let _ = writeln!(out, "<h1>Financial Year {}</h1>", summary.fiscal_year);
    let _ = writeln!(
        out,
        "<p>{} invoices issued between {} and {}.</p>",
        summary.invoice_count,
        summary.fiscal_year.start(),
        summary.fiscal_year.end()
    );

    out.push_str("<table>\n");
    for (label, amount) in [
        ("Total invoiced", summary.total_invoiced),
        ("Tax collected", summary.total_tax),
        ("Total paid", summary.total_paid),
        ("Outstanding", summary.total_outstanding),
    ] {
        let _ = writeln!(
            out,
            "<tr><th>{label}</th><td>{} {currency}</td></tr>",
            format_money(amount)
        );
    }
    out.push_str("</table>\n");

    out.push_str("<ul>\n");
    for status in InvoiceStatus::ALL {
        let _ = writeln!(
            out,
            "<li>{}: {}</li>",
            status,
            summary.by_status.get(status)
        );
    }
    out.push_str("</ul>");

    out
}

/// Two decimal places, half-up.
pub fn format_money(amount: Decimal) -> String {
    format!("{:.2}", round_money(amount))
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
