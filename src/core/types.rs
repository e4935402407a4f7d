use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::BillingError;

/// An invoice: client reference, dates, ordered line items and the
/// aggregate/payment state derived from them.
///
/// The aggregates, `amount_paid`, `status` and `version` are private: the
/// aggregator owns the totals, reconciliation owns `amount_paid`, and the
/// lifecycle state machine owns `status`. They still deserialize, so a
/// store rechecks them on every write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub(crate) id: Uuid,
    /// Human-facing invoice number (e.g. "INV-2024-2025-001").
    pub number: String,
    /// Billed client.
    pub client_id: Uuid,
    pub issue_date: NaiveDate,
    /// Expected to be on or after `issue_date`; not enforced.
    pub due_date: NaiveDate,
    pub notes: Option<String>,
    pub(crate) items: Vec<LineItem>,
    pub(crate) totals: Totals,
    pub(crate) amount_paid: Decimal,
    pub(crate) status: InvoiceStatus,
    /// Advanced by the store on every committed write; compare-and-swap key.
    pub(crate) version: u64,
}

impl Invoice {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Line items in insertion order.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn totals(&self) -> &Totals {
        &self.totals
    }

    pub fn total_amount(&self) -> Decimal {
        self.totals.total_amount
    }

    pub fn amount_paid(&self) -> Decimal {
        self.amount_paid
    }

    pub fn status(&self) -> InvoiceStatus {
        self.status
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Advance the version after a successful conditional write.
    ///
    /// Intended for [`InvoiceStore`](super::InvoiceStore) implementations;
    /// the engine never calls it on uncommitted copies.
    pub fn committed(mut self) -> Self {
        // A hand-set u64::MAX wraps instead of panicking
        self.version = self.version.wrapping_add(1);
        self
    }

    /// `total_amount - amount_paid`. Negative when the client holds a credit.
    pub fn balance(&self) -> Decimal {
        self.totals.total_amount - self.amount_paid
    }

    /// Amount still owed, never negative.
    pub fn outstanding(&self) -> Decimal {
        self.balance().max(Decimal::ZERO)
    }

    /// Amount paid beyond the invoice total, never negative.
    pub fn credit(&self) -> Decimal {
        (-self.balance()).max(Decimal::ZERO)
    }
}

/// One billable row of an invoice.
///
/// `line_total` is not a field: it is always recomputed from quantity,
/// price, discount and tax (see [`LineItem::line_total`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Weak reference to a catalogue product.
    pub product_id: Option<Uuid>,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    /// Tax rate in percent (0–100), applied after the discount.
    pub tax_rate: Decimal,
    /// Discount in percent (0–100) of `quantity * unit_price`.
    pub discount_percent: Decimal,
}

/// Invoice aggregates produced by [`compute_totals`](super::compute_totals).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Totals {
    /// Σ quantity × unit_price.
    pub subtotal: Decimal,
    /// Σ per-item discount.
    pub discount_amount: Decimal,
    /// Σ per-item tax on the discounted amount.
    pub tax_amount: Decimal,
    /// subtotal - discount_amount + tax_amount.
    pub total_amount: Decimal,
}

/// A recorded payment against an invoice. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub method: PaymentMethod,
    pub reference_number: Option<String>,
    pub status: PaymentStatus,
    pub notes: Option<String>,
    /// Acting user as supplied by the auth collaborator.
    pub created_by: Option<String>,
}

/// Invoice lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
    Overdue,
    Cancelled,
}

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 5] = [
        Self::Draft,
        Self::Sent,
        Self::Paid,
        Self::Overdue,
        Self::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Paid => "paid",
            Self::Overdue => "overdue",
            Self::Cancelled => "cancelled",
        }
    }

    /// `paid` and `cancelled` end the payment-driven lifecycle.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Paid | Self::Cancelled)
    }

    /// Only drafts may have their items edited or be deleted.
    pub fn is_editable(&self) -> bool {
        *self == Self::Draft
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "sent" => Ok(Self::Sent),
            "paid" => Ok(Self::Paid),
            "overdue" => Ok(Self::Overdue),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(BillingError::Validation(format!(
                "unknown invoice status '{other}'"
            ))),
        }
    }
}

/// How a payment was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    #[default]
    BankTransfer,
    Check,
    CreditCard,
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::BankTransfer => "bank_transfer",
            Self::Check => "check",
            Self::CreditCard => "credit_card",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(Self::Cash),
            "bank_transfer" => Ok(Self::BankTransfer),
            "check" => Ok(Self::Check),
            "credit_card" => Ok(Self::CreditCard),
            "other" => Ok(Self::Other),
            other => Err(BillingError::Validation(format!(
                "unknown payment method '{other}'"
            ))),
        }
    }
}

/// Settlement state of a payment as reported by the payer's channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    #[default]
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "refunded" => Ok(Self::Refunded),
            other => Err(BillingError::Validation(format!(
                "unknown payment status '{other}'"
            ))),
        }
    }
}
