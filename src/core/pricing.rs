use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{BillingError, ValidationError};
use super::types::{LineItem, Totals};

/// Per-item amounts, in the order they are derived: discount before tax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineBreakdown {
    /// quantity × unit_price.
    pub gross: Decimal,
    pub discount: Decimal,
    /// gross - discount.
    pub net: Decimal,
    /// Tax on `net`.
    pub tax: Decimal,
    /// net + tax.
    pub total: Decimal,
}

/// `amount * percent / 100`, or `None` if it leaves Decimal's range.
pub fn percent_of(amount: Decimal, percent: Decimal) -> Option<Decimal> {
    amount.checked_mul(percent)?.checked_div(dec!(100))
}

/// Round to currency minor units (2 dp) using half-up (commercial rounding).
///
/// The engine itself never rounds; this is for the persistence and
/// presentation boundary.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

impl LineItem {
    /// Derive gross, discount, net, tax and total without checking the
    /// input ranges. `None` when an intermediate amount overflows.
    pub fn breakdown(&self) -> Option<LineBreakdown> {
        let gross = self.quantity.checked_mul(self.unit_price)?;
        let discount = percent_of(gross, self.discount_percent)?;
        let net = gross.checked_sub(discount)?;
        let tax = percent_of(net, self.tax_rate)?;
        Some(LineBreakdown {
            gross,
            discount,
            net,
            tax,
            total: net.checked_add(tax)?,
        })
    }

    /// `((quantity * unit_price) - discount) + tax`.
    pub fn line_total(&self) -> Option<Decimal> {
        self.breakdown().map(|b| b.total)
    }

    /// Like [`breakdown`](Self::breakdown), but refuses inputs outside the
    /// arithmetic preconditions (negative quantity or price, percentages
    /// outside 0–100) and amounts too large to represent.
    pub fn checked_breakdown(&self) -> Result<LineBreakdown, ValidationError> {
        if self.quantity.is_sign_negative() && !self.quantity.is_zero() {
            return Err(ValidationError::with_rule(
                "quantity",
                "quantity must not be negative",
                "LINE-02",
            ));
        }
        if self.unit_price.is_sign_negative() && !self.unit_price.is_zero() {
            return Err(ValidationError::with_rule(
                "unit_price",
                "unit price must not be negative",
                "LINE-03",
            ));
        }
        if !is_percentage(self.discount_percent) {
            return Err(ValidationError::with_rule(
                "discount_percent",
                format!("discount {} must be between 0 and 100", self.discount_percent),
                "LINE-04",
            ));
        }
        if !is_percentage(self.tax_rate) {
            return Err(ValidationError::with_rule(
                "tax_rate",
                format!("tax rate {} must be between 0 and 100", self.tax_rate),
                "LINE-05",
            ));
        }
        self.breakdown().ok_or_else(|| {
            ValidationError::with_rule(
                "quantity",
                format!(
                    "{} x {} exceeds the representable amount range",
                    self.quantity, self.unit_price
                ),
                "LINE-06",
            )
        })
    }
}

fn is_percentage(value: Decimal) -> bool {
    value >= Decimal::ZERO && value <= dec!(100)
}

/// Fold line items into invoice aggregates.
///
/// Each aggregate is summed from every item's own contribution, so discount
/// and tax stay separately reportable. Always recomputes from the full
/// sequence; an empty sequence yields all zeros. The first item that fails
/// [`LineItem::checked_breakdown`] aborts the fold with
/// [`BillingError::InvalidLine`], as does the item whose contribution pushes
/// a sum past the `Decimal` range.
pub fn compute_totals(items: &[LineItem]) -> Result<Totals, BillingError> {
    let mut subtotal = Decimal::ZERO;
    let mut discount_amount = Decimal::ZERO;
    let mut tax_amount = Decimal::ZERO;

    for (index, item) in items.iter().enumerate() {
        let line = item
            .checked_breakdown()
            .map_err(|e| BillingError::InvalidLine {
                index,
                reason: e.to_string(),
            })?;
        let overflow = || BillingError::InvalidLine {
            index,
            reason: "invoice totals exceed the representable amount range".into(),
        };
        subtotal = subtotal.checked_add(line.gross).ok_or_else(overflow)?;
        discount_amount = discount_amount
            .checked_add(line.discount)
            .ok_or_else(overflow)?;
        tax_amount = tax_amount.checked_add(line.tax).ok_or_else(overflow)?;
    }

    // Both non-negative: the subtraction cannot overflow
    let total_amount = (subtotal - discount_amount)
        .checked_add(tax_amount)
        .ok_or_else(|| BillingError::InvalidLine {
            index: items.len().saturating_sub(1),
            reason: "invoice total exceeds the representable amount range".into(),
        })?;

    let totals = Totals {
        subtotal,
        discount_amount,
        tax_amount,
        total_amount,
    };
    debug!(
        items = items.len(),
        subtotal = %totals.subtotal,
        total = %totals.total_amount,
        "recomputed invoice totals"
    );
    Ok(totals)
}

/// Sum of `line_total` over all items, the second path to `total_amount`.
/// `None` on overflow.
pub fn sum_line_totals(items: &[LineItem]) -> Option<Decimal> {
    items
        .iter()
        .try_fold(Decimal::ZERO, |acc, item| acc.checked_add(item.line_total()?))
}
