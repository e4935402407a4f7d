//! Invoice lifecycle state machine and draft editing.
//!
//! ```text
//! draft ──► sent ──► overdue
//!   │        │  ▲       │
//!   │        ▼  └───────┤ (partial payment)
//!   ├──────► paid ◄─────┤
//!   └──────► cancelled ◄┘
//! ```
//!
//! `paid` and `cancelled` are terminal. Nothing here lowers `amount_paid`
//! except an explicit payment reversal.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::error::BillingError;
use super::pricing::compute_totals;
use super::types::{Invoice, InvoiceStatus, LineItem};

impl InvoiceStatus {
    /// Whether the state machine permits moving from `self` to `next`.
    ///
    /// Self-transitions are allowed for `sent` and `paid` so that a further
    /// partial payment (or a payment on a settled invoice) can be recorded.
    pub fn can_transition_to(&self, next: InvoiceStatus) -> bool {
        use InvoiceStatus::*;
        matches!(
            (self, next),
            (Draft, Sent | Paid | Cancelled)
                | (Sent, Sent | Paid | Overdue | Cancelled)
                | (Overdue, Sent | Paid | Cancelled)
                | (Paid, Paid)
        )
    }
}

/// Status an invoice takes after a payment brings `amount_paid` to the given value.
pub fn status_after_payment(amount_paid: Decimal, total_amount: Decimal) -> InvoiceStatus {
    if amount_paid >= total_amount {
        InvoiceStatus::Paid
    } else {
        InvoiceStatus::Sent
    }
}

impl Invoice {
    /// `draft → sent`.
    pub fn mark_sent(&mut self) -> Result<(), BillingError> {
        self.require(InvoiceStatus::Draft, InvoiceStatus::Sent)?;
        self.transition(InvoiceStatus::Sent)
    }

    /// `sent → overdue` when the due date has passed and money is still owed.
    ///
    /// Returns `Ok(false)` when the invoice is sent but not yet overdue.
    pub fn mark_overdue(&mut self, today: NaiveDate) -> Result<bool, BillingError> {
        self.require(InvoiceStatus::Sent, InvoiceStatus::Overdue)?;
        if self.due_date >= today || self.outstanding().is_zero() {
            return Ok(false);
        }
        self.transition(InvoiceStatus::Overdue)?;
        Ok(true)
    }

    /// Any non-terminal status `→ cancelled`.
    pub fn cancel(&mut self) -> Result<(), BillingError> {
        self.transition(InvoiceStatus::Cancelled)
    }

    /// Append an item to a draft and recompute totals.
    pub fn add_item(&mut self, item: LineItem) -> Result<(), BillingError> {
        let mut items = self.items.clone();
        items.push(item);
        self.replace_items(items)
    }

    /// Replace the item at `index` in a draft and recompute totals.
    pub fn replace_item(&mut self, index: usize, item: LineItem) -> Result<(), BillingError> {
        let mut items = self.items.clone();
        let slot = items
            .get_mut(index)
            .ok_or_else(|| BillingError::NotFound(format!("line item {index}")))?;
        *slot = item;
        self.replace_items(items)
    }

    /// Remove the item at `index` from a draft and recompute totals.
    /// The last remaining item cannot be removed.
    pub fn remove_item(&mut self, index: usize) -> Result<LineItem, BillingError> {
        if index >= self.items.len() {
            return Err(BillingError::NotFound(format!("line item {index}")));
        }
        if self.items.len() == 1 {
            return Err(BillingError::Validation(
                "an invoice must keep at least one line item".into(),
            ));
        }
        let mut items = self.items.clone();
        let removed = items.remove(index);
        self.replace_items(items)?;
        Ok(removed)
    }

    fn replace_items(&mut self, items: Vec<LineItem>) -> Result<(), BillingError> {
        if !self.status.is_editable() {
            return Err(BillingError::InvalidTransition {
                from: self.status,
                to: InvoiceStatus::Draft,
            });
        }
        // Nothing is swapped in unless the new item set prices cleanly.
        self.totals = compute_totals(&items)?;
        self.items = items;
        Ok(())
    }

    /// Add a payment amount and move to the resulting status.
    ///
    /// Cancelled invoices accept no payments.
    pub(crate) fn apply_payment(&mut self, amount: Decimal) -> Result<(), BillingError> {
        let amount_paid = self.amount_paid.checked_add(amount).ok_or_else(|| {
            BillingError::Validation(format!(
                "payment {amount} would push amount paid {} past the representable range",
                self.amount_paid
            ))
        })?;
        let next = status_after_payment(amount_paid, self.totals.total_amount);
        if !self.status.can_transition_to(next) {
            return Err(BillingError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.amount_paid = amount_paid;
        self.status = next;
        Ok(())
    }

    /// Subtract a reversed payment. A `paid` invoice that is no longer fully
    /// covered returns to `sent`; every other status is kept.
    pub(crate) fn reverse_payment(&mut self, amount: Decimal) -> Result<(), BillingError> {
        self.amount_paid = self.amount_paid.checked_sub(amount).ok_or_else(|| {
            BillingError::Validation(format!(
                "reversing {amount} from amount paid {} leaves the representable range",
                self.amount_paid
            ))
        })?;
        if self.status == InvoiceStatus::Paid && self.amount_paid < self.totals.total_amount {
            self.status = InvoiceStatus::Sent;
        }
        Ok(())
    }

    fn require(&self, from: InvoiceStatus, to: InvoiceStatus) -> Result<(), BillingError> {
        if self.status != from {
            return Err(BillingError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        Ok(())
    }

    fn transition(&mut self, next: InvoiceStatus) -> Result<(), BillingError> {
        if !self.status.can_transition_to(next) {
            return Err(BillingError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::builder::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn invoice(total: Decimal) -> Invoice {
        InvoiceBuilder::new("INV-1", Uuid::new_v4(), date(2024, 4, 10), date(2024, 5, 10))
            .add_item(LineItemBuilder::new("Retainer", dec!(1), total).build())
            .build()
            .unwrap()
    }

    #[test]
    fn payment_rule() {
        assert_eq!(status_after_payment(dec!(100), dec!(100)), InvoiceStatus::Paid);
        assert_eq!(status_after_payment(dec!(120), dec!(100)), InvoiceStatus::Paid);
        assert_eq!(status_after_payment(dec!(40), dec!(100)), InvoiceStatus::Sent);
    }

    #[test]
    fn terminal_states_have_no_exits() {
        for next in InvoiceStatus::ALL {
            assert!(!InvoiceStatus::Cancelled.can_transition_to(next));
            assert_eq!(
                InvoiceStatus::Paid.can_transition_to(next),
                next == InvoiceStatus::Paid
            );
        }
    }

    #[test]
    fn full_payment_from_draft() {
        let mut inv = invoice(dec!(100));
        inv.apply_payment(dec!(100)).unwrap();
        assert_eq!(inv.status(), InvoiceStatus::Paid);
        assert_eq!(inv.amount_paid(), dec!(100));
    }

    #[test]
    fn partial_payment_moves_to_sent() {
        let mut inv = invoice(dec!(100));
        inv.apply_payment(dec!(40)).unwrap();
        assert_eq!(inv.status(), InvoiceStatus::Sent);
        assert_eq!(inv.outstanding(), dec!(60));
    }

    #[test]
    fn cancelled_invoice_rejects_payment() {
        let mut inv = invoice(dec!(100));
        inv.cancel().unwrap();
        let err = inv.apply_payment(dec!(10)).unwrap_err();
        assert!(matches!(err, BillingError::InvalidTransition { .. }));
        assert!(inv.amount_paid().is_zero());
    }

    #[test]
    fn payment_overflow_leaves_invoice_unchanged() {
        let mut inv = invoice(dec!(100));
        inv.apply_payment(Decimal::MAX).unwrap();
        let err = inv.apply_payment(Decimal::MAX).unwrap_err();
        assert!(matches!(err, BillingError::Validation(_)));
        assert_eq!(inv.amount_paid(), Decimal::MAX);
        assert_eq!(inv.status(), InvoiceStatus::Paid);
    }

    #[test]
    fn overdue_only_after_due_date() {
        let mut inv = invoice(dec!(100));
        assert!(inv.mark_overdue(date(2024, 6, 1)).is_err());
        inv.mark_sent().unwrap();
        assert!(!inv.mark_overdue(date(2024, 5, 10)).unwrap());
        assert!(inv.mark_overdue(date(2024, 5, 11)).unwrap());
        assert_eq!(inv.status(), InvoiceStatus::Overdue);
    }

    #[test]
    fn reversal_reopens_paid_invoice() {
        let mut inv = invoice(dec!(100));
        inv.apply_payment(dec!(100)).unwrap();
        inv.reverse_payment(dec!(30)).unwrap();
        assert_eq!(inv.status(), InvoiceStatus::Sent);
        assert_eq!(inv.amount_paid(), dec!(70));
    }

    #[test]
    fn editing_recomputes_totals() {
        let mut inv = invoice(dec!(100));
        inv.add_item(
            LineItemBuilder::new("Setup", dec!(2), dec!(25))
                .tax_rate(dec!(10))
                .build(),
        )
        .unwrap();
        assert_eq!(inv.total_amount(), dec!(155));

        inv.replace_item(1, LineItemBuilder::new("Setup", dec!(1), dec!(25)).build())
            .unwrap();
        assert_eq!(inv.total_amount(), dec!(125));

        inv.remove_item(0).unwrap();
        assert_eq!(inv.total_amount(), dec!(25));
        assert!(inv.remove_item(0).is_err());
    }

    #[test]
    fn invalid_edit_leaves_invoice_untouched() {
        let mut inv = invoice(dec!(100));
        let bad = LineItemBuilder::new("Bad", dec!(1), dec!(10))
            .discount(dec!(150))
            .build();
        assert!(inv.add_item(bad).is_err());
        assert_eq!(inv.items().len(), 1);
        assert_eq!(inv.total_amount(), dec!(100));
    }

    #[test]
    fn only_drafts_are_editable() {
        let mut inv = invoice(dec!(100));
        inv.mark_sent().unwrap();
        let err = inv
            .add_item(LineItemBuilder::new("Extra", dec!(1), dec!(1)).build())
            .unwrap_err();
        assert!(matches!(err, BillingError::InvalidTransition { .. }));
    }
}
