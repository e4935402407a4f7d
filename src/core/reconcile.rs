//! Payment reconciliation.
//!
//! Recording a payment reads the invoice, derives the new `amount_paid` and
//! status, and commits the payment together with the invoice update,
//! conditional on the version that was read. A concurrent writer makes the
//! commit fail with [`BillingError::Conflict`] instead of silently dropping
//! one of the updates; nothing is retried here.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::config::{EngineConfig, OverpaymentPolicy};
use super::error::BillingError;
use super::store::InvoiceStore;
use super::types::{Invoice, InvoiceStatus, Payment, PaymentMethod, PaymentStatus};
use super::validation;

/// Caller-supplied details of a payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentInput {
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub method: PaymentMethod,
    pub reference_number: Option<String>,
    pub status: PaymentStatus,
    pub notes: Option<String>,
    pub created_by: Option<String>,
}

impl PaymentInput {
    /// A completed bank transfer of `amount` on `payment_date`.
    pub fn new(amount: Decimal, payment_date: NaiveDate) -> Self {
        Self {
            amount,
            payment_date,
            method: PaymentMethod::default(),
            reference_number: None,
            status: PaymentStatus::default(),
            notes: None,
            created_by: None,
        }
    }

    pub fn method(mut self, method: PaymentMethod) -> Self {
        self.method = method;
        self
    }

    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference_number = Some(reference.into());
        self
    }

    pub fn status(mut self, status: PaymentStatus) -> Self {
        self.status = status;
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn created_by(mut self, user: impl Into<String>) -> Self {
        self.created_by = Some(user.into());
        self
    }
}

/// Outcome of a committed payment or reversal.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub payment: Payment,
    /// Invoice as committed, carrying its new version.
    pub invoice: Invoice,
    pub previous_amount_paid: Decimal,
    pub previous_status: InvoiceStatus,
}

impl Reconciliation {
    pub fn amount_paid(&self) -> Decimal {
        self.invoice.amount_paid()
    }

    pub fn status(&self) -> InvoiceStatus {
        self.invoice.status()
    }

    pub fn outstanding(&self) -> Decimal {
        self.invoice.outstanding()
    }

    pub fn credit(&self) -> Decimal {
        self.invoice.credit()
    }
}

/// Applies payments and lifecycle transitions through an [`InvoiceStore`].
#[derive(Debug)]
pub struct Reconciler<S> {
    store: S,
    config: EngineConfig,
}

impl<S: InvoiceStore> Reconciler<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    pub fn with_config(store: S, config: EngineConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Record a payment against an invoice.
    ///
    /// Validation and policy failures happen before anything is written. A
    /// [`BillingError::Conflict`] means another writer committed first; the
    /// caller may simply call again.
    #[instrument(skip(self, input), fields(invoice_id = %invoice_id, amount = %input.amount))]
    pub fn record_payment(
        &self,
        invoice_id: Uuid,
        input: PaymentInput,
    ) -> Result<Reconciliation, BillingError> {
        let errors = validation::validate_payment(invoice_id, input.amount);
        if !errors.is_empty() {
            return Err(BillingError::from_validation(&errors));
        }

        let current = self.load(invoice_id)?;
        let expected_version = current.version();

        if self.config.overpayment == OverpaymentPolicy::Reject
            && input.amount > current.outstanding()
        {
            return Err(BillingError::Overpayment {
                outstanding: current.outstanding(),
                attempted: input.amount,
            });
        }

        let mut updated = current.clone();
        updated.apply_payment(input.amount)?;

        let payment = Payment {
            id: Uuid::new_v4(),
            invoice_id,
            amount: input.amount,
            payment_date: input.payment_date,
            method: input.method,
            reference_number: input.reference_number,
            status: input.status,
            notes: input.notes,
            created_by: input.created_by,
        };

        let committed = self
            .store
            .commit_payment(updated, expected_version, payment.clone())
            .inspect_err(|e| {
                if e.is_retriable() {
                    warn!(error = %e, "payment lost a concurrent update race");
                }
            })?;

        if !committed.credit().is_zero() {
            warn!(credit = %committed.credit(), "invoice overpaid");
        }
        info!(
            payment_id = %payment.id,
            amount_paid = %committed.amount_paid(),
            from = %current.status(),
            to = %committed.status(),
            "payment recorded"
        );

        Ok(Reconciliation {
            payment,
            invoice: committed,
            previous_amount_paid: current.amount_paid(),
            previous_status: current.status(),
        })
    }

    /// Remove a recorded payment and take its amount back off the invoice.
    ///
    /// This is the only path that lowers `amount_paid`. A `paid` invoice that
    /// is no longer covered returns to `sent`.
    #[instrument(skip(self), fields(payment_id = %payment_id))]
    pub fn reverse_payment(&self, payment_id: Uuid) -> Result<Reconciliation, BillingError> {
        let payment = self
            .store
            .get_payment(payment_id)?
            .ok_or_else(|| BillingError::NotFound(format!("payment {payment_id}")))?;
        let current = self.load(payment.invoice_id)?;

        let mut updated = current.clone();
        updated.reverse_payment(payment.amount)?;

        let committed = self
            .store
            .remove_payment(updated, current.version(), payment_id)?;
        info!(
            invoice_id = %committed.id(),
            amount_paid = %committed.amount_paid(),
            status = %committed.status(),
            "payment reversed"
        );

        Ok(Reconciliation {
            payment,
            invoice: committed,
            previous_amount_paid: current.amount_paid(),
            previous_status: current.status(),
        })
    }

    /// `draft → sent`.
    pub fn mark_sent(&self, invoice_id: Uuid) -> Result<Invoice, BillingError> {
        self.transition(invoice_id, Invoice::mark_sent)
    }

    /// Cancel a non-terminal invoice.
    pub fn cancel(&self, invoice_id: Uuid) -> Result<Invoice, BillingError> {
        self.transition(invoice_id, Invoice::cancel)
    }

    /// Move every sent invoice past its due date to `overdue`.
    /// Returns the invoices that changed.
    #[instrument(skip(self))]
    pub fn mark_overdue(&self, today: NaiveDate) -> Result<Vec<Invoice>, BillingError> {
        let mut changed = Vec::new();
        for invoice in self.store.list_invoices()? {
            if invoice.status() != InvoiceStatus::Sent {
                continue;
            }
            let expected_version = invoice.version();
            let mut updated = invoice;
            if updated.mark_overdue(today)? {
                changed.push(self.store.update_invoice(updated, expected_version)?);
            }
        }
        if !changed.is_empty() {
            info!(count = changed.len(), "invoices marked overdue");
        }
        Ok(changed)
    }

    /// Payments of an invoice, newest first.
    pub fn payments(&self, invoice_id: Uuid) -> Result<Vec<Payment>, BillingError> {
        self.store.payments_for(invoice_id)
    }

    fn load(&self, invoice_id: Uuid) -> Result<Invoice, BillingError> {
        self.store
            .get_invoice(invoice_id)?
            .ok_or_else(|| BillingError::NotFound(format!("invoice {invoice_id}")))
    }

    fn transition<F>(&self, invoice_id: Uuid, apply: F) -> Result<Invoice, BillingError>
    where
        F: FnOnce(&mut Invoice) -> Result<(), BillingError>,
    {
        let current = self.load(invoice_id)?;
        let from = current.status();
        let expected_version = current.version();
        let mut updated = current;
        apply(&mut updated)?;
        let committed = self.store.update_invoice(updated, expected_version)?;
        info!(invoice_id = %invoice_id, %from, to = %committed.status(), "invoice status changed");
        Ok(committed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::builder::*;
    use crate::core::store::MemoryStore;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn setup(total: Decimal) -> (Reconciler<MemoryStore>, Uuid) {
        let reconciler = Reconciler::new(MemoryStore::new());
        let invoice = InvoiceBuilder::new("INV-1", Uuid::new_v4(), date(2024, 6, 1), date(2024, 7, 1))
            .add_item(LineItemBuilder::new("Retainer", dec!(1), total).build())
            .build()
            .unwrap();
        let id = reconciler.store().insert_invoice(invoice).unwrap().id();
        (reconciler, id)
    }

    #[test]
    fn full_payment_marks_paid() {
        let (rec, id) = setup(dec!(100.00));
        let result = rec
            .record_payment(id, PaymentInput::new(dec!(100.00), date(2024, 6, 10)))
            .unwrap();
        assert_eq!(result.status(), InvoiceStatus::Paid);
        assert_eq!(result.amount_paid(), dec!(100.00));
        assert_eq!(result.previous_status, InvoiceStatus::Draft);
        assert_eq!(result.invoice.version(), 1);
    }

    #[test]
    fn partial_payment_keeps_sent() {
        let (rec, id) = setup(dec!(100.00));
        let result = rec
            .record_payment(id, PaymentInput::new(dec!(40.00), date(2024, 6, 10)))
            .unwrap();
        assert_eq!(result.status(), InvoiceStatus::Sent);
        assert_eq!(result.amount_paid(), dec!(40.00));
        assert_eq!(result.outstanding(), dec!(60.00));
    }

    #[test]
    fn non_positive_amount_writes_nothing() {
        let (rec, id) = setup(dec!(100));
        let err = rec
            .record_payment(id, PaymentInput::new(dec!(0), date(2024, 6, 10)))
            .unwrap_err();
        assert!(matches!(err, BillingError::Validation(_)));
        assert!(rec.payments(id).unwrap().is_empty());
    }

    #[test]
    fn unknown_invoice() {
        let (rec, _) = setup(dec!(100));
        let err = rec
            .record_payment(Uuid::new_v4(), PaymentInput::new(dec!(1), date(2024, 6, 10)))
            .unwrap_err();
        assert!(matches!(err, BillingError::NotFound(_)));
    }

    #[test]
    fn reject_policy_refuses_overpayment() {
        let (rec, id) = setup(dec!(100));
        let config = EngineConfig {
            overpayment: OverpaymentPolicy::Reject,
            ..EngineConfig::default()
        };
        let rec = Reconciler::with_config(rec.store, config);

        let err = rec
            .record_payment(id, PaymentInput::new(dec!(100.01), date(2024, 6, 10)))
            .unwrap_err();
        assert!(matches!(err, BillingError::Overpayment { .. }));
        assert!(rec.payments(id).unwrap().is_empty());
    }

    #[test]
    fn allow_policy_keeps_credit() {
        let (rec, id) = setup(dec!(100));
        let result = rec
            .record_payment(id, PaymentInput::new(dec!(130), date(2024, 6, 10)))
            .unwrap();
        assert_eq!(result.status(), InvoiceStatus::Paid);
        assert_eq!(result.credit(), dec!(30));
        assert!(result.outstanding().is_zero());
    }

    #[test]
    fn reversal_reopens_invoice() {
        let (rec, id) = setup(dec!(100));
        rec.record_payment(id, PaymentInput::new(dec!(60), date(2024, 6, 10)))
            .unwrap();
        let second = rec
            .record_payment(id, PaymentInput::new(dec!(40), date(2024, 6, 11)))
            .unwrap();
        assert_eq!(second.status(), InvoiceStatus::Paid);

        let reversed = rec.reverse_payment(second.payment.id).unwrap();
        assert_eq!(reversed.status(), InvoiceStatus::Sent);
        assert_eq!(reversed.amount_paid(), dec!(60));
        assert_eq!(rec.payments(id).unwrap().len(), 1);
    }

    #[test]
    fn cancelled_invoice_refuses_payment() {
        let (rec, id) = setup(dec!(100));
        rec.cancel(id).unwrap();
        let err = rec
            .record_payment(id, PaymentInput::new(dec!(10), date(2024, 6, 10)))
            .unwrap_err();
        assert!(matches!(
            err,
            BillingError::InvalidTransition {
                from: InvoiceStatus::Cancelled,
                ..
            }
        ));
    }

    #[test]
    fn overdue_sweep() {
        let (rec, id) = setup(dec!(100));
        assert!(rec.mark_overdue(date(2024, 8, 1)).unwrap().is_empty());
        rec.mark_sent(id).unwrap();
        let changed = rec.mark_overdue(date(2024, 8, 1)).unwrap();
        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].status(), InvoiceStatus::Overdue);
    }
}
