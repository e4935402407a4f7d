//! Storage boundary.
//!
//! The relational store is an external collaborator; [`InvoiceStore`] is the
//! contract the engine needs from it. Every write that touches an invoice is
//! conditional on the version the caller read, and payment writes change the
//! payment table and the invoice row together or not at all. Rows whose
//! totals, payments or status contradict their items are refused.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use uuid::Uuid;

use super::error::BillingError;
use super::pricing::compute_totals;
use super::types::{Invoice, Payment};
use super::validation::validate_row;

/// Persistence contract for invoices and their payments.
///
/// Methods taking `expected_version` must fail with
/// [`BillingError::Conflict`] when either the stored invoice's version or the
/// version carried by the given invoice differs from it. A caller cannot
/// write a snapshot older than the version it claims to have read. When both
/// match, the invoice is stored with its version advanced
/// ([`Invoice::committed`]) and the committed row is returned.
///
/// Every write that carries an invoice must refuse it with
/// [`BillingError::Validation`] (or [`BillingError::InvalidLine`]) when its
/// totals, `amount_paid` or status contradict its items ([`validate_row`]).
pub trait InvoiceStore: Send + Sync {
    /// Insert a new invoice with its items.
    fn insert_invoice(&self, invoice: Invoice) -> Result<Invoice, BillingError>;

    fn get_invoice(&self, id: Uuid) -> Result<Option<Invoice>, BillingError>;

    fn list_invoices(&self) -> Result<Vec<Invoice>, BillingError>;

    /// Replace an invoice row (items, totals, status) conditionally.
    fn update_invoice(&self, invoice: Invoice, expected_version: u64)
        -> Result<Invoice, BillingError>;

    /// Delete an invoice and its payments conditionally.
    fn delete_invoice(&self, id: Uuid, expected_version: u64) -> Result<(), BillingError>;

    /// Append `payment` and replace the invoice row in one atomic unit.
    fn commit_payment(
        &self,
        invoice: Invoice,
        expected_version: u64,
        payment: Payment,
    ) -> Result<Invoice, BillingError>;

    /// Remove a payment and replace the invoice row in one atomic unit.
    fn remove_payment(
        &self,
        invoice: Invoice,
        expected_version: u64,
        payment_id: Uuid,
    ) -> Result<Invoice, BillingError>;

    fn get_payment(&self, id: Uuid) -> Result<Option<Payment>, BillingError>;

    /// Payments of one invoice, newest `payment_date` first.
    fn payments_for(&self, invoice_id: Uuid) -> Result<Vec<Payment>, BillingError>;
}

impl<T: InvoiceStore + ?Sized> InvoiceStore for Arc<T> {
    fn insert_invoice(&self, invoice: Invoice) -> Result<Invoice, BillingError> {
        (**self).insert_invoice(invoice)
    }

    fn get_invoice(&self, id: Uuid) -> Result<Option<Invoice>, BillingError> {
        (**self).get_invoice(id)
    }

    fn list_invoices(&self) -> Result<Vec<Invoice>, BillingError> {
        (**self).list_invoices()
    }

    fn update_invoice(
        &self,
        invoice: Invoice,
        expected_version: u64,
    ) -> Result<Invoice, BillingError> {
        (**self).update_invoice(invoice, expected_version)
    }

    fn delete_invoice(&self, id: Uuid, expected_version: u64) -> Result<(), BillingError> {
        (**self).delete_invoice(id, expected_version)
    }

    fn commit_payment(
        &self,
        invoice: Invoice,
        expected_version: u64,
        payment: Payment,
    ) -> Result<Invoice, BillingError> {
        (**self).commit_payment(invoice, expected_version, payment)
    }

    fn remove_payment(
        &self,
        invoice: Invoice,
        expected_version: u64,
        payment_id: Uuid,
    ) -> Result<Invoice, BillingError> {
        (**self).remove_payment(invoice, expected_version, payment_id)
    }

    fn get_payment(&self, id: Uuid) -> Result<Option<Payment>, BillingError> {
        (**self).get_payment(id)
    }

    fn payments_for(&self, invoice_id: Uuid) -> Result<Vec<Payment>, BillingError> {
        (**self).payments_for(invoice_id)
    }
}

#[derive(Debug, Default)]
struct Tables {
    invoices: HashMap<Uuid, Invoice>,
    // Insertion order
    payments: Vec<Payment>,
}

/// Refuse a row whose derived columns do not follow from its items.
fn check_row(invoice: &Invoice) -> Result<(), BillingError> {
    compute_totals(&invoice.items)?;
    let errors = validate_row(invoice);
    if !errors.is_empty() {
        return Err(BillingError::from_validation(&errors));
    }
    Ok(())
}

/// The snapshot being written must be the one read at `expected_version`.
fn check_snapshot(invoice: &Invoice, expected_version: u64) -> Result<(), BillingError> {
    if invoice.version != expected_version {
        return Err(BillingError::Conflict {
            invoice_id: invoice.id,
            expected: expected_version,
            actual: invoice.version,
        });
    }
    Ok(())
}

impl Tables {
    /// The stored row, provided it is still at `expected_version`.
    fn row_at(&mut self, id: Uuid, expected_version: u64) -> Result<&mut Invoice, BillingError> {
        let stored = self
            .invoices
            .get_mut(&id)
            .ok_or_else(|| BillingError::NotFound(format!("invoice {id}")))?;
        if stored.version != expected_version {
            return Err(BillingError::Conflict {
                invoice_id: id,
                expected: expected_version,
                actual: stored.version,
            });
        }
        Ok(stored)
    }
}

/// In-process [`InvoiceStore`]. One lock guards all tables, so each
/// conditional write is a single critical section.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InvoiceStore for MemoryStore {
    fn insert_invoice(&self, invoice: Invoice) -> Result<Invoice, BillingError> {
        check_row(&invoice)?;
        let mut tables = self.tables.write();
        if tables.invoices.contains_key(&invoice.id) {
            return Err(BillingError::Storage(format!(
                "invoice {} already exists",
                invoice.id
            )));
        }
        tables.invoices.insert(invoice.id, invoice.clone());
        Ok(invoice)
    }

    fn get_invoice(&self, id: Uuid) -> Result<Option<Invoice>, BillingError> {
        Ok(self.tables.read().invoices.get(&id).cloned())
    }

    fn list_invoices(&self) -> Result<Vec<Invoice>, BillingError> {
        let mut invoices: Vec<_> = self.tables.read().invoices.values().cloned().collect();
        invoices.sort_by(|a, b| b.issue_date.cmp(&a.issue_date).then(a.number.cmp(&b.number)));
        Ok(invoices)
    }

    fn update_invoice(
        &self,
        invoice: Invoice,
        expected_version: u64,
    ) -> Result<Invoice, BillingError> {
        check_snapshot(&invoice, expected_version)?;
        check_row(&invoice)?;
        let mut tables = self.tables.write();
        let row = tables.row_at(invoice.id, expected_version)?;
        *row = invoice.committed();
        Ok(row.clone())
    }

    fn delete_invoice(&self, id: Uuid, expected_version: u64) -> Result<(), BillingError> {
        let mut tables = self.tables.write();
        tables.row_at(id, expected_version)?;
        tables.invoices.remove(&id);
        tables.payments.retain(|p| p.invoice_id != id);
        Ok(())
    }

    fn commit_payment(
        &self,
        invoice: Invoice,
        expected_version: u64,
        payment: Payment,
    ) -> Result<Invoice, BillingError> {
        if payment.invoice_id != invoice.id {
            return Err(BillingError::Validation(format!(
                "payment {} belongs to invoice {}, not {}",
                payment.id, payment.invoice_id, invoice.id
            )));
        }
        check_snapshot(&invoice, expected_version)?;
        check_row(&invoice)?;
        let mut tables = self.tables.write();
        if tables.payments.iter().any(|p| p.id == payment.id) {
            return Err(BillingError::Storage(format!(
                "payment {} already exists",
                payment.id
            )));
        }
        let row = tables.row_at(invoice.id, expected_version)?;
        *row = invoice.committed();
        let committed = row.clone();
        tables.payments.push(payment);
        Ok(committed)
    }

    fn remove_payment(
        &self,
        invoice: Invoice,
        expected_version: u64,
        payment_id: Uuid,
    ) -> Result<Invoice, BillingError> {
        check_snapshot(&invoice, expected_version)?;
        check_row(&invoice)?;
        let mut tables = self.tables.write();
        let position = tables
            .payments
            .iter()
            .position(|p| p.id == payment_id && p.invoice_id == invoice.id)
            .ok_or_else(|| BillingError::NotFound(format!("payment {payment_id}")))?;
        let row = tables.row_at(invoice.id, expected_version)?;
        *row = invoice.committed();
        let committed = row.clone();
        tables.payments.remove(position);
        Ok(committed)
    }

    fn get_payment(&self, id: Uuid) -> Result<Option<Payment>, BillingError> {
        Ok(self
            .tables
            .read()
            .payments
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    fn payments_for(&self, invoice_id: Uuid) -> Result<Vec<Payment>, BillingError> {
        let mut payments: Vec<_> = self
            .tables
            .read()
            .payments
            .iter()
            .filter(|p| p.invoice_id == invoice_id)
            .cloned()
            .collect();
        // Stable: same-day payments keep insertion order
        payments.sort_by(|a, b| b.payment_date.cmp(&a.payment_date));
        Ok(payments)
    }
}
