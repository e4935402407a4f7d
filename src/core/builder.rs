use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::error::BillingError;
use super::pricing::compute_totals;
use super::types::*;
use super::validation;

/// Builder for constructing new invoices.
///
/// Every invoice starts in `draft` with nothing paid; totals are computed
/// from the items at build time.
///
/// ```
/// use billdesk::core::*;
/// use rust_decimal_macros::dec;
/// use chrono::NaiveDate;
/// use uuid::Uuid;
///
/// let invoice = InvoiceBuilder::new(
///     "INV-2024-2025-001",
///     Uuid::new_v4(),
///     NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
///     NaiveDate::from_ymd_opt(2024, 7, 15).unwrap(),
/// )
/// .add_item(LineItemBuilder::new("Consulting", dec!(2), dec!(50.00))
///     .discount(dec!(10))
///     .tax_rate(dec!(18))
///     .build())
/// .build()
/// .unwrap();
///
/// assert_eq!(invoice.total_amount(), dec!(106.20));
/// assert_eq!(invoice.status(), InvoiceStatus::Draft);
/// ```
pub struct InvoiceBuilder {
    id: Option<Uuid>,
    number: String,
    client_id: Uuid,
    issue_date: NaiveDate,
    due_date: NaiveDate,
    notes: Option<String>,
    items: Vec<LineItem>,
}

impl InvoiceBuilder {
    pub fn new(
        number: impl Into<String>,
        client_id: Uuid,
        issue_date: NaiveDate,
        due_date: NaiveDate,
    ) -> Self {
        Self {
            id: None,
            number: number.into(),
            client_id,
            issue_date,
            due_date,
            notes: None,
            items: Vec::new(),
        }
    }

    /// Use a caller-chosen identifier instead of a random one.
    pub fn id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn add_item(mut self, item: LineItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn items(mut self, items: impl IntoIterator<Item = LineItem>) -> Self {
        self.items.extend(items);
        self
    }

    /// Build the invoice, computing totals and running validation.
    /// Returns all validation errors (not just the first), line-level ones
    /// included. Only a sum that overflows after every line passes comes
    /// back as [`BillingError::InvalidLine`].
    pub fn build(self) -> Result<Invoice, BillingError> {
        if self.items.is_empty() {
            return Err(BillingError::Validation(
                "at least one line item is required".into(),
            ));
        }

        // Input limits to prevent abuse
        if self.items.len() > 10_000 {
            return Err(BillingError::Validation(
                "invoice cannot have more than 10,000 line items".into(),
            ));
        }
        if self.number.len() > 200 {
            return Err(BillingError::Validation(
                "invoice number cannot exceed 200 characters".into(),
            ));
        }

        // Validate before pricing so a bad line does not hide other errors
        let totals = compute_totals(&self.items);
        let invoice = self.into_invoice(totals.as_ref().copied().unwrap_or_default());

        let errors = validation::validate_invoice(&invoice);
        if !errors.is_empty() {
            return Err(BillingError::from_validation(&errors));
        }

        // Lines price individually but their sum may still overflow
        let totals = totals?;
        Ok(Invoice { totals, ..invoice })
    }

    /// Build without submission validation, e.g. when importing stored rows.
    /// Numeric preconditions still apply because totals are computed.
    pub fn build_unchecked(self) -> Result<Invoice, BillingError> {
        self.assemble()
    }

    fn assemble(self) -> Result<Invoice, BillingError> {
        let totals = compute_totals(&self.items)?;
        Ok(self.into_invoice(totals))
    }

    fn into_invoice(self, totals: Totals) -> Invoice {
        Invoice {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            number: self.number,
            client_id: self.client_id,
            issue_date: self.issue_date,
            due_date: self.due_date,
            notes: self.notes,
            items: self.items,
            totals,
            amount_paid: Decimal::ZERO,
            status: InvoiceStatus::Draft,
            version: 0,
        }
    }
}

/// Builder for LineItem.
///
/// Tax and discount default to zero, like a freshly added form row.
pub struct LineItemBuilder {
    product_id: Option<Uuid>,
    description: String,
    quantity: Decimal,
    unit_price: Decimal,
    tax_rate: Decimal,
    discount_percent: Decimal,
}

impl LineItemBuilder {
    pub fn new(description: impl Into<String>, quantity: Decimal, unit_price: Decimal) -> Self {
        Self {
            product_id: None,
            description: description.into(),
            quantity,
            unit_price,
            tax_rate: Decimal::ZERO,
            discount_percent: Decimal::ZERO,
        }
    }

    /// Link the item to a catalogue product.
    pub fn product(mut self, product_id: Uuid) -> Self {
        self.product_id = Some(product_id);
        self
    }

    pub fn tax_rate(mut self, percent: Decimal) -> Self {
        self.tax_rate = percent;
        self
    }

    pub fn discount(mut self, percent: Decimal) -> Self {
        self.discount_percent = percent;
        self
    }

    pub fn build(self) -> LineItem {
        LineItem {
            product_id: self.product_id,
            description: self.description,
            quantity: self.quantity,
            unit_price: self.unit_price,
            tax_rate: self.tax_rate,
            discount_percent: self.discount_percent,
        }
    }
}
