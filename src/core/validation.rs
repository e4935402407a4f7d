use rust_decimal::Decimal;
use uuid::Uuid;

use super::error::ValidationError;
use super::pricing::{compute_totals, sum_line_totals};
use super::types::*;

/// Validate an invoice before it is persisted.
/// Returns all validation errors found (not just the first).
pub fn validate_invoice(invoice: &Invoice) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if invoice.number.trim().is_empty() {
        errors.push(ValidationError::with_rule(
            "number",
            "invoice number must not be empty",
            "INV-01",
        ));
    }

    if invoice.client_id.is_nil() {
        errors.push(ValidationError::with_rule(
            "client_id",
            "invoice must reference a client",
            "INV-02",
        ));
    }

    if invoice.items.is_empty() {
        errors.push(ValidationError::with_rule(
            "items",
            "invoice must have at least one line item",
            "INV-03",
        ));
    }

    for (i, item) in invoice.items.iter().enumerate() {
        validate_item(item, i, &mut errors);
    }

    errors.extend(validate_totals(invoice));

    errors
}

/// Validate stored aggregates against a fresh recomputation.
///
/// Checks both computation paths: the aggregator's per-contribution sums and
/// the sum of every item's `line_total`.
pub fn validate_totals(invoice: &Invoice) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let totals = &invoice.totals;

    // Item errors are reported by validate_item
    let Ok(expected) = compute_totals(&invoice.items) else {
        return errors;
    };

    if *totals != expected {
        errors.push(ValidationError::with_rule(
            "totals",
            format!(
                "stored totals (total {}) do not match recomputed totals (total {})",
                totals.total_amount, expected.total_amount
            ),
            "TOT-01",
        ));
    }

    let expected_total = totals
        .subtotal
        .checked_sub(totals.discount_amount)
        .and_then(|net| net.checked_add(totals.tax_amount));
    if expected_total != Some(totals.total_amount) {
        errors.push(ValidationError::with_rule(
            "totals.total_amount",
            format!(
                "total {} does not match subtotal {} - discount {} + tax {}",
                totals.total_amount, totals.subtotal, totals.discount_amount, totals.tax_amount
            ),
            "TOT-02",
        ));
    }

    let line_sum = sum_line_totals(&invoice.items);
    if line_sum != Some(totals.total_amount) {
        errors.push(ValidationError::with_rule(
            "totals.total_amount",
            format!(
                "total {} does not match sum of line totals {}",
                totals.total_amount,
                line_sum.map_or_else(|| "(overflow)".to_string(), |sum| sum.to_string())
            ),
            "TOT-03",
        ));
    }

    errors
}

/// Validate the derived columns of a row about to be written.
///
/// An `Invoice` can arrive deserialized with hand-set totals, payments or
/// status; stores run this on every write so such a row never lands.
pub fn validate_row(invoice: &Invoice) -> Vec<ValidationError> {
    let mut errors = validate_totals(invoice);

    if invoice.amount_paid < Decimal::ZERO {
        errors.push(ValidationError::with_rule(
            "amount_paid",
            format!("amount paid {} must not be negative", invoice.amount_paid),
            "ROW-01",
        ));
    }

    if invoice.status == InvoiceStatus::Paid && invoice.amount_paid < invoice.totals.total_amount {
        errors.push(ValidationError::with_rule(
            "status",
            format!(
                "paid invoice has {} paid against a total of {}",
                invoice.amount_paid, invoice.totals.total_amount
            ),
            "ROW-02",
        ));
    }

    if invoice.status == InvoiceStatus::Draft && !invoice.amount_paid.is_zero() {
        errors.push(ValidationError::with_rule(
            "amount_paid",
            "a draft cannot carry payments",
            "ROW-03",
        ));
    }

    errors
}

/// Validate a single line item at submission time.
pub fn validate_item(item: &LineItem, index: usize, errors: &mut Vec<ValidationError>) {
    let prefix = format!("items[{index}]");

    if item.description.trim().is_empty() {
        errors.push(ValidationError::with_rule(
            format!("{prefix}.description"),
            "description must not be empty",
            "LINE-01",
        ));
    }

    if let Err(e) = item.checked_breakdown() {
        errors.push(ValidationError {
            field: format!("{prefix}.{}", e.field),
            ..e
        });
    }
}

/// Validate the caller-supplied part of a payment.
pub fn validate_payment(invoice_id: Uuid, amount: Decimal) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if invoice_id.is_nil() {
        errors.push(ValidationError::with_rule(
            "invoice_id",
            "payment must reference an invoice",
            "PAY-01",
        ));
    }

    if amount <= Decimal::ZERO {
        errors.push(ValidationError::with_rule(
            "amount",
            format!("payment amount {amount} must be greater than zero"),
            "PAY-02",
        ));
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::builder::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn test_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn test_item() -> LineItem {
        LineItemBuilder::new("Web design", dec!(10), dec!(150))
            .tax_rate(dec!(18))
            .build()
    }

    #[test]
    fn valid_invoice() {
        let inv = InvoiceBuilder::new("INV-001", Uuid::new_v4(), test_date(), test_date())
            .add_item(test_item())
            .build()
            .unwrap();

        assert!(validate_invoice(&inv).is_empty());
        assert_eq!(inv.totals().subtotal, dec!(1500));
        assert_eq!(inv.totals().tax_amount, dec!(270));
        assert_eq!(inv.total_amount(), dec!(1770));
    }

    #[test]
    fn missing_client_is_reported() {
        let err = InvoiceBuilder::new("INV-001", Uuid::nil(), test_date(), test_date())
            .add_item(test_item())
            .build()
            .unwrap_err()
            .to_string();
        assert!(err.contains("INV-02"), "{err}");
    }

    #[test]
    fn empty_description_is_reported_with_index() {
        let blank = LineItemBuilder::new("  ", dec!(1), dec!(10)).build();
        let err = InvoiceBuilder::new("INV-001", Uuid::new_v4(), test_date(), test_date())
            .add_item(test_item())
            .add_item(blank)
            .build()
            .unwrap_err()
            .to_string();
        assert!(err.contains("items[1].description"), "{err}");
    }

    #[test]
    fn tampered_totals_are_detected() {
        let mut inv = InvoiceBuilder::new("INV-001", Uuid::new_v4(), test_date(), test_date())
            .add_item(test_item())
            .build()
            .unwrap();
        inv.totals.total_amount += dec!(1);

        let rules: Vec<_> = validate_totals(&inv)
            .into_iter()
            .filter_map(|e| e.rule)
            .collect();
        assert!(rules.contains(&"TOT-01".to_string()));
        assert!(rules.contains(&"TOT-02".to_string()));
        assert!(rules.contains(&"TOT-03".to_string()));
    }

    #[test]
    fn row_with_impossible_payment_state_is_rejected() {
        let mut inv = InvoiceBuilder::new("INV-001", Uuid::new_v4(), test_date(), test_date())
            .add_item(test_item())
            .build()
            .unwrap();
        assert!(validate_row(&inv).is_empty());

        inv.amount_paid = dec!(-1);
        inv.status = InvoiceStatus::Paid;
        let rules: Vec<_> = validate_row(&inv).into_iter().filter_map(|e| e.rule).collect();
        assert_eq!(rules, vec!["ROW-01".to_string(), "ROW-02".to_string()]);

        inv.amount_paid = dec!(5);
        inv.status = InvoiceStatus::Draft;
        let rules: Vec<_> = validate_row(&inv).into_iter().filter_map(|e| e.rule).collect();
        assert_eq!(rules, vec!["ROW-03".to_string()]);
    }

    #[test]
    fn payment_amount_must_be_positive() {
        assert!(validate_payment(Uuid::new_v4(), dec!(0.01)).is_empty());
        assert_eq!(validate_payment(Uuid::new_v4(), dec!(0)).len(), 1);
        assert_eq!(validate_payment(Uuid::nil(), dec!(-5)).len(), 2);
    }
}
