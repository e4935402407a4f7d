use billdesk::core::*;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn consulting() -> LineItem {
    LineItemBuilder::new("Consulting", dec!(2), dec!(50.00))
        .discount(dec!(10))
        .tax_rate(dec!(18))
        .build()
}

fn hosting() -> LineItem {
    LineItemBuilder::new("Hosting", dec!(1), dec!(49.90))
        .tax_rate(dec!(5))
        .build()
}

fn draft() -> Invoice {
    InvoiceBuilder::new("INV-2024-2025-001", Uuid::new_v4(), date(2024, 6, 15), date(2024, 7, 15))
        .add_item(consulting())
        .add_item(hosting())
        .build()
        .unwrap()
}

// --- Line item pricing ---

#[test]
fn line_item_breakdown() {
    let b = consulting().breakdown().unwrap();
    assert_eq!(b.gross, dec!(100.00));
    assert_eq!(b.discount, dec!(10.00));
    assert_eq!(b.net, dec!(90.00));
    assert_eq!(b.tax, dec!(16.20));
    assert_eq!(b.total, dec!(106.20));
}

#[test]
fn zero_quantity_or_price_totals_zero() {
    let free = LineItemBuilder::new("Free", dec!(3), dec!(0)).tax_rate(dec!(18)).build();
    let none = LineItemBuilder::new("None", dec!(0), dec!(99)).tax_rate(dec!(18)).build();
    assert_eq!(free.line_total(), Some(Decimal::ZERO));
    assert_eq!(none.line_total(), Some(Decimal::ZERO));
}

#[test]
fn out_of_range_percentages_are_rejected() {
    let item = LineItemBuilder::new("Bad", dec!(1), dec!(10)).discount(dec!(101)).build();
    let err = compute_totals(&[consulting(), item]).unwrap_err();
    assert!(matches!(err, BillingError::InvalidLine { index: 1, .. }));

    let item = LineItemBuilder::new("Bad", dec!(1), dec!(10)).tax_rate(dec!(-1)).build();
    assert!(item.checked_breakdown().is_err());
}

#[test]
fn oversized_amounts_fail_instead_of_panicking() {
    let quadrillion = Decimal::new(1_000_000_000_000_000, 0);
    let huge = LineItemBuilder::new("Huge", quadrillion, quadrillion).build();
    assert!(matches!(
        compute_totals(&[huge.clone()]),
        Err(BillingError::InvalidLine { index: 0, .. })
    ));

    let result = InvoiceBuilder::new("INV-BIG", Uuid::new_v4(), date(2024, 6, 1), date(2024, 7, 1))
        .add_item(huge)
        .build();
    assert!(result.unwrap_err().to_string().contains("LINE-06"));
}

// --- Aggregation ---

#[test]
fn empty_item_list_totals_zero() {
    assert_eq!(compute_totals(&[]).unwrap(), Totals::default());
}

#[test]
fn invoice_totals_aggregate_lines() {
    let inv = draft();
    let totals = inv.totals();
    assert_eq!(totals.subtotal, dec!(149.90));
    assert_eq!(totals.discount_amount, dec!(10.00));
    assert_eq!(totals.tax_amount, dec!(16.20) + dec!(2.495));
    assert_eq!(
        totals.total_amount,
        totals.subtotal - totals.discount_amount + totals.tax_amount
    );
    assert_eq!(Some(totals.total_amount), sum_line_totals(inv.items()));
    assert_eq!(round_money(totals.total_amount), dec!(158.60));
}

#[test]
fn recomputation_is_idempotent() {
    let items = vec![consulting(), hosting()];
    assert_eq!(compute_totals(&items).unwrap(), compute_totals(&items).unwrap());
}

// --- Builder ---

#[test]
fn new_invoice_starts_as_draft() {
    let inv = draft();
    assert_eq!(inv.status(), InvoiceStatus::Draft);
    assert_eq!(inv.amount_paid(), Decimal::ZERO);
    assert_eq!(inv.version(), 0);
    assert_eq!(inv.outstanding(), inv.total_amount());
}

#[test]
fn builder_rejects_missing_items() {
    let result =
        InvoiceBuilder::new("INV-1", Uuid::new_v4(), date(2024, 6, 1), date(2024, 7, 1)).build();
    assert!(matches!(result, Err(BillingError::Validation(_))));
}

#[test]
fn builder_reports_all_errors() {
    let blank = LineItemBuilder::new("  ", dec!(1), dec!(10)).build();
    let err = InvoiceBuilder::new("", Uuid::nil(), date(2024, 6, 1), date(2024, 7, 1))
        .add_item(blank)
        .build()
        .unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("INV-01"), "{msg}");
    assert!(msg.contains("INV-02"), "{msg}");
    assert!(msg.contains("LINE-01"), "{msg}");
}

#[test]
fn overlong_number_is_rejected() {
    let result = InvoiceBuilder::new("X".repeat(201), Uuid::new_v4(), date(2024, 6, 1), date(2024, 7, 1))
        .add_item(consulting())
        .build();
    assert!(result.is_err());
}

#[test]
fn unchecked_build_skips_validation_but_prices() {
    let inv = InvoiceBuilder::new("", Uuid::nil(), date(2024, 6, 1), date(2024, 7, 1))
        .add_item(consulting())
        .build_unchecked()
        .unwrap();
    assert_eq!(inv.total_amount(), dec!(106.20));
    assert!(!validate_invoice(&inv).is_empty());
}

// --- Draft editing ---

#[test]
fn editing_a_draft_recomputes_totals() {
    let mut inv = draft();
    inv.remove_item(1).unwrap();
    assert_eq!(inv.total_amount(), dec!(106.20));

    inv.replace_item(0, hosting()).unwrap();
    assert_eq!(inv.total_amount(), dec!(52.395));

    inv.add_item(consulting()).unwrap();
    assert_eq!(inv.items().len(), 2);
    assert!(validate_totals(&inv).is_empty());
}

#[test]
fn last_item_cannot_be_removed() {
    let mut inv = draft();
    inv.remove_item(0).unwrap();
    assert!(inv.remove_item(0).is_err());
    assert_eq!(inv.items().len(), 1);
}

#[test]
fn sent_invoice_is_not_editable() {
    let mut inv = draft();
    inv.mark_sent().unwrap();
    let err = inv.add_item(consulting()).unwrap_err();
    assert!(matches!(
        err,
        BillingError::InvalidTransition { from: InvoiceStatus::Sent, .. }
    ));
}

#[test]
fn bad_edit_leaves_invoice_untouched() {
    let mut inv = draft();
    let before = *inv.totals();
    let bad = LineItemBuilder::new("Bad", dec!(-1), dec!(10)).build();
    assert!(inv.add_item(bad).is_err());
    assert_eq!(*inv.totals(), before);
    assert_eq!(inv.items().len(), 2);
}

// --- Lifecycle ---

#[test]
fn lifecycle_transitions() {
    use InvoiceStatus::*;
    assert!(Draft.can_transition_to(Sent));
    assert!(Sent.can_transition_to(Overdue));
    assert!(Overdue.can_transition_to(Paid));
    assert!(!Paid.can_transition_to(Sent));
    assert!(!Cancelled.can_transition_to(Paid));
    assert!(!Draft.can_transition_to(Overdue));
}

#[test]
fn overdue_requires_passed_due_date() {
    let mut inv = draft();
    inv.mark_sent().unwrap();
    assert!(!inv.mark_overdue(date(2024, 7, 15)).unwrap());
    assert!(inv.mark_overdue(date(2024, 7, 16)).unwrap());
    assert_eq!(inv.status(), InvoiceStatus::Overdue);
}

#[test]
fn cancelled_is_terminal() {
    let mut inv = draft();
    inv.cancel().unwrap();
    assert!(inv.cancel().is_err());
    assert!(inv.mark_sent().is_err());
}

// --- Policy ---

#[test]
fn accountant_cannot_manage_users() {
    assert!(can_perform(Role::Accountant, Action::RecordPayment));
    assert!(!can_perform(Role::Accountant, Action::ManageUsers));
    assert!(can_perform(Role::SuperAdmin, Action::ManageUsers));
}

#[test]
fn status_labels_round_trip_through_str() {
    for status in InvoiceStatus::ALL {
        assert_eq!(status.as_str().parse::<InvoiceStatus>().unwrap(), status);
    }
}
