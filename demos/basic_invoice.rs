use chrono::NaiveDate;
use billdesk::core::*;
use rust_decimal_macros::dec;
use uuid::Uuid;

fn main() {
    let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
    let mut numbers = InvoiceNumberSequence::new("INV-", FiscalYear::containing(today));

    // A two-line draft for a single client
    let invoice = InvoiceBuilder::new(
        numbers.next_number(),
        Uuid::new_v4(),
        today,
        NaiveDate::from_ymd_opt(2024, 7, 15).unwrap(),
    )
    .notes("Thank you for your business")
    .add_item(
        LineItemBuilder::new("Consulting", dec!(2), dec!(50.00))
            .discount(dec!(10))
            .tax_rate(dec!(18))
            .build(),
    )
    .add_item(
        LineItemBuilder::new("Hosting", dec!(1), dec!(50.00))
            .tax_rate(dec!(18))
            .build(),
    )
    .build()
    .expect("valid invoice");

    println!("Invoice {} ({})", invoice.number, fiscal_year_of(invoice.issue_date));
    for (i, item) in invoice.items().iter().enumerate() {
        let Some(b) = item.breakdown() else {
            continue;
        };
        println!(
            "  {}. {:<12} gross {:>8} discount {:>6} tax {:>6} total {:>8}",
            i + 1,
            item.description,
            round_money(b.gross),
            round_money(b.discount),
            round_money(b.tax),
            round_money(b.total),
        );
    }
    let totals = invoice.totals();
    println!("  Subtotal: {}", round_money(totals.subtotal));
    println!("  Discount: {}", round_money(totals.discount_amount));
    println!("  Tax:      {}", round_money(totals.tax_amount));
    println!("  Total:    {}", round_money(totals.total_amount));

    // Store it, send it, and take two payments
    let reconciler = Reconciler::new(MemoryStore::new());
    let id = reconciler.store().insert_invoice(invoice).unwrap().id();
    reconciler.mark_sent(id).unwrap();

    for amount in [dec!(100.00), dec!(65.20)] {
        let done = reconciler
            .record_payment(
                id,
                PaymentInput::new(amount, today).method(PaymentMethod::BankTransfer),
            )
            .unwrap();
        println!(
            "Paid {} -> {} (outstanding {})",
            amount,
            done.status(),
            round_money(done.outstanding())
        );
    }

    println!("Recent fiscal years: {:?}", recent_labels(today, 3));
}
