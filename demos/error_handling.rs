use std::sync::Arc;

use billdesk::core::*;
use chrono::NaiveDate;
use rust_decimal_macros::dec;
use uuid::Uuid;

fn main() {
    let day = |m, d| NaiveDate::from_ymd_opt(2024, m, d).unwrap();

    // ── 1. Validation: every problem is reported at once ────────────
    println!("=== Validation Errors ===");
    let result = InvoiceBuilder::new("", Uuid::nil(), day(6, 15), day(7, 15))
        .add_item(LineItemBuilder::new("", dec!(1), dec!(10)).build())
        .build();
    if let Err(e) = result {
        println!("  {e}");
    }

    // ── 2. Arithmetic preconditions name the offending line ─────────
    println!("\n=== Invalid Line ===");
    let items = [
        LineItemBuilder::new("Ok", dec!(1), dec!(10)).build(),
        LineItemBuilder::new("Bad", dec!(1), dec!(10)).discount(dec!(150)).build(),
    ];
    match compute_totals(&items) {
        Err(BillingError::InvalidLine { index, reason }) => {
            println!("  line {index}: {reason}");
        }
        other => println!("  unexpected: {other:?}"),
    }

    // ── 3. Lifecycle: sent invoices cannot be edited ────────────────
    println!("\n=== Invalid Transition ===");
    let mut invoice = InvoiceBuilder::new("INV-2024-2025-001", Uuid::new_v4(), day(6, 15), day(7, 15))
        .add_item(LineItemBuilder::new("Audit", dec!(1), dec!(100)).build())
        .build()
        .unwrap();
    invoice.mark_sent().unwrap();
    if let Err(e) = invoice.add_item(LineItemBuilder::new("Extra", dec!(1), dec!(5)).build()) {
        println!("  {e}");
    }

    // ── 4. Fiscal labels ────────────────────────────────────────────
    println!("\n=== Fiscal Year ===");
    for label in ["2024-2025", "2024-2026", "FY24"] {
        match range_of(label) {
            Ok((start, end)) => println!("  {label}: {start} .. {end}"),
            Err(e) => println!("  {e}"),
        }
    }

    // ── 5. Conflicts are retriable ──────────────────────────────────
    println!("\n=== Concurrent Payments ===");
    let config = EngineConfig {
        overpayment: OverpaymentPolicy::Reject,
        ..EngineConfig::default()
    };
    let reconciler = Reconciler::with_config(Arc::new(MemoryStore::new()), config);
    let id = reconciler.store().insert_invoice(invoice).unwrap().id();

    std::thread::scope(|s| {
        for _ in 0..2 {
            s.spawn(|| {
                let mut attempts = 0;
                loop {
                    attempts += 1;
                    match reconciler.record_payment(id, PaymentInput::new(dec!(60), day(6, 20))) {
                        Ok(done) => {
                            println!("  paid after {attempts} attempt(s): {}", done.status());
                            break;
                        }
                        Err(e) if e.is_retriable() => continue,
                        Err(e) => {
                            println!("  refused: {e}");
                            break;
                        }
                    }
                }
            });
        }
    });
}
