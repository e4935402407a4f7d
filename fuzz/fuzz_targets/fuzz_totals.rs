#![no_main]

use billdesk::{LineItem, compute_totals, sum_line_totals};
use libfuzzer_sys::fuzz_target;
use rust_decimal::Decimal;

fuzz_target!(|data: &[u8]| {
    // Four small signed values per item keep the arithmetic in range.
    let items: Vec<LineItem> = data
        .chunks_exact(4)
        .map(|c| LineItem {
            product_id: None,
            description: "fuzz".into(),
            quantity: Decimal::new(i64::from(c[0] as i8), 1),
            unit_price: Decimal::new(i64::from(c[1]) * 7, 2),
            discount_percent: Decimal::from(c[2] % 120),
            tax_rate: Decimal::from(c[3] % 120),
        })
        .collect();

    if let Ok(totals) = compute_totals(&items) {
        assert_eq!(
            totals.total_amount,
            totals.subtotal - totals.discount_amount + totals.tax_amount
        );
        assert_eq!(Some(totals.total_amount), sum_line_totals(&items));
    }
});
