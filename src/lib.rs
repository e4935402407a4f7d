//! # billdesk
//!
//! Billing engine for multi-tenant invoicing tools: line-item pricing,
//! invoice aggregation, the invoice lifecycle, race-free payment
//! reconciliation, April–March fiscal years, and scheduled reports.
//!
//! All monetary values use [`rust_decimal::Decimal`], never floating point.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use billdesk::core::*;
//! use rust_decimal_macros::dec;
//! use uuid::Uuid;
//!
//! let day = |m, d| NaiveDate::from_ymd_opt(2024, m, d).unwrap();
//! let invoice = InvoiceBuilder::new("INV-2024-2025-001", Uuid::new_v4(), day(6, 15), day(7, 15))
//!     .add_item(LineItemBuilder::new("Consulting", dec!(2), dec!(50.00))
//!         .discount(dec!(10))
//!         .tax_rate(dec!(18))
//!         .build())
//!     .build()
//!     .unwrap();
//!
//! let reconciler = Reconciler::new(MemoryStore::new());
//! let id = reconciler.store().insert_invoice(invoice).unwrap().id();
//!
//! let result = reconciler
//!     .record_payment(id, PaymentInput::new(dec!(106.20), day(6, 20)))
//!     .unwrap();
//! assert_eq!(result.status(), InvoiceStatus::Paid);
//! assert_eq!(fiscal_year_of(day(6, 15)), "2024-2025");
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Pricing, lifecycle, reconciliation, fiscal years, roles |
//! | `config` (default) | Load `EngineConfig` from TOML |
//! | `reports` | Report schedule, fiscal-year summary, email boundary |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "reports")]
pub mod reports;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
