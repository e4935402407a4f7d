//! Core billing engine: line-item pricing, invoice aggregation, lifecycle,
//! payment reconciliation and fiscal-year windowing.
//!
//! All amounts are exact [`rust_decimal::Decimal`]s; nothing is rounded
//! until [`round_money`] is applied at the presentation boundary.

mod builder;
mod config;
mod error;
mod fiscal;
mod lifecycle;
mod numbering;
mod policy;
mod pricing;
mod reconcile;
mod store;
mod types;
mod validation;

pub use builder::*;
pub use config::*;
pub use error::*;
pub use fiscal::*;
pub use lifecycle::*;
pub use numbering::*;
pub use policy::*;
pub use pricing::*;
pub use reconcile::*;
pub use store::*;
pub use types::*;
pub use validation::*;
