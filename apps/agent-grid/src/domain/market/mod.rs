//! Market Data Bounded Context
//!
//! Latest price snapshots for the tracked symbols and the alerts
//! evaluated against them.

pub mod alert;
pub mod price;

pub use alert::{Alert, AlertBook, AlertCondition, CHANGE_THRESHOLD};
pub use price::{PriceData, PriceSeed, PriceSnapshotBook, PriceUpdate, seed_table};
