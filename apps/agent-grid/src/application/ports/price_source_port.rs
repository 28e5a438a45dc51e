//! Price Source Port (Driven Port)
//!
//! Where the price monitor gets a fresh snapshot for a tracked symbol.

use crate::domain::market::{PriceData, PriceSeed};

/// Port for sampling current prices.
pub trait PriceSource: Send + Sync {
    /// Produce the current snapshot for a seeded symbol.
    fn sample(&self, seed: &PriceSeed) -> PriceData;
}
