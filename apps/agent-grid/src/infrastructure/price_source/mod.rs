//! Simulated Price Source
//!
//! Jitters each seed: price by up to `±price_jitter` (a fraction of the
//! seed price), 24h change by up to `±change_jitter` percentage points.
//! Volume passes through untouched.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

use crate::application::ports::PriceSource;
use crate::domain::market::{PriceData, PriceSeed};

/// Default price jitter: ±5%.
pub const DEFAULT_PRICE_JITTER: f64 = 0.05;

/// Default change jitter: ±2 percentage points.
pub const DEFAULT_CHANGE_JITTER: f64 = 2.0;

/// Widest change jitter the configuration accepts.
pub const MAX_CHANGE_JITTER: f64 = 100.0;

/// Random-walk-free price simulator. Every sample is drawn around the seed.
#[derive(Debug)]
pub struct SimulatedPriceSource {
    rng: Mutex<StdRng>,
    price_jitter: f64,
    change_jitter: f64,
}

impl Default for SimulatedPriceSource {
    fn default() -> Self {
        Self::new(DEFAULT_PRICE_JITTER, DEFAULT_CHANGE_JITTER)
    }
}

impl SimulatedPriceSource {
    /// Create a source seeded from the OS.
    #[must_use]
    pub fn new(price_jitter: f64, change_jitter: f64) -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
            price_jitter: price_jitter.abs(),
            change_jitter: change_jitter.abs(),
        }
    }

    /// Deterministic source for tests and replays.
    #[must_use]
    pub fn with_seed(seed: u64, price_jitter: f64, change_jitter: f64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            price_jitter: price_jitter.abs(),
            change_jitter: change_jitter.abs(),
        }
    }

    /// Uniform draw in `[-width, width]`. Widths too large for a `Decimal`
    /// draw zero.
    fn draw(rng: &mut StdRng, width: f64) -> Decimal {
        if width == 0.0 || !width.is_finite() {
            return Decimal::ZERO;
        }
        // Scale a unit draw; a range built from `width` overflows near f64::MAX.
        let value = width * rng.random_range(-1.0..=1.0);
        Decimal::from_f64_retain(value)
            .unwrap_or_default()
            .round_dp(6)
    }
}

impl PriceSource for SimulatedPriceSource {
    fn sample(&self, seed: &PriceSeed) -> PriceData {
        let (price_factor, change_delta) = {
            let mut rng = self.rng.lock();
            (
                Self::draw(&mut rng, self.price_jitter),
                Self::draw(&mut rng, self.change_jitter),
            )
        };
        seed.jittered(price_factor, change_delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::seed_table;
    use rust_decimal_macros::dec;

    #[test]
    fn zero_jitter_reproduces_seed() {
        let source = SimulatedPriceSource::with_seed(7, 0.0, 0.0);
        for seed in seed_table() {
            let data = source.sample(&seed);
            assert_eq!(data.price, seed.price);
            assert_eq!(data.change_24h, seed.change_24h);
            assert_eq!(data.volume_24h, seed.volume_24h);
        }
    }

    #[test]
    fn prices_stay_within_five_percent() {
        let source = SimulatedPriceSource::with_seed(42, DEFAULT_PRICE_JITTER, DEFAULT_CHANGE_JITTER);
        for _ in 0..200 {
            for seed in seed_table() {
                let data = source.sample(&seed);
                let low = seed.price * dec!(0.95);
                let high = seed.price * dec!(1.05);
                assert!(data.price >= low && data.price <= high, "{} out of range", data.price);
                assert!((data.change_24h - seed.change_24h).abs() <= dec!(2));
                assert_eq!(data.volume_24h, seed.volume_24h);
            }
        }
    }

    #[test]
    fn huge_width_does_not_panic() {
        let source = SimulatedPriceSource::with_seed(3, 0.0, 1e308);
        let seed = &seed_table()[0];
        for _ in 0..20 {
            assert_eq!(source.sample(seed).price, seed.price);
        }
    }

    #[test]
    fn widest_accepted_change_jitter_stays_in_range() {
        let source = SimulatedPriceSource::with_seed(5, 0.0, MAX_CHANGE_JITTER);
        let seed = &seed_table()[0];
        for _ in 0..100 {
            let delta = (source.sample(seed).change_24h - seed.change_24h).abs();
            assert!(delta <= dec!(100), "{delta} outside the jitter width");
        }
    }

    #[test]
    fn same_seed_same_samples() {
        let a = SimulatedPriceSource::with_seed(9, 0.05, 2.0);
        let b = SimulatedPriceSource::with_seed(9, 0.05, 2.0);
        let seed = &seed_table()[0];
        for _ in 0..10 {
            assert_eq!(a.sample(seed).price, b.sample(seed).price);
        }
    }
}
