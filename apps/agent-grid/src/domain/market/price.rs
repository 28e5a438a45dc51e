//! Price records and the latest-snapshot book.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::shared::{Symbol, Timestamp};

/// Market cap is price times this fixed supply.
pub const MARKET_CAP_SUPPLY: Decimal = dec!(1000000);

/// Latest known market data for one symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceData {
    /// Asset symbol.
    pub symbol: Symbol,
    /// Current price.
    pub price: Decimal,
    /// 24h change, in percent.
    pub change_24h: Decimal,
    /// 24h traded volume.
    pub volume_24h: Decimal,
    /// `price * 1_000_000`.
    pub market_cap: Decimal,
    /// When the record was produced.
    pub timestamp: Timestamp,
}

impl PriceData {
    /// Build a record, deriving the market cap from the price.
    #[must_use]
    pub fn new(symbol: Symbol, price: Decimal, change_24h: Decimal, volume_24h: Decimal) -> Self {
        Self {
            symbol,
            price,
            change_24h,
            volume_24h,
            market_cap: price * MARKET_CAP_SUPPLY,
            timestamp: Timestamp::now(),
        }
    }

    /// The push message sent downstream for this record.
    #[must_use]
    pub fn to_update(&self) -> PriceUpdate {
        PriceUpdate {
            symbol: self.symbol.clone(),
            price: self.price,
            change_24h: self.change_24h,
            volume_24h: self.volume_24h,
            timestamp: self.timestamp,
        }
    }
}

/// Price push from the monitor to its subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceUpdate {
    /// Asset symbol.
    pub symbol: Symbol,
    /// Current price.
    pub price: Decimal,
    /// 24h change, in percent.
    pub change_24h: Decimal,
    /// 24h traded volume.
    pub volume_24h: Decimal,
    /// When the price was observed.
    pub timestamp: Timestamp,
}

/// Static starting values for a tracked symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceSeed {
    /// Asset symbol.
    pub symbol: Symbol,
    /// Base price that jitter is applied to.
    pub price: Decimal,
    /// Base 24h change, in percent.
    pub change_24h: Decimal,
    /// 24h volume. Not jittered.
    pub volume_24h: Decimal,
}

impl PriceSeed {
    fn new(symbol: &str, price: Decimal, change_24h: Decimal, volume_24h: Decimal) -> Self {
        Self {
            symbol: Symbol::new(symbol),
            price,
            change_24h,
            volume_24h,
        }
    }

    /// Apply jitter: `price * (1 + price_factor)` and `change + change_delta`.
    #[must_use]
    pub fn jittered(&self, price_factor: Decimal, change_delta: Decimal) -> PriceData {
        PriceData::new(
            self.symbol.clone(),
            self.price * (Decimal::ONE + price_factor),
            self.change_24h + change_delta,
            self.volume_24h,
        )
    }
}

/// The seven tracked symbols and their seed values.
#[must_use]
pub fn seed_table() -> Vec<PriceSeed> {
    vec![
        PriceSeed::new("BTC", dec!(45000), dec!(2.5), dec!(25000000000)),
        PriceSeed::new("ETH", dec!(3000), dec!(3.2), dec!(15000000000)),
        PriceSeed::new("SOL", dec!(100), dec!(-1.8), dec!(2000000000)),
        PriceSeed::new("AVAX", dec!(25), dec!(5.1), dec!(800000000)),
        PriceSeed::new("MATIC", dec!(0.8), dec!(1.2), dec!(500000000)),
        PriceSeed::new("USDC", dec!(1.0), dec!(0.0), dec!(1000000000)),
        PriceSeed::new("USDT", dec!(1.0), dec!(0.0), dec!(2000000000)),
    ]
}

/// Latest snapshot per symbol. No history is kept.
#[derive(Debug, Default)]
pub struct PriceSnapshotBook {
    latest: HashMap<Symbol, PriceData>,
}

impl PriceSnapshotBook {
    /// Create an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the snapshot for the record's symbol.
    pub fn record(&mut self, data: PriceData) -> Option<PriceData> {
        self.latest.insert(data.symbol.clone(), data)
    }

    /// Latest snapshot for a symbol.
    #[must_use]
    pub fn get(&self, symbol: &Symbol) -> Option<&PriceData> {
        self.latest.get(symbol)
    }

    /// Number of symbols with a snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.latest.len()
    }

    /// Returns true before the first refresh.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.latest.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_cap_is_derived() {
        let data = PriceData::new(Symbol::new("SOL"), dec!(101.5), dec!(0), dec!(1));
        assert_eq!(data.market_cap, dec!(101500000));
    }

    #[test]
    fn seed_table_has_seven_symbols() {
        let seeds = seed_table();
        assert_eq!(seeds.len(), 7);
        assert_eq!(seeds[0].symbol.as_str(), "BTC");
        assert_eq!(seeds[4].price, dec!(0.8));
    }

    #[test]
    fn zero_jitter_reproduces_seed() {
        let seed = &seed_table()[1];
        let data = seed.jittered(Decimal::ZERO, Decimal::ZERO);
        assert_eq!(data.price, dec!(3000));
        assert_eq!(data.change_24h, dec!(3.2));
        assert_eq!(data.volume_24h, dec!(15000000000));
    }

    #[test]
    fn jitter_scales_price_and_shifts_change() {
        let seed = &seed_table()[0];
        let data = seed.jittered(dec!(0.05), dec!(-2));
        assert_eq!(data.price, dec!(47250));
        assert_eq!(data.change_24h, dec!(0.5));
        assert_eq!(data.market_cap, dec!(47250000000));
    }

    #[test]
    fn snapshot_is_overwritten_not_merged() {
        let mut book = PriceSnapshotBook::new();
        assert!(book.is_empty());

        book.record(PriceData::new(Symbol::new("BTC"), dec!(1), dec!(1), dec!(1)));
        let previous = book.record(PriceData::new(Symbol::new("BTC"), dec!(2), dec!(9), dec!(3)));

        assert_eq!(previous.map(|p| p.price), Some(dec!(1)));
        assert_eq!(book.len(), 1);
        let latest = book.get(&Symbol::new("btc")).unwrap();
        assert_eq!(latest.price, dec!(2));
        assert_eq!(latest.change_24h, dec!(9));
    }

    #[test]
    fn update_mirrors_record() {
        let data = PriceData::new(Symbol::new("ETH"), dec!(3100), dec!(1), dec!(5));
        let update = data.to_update();
        assert_eq!(update.symbol, data.symbol);
        assert_eq!(update.price, data.price);
        assert_eq!(update.timestamp, data.timestamp);
    }
}
