//! Per-asset constants used to score an allocation.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;

use super::risk::Allocation;
use crate::domain::shared::Symbol;

/// Yearly return assumed for a stablecoin.
pub const STABLECOIN_RETURN: Decimal = dec!(0.02);

/// Yearly return assumed for any other asset.
pub const VOLATILE_RETURN: Decimal = dec!(0.1);

/// What the portfolio manager knows about one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetInfo {
    /// Last known price. Updated by price pushes.
    pub price: Decimal,
    /// Volatility weight used in the risk score.
    pub volatility: Decimal,
    /// Correlation hint. Carried, not used in scoring.
    pub correlation: Decimal,
}

/// Expected return and risk score of an allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortfolioMetrics {
    /// Weighted expected return.
    pub expected_return: Decimal,
    /// Weighted volatility.
    pub risk_score: Decimal,
}

/// The fixed asset universe and its latest prices.
#[derive(Debug, Clone)]
pub struct AssetTable {
    assets: HashMap<Symbol, AssetInfo>,
}

impl Default for AssetTable {
    fn default() -> Self {
        let rows = [
            ("BTC", dec!(45000), dec!(0.8), dec!(0.1)),
            ("ETH", dec!(3000), dec!(0.9), dec!(0.3)),
            ("SOL", dec!(100), dec!(1.2), dec!(0.5)),
            ("AVAX", dec!(25), dec!(1.1), dec!(0.4)),
            ("MATIC", dec!(0.8), dec!(0.7), dec!(0.6)),
            ("USDC", dec!(1.0), dec!(0.01), dec!(0.0)),
            ("USDT", dec!(1.0), dec!(0.01), dec!(0.0)),
        ];

        let assets = rows
            .into_iter()
            .map(|(symbol, price, volatility, correlation)| {
                (
                    Symbol::new(symbol),
                    AssetInfo {
                        price,
                        volatility,
                        correlation,
                    },
                )
            })
            .collect();

        Self { assets }
    }
}

impl AssetTable {
    /// Look up an asset.
    #[must_use]
    pub fn get(&self, symbol: &Symbol) -> Option<&AssetInfo> {
        self.assets.get(symbol)
    }

    /// Overwrite an asset's price. Unknown symbols are ignored.
    ///
    /// Returns true when the table changed.
    pub fn apply_price(&mut self, symbol: &Symbol, price: Decimal) -> bool {
        match self.assets.get_mut(symbol) {
            Some(asset) => {
                asset.price = price;
                true
            }
            None => false,
        }
    }

    /// Score an allocation. Assets missing from the table contribute nothing.
    #[must_use]
    pub fn metrics(&self, allocation: &Allocation) -> PortfolioMetrics {
        let mut expected_return = Decimal::ZERO;
        let mut risk_score = Decimal::ZERO;

        for (symbol, weight) in allocation {
            let Some(asset) = self.assets.get(symbol) else {
                continue;
            };
            let asset_return = if symbol.is_stablecoin() {
                STABLECOIN_RETURN
            } else {
                VOLATILE_RETURN
            };
            expected_return += weight * asset_return;
            risk_score += weight * asset.volatility;
        }

        PortfolioMetrics {
            expected_return,
            risk_score,
        }
    }
}
