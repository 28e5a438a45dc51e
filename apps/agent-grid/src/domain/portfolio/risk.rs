//! Risk levels and their static allocation tables.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::shared::Symbol;

/// Asset weights, keyed by symbol. Meant to sum to 1.
pub type Allocation = BTreeMap<Symbol, Decimal>;

/// Coarse risk appetite of a portfolio request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Mostly stablecoins.
    Low,
    /// Balanced.
    Medium,
    /// Mostly volatile assets.
    High,
}

impl RiskLevel {
    /// Parse a label. Matching is exact: anything other than `low` or
    /// `medium` is `High`.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label {
            "low" => Self::Low,
            "medium" => Self::Medium,
            _ => Self::High,
        }
    }

    /// Lower-case label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// The fixed allocation table for this level.
    #[must_use]
    pub fn allocation(self) -> Allocation {
        let weights: &[(&str, Decimal)] = match self {
            Self::Low => &[
                ("USDC", dec!(0.4)),
                ("USDT", dec!(0.3)),
                ("BTC", dec!(0.2)),
                ("ETH", dec!(0.1)),
            ],
            Self::Medium => &[
                ("BTC", dec!(0.3)),
                ("ETH", dec!(0.25)),
                ("SOL", dec!(0.15)),
                ("AVAX", dec!(0.1)),
                ("MATIC", dec!(0.1)),
                ("USDC", dec!(0.1)),
            ],
            Self::High => &[
                ("BTC", dec!(0.25)),
                ("ETH", dec!(0.2)),
                ("SOL", dec!(0.2)),
                ("AVAX", dec!(0.15)),
                ("MATIC", dec!(0.15)),
                ("USDC", dec!(0.05)),
            ],
        };

        weights
            .iter()
            .map(|(symbol, weight)| (Symbol::new(symbol), *weight))
            .collect()
    }

    /// Canned advice for this level.
    #[must_use]
    pub const fn base_recommendations(self) -> [&'static str; 3] {
        match self {
            Self::Low => [
                "Consider dollar-cost averaging for stable growth",
                "Monitor market conditions monthly",
                "Rebalance quarterly to maintain target allocation",
            ],
            Self::Medium => [
                "Diversify across different sectors",
                "Consider staking rewards for passive income",
                "Monitor weekly and rebalance monthly",
            ],
            Self::High => [
                "High volatility expected - prepare for swings",
                "Consider stop-loss strategies",
                "Monitor daily and be ready to adjust quickly",
            ],
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
