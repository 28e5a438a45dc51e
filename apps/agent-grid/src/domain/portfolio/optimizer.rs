//! Portfolio Optimizer
//!
//! Looks up the allocation for a risk label, scores it and attaches
//! recommendations. The amount and preferences do not change the answer.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::assets::AssetTable;
use super::risk::{Allocation, RiskLevel};
use crate::domain::shared::{Symbol, Timestamp};
use crate::domain::task::Parameters;

/// BTC weight above which over-exposure is flagged.
const BTC_EXPOSURE_LIMIT: Decimal = dec!(0.3);

/// Combined stablecoin weight below which more stability is suggested.
const STABLECOIN_FLOOR: Decimal = dec!(0.1);

/// Sole recommendation of the error response.
pub const ERROR_RECOMMENDATION: &str = "Error processing request. Please try again.";

/// Request for a recommended allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioRequest {
    /// Wallet address of the requesting user.
    pub user_address: String,
    /// `low`, `medium` or `high`. Anything else is treated as `high`.
    pub risk_level: String,
    /// Amount to invest. Must be positive.
    pub amount: Decimal,
    /// Free-form preferences. Ignored.
    #[serde(default)]
    pub preferences: Option<Parameters>,
}

impl PortfolioRequest {
    /// Create a request with no preferences.
    #[must_use]
    pub fn new(user_address: impl Into<String>, risk_level: impl Into<String>, amount: Decimal) -> Self {
        Self {
            user_address: user_address.into(),
            risk_level: risk_level.into(),
            amount,
            preferences: None,
        }
    }
}

/// Recommended allocation with its scores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioResponse {
    /// Weight per asset.
    pub allocations: Allocation,
    /// Weighted expected return.
    pub expected_return: Decimal,
    /// Weighted volatility.
    pub risk_score: Decimal,
    /// Advice strings.
    pub recommendations: Vec<String>,
    /// When the response was produced.
    pub timestamp: Timestamp,
}

impl PortfolioResponse {
    /// The canned reply sent when a request cannot be handled.
    #[must_use]
    pub fn error() -> Self {
        Self {
            allocations: Allocation::new(),
            expected_return: Decimal::ZERO,
            risk_score: Decimal::ONE,
            recommendations: vec![ERROR_RECOMMENDATION.to_string()],
            timestamp: Timestamp::now(),
        }
    }

    /// Whether this is the canned error reply.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.allocations.is_empty()
            && self.recommendations.len() == 1
            && self.recommendations[0] == ERROR_RECOMMENDATION
    }
}

/// Reasons a portfolio request is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortfolioError {
    /// Zero or negative amount.
    #[error("amount must be positive, got {amount}")]
    NonPositiveAmount {
        /// The rejected amount.
        amount: Decimal,
    },
}

/// Build the response for a request.
pub fn optimize(
    assets: &AssetTable,
    request: &PortfolioRequest,
) -> Result<PortfolioResponse, PortfolioError> {
    if request.amount <= Decimal::ZERO {
        return Err(PortfolioError::NonPositiveAmount {
            amount: request.amount,
        });
    }

    let risk_level = RiskLevel::from_label(&request.risk_level);
    let allocations = risk_level.allocation();
    let metrics = assets.metrics(&allocations);
    let recommendations = recommendations(risk_level, &allocations);

    Ok(PortfolioResponse {
        allocations,
        expected_return: metrics.expected_return,
        risk_score: metrics.risk_score,
        recommendations,
        timestamp: Timestamp::now(),
    })
}

/// Canned advice for the level plus allocation-specific warnings.
#[must_use]
pub fn recommendations(risk_level: RiskLevel, allocations: &Allocation) -> Vec<String> {
    let mut out: Vec<String> = risk_level
        .base_recommendations()
        .iter()
        .map(ToString::to_string)
        .collect();

    let weight = |symbol: &str| {
        allocations
            .get(&Symbol::new(symbol))
            .copied()
            .unwrap_or_default()
    };

    if weight("BTC") > BTC_EXPOSURE_LIMIT {
        out.push("High BTC allocation - consider reducing if overexposed".to_string());
    }
    if weight("USDC") + weight("USDT") < STABLECOIN_FLOOR {
        out.push("Low stablecoin allocation - consider adding more for stability".to_string());
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_risk_response() {
        let response = optimize(
            &AssetTable::default(),
            &PortfolioRequest::new("0xabc", "low", dec!(10000)),
        )
        .unwrap();

        assert_eq!(response.allocations.len(), 4);
        assert_eq!(response.expected_return, dec!(0.044));
        assert_eq!(response.risk_score, dec!(0.257));
        assert_eq!(response.recommendations.len(), 3);
        assert_eq!(
            response.recommendations[0],
            "Consider dollar-cost averaging for stable growth"
        );
    }

    #[test]
    fn high_risk_flags_low_stablecoins() {
        let response = optimize(
            &AssetTable::default(),
            &PortfolioRequest::new("0xabc", "high", dec!(1)),
        )
        .unwrap();

        assert_eq!(response.recommendations.len(), 4);
        assert_eq!(
            response.recommendations[3],
            "Low stablecoin allocation - consider adding more for stability"
        );
    }

    #[test]
    fn medium_risk_sits_on_both_thresholds() {
        // BTC is exactly 0.3 and stablecoins exactly 0.1: neither warning fires.
        let response = optimize(
            &AssetTable::default(),
            &PortfolioRequest::new("0xabc", "medium", dec!(5000)),
        )
        .unwrap();
        assert_eq!(response.recommendations.len(), 3);
        assert_eq!(response.recommendations[0], "Diversify across different sectors");
    }

    #[test]
    fn unknown_label_uses_high_table() {
        let assets = AssetTable::default();
        let unknown = optimize(&assets, &PortfolioRequest::new("0x", "yolo", dec!(1))).unwrap();
        let high = optimize(&assets, &PortfolioRequest::new("0x", "high", dec!(1))).unwrap();
        assert_eq!(unknown.allocations, high.allocations);
        assert_eq!(unknown.recommendations, high.recommendations);
    }

    #[test]
    fn btc_warning_above_limit() {
        let mut allocation = Allocation::new();
        allocation.insert(Symbol::new("BTC"), dec!(0.5));
        allocation.insert(Symbol::new("USDC"), dec!(0.5));
        let recs = recommendations(RiskLevel::Medium, &allocation);
        assert_eq!(recs.len(), 4);
        assert!(recs[3].starts_with("High BTC allocation"));
    }

    #[test]
    fn non_positive_amount_rejected() {
        let assets = AssetTable::default();
        for amount in [Decimal::ZERO, dec!(-5)] {
            let err = optimize(&assets, &PortfolioRequest::new("0x", "low", amount)).unwrap_err();
            assert_eq!(err, PortfolioError::NonPositiveAmount { amount });
        }
    }

    #[test]
    fn error_response_shape() {
        let response = PortfolioResponse::error();
        assert!(response.is_error());
        assert_eq!(response.expected_return, Decimal::ZERO);
        assert_eq!(response.risk_score, Decimal::ONE);
    }

    #[test]
    fn request_deserialises_without_preferences() {
        let request: PortfolioRequest = serde_json::from_str(
            r#"{"user_address":"0xabc","risk_level":"low","amount":"250"}"#,
        )
        .unwrap();
        assert_eq!(request.amount, dec!(250));
        assert!(request.preferences.is_none());
    }
}
