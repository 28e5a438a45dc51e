//! Portfolio Bounded Context
//!
//! Static allocation tables per risk level, scored against a small asset
//! universe whose prices follow the price monitor's pushes.

pub mod assets;
pub mod optimizer;
pub mod risk;

pub use assets::{AssetInfo, AssetTable, PortfolioMetrics};
pub use optimizer::{
    ERROR_RECOMMENDATION, PortfolioError, PortfolioRequest, PortfolioResponse, optimize,
    recommendations,
};
pub use risk::{Allocation, RiskLevel};
