//! The three agents of the grid.

mod executor;
mod portfolio_manager;
mod price_monitor;

pub use executor::{ExecutorAgent, ExecutorConfig};
pub use portfolio_manager::PortfolioManagerAgent;
pub use price_monitor::{PriceMonitorAgent, PriceMonitorConfig};
