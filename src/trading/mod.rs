//! Sizing logic: instrument catalog, risk parameters, position sizing.

pub mod catalog;
mod config;
mod input;
mod position_sizer;
mod risk_params;

pub use config::CalculatorConfig;
pub use position_sizer::PositionSizer;
pub use risk_params::RiskParameters;
