//! Calculator configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::catalog::DEFAULT_SYMBOL;

/// Defaults for fresh parameters and the settings save delay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculatorConfig {
    /// Instrument selected on start
    pub default_symbol: String,

    /// Account balance in USD
    pub default_balance: String,

    /// Percent of balance at risk
    pub default_risk_percent: String,

    /// Dollar risk, consistent with balance and percent
    pub default_risk_cash: String,

    /// Stop-loss distance in USD
    pub default_sl_distance: String,

    /// Quiet period before edits are written to the settings store
    pub save_debounce_ms: u64,
}

impl CalculatorConfig {
    pub fn save_debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            default_symbol: DEFAULT_SYMBOL.to_string(),
            default_balance: "5000".to_string(),
            default_risk_percent: "0.5".to_string(),
            default_risk_cash: "25.00".to_string(),
            default_sl_distance: "0.15".to_string(),
            save_debounce_ms: 1500, // 1.5s of inactivity
        }
    }
}
