//! Editable risk parameters with bidirectional percent/cash coupling.
//!
//! Balance is the anchor. Editing percent derives cash, editing cash derives
//! percent, and the last edit wins. Every setter stores its text verbatim and
//! only touches its peer field when all inputs to the derivation parse:
//!
//! | setter             | may update    | precondition                        |
//! |--------------------|---------------|-------------------------------------|
//! | `set_balance`      | `risk_cash`   | balance, risk_percent parse         |
//! | `set_risk_percent` | `risk_cash`   | balance, risk_percent parse         |
//! | `set_risk_cash`    | `risk_percent`| balance, risk_cash parse; balance≠0 |
//! | `set_sl_distance`  | nothing       |                                     |
//! | `set_instrument`   | nothing       |                                     |

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::models::{CalculationResult, Instrument, SettingsSnapshot};

use super::{catalog, input, CalculatorConfig, PositionSizer};

/// The four raw input fields plus the selected instrument.
#[derive(Debug, Clone)]
pub struct RiskParameters {
    balance: String,
    risk_percent: String,
    risk_cash: String,
    sl_distance: String,
    instrument: &'static Instrument,
}

impl Default for RiskParameters {
    fn default() -> Self {
        Self::from_config(&CalculatorConfig::default())
    }
}

impl RiskParameters {
    /// Fresh parameters from configured defaults.
    ///
    /// An unknown default symbol falls back to the catalog default.
    pub fn from_config(config: &CalculatorConfig) -> Self {
        let instrument = catalog::lookup(&config.default_symbol).unwrap_or_else(|| {
            warn!(symbol = %config.default_symbol, "Unknown default symbol, using catalog default");
            catalog::default_instrument()
        });

        Self {
            balance: config.default_balance.clone(),
            risk_percent: config.default_risk_percent.clone(),
            risk_cash: config.default_risk_cash.clone(),
            sl_distance: config.default_sl_distance.clone(),
            instrument,
        }
    }

    pub fn balance(&self) -> &str {
        &self.balance
    }

    pub fn risk_percent(&self) -> &str {
        &self.risk_percent
    }

    pub fn risk_cash(&self) -> &str {
        &self.risk_cash
    }

    pub fn sl_distance(&self) -> &str {
        &self.sl_distance
    }

    pub fn instrument(&self) -> &'static Instrument {
        self.instrument
    }

    /// Set the balance and re-derive risk cash from the current percent.
    pub fn set_balance(&mut self, value: impl Into<String>) {
        self.balance = value.into();
        self.derive_risk_cash();
    }

    /// Set the risk percent and re-derive risk cash.
    pub fn set_risk_percent(&mut self, value: impl Into<String>) {
        self.risk_percent = value.into();
        self.derive_risk_cash();
    }

    /// Set the risk cash and re-derive the risk percent.
    pub fn set_risk_cash(&mut self, value: impl Into<String>) {
        self.risk_cash = value.into();
        self.derive_risk_percent();
    }

    pub fn set_sl_distance(&mut self, value: impl Into<String>) {
        self.sl_distance = value.into();
    }

    pub fn set_instrument(&mut self, instrument: &'static Instrument) {
        self.instrument = instrument;
    }

    /// Run the sizing engine on the current fields.
    pub fn result(&self) -> Option<CalculationResult> {
        PositionSizer::compute(&self.risk_cash, &self.sl_distance, self.instrument)
    }

    /// Snapshot of the persisted fields.
    pub fn snapshot(&self) -> SettingsSnapshot {
        SettingsSnapshot {
            balance: self.balance.clone(),
            risk_percent: self.risk_percent.clone(),
            risk_cash: self.risk_cash.clone(),
            sl_distance: self.sl_distance.clone(),
            instrument_symbol: self.instrument.symbol.to_string(),
        }
    }

    /// Replace all fields from a stored snapshot without any derivation.
    ///
    /// A stored symbol missing from the catalog keeps the current instrument.
    pub fn apply_snapshot(&mut self, snapshot: SettingsSnapshot) {
        self.balance = snapshot.balance;
        self.risk_percent = snapshot.risk_percent;
        self.risk_cash = snapshot.risk_cash;
        self.sl_distance = snapshot.sl_distance;

        match catalog::lookup(&snapshot.instrument_symbol) {
            Some(instrument) => self.instrument = instrument,
            None => warn!(
                symbol = %snapshot.instrument_symbol,
                "Stored instrument not in catalog, keeping current selection"
            ),
        }
    }

    /// risk_cash = balance * risk_percent / 100
    fn derive_risk_cash(&mut self) {
        let (Some(balance), Some(percent)) = (
            input::parse_decimal(&self.balance),
            input::parse_decimal(&self.risk_percent),
        ) else {
            debug!("Risk cash not derived: balance or percent incomplete");
            return;
        };

        let Some(cash) = balance
            .checked_mul(percent)
            .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
        else {
            debug!("Risk cash not derived: overflow");
            return;
        };

        self.risk_cash = input::format_2dp(cash);
    }

    /// risk_percent = risk_cash / balance * 100
    fn derive_risk_percent(&mut self) {
        let (Some(balance), Some(cash)) = (
            input::parse_decimal(&self.balance),
            input::parse_decimal(&self.risk_cash),
        ) else {
            debug!("Risk percent not derived: balance or cash incomplete");
            return;
        };

        if balance.is_zero() {
            debug!("Risk percent not derived: zero balance");
            return;
        }

        let Some(percent) = cash
            .checked_div(balance)
            .and_then(|v| v.checked_mul(Decimal::ONE_HUNDRED))
        else {
            debug!("Risk percent not derived: overflow");
            return;
        };

        self.risk_percent = input::format_2dp(percent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal::RoundingStrategy;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults() {
        let params = RiskParameters::default();

        assert_eq!(params.balance(), "5000");
        assert_eq!(params.risk_percent(), "0.5");
        assert_eq!(params.risk_cash(), "25.00");
        assert_eq!(params.sl_distance(), "0.15");
        assert_eq!(params.instrument().symbol, "AVAX/USD");
    }

    #[test]
    fn test_default_result() {
        let result = RiskParameters::default().result().unwrap();

        assert_eq!(result.lots, dec!(166.6));
        assert!(result.is_valid);
        assert_eq!(result.actual_risk, dec!(24.99));
    }

    #[test]
    fn test_set_balance_derives_cash() {
        let mut params = RiskParameters::default();
        params.set_balance("5000");
        assert_eq!(params.risk_cash(), "25.00");

        params.set_balance("12000");
        assert_eq!(params.balance(), "12000");
        assert_eq!(params.risk_cash(), "60.00");
        assert_eq!(params.risk_percent(), "0.5");
    }

    #[test]
    fn test_set_risk_percent_derives_cash() {
        let mut params = RiskParameters::default();
        params.set_risk_percent("1.25");

        assert_eq!(params.risk_percent(), "1.25");
        assert_eq!(params.risk_cash(), "62.50");
    }

    #[test]
    fn test_set_risk_cash_derives_percent() {
        let mut params = RiskParameters::default();
        params.set_risk_cash("100");

        assert_eq!(params.risk_cash(), "100");
        assert_eq!(params.risk_percent(), "2.00");
    }

    #[test]
    fn test_zero_balance_keeps_percent() {
        let mut params = RiskParameters::default();
        params.set_balance("0");
        assert_eq!(params.risk_cash(), "0.00");

        params.set_risk_cash("50");
        assert_eq!(params.risk_cash(), "50");
        assert_eq!(params.risk_percent(), "0.5");
    }

    #[test]
    fn test_partial_input_keeps_peer() {
        let mut params = RiskParameters::default();

        params.set_balance("");
        assert_eq!(params.balance(), "");
        assert_eq!(params.risk_cash(), "25.00");

        params.set_balance("50a");
        assert_eq!(params.risk_cash(), "25.00");

        params.set_balance("5000");
        params.set_risk_percent("");
        assert_eq!(params.risk_cash(), "25.00");

        params.set_risk_cash("-");
        assert_eq!(params.risk_cash(), "-");
        assert_eq!(params.risk_percent(), "");
    }

    #[test]
    fn test_sl_distance_and_instrument_uncoupled() {
        let mut params = RiskParameters::default();
        params.set_sl_distance("2");
        params.set_instrument(catalog::lookup("LINK/USD").unwrap());

        assert_eq!(params.balance(), "5000");
        assert_eq!(params.risk_percent(), "0.5");
        assert_eq!(params.risk_cash(), "25.00");

        let result = params.result().unwrap();
        assert_eq!(result.lots, dec!(12));
        assert_eq!(result.actual_risk, dec!(24));
    }

    #[test]
    fn test_result_absent_for_zero_cash() {
        let mut params = RiskParameters::default();
        params.set_risk_cash("0");
        assert!(params.result().is_none());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut params = RiskParameters::default();
        params.set_balance("8000");
        params.set_sl_distance("1.5");
        params.set_instrument(catalog::lookup("ETH/USD").unwrap());

        let snapshot = params.snapshot();
        assert_eq!(snapshot.instrument_symbol, "ETH/USD");
        assert_eq!(snapshot.risk_cash, "40.00");

        let mut restored = RiskParameters::default();
        restored.apply_snapshot(snapshot);
        assert_eq!(restored.balance(), "8000");
        assert_eq!(restored.risk_cash(), "40.00");
        assert_eq!(restored.sl_distance(), "1.5");
        assert_eq!(restored.instrument().symbol, "ETH/USD");
    }

    #[test]
    fn test_apply_snapshot_does_not_derive() {
        let mut params = RiskParameters::default();
        params.apply_snapshot(SettingsSnapshot {
            balance: "1000".to_string(),
            risk_percent: "3".to_string(),
            risk_cash: "7.00".to_string(),
            sl_distance: "0.5".to_string(),
            instrument_symbol: "DOGE/USD".to_string(),
        });

        assert_eq!(params.risk_cash(), "7.00");
        assert_eq!(params.risk_percent(), "3");
        assert_eq!(params.instrument().symbol, "AVAX/USD");
    }

    fn round2(v: Decimal) -> Decimal {
        v.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }

    proptest! {
        #[test]
        fn prop_percent_edit_derives_cash(
            balance_cents in 0i64..100_000_000,
            percent_bp in 0i64..10_000,
        ) {
            let balance = Decimal::new(balance_cents, 2);
            let percent = Decimal::new(percent_bp, 2);

            let mut params = RiskParameters::default();
            params.set_balance(balance.to_string());
            params.set_risk_percent(percent.to_string());

            let cash = input::parse_decimal(params.risk_cash()).unwrap();
            prop_assert_eq!(cash, round2(balance * percent / dec!(100)));
        }

        #[test]
        fn prop_cash_edit_derives_percent(
            balance_cents in 1i64..100_000_000,
            cash_cents in 0i64..10_000_000,
        ) {
            let balance = Decimal::new(balance_cents, 2);
            let cash = Decimal::new(cash_cents, 2);

            let mut params = RiskParameters::default();
            params.set_balance(balance.to_string());
            params.set_risk_cash(cash.to_string());

            let percent = input::parse_decimal(params.risk_percent()).unwrap();
            prop_assert_eq!(percent, round2(cash / balance * dec!(100)));
        }
    }
}
