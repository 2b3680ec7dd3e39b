//! Instrument model describing a tradable symbol and its lot constraints.

use rust_decimal::Decimal;
use serde::Serialize;

/// Tradable instrument with exchange lot constraints.
///
/// Instruments live in the static catalog and are handed out as
/// `&'static Instrument`; nothing ever clones or edits one.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    /// Unique symbol (e.g., "AVAX/USD")
    pub symbol: &'static str,

    /// Human-readable name
    pub name: &'static str,

    /// Asset class label for display
    pub asset_type: &'static str,

    /// Quote currency
    pub currency: &'static str,

    /// Price decimals shown for this instrument
    pub precision: u32,

    /// Margin rate label (e.g., "1:2")
    pub margin_rate: &'static str,

    /// Contract size per 1.0 lot
    pub lot_size: Decimal,

    /// Smallest tradable lot count (inclusive)
    pub min_size: Decimal,

    /// Largest tradable lot count (inclusive)
    pub max_size: Decimal,

    /// Quantization granularity for lots
    pub step_size: Decimal,
}

impl Instrument {
    /// Base asset of the symbol ("AVAX" for "AVAX/USD").
    pub fn base_asset(&self) -> &'static str {
        self.symbol.split('/').next().unwrap_or(self.symbol)
    }

    /// Number of fractional digits in the step size (0.01 -> 2, 1 -> 0).
    pub fn step_decimals(&self) -> u32 {
        self.step_size.normalize().scale()
    }

    /// Check the record-level invariants: positive step, min <= max.
    pub fn is_well_formed(&self) -> bool {
        self.step_size > Decimal::ZERO && self.min_size <= self.max_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn instrument(step_size: Decimal) -> Instrument {
        Instrument {
            symbol: "TEST/USD",
            name: "Test",
            asset_type: "Crypto",
            currency: "USD",
            precision: 2,
            margin_rate: "1:2",
            lot_size: dec!(1.0),
            min_size: dec!(0.1),
            max_size: dec!(1000),
            step_size,
        }
    }

    #[test]
    fn test_step_decimals() {
        assert_eq!(instrument(dec!(0.01)).step_decimals(), 2);
        assert_eq!(instrument(dec!(0.1)).step_decimals(), 1);
        assert_eq!(instrument(dec!(1)).step_decimals(), 0);
        // Trailing zeros do not count
        assert_eq!(instrument(dec!(0.10)).step_decimals(), 1);
        assert_eq!(instrument(dec!(1.0)).step_decimals(), 0);
    }

    #[test]
    fn test_base_asset() {
        assert_eq!(instrument(dec!(1)).base_asset(), "TEST");
    }

    #[test]
    fn test_well_formed() {
        assert!(instrument(dec!(0.1)).is_well_formed());
        assert!(!instrument(Decimal::ZERO).is_well_formed());

        let mut inverted = instrument(dec!(0.1));
        inverted.min_size = dec!(2000);
        assert!(!inverted.is_well_formed());
    }
}
