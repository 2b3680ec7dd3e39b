//! Result of a position sizing calculation.

use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

/// Validated lot size derived from risk cash and stop-loss distance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    /// Lot count quantized down to the instrument step
    pub lots: Decimal,

    /// Whether the lots fall inside the instrument's min/max bounds
    pub is_valid: bool,

    /// Success notice or the reason the size is invalid
    pub message: String,

    /// Dollar risk after quantization (lots * stop-loss distance)
    pub actual_risk: Decimal,
}

impl CalculationResult {
    /// Lots expressed in mini lots (10x), to one decimal.
    pub fn mini_lots(&self) -> Decimal {
        self.lots
            .saturating_mul(Decimal::TEN)
            .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
            .normalize()
    }

    /// Lots expressed in whole micro lots (100x).
    pub fn micro_lots(&self) -> Decimal {
        self.lots
            .saturating_mul(Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .normalize()
    }
}

impl fmt::Display for CalculationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Lots:         {}", self.lots)?;
        writeln!(f, "Mini Lots:    {}", self.mini_lots())?;
        writeln!(f, "Micro Lots:   {}", self.micro_lots())?;
        writeln!(f, "Actual Risk:  ${:.2}", self.actual_risk)?;
        write!(
            f,
            "Status:       {} ({})",
            if self.is_valid { "VALID" } else { "INVALID" },
            self.message
        )
    }
}
