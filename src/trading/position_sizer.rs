//! Position sizing: risk cash and stop-loss distance to a validated lot count.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::debug;

use crate::models::{CalculationResult, Instrument};

use super::input;

/// Added before flooring so a value sitting exactly on a step boundary is not
/// truncated to the step below by binary float error.
pub const QUANTIZE_EPSILON: f64 = 1e-7;

/// Message for a size inside the instrument bounds.
pub const SUCCESS_MESSAGE: &str = "Calculation successful";

/// Calculator for exchange-compliant position sizes.
///
/// Stateless; every call is a pure function of its inputs, so it is cheap to
/// re-run on every edit.
pub struct PositionSizer;

impl PositionSizer {
    /// Compute lots for the given raw risk cash and stop-loss distance.
    ///
    /// Returns `None` while the inputs are not computable: either field does
    /// not parse, the distance is zero, or the risk amount is not positive.
    ///
    /// Lots = floor(risk / distance / step + ε) * step, rounded to the step's
    /// decimals. Bounds are checked on the quantized value.
    pub fn compute(
        risk_cash: &str,
        sl_distance: &str,
        instrument: &Instrument,
    ) -> Option<CalculationResult> {
        let risk_amount = input::parse_f64(risk_cash)?;
        let distance = input::parse_f64(sl_distance)?;

        if distance == 0.0 || risk_amount <= 0.0 {
            debug!(risk_amount, distance, "Inputs not computable");
            return None;
        }

        let raw_units = risk_amount / distance;
        let lots = Self::quantize(raw_units, instrument)?;

        let (is_valid, message) = Self::validate(lots, instrument);

        let actual_risk = lots.saturating_mul(input::parse_decimal(sl_distance)?);

        debug!(
            symbol = instrument.symbol,
            raw_units,
            lots = %lots,
            actual_risk = %actual_risk,
            is_valid,
            "Position size computed"
        );

        Some(CalculationResult {
            lots,
            is_valid,
            message,
            actual_risk,
        })
    }

    /// Floor raw units to a multiple of the instrument step.
    ///
    /// Never rounds up. Sizes beyond the `Decimal` range saturate to
    /// `Decimal::MAX` / `Decimal::MIN`, which always fail the bounds check.
    /// `None` only for NaN.
    pub fn quantize(raw_units: f64, instrument: &Instrument) -> Option<Decimal> {
        let step = instrument.step_size.to_f64()?;
        let stepped_units = (raw_units / step + QUANTIZE_EPSILON).floor() * step;

        let lots = match Decimal::from_f64(stepped_units) {
            Some(lots) => lots
                .round_dp_with_strategy(
                    instrument.step_decimals(),
                    RoundingStrategy::MidpointAwayFromZero,
                )
                .normalize(),
            None if stepped_units.is_nan() => return None,
            None if stepped_units > 0.0 => Decimal::MAX,
            None => Decimal::MIN,
        };

        Some(lots)
    }

    /// Check quantized lots against the instrument's min/max bounds.
    pub fn validate(lots: Decimal, instrument: &Instrument) -> (bool, String) {
        if lots < instrument.min_size {
            (false, format!("Below Min Size ({})", instrument.min_size))
        } else if lots > instrument.max_size {
            (false, format!("Exceeds Max Size ({})", instrument.max_size))
        } else {
            (true, SUCCESS_MESSAGE.to_string())
        }
    }
}
