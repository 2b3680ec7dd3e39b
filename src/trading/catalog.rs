//! Static instrument catalog.

use std::collections::HashSet;
use std::sync::LazyLock;

use anyhow::{bail, Result};
use rust_decimal_macros::dec;

use crate::models::Instrument;

/// Symbol selected when nothing else is configured.
pub const DEFAULT_SYMBOL: &str = "AVAX/USD";

static INSTRUMENTS: LazyLock<Vec<Instrument>> = LazyLock::new(|| {
    vec![
        Instrument {
            symbol: "BTC/USD",
            name: "Bitcoin",
            asset_type: "Crypto",
            currency: "USD",
            precision: 2,
            margin_rate: "1:2",
            lot_size: dec!(1.0),
            min_size: dec!(0.001),
            max_size: dec!(10),
            step_size: dec!(0.001),
        },
        Instrument {
            symbol: "ETH/USD",
            name: "Ethereum",
            asset_type: "Crypto",
            currency: "USD",
            precision: 2,
            margin_rate: "1:2",
            lot_size: dec!(1.0),
            min_size: dec!(0.01),
            max_size: dec!(100),
            step_size: dec!(0.01),
        },
        Instrument {
            symbol: "AVAX/USD",
            name: "Avalanche",
            asset_type: "Crypto",
            currency: "USD",
            precision: 3,
            margin_rate: "1:2",
            lot_size: dec!(1.0),
            min_size: dec!(0.1),
            max_size: dec!(1000),
            step_size: dec!(0.1),
        },
        Instrument {
            symbol: "SOL/USD",
            name: "Solana",
            asset_type: "Crypto",
            currency: "USD",
            precision: 3,
            margin_rate: "1:2",
            lot_size: dec!(1.0),
            min_size: dec!(0.1),
            max_size: dec!(1000),
            step_size: dec!(0.1),
        },
        Instrument {
            symbol: "AAVE/USD",
            name: "Aave",
            asset_type: "Crypto",
            currency: "USD",
            precision: 2,
            margin_rate: "1:2",
            lot_size: dec!(1.0),
            min_size: dec!(0.01),
            max_size: dec!(500),
            step_size: dec!(0.01),
        },
        Instrument {
            symbol: "LINK/USD",
            name: "Chainlink",
            asset_type: "Crypto",
            currency: "USD",
            precision: 3,
            margin_rate: "1:2",
            lot_size: dec!(1.0),
            min_size: dec!(1),
            max_size: dec!(5000),
            step_size: dec!(1),
        },
        Instrument {
            symbol: "ADA/USD",
            name: "Cardano",
            asset_type: "Crypto",
            currency: "USD",
            precision: 4,
            margin_rate: "1:2",
            lot_size: dec!(1.0),
            min_size: dec!(10),
            max_size: dec!(100000),
            step_size: dec!(1),
        },
    ]
});

/// Every instrument in display order.
pub fn all() -> &'static [Instrument] {
    &INSTRUMENTS
}

/// Find an instrument by its exact symbol.
pub fn lookup(symbol: &str) -> Option<&'static Instrument> {
    INSTRUMENTS.iter().find(|i| i.symbol == symbol)
}

/// Resolve user input: exact symbol, or a base asset / symbol in any case.
pub fn resolve(input: &str) -> Option<&'static Instrument> {
    let input = input.trim();
    lookup(input).or_else(|| {
        INSTRUMENTS.iter().find(|i| {
            i.symbol.eq_ignore_ascii_case(input) || i.base_asset().eq_ignore_ascii_case(input)
        })
    })
}

/// The instrument selected for fresh parameters.
pub fn default_instrument() -> &'static Instrument {
    lookup(DEFAULT_SYMBOL).unwrap_or(&INSTRUMENTS[0])
}

/// Check that symbols are unique and every instrument is well formed.
pub fn validate(instruments: &[Instrument]) -> Result<()> {
    let mut seen = HashSet::new();

    for instrument in instruments {
        if !seen.insert(instrument.symbol) {
            bail!("Duplicate instrument symbol: {}", instrument.symbol);
        }
        if !instrument.is_well_formed() {
            bail!(
                "{}: invalid lot constraints (step {}, min {}, max {})",
                instrument.symbol,
                instrument.step_size,
                instrument.min_size,
                instrument.max_size
            );
        }
    }

    Ok(())
}
