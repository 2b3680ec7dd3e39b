//! Data models for instruments, calculation results, and persisted settings.

mod instrument;
mod result;
mod settings;

pub use instrument::Instrument;
pub use result::CalculationResult;
pub use settings::{AuthEvent, SaveStatus, Session, SettingsSnapshot, StoredSettings};
