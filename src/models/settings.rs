//! Persisted settings snapshot and the identity it is keyed by.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authenticated session supplied by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Stable user identifier, the settings row key
    pub user_id: String,

    /// Account email for display
    pub email: String,
}

impl Session {
    pub fn new(user_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
        }
    }
}

/// Identity state change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(Session),
    SignedOut,
}

/// Raw text of the five persisted fields.
///
/// Values are stored exactly as the user typed them, so partial input
/// survives a round trip through the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SettingsSnapshot {
    pub balance: String,
    pub risk_percent: String,
    pub risk_cash: String,
    pub sl_distance: String,
    pub instrument_symbol: String,
}

/// Stored settings row with its write timestamp.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredSettings {
    pub user_id: String,
    #[sqlx(flatten)]
    pub snapshot: SettingsSnapshot,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of the most recent settings write, for the status indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveStatus {
    #[default]
    Idle,
    Saving,
    Saved,
    Error,
}

impl SaveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaveStatus::Idle => "idle",
            SaveStatus::Saving => "saving",
            SaveStatus::Saved => "saved",
            SaveStatus::Error => "error",
        }
    }
}
