//! Database persistence for per-user calculator settings.
//!
//! One row per user id holding the raw text of the five persisted fields.
//! Rows are read once at session start and written by upsert.

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

use crate::models::{SettingsSnapshot, StoredSettings};

/// Database connection pool for the settings store.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection.
    pub async fn new(database_url: &str) -> Result<Self> {
        Self::connect(database_url, 5).await
    }

    /// Private in-memory database. Limited to one connection, since every
    /// SQLite memory connection is a separate database.
    pub async fn in_memory() -> Result<Self> {
        Self::connect("sqlite::memory:", 1).await
    }

    async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to connect to database")?;

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    /// Run all database migrations.
    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_settings (
                user_id TEXT PRIMARY KEY,
                balance TEXT NOT NULL,
                risk_percent TEXT NOT NULL,
                risk_cash TEXT NOT NULL,
                sl_distance TEXT NOT NULL,
                instrument_symbol TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create user_settings table")?;

        Ok(())
    }

    /// Load a user's settings. `None` when the user has never saved.
    pub async fn load_settings(&self, user_id: &str) -> Result<Option<StoredSettings>> {
        sqlx::query_as::<_, StoredSettings>(
            r#"
            SELECT user_id, balance, risk_percent, risk_cash, sl_distance,
                   instrument_symbol, updated_at
            FROM user_settings
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to load settings")
    }

    /// Insert or replace a user's settings, stamping the write time.
    pub async fn save_settings(&self, user_id: &str, snapshot: &SettingsSnapshot) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_settings (
                user_id, balance, risk_percent, risk_cash, sl_distance,
                instrument_symbol, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                balance = excluded.balance,
                risk_percent = excluded.risk_percent,
                risk_cash = excluded.risk_cash,
                sl_distance = excluded.sl_distance,
                instrument_symbol = excluded.instrument_symbol,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(&snapshot.balance)
        .bind(&snapshot.risk_percent)
        .bind(&snapshot.risk_cash)
        .bind(&snapshot.sl_distance)
        .bind(&snapshot.instrument_symbol)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .context("Failed to save settings")?;

        Ok(())
    }

    /// Get the connection pool (for advanced queries).
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
