//! Settings sync: one-time import on sign-in and debounced export on edit.
//!
//! Only the latest snapshot matters, so a new edit aborts the pending write
//! and schedules a fresh one instead of queueing. Once the quiet period has
//! passed the write is no longer cancellable. Write failures surface as
//! [`SaveStatus::Error`] and are not retried; the next edit writes again.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::db::Database;
use crate::models::{AuthEvent, SaveStatus, Session, SettingsSnapshot};

/// Debounced bridge between the parameter state and the settings store.
pub struct SettingsSync {
    db: Arc<Database>,
    debounce: Duration,
    session: Option<Session>,
    pending: Option<JoinHandle<()>>,
    status: Arc<RwLock<SaveStatus>>,
    saves: Arc<AtomicU64>,
}

impl SettingsSync {
    pub fn new(db: Arc<Database>, debounce: Duration) -> Self {
        Self {
            db,
            debounce,
            session: None,
            pending: None,
            status: Arc::new(RwLock::new(SaveStatus::Idle)),
            saves: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Current session, if signed in.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Outcome of the most recent write.
    pub async fn status(&self) -> SaveStatus {
        *self.status.read().await
    }

    /// Number of writes that reached the store successfully.
    pub fn saves_completed(&self) -> u64 {
        self.saves.load(Ordering::SeqCst)
    }

    /// Observe an identity change.
    ///
    /// Signing in as a new user loads that user's stored snapshot once and
    /// returns it for import; `None` means nothing stored. Repeated sign-in
    /// notifications for the current user do not reload. Signing out drops
    /// any pending write.
    pub async fn on_auth_event(&mut self, event: AuthEvent) -> Result<Option<SettingsSnapshot>> {
        match event {
            AuthEvent::SignedIn(session) => {
                if self.session.as_ref().map(|s| &s.user_id) == Some(&session.user_id) {
                    debug!(user_id = %session.user_id, "Session refreshed");
                    self.session = Some(session);
                    return Ok(None);
                }

                self.cancel();
                info!(user_id = %session.user_id, email = %session.email, "Session started");
                let user_id = session.user_id.clone();
                self.session = Some(session);

                let stored = self.db.load_settings(&user_id).await?;
                match &stored {
                    Some(row) => info!(
                        user_id = %user_id,
                        updated_at = %row.updated_at,
                        "Loaded stored settings"
                    ),
                    None => info!(user_id = %user_id, "No stored settings"),
                }

                Ok(stored.map(|row| row.snapshot))
            }
            AuthEvent::SignedOut => {
                if let Some(session) = self.session.take() {
                    info!(user_id = %session.user_id, "Session ended");
                }
                self.cancel();
                *self.status.write().await = SaveStatus::Idle;
                Ok(None)
            }
        }
    }

    /// Schedule a write of `snapshot` after the debounce delay.
    ///
    /// Replaces any write still pending. Returns `false` without scheduling
    /// when there is no session.
    pub fn schedule(&mut self, snapshot: SettingsSnapshot) -> bool {
        let Some(user_id) = self.session.as_ref().map(|s| s.user_id.clone()) else {
            return false;
        };

        self.cancel();

        let db = self.db.clone();
        let status = self.status.clone();
        let saves = self.saves.clone();
        let debounce = self.debounce;

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;

            // Past the quiet period the write is no longer cancellable
            let write = tokio::spawn(async move {
                *status.write().await = SaveStatus::Saving;
                match db.save_settings(&user_id, &snapshot).await {
                    Ok(()) => {
                        saves.fetch_add(1, Ordering::SeqCst);
                        info!(user_id = %user_id, "Settings saved");
                        *status.write().await = SaveStatus::Saved;
                    }
                    Err(e) => {
                        warn!(user_id = %user_id, error = %e, "Failed to save settings");
                        *status.write().await = SaveStatus::Error;
                    }
                }
            });
            if let Err(e) = write.await {
                warn!(error = %e, "Settings save task ended abnormally");
            }
        }));

        debug!(delay_ms = debounce.as_millis() as u64, "Settings save scheduled");
        true
    }

    /// Wait for the pending write, if any, to finish.
    pub async fn flush(&mut self) {
        if let Some(handle) = self.pending.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "Settings save task ended abnormally");
            }
        }
    }

    /// Drop the pending write if its quiet period has not elapsed yet.
    ///
    /// A write already under way runs to completion and still reports its
    /// outcome through [`SettingsSync::status`].
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            if !handle.is_finished() {
                debug!("Pending settings save cancelled");
            }
            handle.abort();
        }
    }
}

impl Drop for SettingsSync {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trading::RiskParameters;
    use std::time::Instant;

    const DEBOUNCE: Duration = Duration::from_millis(50);

    async fn sync_with(debounce: Duration) -> SettingsSync {
        let db = Arc::new(Database::in_memory().await.unwrap());
        SettingsSync::new(db, debounce)
    }

    async fn sync() -> SettingsSync {
        sync_with(DEBOUNCE).await
    }

    fn session() -> Session {
        Session::new("user-1", "trader@example.com")
    }

    async fn wait_for_status(sync: &SettingsSync, want: SaveStatus) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while sync.status().await != want {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("status never became {}", want.as_str()));
    }

    #[tokio::test]
    async fn test_no_session_no_schedule() {
        let mut sync = sync().await;
        assert!(!sync.schedule(RiskParameters::default().snapshot()));
        assert!(sync.pending.is_none());

        sync.flush().await;
        assert_eq!(sync.status().await, SaveStatus::Idle);
        assert_eq!(sync.saves_completed(), 0);
    }

    #[tokio::test]
    async fn test_sign_in_without_stored_settings() {
        let mut sync = sync().await;
        let loaded = sync.on_auth_event(AuthEvent::SignedIn(session())).await.unwrap();

        assert!(loaded.is_none());
        assert_eq!(sync.session().unwrap().email, "trader@example.com");
    }

    #[tokio::test]
    async fn test_rapid_edits_coalesce_into_one_write() {
        let mut sync = sync().await;
        sync.on_auth_event(AuthEvent::SignedIn(session())).await.unwrap();

        let mut params = RiskParameters::default();
        for balance in ["6", "60", "600", "6000"] {
            params.set_balance(balance);
            assert!(sync.schedule(params.snapshot()));
        }

        sync.flush().await;
        assert_eq!(sync.saves_completed(), 1);
        assert_eq!(sync.status().await, SaveStatus::Saved);

        let stored = sync.db.load_settings("user-1").await.unwrap().unwrap();
        assert_eq!(stored.snapshot.balance, "6000");
        assert_eq!(stored.snapshot.risk_cash, "30.00");
    }

    #[tokio::test]
    async fn test_edit_restarts_quiet_period() {
        let debounce = Duration::from_millis(300);
        let mut sync = sync_with(debounce).await;
        sync.on_auth_event(AuthEvent::SignedIn(session())).await.unwrap();

        let mut params = RiskParameters::default();
        params.set_balance("1000");
        sync.schedule(params.snapshot());

        tokio::time::sleep(Duration::from_millis(20)).await;
        params.set_balance("2000");
        let last_edit = Instant::now();
        sync.schedule(params.snapshot());
        assert_eq!(sync.status().await, SaveStatus::Idle);

        sync.flush().await;
        assert!(last_edit.elapsed() >= debounce);
        assert_eq!(sync.saves_completed(), 1);

        let stored = sync.db.load_settings("user-1").await.unwrap().unwrap();
        assert_eq!(stored.snapshot.balance, "2000");
    }

    #[tokio::test]
    async fn test_sign_in_imports_once() {
        let mut sync = sync().await;
        sync.on_auth_event(AuthEvent::SignedIn(session())).await.unwrap();

        let mut params = RiskParameters::default();
        params.set_sl_distance("0.75");
        sync.schedule(params.snapshot());
        sync.flush().await;

        sync.on_auth_event(AuthEvent::SignedOut).await.unwrap();
        let loaded = sync
            .on_auth_event(AuthEvent::SignedIn(session()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.sl_distance, "0.75");

        // Same user again: no second import
        let again = sync.on_auth_event(AuthEvent::SignedIn(session())).await.unwrap();
        assert!(again.is_none());
    }

    #[tokio::test]
    async fn test_sign_out_drops_pending_write() {
        let mut sync = sync().await;
        sync.on_auth_event(AuthEvent::SignedIn(session())).await.unwrap();
        sync.schedule(RiskParameters::default().snapshot());

        sync.on_auth_event(AuthEvent::SignedOut).await.unwrap();
        tokio::time::sleep(DEBOUNCE * 4).await;

        assert!(sync.session().is_none());
        assert_eq!(sync.saves_completed(), 0);
        assert_eq!(sync.status().await, SaveStatus::Idle);
        assert!(sync.db.load_settings("user-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cancel_lets_running_write_finish() {
        let mut sync = sync().await;
        sync.on_auth_event(AuthEvent::SignedIn(session())).await.unwrap();

        // Hold the only connection so the write stalls after it starts
        let conn = sync.db.pool().acquire().await.unwrap();
        sync.schedule(RiskParameters::default().snapshot());
        wait_for_status(&sync, SaveStatus::Saving).await;

        sync.cancel();
        drop(conn);

        wait_for_status(&sync, SaveStatus::Saved).await;
        assert_eq!(sync.saves_completed(), 1);
        assert!(sync.db.load_settings("user-1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_failed_write_sets_error_status() {
        let mut sync = sync().await;
        sync.on_auth_event(AuthEvent::SignedIn(session())).await.unwrap();
        sync.db.pool().close().await;

        sync.schedule(RiskParameters::default().snapshot());
        sync.flush().await;

        assert_eq!(sync.status().await, SaveStatus::Error);
        assert_eq!(sync.saves_completed(), 0);
    }
}
