// src/session/mod.rs — Session store: who is logged in, persisted across restarts
//
// Single source of truth for the current token and user. The pair is
// persisted under two fixed keys in durable storage, restored once at
// startup, and pushed into the API gateway whenever it changes.

pub mod claims;
pub mod storage;
pub mod user;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Arc, RwLock};
use tokio::sync::watch;

use crate::api::{ApiGateway, UnauthorizedHandler};
use crate::infra::config::SessionConfig;
use crate::infra::errors::NekotaError;
use storage::DurableStorage;
use user::UserRecord;

/// Durable key holding the bearer token. Existing installs depend on this name.
pub const TOKEN_KEY: &str = "token";
/// Durable key holding the JSON-serialized user. Existing installs depend on this name.
pub const USER_KEY: &str = "user";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Uninitialized,
    Restoring,
    /// Reached exactly once, after the first restore attempt, whatever its outcome.
    Ready,
}

/// Token and user always travel together.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedSession {
    pub token: String,
    pub user: UserRecord,
}

pub struct SessionStore {
    storage: Arc<dyn DurableStorage>,
    gateway: Arc<ApiGateway>,
    state: RwLock<Option<AuthenticatedSession>>,
    status: watch::Sender<SessionStatus>,
    admin_user_id: String,
    premium_days: i64,
}

impl SessionStore {
    /// Build the store and register it as the gateway's 401 handler.
    pub fn new(
        storage: Arc<dyn DurableStorage>,
        gateway: Arc<ApiGateway>,
        config: &SessionConfig,
    ) -> Arc<Self> {
        let (status, _) = watch::channel(SessionStatus::Uninitialized);
        let store = Arc::new(Self {
            storage,
            gateway,
            state: RwLock::new(None),
            status,
            admin_user_id: config.admin_user_id.clone(),
            premium_days: config.premium_days,
        });
        let handler: Arc<dyn UnauthorizedHandler> = store.clone();
        store
            .gateway
            .set_unauthorized_handler(Arc::downgrade(&handler));
        store
    }

    pub fn gateway(&self) -> &Arc<ApiGateway> {
        &self.gateway
    }

    // ─── Lifecycle ──────────────────────────────────────────────────────────

    /// Restore `{token, user}` from durable storage. Runs once; later calls
    /// return the current session without touching storage.
    ///
    /// Never fails: a missing half, an unparseable user or a storage error
    /// all degrade to "logged out" with both keys cleared.
    pub async fn restore(&self) -> Option<AuthenticatedSession> {
        let mut claimed = false;
        self.status.send_if_modified(|s| {
            if *s == SessionStatus::Uninitialized {
                *s = SessionStatus::Restoring;
                claimed = true;
            }
            claimed
        });
        if !claimed {
            self.wait_ready().await;
            return self.current();
        }

        let restored = match self.read_durable().await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("Session restore failed, continuing logged out: {e}");
                self.clear_durable().await;
                None
            }
        };

        if let Some(session) = &restored {
            tracing::info!(user_id = %session.user.id, "Session restored");
            self.write_state(Some(session.clone()));
            self.gateway.set_token(Some(session.token.clone()));
        } else {
            tracing::debug!("No stored session");
        }

        // Unconditional: a failed restore must not leave the status stuck
        self.status.send_replace(SessionStatus::Ready);
        restored
    }

    async fn read_durable(&self) -> Result<Option<AuthenticatedSession>, NekotaError> {
        let token = self.storage.get(TOKEN_KEY).await?;
        let user_json = self.storage.get(USER_KEY).await?;

        match (token, user_json) {
            (Some(token), Some(user_json)) if !token.is_empty() => {
                let user: UserRecord = serde_json::from_str(&user_json)
                    .map_err(|e| NekotaError::StorageCorrupt(format!("stored user: {e}")))?;
                Ok(Some(AuthenticatedSession { token, user }))
            }
            (None, None) => Ok(None),
            _ => {
                tracing::warn!("Half-written session record found, clearing it");
                self.clear_durable().await;
                Ok(None)
            }
        }
    }

    /// Overwrite the persisted and in-memory session, then hand the token
    /// to the gateway. The pair is trusted as given.
    pub async fn login(&self, token: String, user: UserRecord) -> Result<(), NekotaError> {
        let user_json = serde_json::to_string(&user)
            .map_err(|e| NekotaError::Storage(format!("serialize user: {e}")))?;

        // Write the user first: a crash in between leaves a half record,
        // which restore() discards.
        if let Err(e) = self.write_durable(&token, &user_json).await {
            self.clear_durable().await;
            return Err(e);
        }

        tracing::info!(user_id = %user.id, "Logged in");
        self.write_state(Some(AuthenticatedSession {
            token: token.clone(),
            user,
        }));
        self.gateway.set_token(Some(token));
        Ok(())
    }

    async fn write_durable(&self, token: &str, user_json: &str) -> Result<(), NekotaError> {
        self.storage.set(USER_KEY, user_json).await?;
        self.storage.set(TOKEN_KEY, token).await
    }

    /// Clear persisted and in-memory state and drop the gateway's token.
    /// Safe to call when already logged out.
    pub async fn logout(&self) {
        self.clear_durable().await;
        let previous = self.write_state(None);
        self.gateway.set_token(None);
        if let Some(previous) = previous {
            tracing::info!(user_id = %previous.user.id, "Logged out");
        }
    }

    async fn clear_durable(&self) {
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.storage.remove(key).await {
                tracing::warn!(key, "Failed to clear stored session: {e}");
            }
        }
    }

    // ─── Premium ────────────────────────────────────────────────────────────

    /// Optimistic, local-only premium patch (after a payment redirect).
    /// Marks the user with a local override until the server confirms.
    /// No-op without a user.
    pub async fn update_premium_status(
        &self,
        is_premium: bool,
        premium_until: Option<DateTime<Utc>>,
    ) -> Result<(), NekotaError> {
        let premium_days = self.premium_days;
        self.patch_user(|user| {
            user.apply_premium_override(is_premium, premium_until, premium_days, Utc::now())
        })
        .await
    }

    /// Apply the server-confirmed premium flag, dropping the local override.
    pub async fn reconcile_premium(&self, is_premium: bool) -> Result<(), NekotaError> {
        let premium_days = self.premium_days;
        self.patch_user(|user| user.reconcile_premium(is_premium, premium_days, Utc::now()))
            .await
    }

    /// Replace the user snapshot (e.g. after /api/auth/verify), keeping the token.
    pub async fn replace_user(&self, user: UserRecord) -> Result<(), NekotaError> {
        self.patch_user(move |current| *current = user).await
    }

    /// Patch a copy of the user, persist it, then publish it. A failed
    /// write leaves both copies as they were.
    async fn patch_user<F>(&self, patch: F) -> Result<(), NekotaError>
    where
        F: FnOnce(&mut UserRecord),
    {
        let Some(mut patched) = self.current() else {
            return Ok(());
        };
        patch(&mut patched.user);
        let user_json = serde_json::to_string(&patched.user)
            .map_err(|e| NekotaError::Storage(format!("serialize user: {e}")))?;
        self.storage.set(USER_KEY, &user_json).await?;

        // A logout or re-login may have landed while the write was pending
        let superseded = {
            let mut guard = self.state.write().unwrap_or_else(|e| e.into_inner());
            match guard.as_mut() {
                Some(active) if active.token == patched.token => {
                    active.user = patched.user;
                    None
                }
                other => Some(other.cloned()),
            }
        };
        if let Some(active) = superseded {
            tracing::debug!("Session changed during a user update, dropping the update");
            self.resync_durable_user(active).await;
        }
        Ok(())
    }

    /// Put the durable user back in line with the in-memory session.
    async fn resync_durable_user(&self, active: Option<AuthenticatedSession>) {
        let result = match active {
            Some(session) => match serde_json::to_string(&session.user) {
                Ok(json) => self.storage.set(USER_KEY, &json).await,
                Err(e) => Err(NekotaError::Storage(format!("serialize user: {e}"))),
            },
            None => self.storage.remove(USER_KEY).await,
        };
        if let Err(e) = result {
            tracing::warn!("Failed to resync stored user: {e}");
        }
    }

    // ─── Accessors ──────────────────────────────────────────────────────────

    pub fn status(&self) -> SessionStatus {
        *self.status.borrow()
    }

    pub fn is_ready(&self) -> bool {
        self.status() == SessionStatus::Ready
    }

    /// Resolves once restore() has finished.
    pub async fn wait_ready(&self) {
        let mut rx = self.status.subscribe();
        // The sender lives in self, so the channel cannot close here
        let _ = rx.wait_for(|s| *s == SessionStatus::Ready).await;
    }

    pub fn current(&self) -> Option<AuthenticatedSession> {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn current_user(&self) -> Option<UserRecord> {
        self.current().map(|s| s.user)
    }

    pub fn token(&self) -> Option<String> {
        self.current().map(|s| s.token)
    }

    pub fn is_logged_in(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|s| s.user.is_admin(&self.admin_user_id))
    }

    fn write_state(&self, next: Option<AuthenticatedSession>) -> Option<AuthenticatedSession> {
        let mut guard = self.state.write().unwrap_or_else(|e| e.into_inner());
        std::mem::replace(&mut *guard, next)
    }
}

#[async_trait]
impl UnauthorizedHandler for SessionStore {
    async fn on_unauthorized(&self, rejected_token: &str) {
        if self.token().as_deref() != Some(rejected_token) {
            return;
        }
        tracing::warn!("Backend rejected the session token, logging out");
        self.logout().await;
    }
}

#[cfg(test)]
mod tests {
    use super::storage::{MemoryStorage, MockDurableStorage};
    use super::*;
    use mockall::Sequence;
    use pretty_assertions::assert_eq;
    use tokio::sync::Notify;

    /// Memory storage whose next `user` write parks until released.
    struct GatedStorage {
        inner: MemoryStorage,
        entered: Notify,
        release: Notify,
        armed: std::sync::atomic::AtomicBool,
    }

    #[async_trait]
    impl DurableStorage for GatedStorage {
        async fn get(&self, key: &str) -> Result<Option<String>, NekotaError> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> Result<(), NekotaError> {
            use std::sync::atomic::Ordering;
            if key == USER_KEY && self.armed.swap(false, Ordering::SeqCst) {
                self.entered.notify_one();
                self.release.notified().await;
            }
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> Result<(), NekotaError> {
            self.inner.remove(key).await
        }
    }

    fn gateway() -> Arc<ApiGateway> {
        Arc::new(ApiGateway::new("http://127.0.0.1:9").unwrap())
    }

    fn store_with(storage: Arc<dyn DurableStorage>) -> Arc<SessionStore> {
        SessionStore::new(storage, gateway(), &SessionConfig::default())
    }

    #[tokio::test]
    async fn test_starts_uninitialized() {
        let store = store_with(Arc::new(MemoryStorage::new()));
        assert_eq!(store.status(), SessionStatus::Uninitialized);
        assert!(!store.is_logged_in());
    }

    #[tokio::test]
    async fn test_restore_twice_reads_storage_once() {
        let mut mock = MockDurableStorage::new();
        mock.expect_get().times(2).returning(|_| Ok(None));
        let store = store_with(Arc::new(mock));

        assert!(store.restore().await.is_none());
        assert!(store.restore().await.is_none());
        assert_eq!(store.status(), SessionStatus::Ready);
    }

    #[tokio::test]
    async fn test_restore_storage_failure_degrades_to_logged_out() {
        let mut mock = MockDurableStorage::new();
        mock.expect_get()
            .returning(|_| Err(NekotaError::Storage("disk on fire".into())));
        mock.expect_remove().times(2).returning(|_| Ok(()));
        let store = store_with(Arc::new(mock));

        assert!(store.restore().await.is_none());
        assert_eq!(store.status(), SessionStatus::Ready);
        assert!(store.gateway().token().is_none());
    }

    #[tokio::test]
    async fn test_login_write_failure_leaves_no_half_record() {
        let mut mock = MockDurableStorage::new();
        mock.expect_set()
            .withf(|k, _| k == USER_KEY)
            .returning(|_, _| Ok(()));
        mock.expect_set()
            .withf(|k, _| k == TOKEN_KEY)
            .returning(|_, _| Err(NekotaError::Storage("quota".into())));
        mock.expect_remove().times(2).returning(|_| Ok(()));
        let store = store_with(Arc::new(mock));

        let result = store.login("abc".into(), UserRecord::new("u1")).await;
        assert!(matches!(result, Err(NekotaError::Storage(_))));
        assert!(!store.is_logged_in());
        assert!(store.gateway().token().is_none());
    }

    #[tokio::test]
    async fn test_premium_write_failure_keeps_memory_and_disk_in_step() {
        let mut mock = MockDurableStorage::new();
        let mut seq = Sequence::new();
        mock.expect_set()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        mock.expect_set()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(NekotaError::Storage("quota".into())));
        let store = store_with(Arc::new(mock));
        store.login("abc".into(), UserRecord::new("u1")).await.unwrap();

        let result = store.update_premium_status(true, None).await;
        assert!(matches!(result, Err(NekotaError::Storage(_))));

        let user = store.current_user().unwrap();
        assert_eq!(user.premium_until, None);
        assert!(!user.has_local_premium_override());
    }

    #[tokio::test]
    async fn test_logout_during_premium_write_leaves_no_user_behind() {
        let storage = Arc::new(GatedStorage {
            inner: MemoryStorage::new(),
            entered: Notify::new(),
            release: Notify::new(),
            armed: std::sync::atomic::AtomicBool::new(false),
        });
        let store = store_with(storage.clone());
        store.login("abc".into(), UserRecord::new("u1")).await.unwrap();
        storage
            .armed
            .store(true, std::sync::atomic::Ordering::SeqCst);

        let pending = {
            let store = store.clone();
            tokio::spawn(async move { store.update_premium_status(true, None).await })
        };
        storage.entered.notified().await;
        store.logout().await;
        storage.release.notify_one();

        pending.await.unwrap().unwrap();
        assert!(!store.is_logged_in());
        assert!(storage.inner.is_empty());
    }

    #[tokio::test]
    async fn test_relogin_during_premium_write_keeps_new_user() {
        let storage = Arc::new(GatedStorage {
            inner: MemoryStorage::new(),
            entered: Notify::new(),
            release: Notify::new(),
            armed: std::sync::atomic::AtomicBool::new(false),
        });
        let store = store_with(storage.clone());
        store.login("old".into(), UserRecord::new("u1")).await.unwrap();
        storage
            .armed
            .store(true, std::sync::atomic::Ordering::SeqCst);

        let pending = {
            let store = store.clone();
            tokio::spawn(async move { store.update_premium_status(true, None).await })
        };
        storage.entered.notified().await;
        store.login("new".into(), UserRecord::new("u2")).await.unwrap();
        storage.release.notify_one();

        pending.await.unwrap().unwrap();
        assert_eq!(store.current_user().unwrap().id, "u2");
        let stored = storage.inner.get(USER_KEY).await.unwrap().unwrap();
        let stored: UserRecord = serde_json::from_str(&stored).unwrap();
        assert_eq!(stored.id, "u2");
        assert_eq!(stored.premium_until, None);
    }

    #[tokio::test]
    async fn test_is_admin_uses_configured_sentinel() {
        let config = SessionConfig {
            admin_user_id: "root".into(),
            ..SessionConfig::default()
        };
        let store = SessionStore::new(Arc::new(MemoryStorage::new()), gateway(), &config);
        store.login("t".into(), UserRecord::new("root")).await.unwrap();
        assert!(store.is_admin());
        store.login("t".into(), UserRecord::new("admin")).await.unwrap();
        assert!(!store.is_admin());
    }

    #[tokio::test]
    async fn test_unauthorized_for_stale_token_is_ignored() {
        let store = store_with(Arc::new(MemoryStorage::new()));
        store.login("new".into(), UserRecord::new("u1")).await.unwrap();
        store.on_unauthorized("old").await;
        assert!(store.is_logged_in());

        store.on_unauthorized("new").await;
        assert!(!store.is_logged_in());
    }

    #[tokio::test]
    async fn test_wait_ready_resolves_after_restore() {
        let store = store_with(Arc::new(MemoryStorage::new()));
        let waiter = {
            let store = store.clone();
            tokio::spawn(async move {
                store.wait_ready().await;
                store.status()
            })
        };
        store.restore().await;
        assert_eq!(waiter.await.unwrap(), SessionStatus::Ready);
    }
}
