//! Persisted session (bearer token + user profile).
//!
//! Token and profile live together in one [`SessionRecord`] under
//! [`keys::SESSION`], so every change is a single storage write and there is
//! no window where one half exists without the other on disk. The individual
//! operations (`store`, `persist_profile`, `clear`, ...) are read-modify-write
//! cycles on that record, serialized by an internal lock.
//!
//! Storage failures never reach the caller: they are logged and reported as
//! `false` / `None`, leaving whatever was stored before untouched.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::clock::Clock;
use crate::models::UserProfile;
use crate::storage::{keys, KeyValueStorage, KeyValueStorageExt};

/// A usable session: the bearer token and the profile it belongs to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token.
    pub token: String,
    /// Profile snapshot taken at sign-in or last update.
    pub user: Option<UserProfile>,
}

impl Session {
    /// Create a session.
    pub fn new(token: impl Into<String>, user: UserProfile) -> Self {
        Self {
            token: token.into(),
            user: Some(user),
        }
    }
}

/// What is actually written to storage.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Bearer token, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Profile snapshot, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
    /// Last write, Unix milliseconds.
    #[serde(default)]
    pub updated_at: i64,
}

impl SessionRecord {
    fn is_empty(&self) -> bool {
        self.token.is_none() && self.user.is_none()
    }
}

/// Reads and writes the session record.
///
/// Cheap to clone; clones share the same storage and write lock.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn KeyValueStorage>,
    clock: Arc<dyn Clock>,
    write_lock: Arc<Mutex<()>>,
}

impl SessionStore {
    /// Create a store over the given storage.
    pub fn new(storage: Arc<dyn KeyValueStorage>, clock: Arc<dyn Clock>) -> Self {
        Self {
            storage,
            clock,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Save the bearer token, keeping the current profile.
    pub async fn store(&self, token: &str) -> bool {
        let token = token.to_string();
        self.update(move |record| record.token = Some(token)).await
    }

    /// Current bearer token.
    pub async fn read(&self) -> Option<String> {
        self.load().await.and_then(|record| record.token)
    }

    /// Forget the bearer token. The profile snapshot is left in place.
    pub async fn clear(&self) -> bool {
        self.update(|record| record.token = None).await
    }

    /// Save the profile snapshot, keeping the current token.
    pub async fn persist_profile(&self, profile: &UserProfile) -> bool {
        let profile = profile.clone();
        self.update(move |record| record.user = Some(profile)).await
    }

    /// Current profile snapshot.
    pub async fn restore_profile(&self) -> Option<UserProfile> {
        self.load().await.and_then(|record| record.user)
    }

    /// Save token and profile in a single write.
    pub async fn save(&self, session: &Session) -> bool {
        let session = session.clone();
        self.update(move |record| {
            record.token = Some(session.token);
            record.user = session.user;
        })
        .await
    }

    /// The stored session, only when both token and profile are present.
    pub async fn restore(&self) -> Option<Session> {
        let record = self.load().await?;
        match (record.token, record.user) {
            (Some(token), Some(user)) => Some(Session::new(token, user)),
            _ => None,
        }
    }

    /// Remove everything, including keys written by older app versions.
    pub async fn clear_all(&self) -> bool {
        let _guard = self.write_lock.lock().await;
        let mut ok = true;
        for key in [keys::SESSION, keys::LEGACY_TOKEN, keys::LEGACY_USER] {
            if let Err(err) = self.storage.remove(key).await {
                tracing::warn!(key, "failed to clear session key: {err}");
                ok = false;
            }
        }
        ok
    }

    /// Fold the token/profile pair written by older app versions under two
    /// separate keys into the session record.
    ///
    /// Only runs when no record exists yet. Returns true if a legacy session
    /// was migrated.
    pub async fn migrate_legacy(&self) -> bool {
        let _guard = self.write_lock.lock().await;

        match self.storage.get(keys::SESSION).await {
            Ok(Some(_)) => return false,
            Ok(None) => {}
            Err(err) => {
                tracing::warn!("failed to read session record: {err}");
                return false;
            }
        }

        let token = match self.storage.get(keys::LEGACY_TOKEN).await {
            Ok(Some(token)) if !token.is_empty() => token,
            Ok(_) => return false,
            Err(err) => {
                tracing::warn!("failed to read legacy token: {err}");
                return false;
            }
        };
        let user = match self.storage.get_json::<UserProfile>(keys::LEGACY_USER).await {
            Ok(user) => user,
            Err(err) => {
                tracing::warn!("discarding unreadable legacy profile: {err}");
                None
            }
        };

        let record = SessionRecord {
            token: Some(token),
            user,
            updated_at: self.clock.now_millis(),
        };
        if let Err(err) = self.storage.set_json(keys::SESSION, &record).await {
            tracing::warn!("failed to migrate legacy session: {err}");
            return false;
        }
        for key in [keys::LEGACY_TOKEN, keys::LEGACY_USER] {
            if let Err(err) = self.storage.remove(key).await {
                tracing::warn!(key, "failed to remove legacy key: {err}");
            }
        }
        tracing::info!("migrated legacy session record");
        true
    }

    async fn load(&self) -> Option<SessionRecord> {
        match self.storage.get_json::<SessionRecord>(keys::SESSION).await {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!("failed to read session record: {err}");
                None
            }
        }
    }

    async fn update<F>(&self, apply: F) -> bool
    where
        F: FnOnce(&mut SessionRecord) + Send,
    {
        let _guard = self.write_lock.lock().await;

        let mut record = match self.storage.get_json::<SessionRecord>(keys::SESSION).await {
            Ok(record) => record.unwrap_or_default(),
            Err(err) => {
                tracing::warn!("overwriting unreadable session record: {err}");
                SessionRecord::default()
            }
        };
        apply(&mut record);
        record.updated_at = self.clock.now_millis();

        let result = if record.is_empty() {
            self.storage.remove(keys::SESSION).await
        } else {
            self.storage.set_json(keys::SESSION, &record).await
        };
        match result {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!("failed to write session record: {err}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::InMemoryStorage;

    fn store_with(storage: Arc<InMemoryStorage>) -> SessionStore {
        SessionStore::new(storage, ManualClock::shared(1_000))
    }

    #[tokio::test]
    async fn test_save_and_restore() {
        let store = store_with(Arc::new(InMemoryStorage::new()));
        let profile = UserProfile::new(1, 2);

        assert!(store.save(&Session::new("abc", profile.clone())).await);

        let session = store.restore().await.unwrap();
        assert_eq!(session.token, "abc");
        assert_eq!(session.user, Some(profile));
    }

    #[tokio::test]
    async fn test_restore_requires_both_halves() {
        let store = store_with(Arc::new(InMemoryStorage::new()));

        store.store("abc").await;
        assert_eq!(store.read().await, Some("abc".to_string()));
        assert!(store.restore().await.is_none());

        store.persist_profile(&UserProfile::new(1, 2)).await;
        assert!(store.restore().await.is_some());
    }

    #[tokio::test]
    async fn test_clear_keeps_profile() {
        let store = store_with(Arc::new(InMemoryStorage::new()));
        store.save(&Session::new("abc", UserProfile::new(1, 2))).await;

        assert!(store.clear().await);
        assert_eq!(store.read().await, None);
        assert!(store.restore_profile().await.is_some());
        assert!(store.restore().await.is_none());
    }

    #[tokio::test]
    async fn test_clear_all() {
        let storage = Arc::new(InMemoryStorage::new());
        let store = store_with(storage.clone());
        store.save(&Session::new("abc", UserProfile::new(1, 2))).await;

        assert!(store.clear_all().await);
        assert_eq!(store.read().await, None);
        assert_eq!(store.restore_profile().await, None);
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_write_failure_is_swallowed() {
        let storage = Arc::new(InMemoryStorage::new());
        let store = store_with(storage.clone());
        store.store("old").await;

        storage.fail_writes(true);
        assert!(!store.store("new").await);
        assert_eq!(store.read().await, Some("old".to_string()));
    }

    #[tokio::test]
    async fn test_corrupted_record_reads_as_empty() {
        let storage = Arc::new(InMemoryStorage::new());
        storage.set(keys::SESSION, "{broken").await.unwrap();
        let store = store_with(storage);

        assert_eq!(store.read().await, None);
        assert!(store.store("fresh").await);
        assert_eq!(store.read().await, Some("fresh".to_string()));
    }

    #[tokio::test]
    async fn test_migrate_legacy_keys() {
        let storage = Arc::new(InMemoryStorage::new());
        storage.set(keys::LEGACY_TOKEN, "abc").await.unwrap();
        storage
            .set(keys::LEGACY_USER, r#"{"iD_Usuario":1,"iD_RolUsuario":2}"#)
            .await
            .unwrap();
        let store = store_with(storage.clone());

        assert!(store.migrate_legacy().await);
        assert!(!store.migrate_legacy().await);

        let session = store.restore().await.unwrap();
        assert_eq!(session.token, "abc");
        assert_eq!(storage.get(keys::LEGACY_TOKEN).await.unwrap(), None);
    }
}
