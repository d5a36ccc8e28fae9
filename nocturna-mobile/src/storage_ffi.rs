//! Platform key/value storage supplied by the host app.
//!
//! iOS hosts usually back this with `UserDefaults`, Android hosts with
//! `SharedPreferences` or DataStore. The Rust side only ever sees strings.

use std::sync::Arc;

use nocturna_core::storage::{KeyValueStorage, StorageError, StorageErrorCode, StorageResult};

/// Key/value store callback interface.
///
/// Implement this in Swift/Kotlin and pass it to `NocturnaClient::new`.
///
/// # Thread Safety
///
/// Methods may be called from any thread. Implementations must be
/// thread-safe.
#[uniffi::export(callback_interface)]
pub trait KeyValueStoreCallback: Send + Sync {
    /// Read a value, `None` when the key is absent.
    fn get(&self, key: String) -> Option<String>;

    /// Write a value. Return false if the platform store refused it.
    fn set(&self, key: String, value: String) -> bool;

    /// Delete a value. Removing an absent key returns true.
    fn remove(&self, key: String) -> bool;

    /// Every key currently stored.
    fn keys(&self) -> Vec<String>;
}

/// Bridge from the FFI callback to [`KeyValueStorage`].
pub struct CallbackStorage {
    ffi: Arc<dyn KeyValueStoreCallback>,
}

impl CallbackStorage {
    /// Wrap a host store.
    pub fn new(ffi: Arc<dyn KeyValueStoreCallback>) -> Self {
        Self { ffi }
    }
}

impl std::fmt::Debug for CallbackStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackStorage")
            .field("ffi", &"<KeyValueStoreCallback>")
            .finish()
    }
}

#[async_trait::async_trait]
impl KeyValueStorage for CallbackStorage {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.ffi.get(key.to_string()))
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        if self.ffi.set(key.to_string(), value.to_string()) {
            Ok(())
        } else {
            tracing::warn!(key, "host store refused write");
            Err(StorageError::with_key(
                StorageErrorCode::Unavailable,
                "platform store refused the write",
                key,
            ))
        }
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        if self.ffi.remove(key.to_string()) {
            Ok(())
        } else {
            tracing::warn!(key, "host store refused delete");
            Err(StorageError::with_key(
                StorageErrorCode::Unavailable,
                "platform store refused the delete",
                key,
            ))
        }
    }

    async fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.ffi.keys())
    }
}
