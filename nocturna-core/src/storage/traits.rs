//! Core traits for key/value storage.

use std::fmt;
use std::future::Future;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Error codes for storage operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum StorageErrorCode {
    /// Platform store refused the operation
    Unavailable = 1000,
    /// Stored value could not be decoded
    Corrupted = 2000,
    /// Value could not be encoded
    Encoding = 2001,
    /// Underlying I/O failed
    Io = 3000,
    /// Storage is full
    QuotaExceeded = 4000,
    /// Internal error (lock poisoning etc.)
    Internal = 9999,
}

/// Error type for storage operations.
#[derive(Debug, Clone)]
pub struct StorageError {
    /// Error code for FFI/mobile integration
    pub code: StorageErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Key related to the error (if applicable)
    pub key: Option<String>,
}

impl StorageError {
    /// Create a new error.
    pub fn new(code: StorageErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            key: None,
        }
    }

    /// Create a new error tied to a key.
    pub fn with_key(
        code: StorageErrorCode,
        message: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Create a "corrupted value" error.
    pub fn corrupted(key: impl Into<String>, reason: impl fmt::Display) -> Self {
        let key = key.into();
        Self {
            code: StorageErrorCode::Corrupted,
            message: format!("Stored value is not valid: {}", reason),
            key: Some(key),
        }
    }

    /// Create an I/O error.
    pub fn io(reason: impl fmt::Display) -> Self {
        Self::new(StorageErrorCode::Io, reason.to_string())
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(key) = &self.key {
            write!(f, "{} (key: {})", self.message, key)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for StorageError {}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Asynchronous string key/value store.
///
/// Implementations must be thread-safe. Writes are last-writer-wins; no
/// read-after-write guarantee is assumed by callers beyond a single key.
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    /// Read a value.
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Write a value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove a value. Removing a missing key succeeds.
    async fn remove(&self, key: &str) -> StorageResult<()>;

    /// List all stored keys.
    async fn keys(&self) -> StorageResult<Vec<String>>;
}

/// JSON convenience methods for any [`KeyValueStorage`].
pub trait KeyValueStorageExt: KeyValueStorage {
    /// Read and decode a JSON value.
    fn get_json<'a, T>(
        &'a self,
        key: &'a str,
    ) -> impl Future<Output = StorageResult<Option<T>>> + Send + 'a
    where
        T: DeserializeOwned + Send + 'a,
    {
        async move {
            match self.get(key).await? {
                Some(raw) => serde_json::from_str(&raw)
                    .map(Some)
                    .map_err(|e| StorageError::corrupted(key, e)),
                None => Ok(None),
            }
        }
    }

    /// Encode a value as JSON and write it.
    fn set_json<'a, T>(
        &'a self,
        key: &'a str,
        value: &'a T,
    ) -> impl Future<Output = StorageResult<()>> + Send + 'a
    where
        T: Serialize + Sync + ?Sized,
    {
        async move {
            let raw = serde_json::to_string(value).map_err(|e| {
                StorageError::with_key(StorageErrorCode::Encoding, e.to_string(), key)
            })?;
            self.set(key, &raw).await
        }
    }
}

impl<S: KeyValueStorage + ?Sized> KeyValueStorageExt for S {}
