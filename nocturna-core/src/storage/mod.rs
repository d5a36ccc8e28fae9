//! Device-local key/value storage abstraction.
//!
//! The host application owns the actual storage (AsyncStorage-like stores on
//! mobile, a JSON file on desktop). Everything in this crate talks to it
//! through [`KeyValueStorage`], injected as `Arc<dyn KeyValueStorage>`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use nocturna_core::storage::{InMemoryStorage, KeyValueStorage, KeyValueStorageExt};
//!
//! let storage = InMemoryStorage::new();
//! storage.set("greeting", "hola").await?;
//! storage.set_json("numbers", &vec![1, 2, 3]).await?;
//! let numbers: Option<Vec<u32>> = storage.get_json("numbers").await?;
//! ```
//!
//! The key space is shared by every component and there is no locking
//! discipline across keys; each component owns exactly one key (see [`keys`]).

mod file;
mod memory;
mod traits;

pub use file::FileStorage;
pub use memory::InMemoryStorage;
pub use traits::{
    KeyValueStorage, KeyValueStorageExt, StorageError, StorageErrorCode, StorageResult,
};

/// Well-known storage keys.
pub mod keys {
    /// Combined bearer token + user profile record.
    pub const SESSION: &str = "nocturna:session";
    /// Checkout started against the payment provider, awaiting confirmation.
    pub const PENDING_PAYMENT: &str = "nocturna:pending_payment";
    /// Advertising ids the user has already seen.
    pub const VIEWED_ADS: &str = "nocturna:viewed_ads";
    /// Bearer token as written by older app versions.
    pub const LEGACY_TOKEN: &str = "token";
    /// Serialized user profile as written by older app versions.
    pub const LEGACY_USER: &str = "usuario";
}
