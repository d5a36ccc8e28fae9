//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use nocturna_core::prelude::*;
//! ```

// Facade and configuration
pub use crate::{BootReport, ClientConfig, NocturnaApp};

// Error handling
pub use crate::errors::{NocturnaError, NocturnaErrorCode};
pub use crate::Result;

// Storage
pub use crate::storage::{
    FileStorage, InMemoryStorage, KeyValueStorage, KeyValueStorageExt, StorageError,
};

// Session and auth
pub use crate::auth::{
    AuthBackend, AuthOrchestrator, AuthState, AuthSubscription, GoogleSignIn, IdentityOutcome,
    IdentityProvider, SignInOutcome,
};
pub use crate::roles::{Role, RoleResolver, RoleSource};
pub use crate::session::{Session, SessionStore};

// Payments
pub use crate::payments::{
    parse_payment_link, PaymentBackend, PaymentNavigation, PaymentNavigationStatus,
    PaymentReconciler, ReconcileOutcome,
};

// Backend
pub use crate::api::{ApiClient, Geocoder};
pub use crate::models::UserProfile;

// Time and caching
pub use crate::cache::{CachePolicy, TtlCache};
pub use crate::clock::{Clock, ManualClock, SystemClock};
