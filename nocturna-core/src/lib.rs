//! Nocturna client core.
//!
//! Session, authentication and payment reconciliation for the Nocturna venue
//! app, plus a typed client for its REST backend. The crate holds no UI and
//! no platform code: storage and the identity provider are injected through
//! traits, so the same logic runs under the mobile bindings and in tests.
//!
//! # Components
//!
//! - **Session Store** ([`session`]): bearer token and profile, one record
//! - **Role Resolver** ([`roles`]): cached role list, tagged [`Role`]
//! - **Auth Orchestrator** ([`auth`]): sign-in, registration, observable state
//! - **Payment Reconciler** ([`payments`]): deep links and stored checkouts
//! - **REST Client** ([`api`]): bearer auth, 401 handling, error messages
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use nocturna_core::prelude::*;
//!
//! let app = NocturnaApp::new(
//!     ClientConfig::new("https://api.nocturna.app"),
//!     Arc::new(InMemoryStorage::new()),
//!     identity,
//! )?;
//! let report = app.boot().await;
//! if report.auth.is_admin() {
//!     // show moderation tabs
//! }
//! ```

pub mod advertising;
pub mod api;
pub mod app;
pub mod auth;
pub mod cache;
pub mod clock;
pub mod config;
pub mod errors;
pub mod models;
pub mod payments;
pub mod prelude;
pub mod roles;
pub mod session;
pub mod storage;
pub mod validation;

pub use api::ApiClient;
pub use app::{BootReport, NocturnaApp};
pub use config::ClientConfig;
pub use errors::{NocturnaError, NocturnaErrorCode};
pub use roles::Role;

/// Common result alias for Nocturna operations.
pub type Result<T> = std::result::Result<T, NocturnaError>;
