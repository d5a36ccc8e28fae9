//! Authentication.
//!
//! [`AuthOrchestrator`] drives the identity provider and the backend exchange
//! and publishes an [`AuthState`] that screens subscribe to.

mod orchestrator;
mod provider;
mod state;

pub use orchestrator::{AuthOrchestrator, AuthSubscription, SignInOutcome};
pub use provider::{AuthBackend, GoogleSignIn, IdentityOutcome, IdentityProvider};
pub use state::AuthState;
