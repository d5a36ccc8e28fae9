//! Collaborators of the auth orchestrator.

use async_trait::async_trait;

use crate::models::{AuthResponse, UserProfile};
use crate::Result;

/// What the identity provider's sign-in sheet returned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IdentityOutcome {
    /// Provider identity token, to be exchanged with the backend.
    Token(String),
    /// The user dismissed the sheet.
    Cancelled,
}

/// Third-party identity provider (Google sign-in on device).
///
/// Cancellation is an [`IdentityOutcome`], not an error.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Run the interactive sign-in.
    async fn sign_in(&self) -> Result<IdentityOutcome>;

    /// Forget the provider session on the device.
    async fn sign_out(&self) -> Result<()>;
}

/// Result of exchanging a provider token with the backend.
#[derive(Clone, Debug, PartialEq)]
pub enum GoogleSignIn {
    /// The backend knows the user.
    SignedIn(AuthResponse),
    /// The backend answered `existeUsuario: false`.
    UnknownUser {
        /// Backend message, shown above the registration prompt.
        message: String,
    },
}

/// Backend calls the auth orchestrator depends on.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Exchange a provider token for a session.
    async fn sign_in_with_google(&self, id_token: &str) -> Result<GoogleSignIn>;

    /// Create the backend user for a provider token.
    async fn register_with_google(&self, id_token: &str, role_id: i64) -> Result<AuthResponse>;

    /// Fetch a user.
    async fn get_user(&self, id: i64) -> Result<UserProfile>;

    /// Replace a user record, returning what the backend stored.
    async fn update_user(&self, profile: &UserProfile) -> Result<UserProfile>;

    /// Delete a user.
    async fn delete_user(&self, id: i64) -> Result<()>;
}
