//! Sign-in, registration and session lifecycle.
//!
//! # State Transitions
//!
//! | Event | Resulting state |
//! |---|---|
//! | boot | `initial()` (loading) |
//! | restore, token + profile found | registered, role resolved |
//! | restore, anything missing | `signed_out()` |
//! | provider sign-in, user unknown to backend | `awaiting_registration()` |
//! | sign-in / registration / profile update | registered, role recomputed |
//! | logout, delete account, unauthorized | `signed_out()` |
//! | provider cancelled | `signed_out()`, no error |

use std::sync::Arc;

use tokio::sync::{watch, Mutex};

use super::provider::{AuthBackend, GoogleSignIn, IdentityOutcome, IdentityProvider};
use super::state::AuthState;
use crate::models::{AuthResponse, UserProfile};
use crate::roles::{Role, RoleResolver};
use crate::session::{Session, SessionStore};
use crate::{NocturnaError, Result};

/// Outcome of [`AuthOrchestrator::sign_in`].
#[derive(Clone, Debug, PartialEq)]
pub enum SignInOutcome {
    /// Full session established.
    SignedIn(AuthState),
    /// Provider sign-in worked but the backend does not know the user yet;
    /// call [`AuthOrchestrator::register`] next.
    NeedsRegistration {
        /// Backend message.
        message: String,
    },
    /// The user dismissed the provider sheet.
    Cancelled,
}

/// Live view of the auth state. Dropping it unsubscribes.
pub struct AuthSubscription {
    rx: watch::Receiver<AuthState>,
}

impl AuthSubscription {
    /// Latest state.
    pub fn current(&self) -> AuthState {
        self.rx.borrow().clone()
    }

    /// Wait for the next change. `None` once the orchestrator is gone.
    pub async fn changed(&mut self) -> Option<AuthState> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}

/// Owns the in-memory auth state and keeps the stored session in line with it.
pub struct AuthOrchestrator {
    session: SessionStore,
    roles: Arc<RoleResolver>,
    backend: Arc<dyn AuthBackend>,
    identity: Arc<dyn IdentityProvider>,
    state: watch::Sender<AuthState>,
    pending_id_token: Mutex<Option<String>>,
}

impl AuthOrchestrator {
    /// Create an orchestrator in the loading state.
    pub fn new(
        session: SessionStore,
        roles: Arc<RoleResolver>,
        backend: Arc<dyn AuthBackend>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        let (state, _) = watch::channel(AuthState::initial());
        Self {
            session,
            roles,
            backend,
            identity,
            state,
            pending_id_token: Mutex::new(None),
        }
    }

    /// Current state.
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Follow state changes.
    pub fn subscribe(&self) -> AuthSubscription {
        AuthSubscription {
            rx: self.state.subscribe(),
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.state.receiver_count()
    }

    /// Rebuild the state from the stored session.
    #[tracing::instrument(skip(self))]
    pub async fn restore_session(&self) -> AuthState {
        let state = match self.session.restore().await {
            Some(Session {
                user: Some(user), ..
            }) => {
                let role = self.roles.role_for(user.role_id).await;
                tracing::info!(user_id = user.id, %role, "session restored");
                AuthState::registered(user, role)
            }
            _ => {
                tracing::debug!("no stored session");
                AuthState::signed_out()
            }
        };
        self.publish(state.clone());
        state
    }

    /// Interactive sign-in through the identity provider.
    ///
    /// Any failure other than cancellation clears local state and is returned.
    #[tracing::instrument(skip(self))]
    pub async fn sign_in(&self) -> Result<SignInOutcome> {
        self.set_loading();

        let id_token = match self.identity.sign_in().await {
            Ok(IdentityOutcome::Token(token)) => token,
            Ok(IdentityOutcome::Cancelled) => {
                tracing::info!("sign-in cancelled");
                self.reset_local().await;
                return Ok(SignInOutcome::Cancelled);
            }
            Err(err) => {
                tracing::warn!("identity provider failed: {err}");
                self.reset_local().await;
                return Err(err);
            }
        };

        match self.backend.sign_in_with_google(&id_token).await {
            Ok(GoogleSignIn::SignedIn(response)) => {
                *self.pending_id_token.lock().await = None;
                let state = self.establish(response).await;
                Ok(SignInOutcome::SignedIn(state))
            }
            Ok(GoogleSignIn::UnknownUser { message }) => {
                tracing::info!("user must register before continuing");
                *self.pending_id_token.lock().await = Some(id_token);
                self.publish(AuthState::awaiting_registration());
                Ok(SignInOutcome::NeedsRegistration { message })
            }
            Err(err) => {
                tracing::warn!("backend sign-in failed: {err}");
                self.sign_out_provider().await;
                self.reset_local().await;
                Err(err)
            }
        }
    }

    /// Create the backend user after [`SignInOutcome::NeedsRegistration`].
    #[tracing::instrument(skip(self))]
    pub async fn register(&self, role: Role) -> Result<AuthState> {
        let mut pending = self.pending_id_token.lock().await;
        let id_token = pending
            .clone()
            .ok_or_else(|| NocturnaError::Auth("no sign-in awaiting registration".into()))?;

        let role_id = self.roles.id_for_role(role).await?;
        let response = self.backend.register_with_google(&id_token, role_id).await?;
        *pending = None;
        drop(pending);

        Ok(self.establish(response).await)
    }

    /// Send an edited profile to the backend and adopt the result.
    #[tracing::instrument(skip(self, profile), fields(user_id = profile.id))]
    pub async fn update_profile(&self, profile: UserProfile) -> Result<AuthState> {
        let stored = self.backend.update_user(&profile).await?;
        Ok(self.apply_profile(stored).await)
    }

    /// Adopt a profile that already reflects backend state (for example after
    /// an administrator changed the user's role).
    pub async fn apply_profile(&self, profile: UserProfile) -> AuthState {
        if !self.session.persist_profile(&profile).await {
            tracing::warn!(user_id = profile.id, "profile kept in memory only");
        }
        let role = self.roles.role_for(profile.role_id).await;
        let state = AuthState::registered(profile, role);
        self.publish(state.clone());
        state
    }

    /// Reload the current user from the backend.
    pub async fn refresh_profile(&self) -> Result<AuthState> {
        let id = match self.state().user_id() {
            Some(id) => id,
            None => self
                .session
                .restore_profile()
                .await
                .map(|p| p.id)
                .ok_or_else(|| NocturnaError::Auth("no user signed in".into()))?,
        };
        let profile = self.backend.get_user(id).await?;
        Ok(self.apply_profile(profile).await)
    }

    /// Sign out everywhere and forget the stored session.
    #[tracing::instrument(skip(self))]
    pub async fn logout(&self) {
        self.sign_out_provider().await;
        self.reset_local().await;
        tracing::info!("logged out");
    }

    /// Delete the backend user, then log out.
    #[tracing::instrument(skip(self))]
    pub async fn delete_account(&self) -> Result<()> {
        let id = self
            .state()
            .user_id()
            .ok_or_else(|| NocturnaError::Auth("no user signed in".into()))?;
        self.backend.delete_user(id).await?;
        self.logout().await;
        Ok(())
    }

    /// Full logout after the backend rejected the token.
    ///
    /// The REST client only clears the token on a 401; call this to also drop
    /// the profile and the in-memory flags.
    pub async fn handle_unauthorized(&self) {
        tracing::warn!("session rejected by backend, signing out");
        self.logout().await;
    }

    async fn establish(&self, response: AuthResponse) -> AuthState {
        let AuthResponse { jwt_token, usuario } = response;
        if !self.session.save(&Session::new(jwt_token, usuario.clone())).await {
            tracing::warn!(user_id = usuario.id, "session kept in memory only");
        }
        let role = self.roles.role_for(usuario.role_id).await;
        tracing::info!(user_id = usuario.id, %role, "signed in");
        let state = AuthState::registered(usuario, role);
        self.publish(state.clone());
        state
    }

    async fn reset_local(&self) {
        *self.pending_id_token.lock().await = None;
        self.session.clear_all().await;
        self.publish(AuthState::signed_out());
    }

    async fn sign_out_provider(&self) {
        if let Err(err) = self.identity.sign_out().await {
            tracing::warn!("identity provider sign-out failed: {err}");
        }
    }

    fn set_loading(&self) {
        self.state.send_modify(|state| state.is_loading = true);
    }

    fn publish(&self, state: AuthState) {
        self.state.send_replace(state);
    }
}
