//! Nocturna Mobile FFI Bindings
//!
//! UniFFI bindings for the Nocturna client core, consumed by the iOS (Swift)
//! and Android (Kotlin) apps.
//!
//! # Architecture
//!
//! The host app supplies two callback interfaces:
//! - [`KeyValueStoreCallback`]: device-local string storage
//! - [`IdentityProviderCallback`]: the Google sign-in sheet
//!
//! and drives everything else through [`NocturnaClient`].
//!
//! # Thread Safety
//!
//! All exposed types are thread-safe. `NocturnaClient` owns a Tokio runtime
//! and blocks the calling thread on each operation, so hosts call it from a
//! background queue or coroutine, never the UI thread.

pub mod identity_ffi;
pub mod storage_ffi;

pub use identity_ffi::{IdentityProviderBridge, IdentityProviderCallback, IdentityResultFFI};
pub use storage_ffi::{CallbackStorage, KeyValueStoreCallback};

use std::sync::{Arc, Mutex, Once};

use nocturna_core::auth::{AuthState, SignInOutcome};
use nocturna_core::models::{PaymentPreference, UserProfile};
use nocturna_core::payments::{
    parse_payment_link, IgnoreReason, PaymentLink, PaymentLinkStatus, PaymentNavigation,
    PaymentNavigationStatus, ReconcileOutcome,
};
use nocturna_core::{BootReport, ClientConfig, NocturnaApp, NocturnaError, Role};

// UniFFI scaffolding
uniffi::setup_scaffolding!();

// ============================================================================
// Error Types
// ============================================================================

/// Mobile-friendly error type.
#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum NocturnaMobileError {
    /// Network failure before a response arrived.
    #[error("Transport error: {msg}")]
    Transport { msg: String },

    /// Request timed out.
    #[error("Network timeout: {msg}")]
    NetworkTimeout { msg: String },

    /// Backend answered with an error status.
    #[error("Backend error ({status}): {msg}")]
    Backend { status: u16, msg: String },

    /// Bearer token rejected; call `handle_unauthorized` to sign out.
    #[error("Session error: {msg}")]
    SessionError { msg: String },

    /// Sign-in or registration failed.
    #[error("Authentication error: {msg}")]
    AuthenticationError { msg: String },

    /// Input rejected before any request was sent.
    #[error("Validation error: {msg}")]
    Validation { msg: String },

    /// Resource not found.
    #[error("Not found: {msg}")]
    NotFound { msg: String },

    /// Serialization/deserialization error.
    #[error("Serialization error: {msg}")]
    Serialization { msg: String },

    /// Checkout or verification failed.
    #[error("Payment error: {msg}")]
    Payment { msg: String },

    /// Device storage failed.
    #[error("Storage error: {msg}")]
    Storage { msg: String },

    /// Internal error (unexpected state).
    #[error("Internal error: {msg}")]
    Internal { msg: String },
}

impl From<NocturnaError> for NocturnaMobileError {
    fn from(e: NocturnaError) -> Self {
        let msg = e.user_message();
        match e {
            NocturnaError::Transport(_) => Self::Transport { msg },
            NocturnaError::Timeout { .. } => Self::NetworkTimeout { msg },
            NocturnaError::Http { status, .. } => Self::Backend { status, msg },
            NocturnaError::Unauthorized => Self::SessionError { msg },
            NocturnaError::Auth(_) | NocturnaError::IdentityProvider(_) => {
                Self::AuthenticationError { msg }
            }
            NocturnaError::NotFound { .. } => Self::NotFound { msg },
            NocturnaError::InvalidData { .. } | NocturnaError::Validation(_) => {
                Self::Validation { msg }
            }
            NocturnaError::Serialization(_) => Self::Serialization { msg },
            NocturnaError::Payment { .. } => Self::Payment { msg },
            NocturnaError::Storage(_) => Self::Storage { msg },
            NocturnaError::Internal(_) => Self::Internal { msg },
        }
    }
}

pub type Result<T> = std::result::Result<T, NocturnaMobileError>;

// ============================================================================
// Configuration
// ============================================================================

/// Client configuration. Unset fields take the core defaults.
#[derive(Clone, Debug, uniffi::Record)]
pub struct ClientConfigFFI {
    pub api_base_url: String,
    pub deep_link_scheme: Option<String>,
    pub timeout_secs: Option<u64>,
    pub pending_payment_ttl_secs: Option<u64>,
}

impl From<ClientConfigFFI> for ClientConfig {
    fn from(config: ClientConfigFFI) -> Self {
        let mut out = ClientConfig::new(config.api_base_url);
        if let Some(scheme) = config.deep_link_scheme {
            out = out.with_deep_link_scheme(scheme);
        }
        if let Some(secs) = config.timeout_secs {
            out = out.with_timeout(secs);
        }
        if let Some(secs) = config.pending_payment_ttl_secs {
            out = out.with_pending_payment_ttl(secs);
        }
        out
    }
}

// ============================================================================
// Auth Types
// ============================================================================

/// User role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, uniffi::Enum)]
pub enum RoleFFI {
    Regular,
    VenueOwner,
    Admin,
}

impl From<Role> for RoleFFI {
    fn from(role: Role) -> Self {
        match role {
            Role::Regular => Self::Regular,
            Role::VenueOwner => Self::VenueOwner,
            Role::Admin => Self::Admin,
        }
    }
}

impl From<RoleFFI> for Role {
    fn from(role: RoleFFI) -> Self {
        match role {
            RoleFFI::Regular => Self::Regular,
            RoleFFI::VenueOwner => Self::VenueOwner,
            RoleFFI::Admin => Self::Admin,
        }
    }
}

/// User record.
///
/// `record_json` carries the full backend record; edit it and pass it back
/// to `update_profile` to replace the user.
#[derive(Clone, Debug, PartialEq, uniffi::Record)]
pub struct UserProfileFFI {
    pub id: i64,
    pub role_id: i64,
    pub approved: bool,
    pub rejection_reason: Option<String>,
    pub display_name: Option<String>,
    pub record_json: String,
}

impl From<&UserProfile> for UserProfileFFI {
    fn from(profile: &UserProfile) -> Self {
        Self {
            id: profile.id,
            role_id: profile.role_id,
            approved: profile.is_approved(),
            rejection_reason: profile.rejection_reason.clone(),
            display_name: profile.display_name().map(str::to_string),
            record_json: serde_json::to_string(profile).unwrap_or_default(),
        }
    }
}

/// Auth state as the UI consumes it.
#[derive(Clone, Debug, PartialEq, uniffi::Record)]
pub struct AuthStateFFI {
    pub is_loading: bool,
    pub is_authenticated: bool,
    pub is_registered: bool,
    pub role: Option<RoleFFI>,
    pub is_admin: bool,
    pub is_bar_owner: bool,
    pub is_approved: bool,
    pub user: Option<UserProfileFFI>,
}

impl From<AuthState> for AuthStateFFI {
    fn from(state: AuthState) -> Self {
        Self {
            is_loading: state.is_loading,
            is_authenticated: state.is_authenticated,
            is_registered: state.is_registered,
            role: state.role.map(Into::into),
            is_admin: state.is_admin(),
            is_bar_owner: state.is_bar_owner(),
            is_approved: state.is_approved,
            user: state.user.as_ref().map(Into::into),
        }
    }
}

/// Result of `NocturnaClient::sign_in`.
#[derive(Clone, Debug, PartialEq, uniffi::Enum)]
pub enum SignInResultFFI {
    SignedIn { state: AuthStateFFI },
    /// Show the role picker, then call `register`.
    NeedsRegistration { message: String },
    Cancelled,
}

impl From<SignInOutcome> for SignInResultFFI {
    fn from(outcome: SignInOutcome) -> Self {
        match outcome {
            SignInOutcome::SignedIn(state) => Self::SignedIn {
                state: state.into(),
            },
            SignInOutcome::NeedsRegistration { message } => Self::NeedsRegistration { message },
            SignInOutcome::Cancelled => Self::Cancelled,
        }
    }
}

// ============================================================================
// Payment Types
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, uniffi::Enum)]
pub enum PaymentNavigationStatusFFI {
    Success,
    Failure,
    Pending,
    PendingVerification,
}

impl From<PaymentNavigationStatus> for PaymentNavigationStatusFFI {
    fn from(status: PaymentNavigationStatus) -> Self {
        match status {
            PaymentNavigationStatus::Success => Self::Success,
            PaymentNavigationStatus::Failure => Self::Failure,
            PaymentNavigationStatus::Pending => Self::Pending,
            PaymentNavigationStatus::PendingVerification => Self::PendingVerification,
        }
    }
}

/// Navigation request for the payment result screen.
#[derive(Clone, Debug, PartialEq, uniffi::Record)]
pub struct PaymentNavigationFFI {
    pub status: PaymentNavigationStatusFFI,
    pub payment_id: Option<String>,
    pub preference_id: Option<String>,
    pub publicidad_id: Option<String>,
    pub timestamp: i64,
}

impl From<PaymentNavigation> for PaymentNavigationFFI {
    fn from(event: PaymentNavigation) -> Self {
        Self {
            status: event.status.into(),
            payment_id: event.payment_id,
            preference_id: event.preference_id,
            publicidad_id: event.publicidad_id,
            timestamp: event.timestamp,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, uniffi::Enum)]
pub enum IgnoreReasonFFI {
    Unrecognized,
    DuplicateLink,
    AlreadyResolved,
    NoPendingPayment,
}

impl From<IgnoreReason> for IgnoreReasonFFI {
    fn from(reason: IgnoreReason) -> Self {
        match reason {
            IgnoreReason::Unrecognized => Self::Unrecognized,
            IgnoreReason::DuplicateLink => Self::DuplicateLink,
            IgnoreReason::AlreadyResolved => Self::AlreadyResolved,
            IgnoreReason::NoPendingPayment => Self::NoPendingPayment,
        }
    }
}

/// What a deep link or pending-payment check did.
#[derive(Clone, Debug, PartialEq, Eq, uniffi::Enum)]
pub enum ReconcileOutcomeFFI {
    /// A navigation event is waiting in `take_payment_navigation`.
    Published { status: PaymentNavigationStatusFFI },
    StillPending,
    Ignored { reason: IgnoreReasonFFI },
}

impl From<ReconcileOutcome> for ReconcileOutcomeFFI {
    fn from(outcome: ReconcileOutcome) -> Self {
        match outcome {
            ReconcileOutcome::Published(status) => Self::Published {
                status: status.into(),
            },
            ReconcileOutcome::StillPending => Self::StillPending,
            ReconcileOutcome::Ignored(reason) => Self::Ignored {
                reason: reason.into(),
            },
        }
    }
}

/// Checkout handed back by `begin_checkout`; open `init_point` in a browser.
#[derive(Clone, Debug, PartialEq, uniffi::Record)]
pub struct PaymentPreferenceFFI {
    pub preference_id: String,
    pub init_point: String,
}

impl From<PaymentPreference> for PaymentPreferenceFFI {
    fn from(preference: PaymentPreference) -> Self {
        Self {
            preference_id: preference.preference_id,
            init_point: preference.init_point,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, uniffi::Enum)]
pub enum PaymentLinkStatusFFI {
    Success,
    Failure,
    Pending,
}

/// A recognized payment return URL.
#[derive(Clone, Debug, PartialEq, uniffi::Record)]
pub struct PaymentLinkFFI {
    pub status: PaymentLinkStatusFFI,
    pub payment_id: Option<String>,
    pub preference_id: Option<String>,
    pub publicidad_id: Option<String>,
}

impl From<PaymentLink> for PaymentLinkFFI {
    fn from(link: PaymentLink) -> Self {
        Self {
            status: match link.status {
                PaymentLinkStatus::Success => PaymentLinkStatusFFI::Success,
                PaymentLinkStatus::Failure => PaymentLinkStatusFFI::Failure,
                PaymentLinkStatus::Pending => PaymentLinkStatusFFI::Pending,
            },
            payment_id: link.payment_id,
            preference_id: link.preference_id,
            publicidad_id: link.publicidad_id,
        }
    }
}

/// What `boot` did.
#[derive(Clone, Debug, PartialEq, uniffi::Record)]
pub struct BootReportFFI {
    pub migrated_legacy: bool,
    pub auth: AuthStateFFI,
    pub payment: Option<ReconcileOutcomeFFI>,
}

impl From<BootReport> for BootReportFFI {
    fn from(report: BootReport) -> Self {
        Self {
            migrated_legacy: report.migrated_legacy,
            auth: report.auth.into(),
            payment: report.payment.map(Into::into),
        }
    }
}

// ============================================================================
// Listeners
// ============================================================================

/// Receives auth state changes.
#[uniffi::export(callback_interface)]
pub trait AuthStateListener: Send + Sync {
    fn on_auth_state_changed(&self, state: AuthStateFFI);
}

/// Told when a payment navigation event is waiting.
///
/// The event stays in place until `take_payment_navigation` consumes it.
#[uniffi::export(callback_interface)]
pub trait PaymentNavigationListener: Send + Sync {
    fn on_payment_navigation(&self, event: PaymentNavigationFFI);
}

/// Live listener registration. Dropping it unsubscribes.
#[derive(uniffi::Object)]
pub struct SubscriptionHandle {
    task: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl SubscriptionHandle {
    fn new(task: tokio::task::JoinHandle<()>) -> Arc<Self> {
        Arc::new(Self {
            task: Mutex::new(Some(task)),
        })
    }
}

#[uniffi::export]
impl SubscriptionHandle {
    /// Stop delivering events.
    pub fn cancel(&self) {
        if let Ok(mut task) = self.task.lock() {
            if let Some(task) = task.take() {
                task.abort();
            }
        }
    }

    /// Whether events are still delivered.
    pub fn is_active(&self) -> bool {
        self.task
            .lock()
            .map(|task| task.as_ref().is_some_and(|t| !t.is_finished()))
            .unwrap_or(false)
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

// ============================================================================
// Client
// ============================================================================

/// Entry point for the mobile apps.
#[derive(uniffi::Object)]
pub struct NocturnaClient {
    app: Arc<NocturnaApp>,
    /// Tokio runtime for async operations.
    runtime: tokio::runtime::Runtime,
}

#[uniffi::export]
impl NocturnaClient {
    /// Create a client against a backend.
    #[uniffi::constructor]
    pub fn new(
        config: ClientConfigFFI,
        storage: Box<dyn KeyValueStoreCallback>,
        identity: Box<dyn IdentityProviderCallback>,
    ) -> Result<Arc<Self>> {
        let runtime = tokio::runtime::Runtime::new().map_err(|e| NocturnaMobileError::Internal {
            msg: e.to_string(),
        })?;
        let app = NocturnaApp::new(
            config.into(),
            Arc::new(CallbackStorage::new(Arc::from(storage))),
            Arc::new(IdentityProviderBridge::new(Arc::from(identity))),
        )?;

        Ok(Arc::new(Self {
            app: Arc::new(app),
            runtime,
        }))
    }

    /// Run the start-up sequence. Call once, before anything else.
    pub fn boot(&self) -> BootReportFFI {
        self.runtime.block_on(self.app.boot()).into()
    }

    // ------------------------------------------------------------------------
    // Auth
    // ------------------------------------------------------------------------

    /// Current auth state.
    pub fn auth_state(&self) -> AuthStateFFI {
        self.app.auth().state().into()
    }

    /// Start the Google sign-in flow.
    pub fn sign_in(&self) -> Result<SignInResultFFI> {
        let outcome = self.runtime.block_on(self.app.auth().sign_in())?;
        Ok(outcome.into())
    }

    /// Register the user from the last `NeedsRegistration` sign-in.
    pub fn register(&self, role: RoleFFI) -> Result<AuthStateFFI> {
        let state = self.runtime.block_on(self.app.auth().register(role.into()))?;
        Ok(state.into())
    }

    /// Replace the signed-in user's record.
    ///
    /// `record_json` is a full user record, usually an edited
    /// `UserProfileFFI::record_json`.
    pub fn update_profile(&self, record_json: String) -> Result<AuthStateFFI> {
        let profile: UserProfile = serde_json::from_str(&record_json)
            .map_err(NocturnaError::from)?;
        let state = self
            .runtime
            .block_on(self.app.auth().update_profile(profile))?;
        Ok(state.into())
    }

    /// Re-fetch the signed-in user from the backend.
    pub fn refresh_profile(&self) -> Result<AuthStateFFI> {
        let state = self.runtime.block_on(self.app.auth().refresh_profile())?;
        Ok(state.into())
    }

    /// Sign out and forget the stored session.
    pub fn logout(&self) {
        self.runtime.block_on(self.app.auth().logout());
    }

    /// Delete the signed-in user, then sign out.
    pub fn delete_account(&self) -> Result<()> {
        self.runtime.block_on(self.app.auth().delete_account())?;
        Ok(())
    }

    /// Full sign-out after a `SessionError`.
    pub fn handle_unauthorized(&self) {
        self.runtime.block_on(self.app.auth().handle_unauthorized());
    }

    /// Deliver auth state changes to `listener` until the handle is dropped.
    pub fn subscribe_auth_state(
        &self,
        listener: Box<dyn AuthStateListener>,
    ) -> Arc<SubscriptionHandle> {
        let mut subscription = self.app.auth().subscribe();
        let task = self.runtime.spawn(async move {
            while let Some(state) = subscription.changed().await {
                listener.on_auth_state_changed(state.into());
            }
        });
        SubscriptionHandle::new(task)
    }

    // ------------------------------------------------------------------------
    // Roles
    // ------------------------------------------------------------------------

    /// Backend description of a role id.
    pub fn role_description(&self, role_id: i64) -> Result<String> {
        Ok(self
            .runtime
            .block_on(self.app.roles().description_for(role_id))?)
    }

    /// Role a role id maps to. Unknown ids map to `Regular`.
    pub fn role_for(&self, role_id: i64) -> RoleFFI {
        self.runtime.block_on(self.app.roles().role_for(role_id)).into()
    }

    // ------------------------------------------------------------------------
    // Payments
    // ------------------------------------------------------------------------

    /// Create a checkout for an advertisement and remember it as pending.
    pub fn begin_checkout(&self, publicidad_id: String) -> Result<PaymentPreferenceFFI> {
        let preference = self
            .runtime
            .block_on(self.app.payments().begin_checkout(&publicidad_id))?;
        Ok(preference.into())
    }

    /// Route a URL the app was opened with.
    pub fn handle_deep_link(&self, url: String) -> Result<ReconcileOutcomeFFI> {
        let outcome = self.runtime.block_on(self.app.handle_deep_link(&url))?;
        Ok(outcome.into())
    }

    /// Check the stored pending payment, e.g. when the app returns to the
    /// foreground without a deep link.
    pub fn check_pending_payment(&self) -> Result<ReconcileOutcomeFFI> {
        let outcome = self
            .runtime
            .block_on(self.app.payments().check_pending_payment())?;
        Ok(outcome.into())
    }

    /// Consume the waiting payment navigation event, if any.
    pub fn take_payment_navigation(&self) -> Option<PaymentNavigationFFI> {
        self.app.navigation().take().map(Into::into)
    }

    /// Look at the waiting payment navigation event without consuming it.
    pub fn peek_payment_navigation(&self) -> Option<PaymentNavigationFFI> {
        self.app.navigation().peek().map(Into::into)
    }

    /// Notify `listener` whenever a payment navigation event is published.
    pub fn subscribe_payment_navigation(
        &self,
        listener: Box<dyn PaymentNavigationListener>,
    ) -> Arc<SubscriptionHandle> {
        let mut rx = self.app.navigation().subscribe();
        let task = self.runtime.spawn(async move {
            while rx.changed().await.is_ok() {
                let event = rx.borrow_and_update().clone();
                if let Some(event) = event {
                    listener.on_payment_navigation(event.into());
                }
            }
        });
        SubscriptionHandle::new(task)
    }

    // ------------------------------------------------------------------------
    // Advertising
    // ------------------------------------------------------------------------

    /// Remember that an advertisement was shown.
    ///
    /// Returns true only when this call recorded the id. An id already viewed,
    /// or one the platform store refused to persist, returns false.
    pub fn mark_ad_viewed(&self, publicidad_id: i64) -> bool {
        self.runtime
            .block_on(self.app.viewed_ads().mark_viewed(publicidad_id))
            .is_new()
    }

    /// Whether an advertisement was already shown.
    pub fn has_viewed_ad(&self, publicidad_id: i64) -> bool {
        self.runtime
            .block_on(self.app.viewed_ads().has_viewed(publicidad_id))
    }
}

// ============================================================================
// Free functions
// ============================================================================

/// Recognize a payment return URL without acting on it.
#[uniffi::export]
pub fn parse_payment_return_url(url: String) -> Option<PaymentLinkFFI> {
    parse_payment_link(&url).map(Into::into)
}

/// Get the library version.
#[uniffi::export]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

static LOGGING: Once = Once::new();

/// Install a `tracing` subscriber writing to stderr.
///
/// `filter` uses `EnvFilter` syntax, e.g. `"nocturna_core=debug"`. Only the
/// first call has any effect.
#[uniffi::export]
pub fn init_logging(filter: String) {
    LOGGING.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_new(&filter)
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity_ffi::tests::ScriptedProvider;
    use crate::storage_ffi::tests::MapStore;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_with(base_url: &str, store: MapStore, identity: ScriptedProvider) -> Arc<NocturnaClient> {
        NocturnaClient::new(
            ClientConfigFFI {
                api_base_url: base_url.into(),
                deep_link_scheme: None,
                timeout_secs: Some(1),
                pending_payment_ttl_secs: None,
            },
            Box::new(store),
            Box::new(identity),
        )
        .unwrap()
    }

    fn client(identity: ScriptedProvider) -> Arc<NocturnaClient> {
        client_with("http://127.0.0.1:9", MapStore::default(), identity)
    }

    #[test]
    fn test_get_version() {
        assert!(!get_version().is_empty());
    }

    #[test]
    fn test_boot_without_session_is_signed_out() {
        let client = client(ScriptedProvider::token("unused"));
        let report = client.boot();

        assert!(!report.auth.is_authenticated);
        assert!(!report.auth.is_loading);
        assert_eq!(report.payment, None);
        assert_eq!(client.auth_state(), report.auth);
    }

    #[test]
    fn test_cancelled_sign_in_is_not_an_error() {
        let client = client(ScriptedProvider::cancelled());
        assert_eq!(client.sign_in().unwrap(), SignInResultFFI::Cancelled);
        assert!(!client.auth_state().is_authenticated);
    }

    #[test]
    fn test_unrecognized_link_is_ignored() {
        let client = client(ScriptedProvider::token("unused"));
        assert_eq!(
            client
                .handle_deep_link("nocturna://venues/3".into())
                .unwrap(),
            ReconcileOutcomeFFI::Ignored {
                reason: IgnoreReasonFFI::Unrecognized
            }
        );
        assert_eq!(client.take_payment_navigation(), None);
    }

    #[test]
    fn test_failure_link_publishes_once() {
        let client = client(ScriptedProvider::token("unused"));
        let url = "nocturna://payment/failure?publicidad_id=7".to_string();

        assert_eq!(
            client.handle_deep_link(url.clone()).unwrap(),
            ReconcileOutcomeFFI::Published {
                status: PaymentNavigationStatusFFI::Failure
            }
        );
        let event = client.take_payment_navigation().unwrap();
        assert_eq!(event.publicidad_id.as_deref(), Some("7"));
        assert_eq!(client.take_payment_navigation(), None);

        assert_eq!(
            client.handle_deep_link(url).unwrap(),
            ReconcileOutcomeFFI::Ignored {
                reason: IgnoreReasonFFI::DuplicateLink
            }
        );
    }

    #[test]
    fn test_viewed_ads() {
        let client = client(ScriptedProvider::token("unused"));
        assert!(client.mark_ad_viewed(4));
        assert!(!client.mark_ad_viewed(4));
        assert!(client.has_viewed_ad(4));
        assert!(!client.has_viewed_ad(5));
    }

    #[test]
    fn test_refused_ad_write_is_not_first_view() {
        let store = MapStore {
            read_only: true,
            ..Default::default()
        };
        let client = client_with("http://127.0.0.1:9", store, ScriptedProvider::token("unused"));

        assert!(!client.mark_ad_viewed(4));
        assert!(!client.has_viewed_ad(4));
    }

    #[test]
    fn test_pending_link_resolves_paid_checkout() {
        // The client blocks on its own runtime, so the mock server gets another.
        let server_runtime = tokio::runtime::Runtime::new().unwrap();
        let server = server_runtime.block_on(async {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/api/Publicidades/crearPreferenciaPago"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "preferenceId": "pr1",
                    "initPoint": "https://checkout.test/pr1"
                })))
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path("/api/Publicidades/5"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "iD_Publicidad": 5,
                    "pago": true
                })))
                .expect(1)
                .mount(&server)
                .await;
            server
        });
        let client = client_with(&server.uri(), MapStore::default(), ScriptedProvider::token("unused"));

        let preference = client.begin_checkout("5".into()).unwrap();
        assert_eq!(preference.preference_id, "pr1");

        assert_eq!(
            client
                .handle_deep_link("nocturna://payment/pending?publicidad_id=5&preference_id=pr1".into())
                .unwrap(),
            ReconcileOutcomeFFI::Published {
                status: PaymentNavigationStatusFFI::Success
            }
        );
        let event = client.take_payment_navigation().unwrap();
        assert_eq!(event.publicidad_id.as_deref(), Some("5"));
        assert_eq!(
            client.check_pending_payment().unwrap(),
            ReconcileOutcomeFFI::Ignored {
                reason: IgnoreReasonFFI::NoPendingPayment
            }
        );
    }

    #[test]
    fn test_parse_payment_return_url() {
        let link = parse_payment_return_url(
            "nocturna://payment/success?payment_id=11&publicidad_id=3".into(),
        )
        .unwrap();
        assert_eq!(link.status, PaymentLinkStatusFFI::Success);
        assert_eq!(link.payment_id.as_deref(), Some("11"));
        assert!(parse_payment_return_url("nocturna://home".into()).is_none());
    }

    #[test]
    fn test_error_mapping_keeps_status() {
        let err: NocturnaMobileError = NocturnaError::Http {
            status: 409,
            message: "Ya existe".into(),
        }
        .into();
        match err {
            NocturnaMobileError::Backend { status, msg } => {
                assert_eq!(status, 409);
                assert_eq!(msg, "Ya existe");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_subscription_handle_cancels() {
        struct Ignore;
        impl AuthStateListener for Ignore {
            fn on_auth_state_changed(&self, _state: AuthStateFFI) {}
        }

        let client = client(ScriptedProvider::token("unused"));
        let handle = client.subscribe_auth_state(Box::new(Ignore));
        assert!(handle.is_active());
        handle.cancel();
        assert!(!handle.is_active());
    }
}
