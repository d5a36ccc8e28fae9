//! Wiring of every component behind one handle.

use std::sync::Arc;

use crate::advertising::ViewedAdvertisements;
use crate::api::{ApiClient, Geocoder};
use crate::auth::{AuthOrchestrator, AuthState, IdentityProvider};
use crate::cache::CachePolicy;
use crate::clock::{system_clock, Clock};
use crate::config::ClientConfig;
use crate::payments::{
    NavigationSlot, PaymentReconciler, PendingPaymentStore, ReconcileOutcome,
};
use crate::roles::RoleResolver;
use crate::session::SessionStore;
use crate::storage::KeyValueStorage;
use crate::{NocturnaError, Result};

/// What [`NocturnaApp::boot`] did.
#[derive(Clone, Debug, PartialEq)]
pub struct BootReport {
    /// A session written by an older app version was migrated.
    pub migrated_legacy: bool,
    /// Auth state after the restore.
    pub auth: AuthState,
    /// Result of the stored pending-payment check, when one ran and succeeded.
    pub payment: Option<ReconcileOutcome>,
}

/// The client, assembled.
pub struct NocturnaApp {
    config: ClientConfig,
    session: SessionStore,
    api: Arc<ApiClient>,
    roles: Arc<RoleResolver>,
    auth: AuthOrchestrator,
    payments: PaymentReconciler,
    viewed_ads: ViewedAdvertisements,
    geocoder: Geocoder,
}

impl NocturnaApp {
    /// Assemble the client on the system clock.
    pub fn new(
        config: ClientConfig,
        storage: Arc<dyn KeyValueStorage>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Result<Self> {
        Self::with_clock(config, storage, identity, system_clock())
    }

    /// Assemble the client on an explicit clock.
    pub fn with_clock(
        config: ClientConfig,
        storage: Arc<dyn KeyValueStorage>,
        identity: Arc<dyn IdentityProvider>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let session = SessionStore::new(storage.clone(), clock.clone());
        let api = Arc::new(ApiClient::new(config.clone(), session.clone())?);
        let roles = Arc::new(RoleResolver::new(
            api.clone(),
            CachePolicy::from_secs(config.role_cache_ttl_secs),
            clock.clone(),
        ));
        let auth = AuthOrchestrator::new(session.clone(), roles.clone(), api.clone(), identity);
        let pending = PendingPaymentStore::new(
            storage.clone(),
            clock.clone(),
            CachePolicy::from_secs(config.pending_payment_ttl_secs),
        );
        let payments = PaymentReconciler::new(
            api.clone(),
            pending,
            Arc::new(NavigationSlot::new()),
            clock.clone(),
        );
        let geocoder = Geocoder::new(
            api.clone(),
            CachePolicy::from_secs(config.geocode_cache_ttl_secs),
            clock,
        );

        Ok(Self {
            config,
            session,
            api,
            roles,
            auth,
            payments,
            viewed_ads: ViewedAdvertisements::new(storage),
            geocoder,
        })
    }

    /// Start-up sequence: legacy migration, session restore, then the stored
    /// pending-payment check for signed-in users.
    #[tracing::instrument(skip(self))]
    pub async fn boot(&self) -> BootReport {
        let migrated_legacy = self.session.migrate_legacy().await;
        let auth = self.auth.restore_session().await;

        let payment = if auth.is_registered {
            match self.payments.check_pending_payment().await {
                Ok(outcome) => Some(outcome),
                Err(err) => {
                    tracing::warn!("pending payment check failed: {err}");
                    None
                }
            }
        } else {
            None
        };

        BootReport {
            migrated_legacy,
            auth,
            payment,
        }
    }

    /// Route a URL the app was opened with.
    pub async fn handle_deep_link(&self, url: &str) -> Result<ReconcileOutcome> {
        self.payments.handle_deep_link(url).await
    }

    /// Escalate a rejected token to a full logout.
    ///
    /// The REST client only clears the token on a 401 and leaves the auth
    /// state alone; callers that want the full logout pass the error here.
    /// Returns true if `err` was a 401.
    pub async fn recover(&self, err: &NocturnaError) -> bool {
        if matches!(err, NocturnaError::Unauthorized) {
            self.auth.handle_unauthorized().await;
            return true;
        }
        false
    }

    /// Configuration in use.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Session store.
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// REST client.
    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    /// Role resolver.
    pub fn roles(&self) -> &Arc<RoleResolver> {
        &self.roles
    }

    /// Auth orchestrator.
    pub fn auth(&self) -> &AuthOrchestrator {
        &self.auth
    }

    /// Payment reconciler.
    pub fn payments(&self) -> &PaymentReconciler {
        &self.payments
    }

    /// Payment navigation events.
    pub fn navigation(&self) -> &Arc<NavigationSlot> {
        self.payments.navigation()
    }

    /// Viewed advertisements.
    pub fn viewed_ads(&self) -> &ViewedAdvertisements {
        &self.viewed_ads
    }

    /// Geocoder.
    pub fn geocoder(&self) -> &Geocoder {
        &self.geocoder
    }
}
