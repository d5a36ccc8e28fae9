//! Resolution of checkouts into navigation events.
//!
//! Two signals can tell the app how a checkout ended: a payment return deep
//! link, or the stored [`PendingPaymentRecord`] found on boot or on focus when
//! no link arrived. Both feed [`PaymentReconciler::reconcile`], which runs one
//! signal at a time. Whichever signal resolves a checkout first wins; the other
//! becomes a no-op.
//!
//! # Checkout Lifecycle
//!
//! ```text
//! begin_checkout ──> Pending ──(success | failure)──> Resolved
//!                       │
//!                       └─(pending / not paid yet)──> Pending (announced once)
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::deep_link::{parse_payment_link, PaymentLink, PaymentLinkStatus};
use super::navigation::{NavigationSlot, PaymentNavigation, PaymentNavigationStatus};
use super::pending::{PendingPaymentRecord, PendingPaymentStore};
use crate::clock::Clock;
use crate::models::{Advertisement, PaymentPreference, PaymentVerification};
use crate::{NocturnaError, Result};

/// Backend calls the reconciler depends on.
#[async_trait]
pub trait PaymentBackend: Send + Sync {
    /// Create a checkout for an advertisement.
    async fn create_payment_preference(&self, publicidad_id: &str) -> Result<PaymentPreference>;

    /// Ask the backend to confirm a payment and activate the advertisement.
    async fn verify_payment(
        &self,
        payment_id: &str,
        publicidad_id: Option<&str>,
    ) -> Result<PaymentVerification>;

    /// Fetch an advertisement to see whether its payment has been recorded.
    async fn fetch_advertisement(&self, publicidad_id: &str) -> Result<Advertisement>;
}

/// Input to [`PaymentReconciler::reconcile`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReconcileSignal {
    /// The app was opened or foregrounded with this URL.
    DeepLink(String),
    /// Look at the stored pending payment record.
    StoredRecord,
}

/// Why a signal did nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    /// URL carries no payment marker.
    Unrecognized,
    /// This exact URL was already handled.
    DuplicateLink,
    /// The checkout was already resolved by an earlier signal.
    AlreadyResolved,
    /// No unexpired pending payment is stored.
    NoPendingPayment,
}

/// What a signal produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// A navigation event with this status was published.
    Published(PaymentNavigationStatus),
    /// Checkout still unsettled and already announced.
    StillPending,
    /// Nothing happened.
    Ignored(IgnoreReason),
}

/// Where a checkout stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckoutPhase {
    /// Started, outcome unknown. `announced` is set once the UI was told.
    Pending {
        /// A pending event has been published for this checkout.
        announced: bool,
    },
    /// Outcome known and published.
    Resolved(PaymentNavigationStatus),
}

#[derive(Default)]
struct ReconcilerState {
    processed_urls: HashSet<String>,
    checkouts: HashMap<String, CheckoutPhase>,
}

impl ReconcilerState {
    fn is_resolved(&self, publicidad_id: Option<&str>) -> bool {
        publicidad_id
            .and_then(|id| self.checkouts.get(id))
            .is_some_and(|phase| matches!(phase, CheckoutPhase::Resolved(_)))
    }

    fn is_announced(&self, key: &str) -> bool {
        matches!(
            self.checkouts.get(key),
            Some(CheckoutPhase::Pending { announced: true })
        )
    }
}

/// Turns payment signals into at most one navigation event per outcome.
pub struct PaymentReconciler {
    backend: Arc<dyn PaymentBackend>,
    pending: PendingPaymentStore,
    navigation: Arc<NavigationSlot>,
    clock: Arc<dyn Clock>,
    state: Mutex<ReconcilerState>,
}

impl PaymentReconciler {
    /// Create a reconciler publishing into `navigation`.
    pub fn new(
        backend: Arc<dyn PaymentBackend>,
        pending: PendingPaymentStore,
        navigation: Arc<NavigationSlot>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            backend,
            pending,
            navigation,
            clock,
            state: Mutex::new(ReconcilerState::default()),
        }
    }

    /// Slot the events are published into.
    pub fn navigation(&self) -> &Arc<NavigationSlot> {
        &self.navigation
    }

    /// Current phase of the checkout for an advertisement. `None` means idle.
    pub async fn phase(&self, publicidad_id: &str) -> Option<CheckoutPhase> {
        self.state.lock().await.checkouts.get(publicidad_id).copied()
    }

    /// Create a checkout and remember it before the user leaves the app.
    ///
    /// Returns the preference whose `init_point` the app should open.
    #[tracing::instrument(skip(self))]
    pub async fn begin_checkout(&self, publicidad_id: &str) -> Result<PaymentPreference> {
        let preference = self.backend.create_payment_preference(publicidad_id).await?;
        if preference.preference_id.is_empty() || preference.init_point.is_empty() {
            return Err(NocturnaError::Payment {
                payment_id: None,
                reason: "El servidor no devolvió un link de pago.".to_string(),
            });
        }

        let mut state = self.state.lock().await;
        if self
            .pending
            .save(publicidad_id, &preference.preference_id)
            .await
            .is_none()
        {
            tracing::warn!("checkout will only be reconciled through its return link");
        }
        state
            .checkouts
            .insert(publicidad_id.to_string(), CheckoutPhase::Pending { announced: false });

        tracing::info!(preference_id = %preference.preference_id, "checkout started");
        Ok(preference)
    }

    /// Feed a URL the app was opened with.
    pub async fn handle_deep_link(&self, url: &str) -> Result<ReconcileOutcome> {
        self.reconcile(ReconcileSignal::DeepLink(url.to_string())).await
    }

    /// Look for a stored checkout whose return link never arrived.
    pub async fn check_pending_payment(&self) -> Result<ReconcileOutcome> {
        self.reconcile(ReconcileSignal::StoredRecord).await
    }

    /// Single entry point for every payment signal.
    ///
    /// Signals are processed one at a time in arrival order.
    pub async fn reconcile(&self, signal: ReconcileSignal) -> Result<ReconcileOutcome> {
        let mut state = self.state.lock().await;
        match signal {
            ReconcileSignal::DeepLink(url) => self.reconcile_link(&mut state, url).await,
            ReconcileSignal::StoredRecord => self.reconcile_stored(&mut state).await,
        }
    }

    async fn reconcile_link(
        &self,
        state: &mut ReconcilerState,
        url: String,
    ) -> Result<ReconcileOutcome> {
        if state.processed_urls.contains(&url) {
            tracing::debug!("payment link already handled");
            return Ok(ReconcileOutcome::Ignored(IgnoreReason::DuplicateLink));
        }
        let Some(mut link) = parse_payment_link(&url) else {
            return Ok(ReconcileOutcome::Ignored(IgnoreReason::Unrecognized));
        };
        state.processed_urls.insert(url);

        let stored = self.pending.load().await;
        if link.publicidad_id.is_none() {
            link.publicidad_id = stored.as_ref().map(|r| r.publicidad_id.clone());
        }
        if link.preference_id.is_none() {
            link.preference_id = stored.as_ref().map(|r| r.preference_id.clone());
        }
        if state.is_resolved(link.publicidad_id.as_deref()) {
            tracing::debug!("checkout already resolved, ignoring link");
            return Ok(ReconcileOutcome::Ignored(IgnoreReason::AlreadyResolved));
        }

        tracing::info!(status = ?link.status, "handling payment link");
        match link.status {
            PaymentLinkStatus::Success => match link.payment_id.clone() {
                Some(payment_id) => self.verify(state, link, &payment_id).await,
                None if link.publicidad_id.is_some() => {
                    self.poll(state, link, PaymentNavigationStatus::PendingVerification)
                        .await
                }
                None => Ok(self.announce_pending(state, &link, PaymentNavigationStatus::Pending)),
            },
            PaymentLinkStatus::Failure => {
                self.pending.clear().await;
                Ok(self.resolve(state, &link, PaymentNavigationStatus::Failure))
            }
            // The provider may have settled the payment since it sent the user back.
            PaymentLinkStatus::Pending if link.publicidad_id.is_some() => {
                self.poll(state, link, PaymentNavigationStatus::Pending).await
            }
            PaymentLinkStatus::Pending => {
                Ok(self.announce_pending(state, &link, PaymentNavigationStatus::Pending))
            }
        }
    }

    async fn reconcile_stored(&self, state: &mut ReconcilerState) -> Result<ReconcileOutcome> {
        let Some(record) = self.pending.load().await else {
            return Ok(ReconcileOutcome::Ignored(IgnoreReason::NoPendingPayment));
        };
        if state.is_resolved(Some(&record.publicidad_id)) {
            self.pending.clear().await;
            return Ok(ReconcileOutcome::Ignored(IgnoreReason::AlreadyResolved));
        }
        let PendingPaymentRecord {
            publicidad_id,
            preference_id,
            ..
        } = record;
        let link = PaymentLink {
            status: PaymentLinkStatus::Pending,
            payment_id: None,
            preference_id: Some(preference_id),
            publicidad_id: Some(publicidad_id),
        };
        self.poll(state, link, PaymentNavigationStatus::PendingVerification)
            .await
    }

    async fn verify(
        &self,
        state: &mut ReconcilerState,
        link: PaymentLink,
        payment_id: &str,
    ) -> Result<ReconcileOutcome> {
        let verification = self
            .backend
            .verify_payment(payment_id, link.publicidad_id.as_deref())
            .await?;

        self.pending.clear().await;
        if verification.success {
            tracing::info!(payment_id, "payment verified");
            Ok(self.resolve(state, &link, PaymentNavigationStatus::Success))
        } else {
            tracing::warn!(
                payment_id,
                "payment verification refused: {}",
                verification.message.as_deref().unwrap_or("no reason given")
            );
            Ok(self.resolve(state, &link, PaymentNavigationStatus::Failure))
        }
    }

    /// Ask the backend whether the advertisement behind `link` is paid.
    /// `unpaid` is announced while it is not.
    async fn poll(
        &self,
        state: &mut ReconcilerState,
        link: PaymentLink,
        unpaid: PaymentNavigationStatus,
    ) -> Result<ReconcileOutcome> {
        let Some(publicidad_id) = link.publicidad_id.as_deref() else {
            return Ok(self.announce_pending(state, &link, unpaid));
        };

        let paid = match self.backend.fetch_advertisement(publicidad_id).await {
            Ok(ad) => ad.is_paid(),
            Err(NocturnaError::NotFound { .. }) => {
                tracing::warn!(publicidad_id, "advertisement no longer exists");
                self.pending.clear().await;
                return Ok(ReconcileOutcome::Ignored(IgnoreReason::NoPendingPayment));
            }
            Err(err) => {
                tracing::warn!(publicidad_id, "could not check payment status: {err}");
                false
            }
        };

        if paid {
            self.pending.clear().await;
            return Ok(self.resolve(state, &link, PaymentNavigationStatus::Success));
        }
        Ok(self.announce_pending(state, &link, unpaid))
    }

    fn resolve(
        &self,
        state: &mut ReconcilerState,
        link: &PaymentLink,
        status: PaymentNavigationStatus,
    ) -> ReconcileOutcome {
        if let Some(id) = &link.publicidad_id {
            state.checkouts.insert(id.clone(), CheckoutPhase::Resolved(status));
        }
        self.publish(link, status);
        ReconcileOutcome::Published(status)
    }

    fn announce_pending(
        &self,
        state: &mut ReconcilerState,
        link: &PaymentLink,
        status: PaymentNavigationStatus,
    ) -> ReconcileOutcome {
        let key = link
            .publicidad_id
            .clone()
            .or_else(|| link.preference_id.clone())
            .unwrap_or_default();
        if state.is_announced(&key) {
            return ReconcileOutcome::StillPending;
        }
        state
            .checkouts
            .insert(key, CheckoutPhase::Pending { announced: true });
        self.publish(link, status);
        ReconcileOutcome::Published(status)
    }

    fn publish(&self, link: &PaymentLink, status: PaymentNavigationStatus) {
        self.navigation.publish(PaymentNavigation {
            status,
            payment_id: link.payment_id.clone(),
            preference_id: link.preference_id.clone(),
            publicidad_id: link.publicidad_id.clone(),
            timestamp: self.clock.now_millis(),
        });
    }
}
