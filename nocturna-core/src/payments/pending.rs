//! Checkout started but not yet confirmed.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cache::CachePolicy;
use crate::clock::Clock;
use crate::storage::{keys, KeyValueStorage, KeyValueStorageExt};

/// Written right before the user is sent to the external checkout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingPaymentRecord {
    /// Advertisement being paid.
    pub publicidad_id: String,
    /// Provider preference id of the checkout.
    pub preference_id: String,
    /// Creation time, Unix milliseconds.
    pub timestamp: i64,
}

impl PendingPaymentRecord {
    /// Create a record stamped at `timestamp`.
    pub fn new(
        publicidad_id: impl Into<String>,
        preference_id: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            publicidad_id: publicidad_id.into(),
            preference_id: preference_id.into(),
            timestamp,
        }
    }

    /// A record created at T is reconcilable strictly before T + window.
    pub fn is_expired(&self, window: CachePolicy, now: i64) -> bool {
        !window.is_fresh(self.timestamp, now)
    }
}

/// Persists the single pending payment record.
#[derive(Clone)]
pub struct PendingPaymentStore {
    storage: Arc<dyn KeyValueStorage>,
    clock: Arc<dyn Clock>,
    window: CachePolicy,
}

impl PendingPaymentStore {
    /// Create a store whose records stay valid for `window`.
    pub fn new(storage: Arc<dyn KeyValueStorage>, clock: Arc<dyn Clock>, window: CachePolicy) -> Self {
        Self {
            storage,
            clock,
            window,
        }
    }

    /// Record a checkout that is about to start, replacing any previous one.
    pub async fn save(&self, publicidad_id: &str, preference_id: &str) -> Option<PendingPaymentRecord> {
        let record =
            PendingPaymentRecord::new(publicidad_id, preference_id, self.clock.now_millis());
        match self.storage.set_json(keys::PENDING_PAYMENT, &record).await {
            Ok(()) => Some(record),
            Err(err) => {
                tracing::warn!(publicidad_id, "failed to persist pending payment: {err}");
                None
            }
        }
    }

    /// The stored record if it is still within its window.
    ///
    /// Expired and unreadable records are deleted.
    pub async fn load(&self) -> Option<PendingPaymentRecord> {
        let record = match self
            .storage
            .get_json::<PendingPaymentRecord>(keys::PENDING_PAYMENT)
            .await
        {
            Ok(record) => record?,
            Err(err) => {
                tracing::warn!("discarding unreadable pending payment: {err}");
                self.clear().await;
                return None;
            }
        };

        if record.is_expired(self.window, self.clock.now_millis()) {
            tracing::info!(
                publicidad_id = %record.publicidad_id,
                "pending payment expired"
            );
            self.clear().await;
            return None;
        }
        Some(record)
    }

    /// Forget the stored record.
    pub async fn clear(&self) -> bool {
        match self.storage.remove(keys::PENDING_PAYMENT).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!("failed to clear pending payment: {err}");
                false
            }
        }
    }
}
