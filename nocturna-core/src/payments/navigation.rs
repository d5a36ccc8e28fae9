//! One-shot payment navigation events.
//!
//! The reconciler publishes at most one [`PaymentNavigation`] at a time; the
//! screen that handles it takes it, which empties the slot for everyone else.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// What the UI should show after a checkout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentNavigationStatus {
    /// Backend confirmed the payment.
    Success,
    /// Provider or backend rejected the payment.
    Failure,
    /// Provider has not settled yet.
    Pending,
    /// A checkout is outstanding and the UI should poll for its result.
    PendingVerification,
}

/// Event consumed by exactly one screen.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentNavigation {
    /// Outcome.
    pub status: PaymentNavigationStatus,
    /// Provider payment id, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    /// Provider preference id, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preference_id: Option<String>,
    /// Advertisement id, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publicidad_id: Option<String>,
    /// Publication time, Unix milliseconds.
    pub timestamp: i64,
}

/// Holder of the current navigation event.
pub struct NavigationSlot {
    tx: watch::Sender<Option<PaymentNavigation>>,
}

impl Default for NavigationSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationSlot {
    /// Create an empty slot.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    /// Replace the current event.
    pub fn publish(&self, event: PaymentNavigation) {
        tracing::debug!(status = ?event.status, "publishing payment navigation");
        self.tx.send_replace(Some(event));
    }

    /// Consume the current event. Later calls return `None` until the next publish.
    pub fn take(&self) -> Option<PaymentNavigation> {
        let mut taken = None;
        self.tx.send_if_modified(|current| {
            taken = current.take();
            taken.is_some()
        });
        taken
    }

    /// Look at the current event without consuming it.
    pub fn peek(&self) -> Option<PaymentNavigation> {
        self.tx.borrow().clone()
    }

    /// Watch the slot. Dropping the receiver ends the subscription.
    pub fn subscribe(&self) -> watch::Receiver<Option<PaymentNavigation>> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(status: PaymentNavigationStatus) -> PaymentNavigation {
        PaymentNavigation {
            status,
            payment_id: Some("p1".into()),
            preference_id: None,
            publicidad_id: Some("5".into()),
            timestamp: 0,
        }
    }

    #[test]
    fn test_take_is_one_shot() {
        let slot = NavigationSlot::new();
        slot.publish(event(PaymentNavigationStatus::Success));

        assert!(slot.peek().is_some());
        assert_eq!(
            slot.take().map(|e| e.status),
            Some(PaymentNavigationStatus::Success)
        );
        assert!(slot.take().is_none());
        assert!(slot.peek().is_none());
    }

    #[tokio::test]
    async fn test_subscribers_see_publish() {
        let slot = NavigationSlot::new();
        let mut rx = slot.subscribe();

        slot.publish(event(PaymentNavigationStatus::PendingVerification));
        rx.changed().await.unwrap();
        assert_eq!(
            rx.borrow().as_ref().map(|e| e.status),
            Some(PaymentNavigationStatus::PendingVerification)
        );
    }
}
