//! Deep-link and stored-record reconciliation of advertising checkouts.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::MockBackend;
use nocturna_core::cache::CachePolicy;
use nocturna_core::clock::ManualClock;
use nocturna_core::payments::{
    IgnoreReason, NavigationSlot, PaymentNavigationStatus, PaymentReconciler,
    PendingPaymentStore, ReconcileOutcome, ReconcileSignal,
};
use nocturna_core::storage::InMemoryStorage;

const SUCCESS_LINK: &str =
    "nocturna://payment/success?payment_id=p1&preference_id=pr1&publicidad_id=5";

struct Harness {
    backend: Arc<MockBackend>,
    clock: Arc<ManualClock>,
    pending: PendingPaymentStore,
    reconciler: PaymentReconciler,
}

fn harness() -> Harness {
    let backend = MockBackend::with_default_roles();
    let clock = ManualClock::shared(1_700_000_000_000);
    let pending = PendingPaymentStore::new(
        Arc::new(InMemoryStorage::new()),
        clock.clone(),
        CachePolicy::from_secs(600),
    );
    let reconciler = PaymentReconciler::new(
        backend.clone(),
        pending.clone(),
        Arc::new(NavigationSlot::new()),
        clock.clone(),
    );
    Harness {
        backend,
        clock,
        pending,
        reconciler,
    }
}

#[tokio::test]
async fn test_success_link_verifies_once_and_clears_record() {
    let h = harness();
    h.pending.save("5", "pr1").await.unwrap();

    let outcome = h.reconciler.handle_deep_link(SUCCESS_LINK).await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::Published(PaymentNavigationStatus::Success));

    let event = h.reconciler.navigation().take().unwrap();
    assert_eq!(event.status, PaymentNavigationStatus::Success);
    assert_eq!(event.payment_id.as_deref(), Some("p1"));
    assert_eq!(event.publicidad_id.as_deref(), Some("5"));
    assert!(h.reconciler.navigation().take().is_none());

    assert!(h.pending.load().await.is_none());
    assert_eq!(
        h.backend.verify_calls(),
        vec![("p1".to_string(), Some("5".to_string()))]
    );
}

#[tokio::test]
async fn test_identical_link_is_processed_once() {
    let h = harness();

    h.reconciler.handle_deep_link(SUCCESS_LINK).await.unwrap();
    h.reconciler.navigation().take();

    let second = h.reconciler.handle_deep_link(SUCCESS_LINK).await.unwrap();
    assert_eq!(second, ReconcileOutcome::Ignored(IgnoreReason::DuplicateLink));
    assert_eq!(h.backend.verify_calls().len(), 1);
    assert!(h.reconciler.navigation().peek().is_none());
}

#[tokio::test]
async fn test_unrecognized_link_changes_nothing() {
    let h = harness();
    h.pending.save("5", "pr1").await.unwrap();

    let outcome = h
        .reconciler
        .handle_deep_link("nocturna://venues/12?tab=reviews")
        .await
        .unwrap();

    assert_eq!(outcome, ReconcileOutcome::Ignored(IgnoreReason::Unrecognized));
    assert!(h.backend.verify_calls().is_empty());
    assert_eq!(h.backend.fetch_calls.load(Ordering::SeqCst), 0);
    assert!(h.reconciler.navigation().peek().is_none());
    assert!(h.pending.load().await.is_some());
    assert_eq!(h.reconciler.phase("5").await, None);
}

#[tokio::test]
async fn test_stored_record_first_then_link_is_noop() {
    let h = harness();
    h.reconciler.begin_checkout("5").await.unwrap();
    h.backend.ad_paid.store(true, Ordering::SeqCst);

    let first = h
        .reconciler
        .reconcile(ReconcileSignal::StoredRecord)
        .await
        .unwrap();
    assert_eq!(first, ReconcileOutcome::Published(PaymentNavigationStatus::Success));

    let second = h.reconciler.handle_deep_link(SUCCESS_LINK).await.unwrap();
    assert_eq!(second, ReconcileOutcome::Ignored(IgnoreReason::AlreadyResolved));
    assert!(h.backend.verify_calls().is_empty());
}

#[tokio::test]
async fn test_link_first_then_stored_record_is_noop() {
    let h = harness();
    h.reconciler.begin_checkout("5").await.unwrap();

    h.reconciler.handle_deep_link(SUCCESS_LINK).await.unwrap();
    let second = h.reconciler.check_pending_payment().await.unwrap();

    assert_eq!(second, ReconcileOutcome::Ignored(IgnoreReason::NoPendingPayment));
    assert_eq!(h.backend.fetch_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_refused_verification_publishes_failure() {
    let h = harness();
    h.backend.verification_success.store(false, Ordering::SeqCst);

    let outcome = h.reconciler.handle_deep_link(SUCCESS_LINK).await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::Published(PaymentNavigationStatus::Failure));
}

#[tokio::test]
async fn test_expired_record_is_not_reconciled() {
    let h = harness();
    h.reconciler.begin_checkout("5").await.unwrap();
    h.clock.advance(10 * 60 * 1000);

    let outcome = h.reconciler.check_pending_payment().await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::Ignored(IgnoreReason::NoPendingPayment));
    assert_eq!(h.backend.fetch_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_begin_checkout_returns_checkout_url() {
    let h = harness();

    let preference = h.reconciler.begin_checkout("9").await.unwrap();
    assert_eq!(preference.init_point, "https://checkout.test/pref-9");

    let record = h.pending.load().await.unwrap();
    assert_eq!(record.publicidad_id, "9");
    assert_eq!(record.preference_id, "pref-9");
}

#[tokio::test]
async fn test_concurrent_signals_resolve_once() {
    let h = Arc::new(harness());
    h.reconciler.begin_checkout("5").await.unwrap();
    h.backend.ad_paid.store(true, Ordering::SeqCst);

    let a = {
        let h = h.clone();
        tokio::spawn(async move { h.reconciler.handle_deep_link(SUCCESS_LINK).await })
    };
    let b = {
        let h = h.clone();
        tokio::spawn(async move { h.reconciler.check_pending_payment().await })
    };
    let outcomes = [a.await.unwrap().unwrap(), b.await.unwrap().unwrap()];

    let published = outcomes
        .iter()
        .filter(|o| matches!(o, ReconcileOutcome::Published(_)))
        .count();
    assert_eq!(published, 1);
}

#[tokio::test]
async fn test_pending_link_polls_and_resolves_paid_checkout() {
    let h = harness();
    h.reconciler.begin_checkout("5").await.unwrap();
    h.backend.ad_paid.store(true, Ordering::SeqCst);

    let outcome = h
        .reconciler
        .handle_deep_link("nocturna://payment/pending?publicidad_id=5&preference_id=pref-5")
        .await
        .unwrap();

    assert_eq!(outcome, ReconcileOutcome::Published(PaymentNavigationStatus::Success));
    assert_eq!(h.backend.fetch_calls.load(Ordering::SeqCst), 1);
    assert!(h.backend.verify_calls().is_empty());
    assert!(h.pending.load().await.is_none());
    assert_eq!(
        h.reconciler.navigation().take().map(|e| e.preference_id),
        Some(Some("pref-5".to_string()))
    );
}

#[tokio::test]
async fn test_pending_link_for_unpaid_checkout_keeps_record() {
    let h = harness();
    h.reconciler.begin_checkout("5").await.unwrap();

    let outcome = h
        .reconciler
        .handle_deep_link("nocturna://payment/pending?publicidad_id=5")
        .await
        .unwrap();

    assert_eq!(outcome, ReconcileOutcome::Published(PaymentNavigationStatus::Pending));
    assert_eq!(h.backend.fetch_calls.load(Ordering::SeqCst), 1);
    assert!(h.pending.load().await.is_some());

    h.backend.ad_paid.store(true, Ordering::SeqCst);
    assert_eq!(
        h.reconciler.check_pending_payment().await.unwrap(),
        ReconcileOutcome::Published(PaymentNavigationStatus::Success)
    );
}
