//! Advertising checkout and its reconciliation.
//!
//! - [`deep_link`]: recognizes payment return URLs
//! - [`pending`]: the stored record of a checkout in progress
//! - [`navigation`]: one-shot events consumed by the UI
//! - [`reconciler`]: turns links and stored records into events

pub mod deep_link;
pub mod navigation;
pub mod pending;
pub mod reconciler;

pub use deep_link::{parse_payment_link, PaymentLink, PaymentLinkStatus};
pub use navigation::{NavigationSlot, PaymentNavigation, PaymentNavigationStatus};
pub use pending::{PendingPaymentRecord, PendingPaymentStore};
pub use reconciler::{
    CheckoutPhase, IgnoreReason, PaymentBackend, PaymentReconciler, ReconcileOutcome,
    ReconcileSignal,
};
