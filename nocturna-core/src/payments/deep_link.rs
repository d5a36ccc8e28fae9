//! Payment return deep links.
//!
//! The checkout provider sends the user back to the app through a URL such as
//!
//! ```text
//! nocturna://payment/success?payment_id=p1&preference_id=pr1&publicidad_id=5
//! ```
//!
//! Providers and OS versions disagree on the exact shape, so recognition is
//! lenient: an outcome path segment *or* a status query parameter is enough,
//! and a bare `payment_id` is treated as pending. Anything else is ignored.
//!
//! # Examples
//!
//! ```rust
//! use nocturna_core::payments::{parse_payment_link, PaymentLinkStatus};
//!
//! let link = parse_payment_link("nocturna://payment/success?payment_id=123").unwrap();
//! assert_eq!(link.status, PaymentLinkStatus::Success);
//! assert_eq!(link.payment_id.as_deref(), Some("123"));
//!
//! assert!(parse_payment_link("nocturna://venues/4").is_none());
//! ```

use serde::{Deserialize, Serialize};

/// Outcome encoded in a payment return link.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentLinkStatus {
    /// Provider approved the payment.
    Success,
    /// Provider rejected the payment or the user abandoned checkout.
    Failure,
    /// Outcome not known yet.
    Pending,
}

/// A recognized payment return link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentLink {
    /// Outcome reported by the provider.
    pub status: PaymentLinkStatus,
    /// Provider payment id.
    pub payment_id: Option<String>,
    /// Provider preference (checkout) id.
    pub preference_id: Option<String>,
    /// Advertisement the payment is for.
    pub publicidad_id: Option<String>,
}

/// Parse a URL the app was opened with.
///
/// Returns `None` for URLs that carry no payment marker.
pub fn parse_payment_link(url: &str) -> Option<PaymentLink> {
    let url = url.trim();
    let url = url.split('#').next().unwrap_or(url);
    let (path, query) = url.split_once('?').unwrap_or((url, ""));

    let mut status = path_status(&path.to_ascii_lowercase());
    let mut payment_id = None;
    let mut preference_id = None;
    let mut publicidad_id = None;
    let mut external_reference = None;

    for param in query.split('&') {
        let Some((key, value)) = param.split_once('=') else {
            continue;
        };
        let value = decode(value);
        if value.is_empty() {
            continue;
        }
        match key {
            "payment_id" | "collection_id" => {
                payment_id.get_or_insert(value);
            }
            "preference_id" => {
                preference_id.get_or_insert(value);
            }
            "publicidad_id" => {
                publicidad_id.get_or_insert(value);
            }
            "external_reference" => {
                external_reference.get_or_insert(value);
            }
            "status" | "collection_status" => {
                if status.is_none() {
                    status = query_status(&value);
                }
            }
            _ => {}
        }
    }

    let status = match status {
        Some(status) => status,
        None if payment_id.is_some() => PaymentLinkStatus::Pending,
        None => return None,
    };

    Some(PaymentLink {
        status,
        payment_id,
        preference_id,
        publicidad_id: publicidad_id.or(external_reference),
    })
}

fn path_status(path: &str) -> Option<PaymentLinkStatus> {
    if path.contains("payment/success") || path.contains("payment-success") {
        Some(PaymentLinkStatus::Success)
    } else if path.contains("payment/failure") || path.contains("payment-failure") {
        Some(PaymentLinkStatus::Failure)
    } else if path.contains("payment/pending") || path.contains("payment-pending") {
        Some(PaymentLinkStatus::Pending)
    } else {
        None
    }
}

fn query_status(value: &str) -> Option<PaymentLinkStatus> {
    match value.to_ascii_lowercase().as_str() {
        "approved" | "success" => Some(PaymentLinkStatus::Success),
        "rejected" | "failure" | "cancelled" | "null" => Some(PaymentLinkStatus::Failure),
        "pending" | "in_process" | "in_mediation" => Some(PaymentLinkStatus::Pending),
        _ => None,
    }
}

fn decode(value: &str) -> String {
    let value = value.replace('+', " ");
    match urlencoding::decode(&value) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => value,
    }
}
