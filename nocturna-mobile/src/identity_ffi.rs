//! Google sign-in supplied by the host app.

use std::sync::Arc;

use nocturna_core::auth::{IdentityOutcome, IdentityProvider};
use nocturna_core::NocturnaError;

/// What the host's sign-in sheet produced.
///
/// Exactly one of `id_token`, `cancelled` or `error` is meaningful: an error
/// wins over a token, and a dismissed sheet sets `cancelled`.
#[derive(Clone, Debug, Default, uniffi::Record)]
pub struct IdentityResultFFI {
    /// Provider identity token.
    pub id_token: Option<String>,
    /// The user dismissed the sheet.
    pub cancelled: bool,
    /// Provider failure message.
    pub error: Option<String>,
}

/// Identity provider callback interface.
///
/// `sign_in` runs the interactive flow and blocks until it finishes, so hosts
/// must call into `NocturnaClient` off the main thread.
#[uniffi::export(callback_interface)]
pub trait IdentityProviderCallback: Send + Sync {
    /// Show the provider sign-in sheet.
    fn sign_in(&self) -> IdentityResultFFI;

    /// Forget the provider session. Returns an error message on failure.
    fn sign_out(&self) -> Option<String>;
}

/// Bridge from the FFI callback to [`IdentityProvider`].
pub struct IdentityProviderBridge {
    ffi: Arc<dyn IdentityProviderCallback>,
}

impl IdentityProviderBridge {
    /// Wrap a host provider.
    pub fn new(ffi: Arc<dyn IdentityProviderCallback>) -> Self {
        Self { ffi }
    }
}

impl std::fmt::Debug for IdentityProviderBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityProviderBridge")
            .field("ffi", &"<IdentityProviderCallback>")
            .finish()
    }
}

impl IdentityResultFFI {
    fn into_outcome(self) -> nocturna_core::Result<IdentityOutcome> {
        if let Some(msg) = self.error {
            return Err(NocturnaError::IdentityProvider(msg));
        }
        match self.id_token {
            Some(token) if !self.cancelled && !token.is_empty() => {
                Ok(IdentityOutcome::Token(token))
            }
            _ if self.cancelled => Ok(IdentityOutcome::Cancelled),
            _ => Err(NocturnaError::IdentityProvider(
                "provider returned no identity token".into(),
            )),
        }
    }
}

#[async_trait::async_trait]
impl IdentityProvider for IdentityProviderBridge {
    async fn sign_in(&self) -> nocturna_core::Result<IdentityOutcome> {
        let outcome = self.ffi.sign_in().into_outcome();
        match &outcome {
            Ok(IdentityOutcome::Token(_)) => tracing::debug!("host provider returned a token"),
            Ok(IdentityOutcome::Cancelled) => tracing::debug!("host sign-in cancelled"),
            Err(err) => tracing::warn!("host sign-in failed: {err}"),
        }
        outcome
    }

    async fn sign_out(&self) -> nocturna_core::Result<()> {
        match self.ffi.sign_out() {
            Some(msg) => {
                tracing::warn!("host sign-out failed: {msg}");
                Err(NocturnaError::IdentityProvider(msg))
            }
            None => Ok(()),
        }
    }
}
