//! Shared test doubles for the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use nocturna_core::auth::{AuthBackend, GoogleSignIn, IdentityOutcome, IdentityProvider};
use nocturna_core::models::{
    Advertisement, AuthResponse, PaymentPreference, PaymentVerification, RoleRecord, UserProfile,
};
use nocturna_core::payments::PaymentBackend;
use nocturna_core::roles::RoleSource;
use nocturna_core::{NocturnaError, Result};

/// In-process backend recording every call.
pub struct MockBackend {
    pub roles: Vec<RoleRecord>,
    pub role_fetches: AtomicUsize,
    pub sign_in: Mutex<Option<GoogleSignIn>>,
    pub verify_calls: Mutex<Vec<(String, Option<String>)>>,
    pub verification_success: AtomicBool,
    pub ad_paid: AtomicBool,
    pub fetch_calls: AtomicUsize,
    pub deleted_users: Mutex<Vec<i64>>,
}

impl MockBackend {
    pub fn new(roles: Vec<RoleRecord>) -> Arc<Self> {
        Arc::new(Self {
            roles,
            role_fetches: AtomicUsize::new(0),
            sign_in: Mutex::new(None),
            verify_calls: Mutex::new(Vec::new()),
            verification_success: AtomicBool::new(true),
            ad_paid: AtomicBool::new(false),
            fetch_calls: AtomicUsize::new(0),
            deleted_users: Mutex::new(Vec::new()),
        })
    }

    pub fn with_default_roles() -> Arc<Self> {
        Self::new(vec![
            RoleRecord::new(1, "Usuario"),
            RoleRecord::new(2, "Administrador"),
            RoleRecord::new(3, "Usuario Comercio"),
        ])
    }

    pub fn respond_to_sign_in(&self, response: GoogleSignIn) {
        *self.sign_in.lock().unwrap() = Some(response);
    }

    pub fn verify_calls(&self) -> Vec<(String, Option<String>)> {
        self.verify_calls.lock().unwrap().clone()
    }

    pub fn role_fetches(&self) -> usize {
        self.role_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RoleSource for MockBackend {
    async fn list_roles(&self) -> Result<Vec<RoleRecord>> {
        self.role_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.roles.clone())
    }
}

#[async_trait]
impl AuthBackend for MockBackend {
    async fn sign_in_with_google(&self, _id_token: &str) -> Result<GoogleSignIn> {
        self.sign_in
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| NocturnaError::Http {
                status: 500,
                message: "no sign-in response configured".into(),
            })
    }

    async fn register_with_google(&self, _id_token: &str, role_id: i64) -> Result<AuthResponse> {
        Ok(AuthResponse {
            jwt_token: "registered-jwt".into(),
            usuario: UserProfile::new(42, role_id).with_approved(true),
        })
    }

    async fn get_user(&self, id: i64) -> Result<UserProfile> {
        Ok(UserProfile::new(id, 3))
    }

    async fn update_user(&self, profile: &UserProfile) -> Result<UserProfile> {
        Ok(profile.clone())
    }

    async fn delete_user(&self, id: i64) -> Result<()> {
        self.deleted_users.lock().unwrap().push(id);
        Ok(())
    }
}

#[async_trait]
impl PaymentBackend for MockBackend {
    async fn create_payment_preference(&self, publicidad_id: &str) -> Result<PaymentPreference> {
        Ok(PaymentPreference {
            preference_id: format!("pref-{}", publicidad_id),
            init_point: format!("https://checkout.test/pref-{}", publicidad_id),
        })
    }

    async fn verify_payment(
        &self,
        payment_id: &str,
        publicidad_id: Option<&str>,
    ) -> Result<PaymentVerification> {
        self.verify_calls
            .lock()
            .unwrap()
            .push((payment_id.to_string(), publicidad_id.map(str::to_string)));
        Ok(PaymentVerification {
            success: self.verification_success.load(Ordering::SeqCst),
            message: None,
        })
    }

    async fn fetch_advertisement(&self, publicidad_id: &str) -> Result<Advertisement> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let id = publicidad_id
            .parse::<i64>()
            .map_err(|_| NocturnaError::not_found("advertisement", publicidad_id))?;
        Ok(serde_json::from_value(serde_json::json!({
            "iD_Publicidad": id,
            "pago": self.ad_paid.load(Ordering::SeqCst),
        }))?)
    }
}

/// Identity provider returning a scripted outcome.
pub struct MockIdentity {
    outcome: Mutex<Result<IdentityOutcome>>,
    pub sign_outs: AtomicUsize,
}

impl MockIdentity {
    pub fn token(token: &str) -> Arc<Self> {
        Self::with(Ok(IdentityOutcome::Token(token.to_string())))
    }

    pub fn cancelled() -> Arc<Self> {
        Self::with(Ok(IdentityOutcome::Cancelled))
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Self::with(Err(NocturnaError::IdentityProvider(message.to_string())))
    }

    fn with(outcome: Result<IdentityOutcome>) -> Arc<Self> {
        Arc::new(Self {
            outcome: Mutex::new(outcome),
            sign_outs: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl IdentityProvider for MockIdentity {
    async fn sign_in(&self) -> Result<IdentityOutcome> {
        match &*self.outcome.lock().unwrap() {
            Ok(outcome) => Ok(outcome.clone()),
            Err(err) => Err(NocturnaError::IdentityProvider(err.to_string())),
        }
    }

    async fn sign_out(&self) -> Result<()> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
