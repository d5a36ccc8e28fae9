//! Advertising slots and their checkout.

use async_trait::async_trait;
use serde_json::json;

use super::ApiClient;
use crate::models::{Advertisement, PaymentPreference, PaymentVerification};
use crate::payments::PaymentBackend;
use crate::Result;

impl ApiClient {
    /// `GET /api/Publicidades/listado`
    pub async fn list_advertisements(&self) -> Result<Vec<Advertisement>> {
        self.get("api/Publicidades/listado").await
    }

    /// `GET /api/Publicidades/{id}`
    pub async fn get_advertisement(&self, publicidad_id: &str) -> Result<Advertisement> {
        self.get(&format!(
            "api/Publicidades/{}",
            urlencoding::encode(publicidad_id)
        ))
        .await
    }

    /// `POST /api/Publicidades/crearPreferenciaPago`
    pub async fn create_payment_preference(&self, publicidad_id: &str) -> Result<PaymentPreference> {
        let body = json!({ "publicidadId": publicidad_id });
        self.post("api/Publicidades/crearPreferenciaPago", &body).await
    }

    /// `POST /api/Publicidades/verificarPago`
    pub async fn verify_payment(
        &self,
        payment_id: &str,
        publicidad_id: Option<&str>,
    ) -> Result<PaymentVerification> {
        let body = json!({ "paymentId": payment_id, "publicidadId": publicidad_id });
        self.post("api/Publicidades/verificarPago", &body).await
    }
}

#[async_trait]
impl PaymentBackend for ApiClient {
    async fn create_payment_preference(&self, publicidad_id: &str) -> Result<PaymentPreference> {
        ApiClient::create_payment_preference(self, publicidad_id).await
    }

    async fn verify_payment(
        &self,
        payment_id: &str,
        publicidad_id: Option<&str>,
    ) -> Result<PaymentVerification> {
        ApiClient::verify_payment(self, payment_id, publicidad_id).await
    }

    async fn fetch_advertisement(&self, publicidad_id: &str) -> Result<Advertisement> {
        self.get_advertisement(publicidad_id).await
    }
}
