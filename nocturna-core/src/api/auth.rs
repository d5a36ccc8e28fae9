//! Users, roles and the Google sign-in exchange.

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};

use super::{extract_message, map_status_error, parse_body, ApiClient};
use crate::auth::{AuthBackend, GoogleSignIn};
use crate::models::{AuthResponse, RoleRecord, UserProfile};
use crate::roles::RoleSource;
use crate::Result;

impl ApiClient {
    /// `POST /api/usuarios/iniciarSesionConGoogle`
    ///
    /// A 400 whose body says `existeUsuario: false` is not an error: the user
    /// has to register first.
    pub async fn sign_in_with_google(&self, id_token: &str) -> Result<GoogleSignIn> {
        let body = json!({ "idToken": id_token });
        let response = self
            .execute_raw(Method::POST, "api/usuarios/iniciarSesionConGoogle", Some(&body))
            .await?;

        if response.is_success() {
            return Ok(GoogleSignIn::SignedIn(parse_body(&response.body)?));
        }
        if response.status == 400 && reports_unknown_user(&response.body) {
            return Ok(GoogleSignIn::UnknownUser {
                message: extract_message(&response.body),
            });
        }
        Err(map_status_error(response.status, &response.body))
    }

    /// `POST /api/Usuarios/registrarseConGoogle`
    pub async fn register_with_google(&self, id_token: &str, role_id: i64) -> Result<AuthResponse> {
        let body = json!({ "idToken": id_token, "rolUsuario": role_id });
        self.post("api/Usuarios/registrarseConGoogle", &body).await
    }

    /// `GET /api/usuarios/{id}`
    pub async fn get_user(&self, id: i64) -> Result<UserProfile> {
        self.get(&format!("api/usuarios/{}", id)).await
    }

    /// `PUT /api/usuarios/{id}` with the whole record.
    ///
    /// Some deployments answer with the stored user, others with a bare
    /// confirmation; in the latter case the submitted record is returned.
    pub async fn update_user(&self, profile: &UserProfile) -> Result<UserProfile> {
        let body = self
            .put(&format!("api/usuarios/{}", profile.id), profile)
            .await?;
        match serde_json::from_str::<UserProfile>(&body) {
            Ok(stored) => Ok(stored),
            Err(_) => Ok(profile.clone()),
        }
    }

    /// `DELETE /api/usuarios/{id}`
    pub async fn delete_user(&self, id: i64) -> Result<()> {
        self.delete(&format!("api/usuarios/{}", id)).await
    }

    /// `GET /api/RolesUsuario/listado`
    pub async fn list_roles(&self) -> Result<Vec<RoleRecord>> {
        self.get("api/RolesUsuario/listado").await
    }
}

fn reports_unknown_user(body: &str) -> bool {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("existeUsuario").and_then(Value::as_bool))
        == Some(false)
}

#[async_trait]
impl AuthBackend for ApiClient {
    async fn sign_in_with_google(&self, id_token: &str) -> Result<GoogleSignIn> {
        ApiClient::sign_in_with_google(self, id_token).await
    }

    async fn register_with_google(&self, id_token: &str, role_id: i64) -> Result<AuthResponse> {
        ApiClient::register_with_google(self, id_token, role_id).await
    }

    async fn get_user(&self, id: i64) -> Result<UserProfile> {
        ApiClient::get_user(self, id).await
    }

    async fn update_user(&self, profile: &UserProfile) -> Result<UserProfile> {
        ApiClient::update_user(self, profile).await
    }

    async fn delete_user(&self, id: i64) -> Result<()> {
        ApiClient::delete_user(self, id).await
    }
}

#[async_trait]
impl RoleSource for ApiClient {
    async fn list_roles(&self) -> Result<Vec<RoleRecord>> {
        ApiClient::list_roles(self).await
    }
}
