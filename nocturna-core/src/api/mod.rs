//! REST backend client.
//!
//! [`ApiClient`] is a thin JSON wrapper over `reqwest`:
//!
//! - the bearer token is read from the [`SessionStore`] for every request
//! - a 401 clears the stored token and yields [`NocturnaError::Unauthorized`]
//! - other non-2xx statuses yield [`NocturnaError::Http`] with a message
//!   extracted from the body
//!
//! Endpoint groups live in submodules as further `impl ApiClient` blocks.

mod advertising;
mod auth;
mod places;
mod venues;

pub use places::Geocoder;

use std::time::Duration;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::session::SessionStore;
use crate::{NocturnaError, Result};

/// Status and body of a response that was not a 401.
#[derive(Debug)]
pub(crate) struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP client for the Nocturna backend.
pub struct ApiClient {
    config: ClientConfig,
    client: reqwest::Client,
    session: SessionStore,
}

impl ApiClient {
    /// Create a client. Fails if the configuration is unusable.
    pub fn new(config: ClientConfig, session: SessionStore) -> Result<Self> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| NocturnaError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            client,
            session,
        })
    }

    /// The configuration in use.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url(), path.trim_start_matches('/'))
    }

    /// Send a request and return the response unless it was a 401.
    pub(crate) async fn execute_raw<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<RawResponse>
    where
        B: Serialize + ?Sized,
    {
        let mut request = self.client.request(method.clone(), self.url(path));
        if let Some(token) = self.session.read().await {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        tracing::debug!(%method, path, "sending request");
        let response = request
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e, &method, path))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| self.map_reqwest_error(e, &method, path))?;

        if status == 401 {
            tracing::warn!(%method, path, "token rejected, clearing it");
            self.session.clear().await;
            return Err(NocturnaError::Unauthorized);
        }
        Ok(RawResponse { status, body })
    }

    /// Send a request and return the body of a 2xx response.
    pub(crate) async fn execute<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<String>
    where
        B: Serialize + ?Sized,
    {
        let response = self.execute_raw(method, path, body).await?;
        if !response.is_success() {
            return Err(map_status_error(response.status, &response.body));
        }
        Ok(response.body)
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let body = self.execute::<()>(Method::GET, path, None).await?;
        parse_body(&body)
    }

    pub(crate) async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = self.execute(Method::POST, path, Some(body)).await?;
        parse_body(&body)
    }

    pub(crate) async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<String> {
        self.execute(Method::PUT, path, Some(body)).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<()> {
        self.execute::<()>(Method::DELETE, path, None).await?;
        Ok(())
    }

    fn map_reqwest_error(&self, e: reqwest::Error, method: &Method, path: &str) -> NocturnaError {
        if e.is_timeout() {
            NocturnaError::Timeout {
                operation: format!("{} {}", method, path),
                timeout_ms: self.config.timeout_secs * 1000,
            }
        } else {
            NocturnaError::Transport(format!("{} {} failed: {}", method, path, e))
        }
    }
}

fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body)
        .map_err(|e| NocturnaError::Serialization(format!("Failed to parse backend response: {}", e)))
}

/// Map a non-2xx, non-401 status to an error.
pub(crate) fn map_status_error(status: u16, body: &str) -> NocturnaError {
    NocturnaError::Http {
        status,
        message: extract_message(body),
    }
}

/// Best-effort human readable message from an error body.
///
/// Looks at `mensaje`, `message`, validation `errors`, `title` and `error` in
/// that order, then falls back to the raw text.
pub(crate) fn extract_message(body: &str) -> String {
    let raw = body.trim();
    let value = match serde_json::from_str::<Value>(raw) {
        Ok(value) => value,
        Err(_) => return raw.to_string(),
    };

    let map = match value {
        Value::String(s) => return s,
        Value::Object(map) => map,
        _ => return raw.to_string(),
    };

    for key in ["mensaje", "message"] {
        if let Some(Value::String(s)) = map.get(key) {
            if !s.is_empty() {
                return s.clone();
            }
        }
    }

    if let Some(errors) = map.get("errors") {
        let details = validation_messages(errors);
        if !details.is_empty() {
            return details.join("; ");
        }
    }

    for key in ["title", "error"] {
        if let Some(Value::String(s)) = map.get(key) {
            if !s.is_empty() {
                return s.clone();
            }
        }
    }
    raw.to_string()
}

fn validation_messages(errors: &Value) -> Vec<String> {
    match errors {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items.iter().flat_map(validation_messages).collect(),
        Value::Object(fields) => fields.values().flat_map(validation_messages).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_message_prefers_mensaje() {
        assert_eq!(
            extract_message(r#"{"mensaje":"Usuario no encontrado","title":"x"}"#),
            "Usuario no encontrado"
        );
        assert_eq!(extract_message(r#"{"message":"nope"}"#), "nope");
    }

    #[test]
    fn test_extract_message_from_validation_errors() {
        let body = r#"{
            "title": "One or more validation errors occurred.",
            "errors": { "Horario": ["Formato inválido"], "Comensales": ["Requerido"] }
        }"#;
        let message = extract_message(body);
        assert!(message.contains("Formato inválido"));
        assert!(message.contains("Requerido"));
    }

    #[test]
    fn test_extract_message_falls_back_to_text() {
        assert_eq!(extract_message("Bad gateway\n"), "Bad gateway");
        assert_eq!(extract_message(r#""plain""#), "plain");
        assert_eq!(extract_message(r#"{"title":"Not Found"}"#), "Not Found");
    }

    #[test]
    fn test_map_status_error() {
        let err = map_status_error(500, r#"{"error":"boom"}"#);
        assert!(err.is_retryable());
        assert_eq!(err.user_message(), "boom");
    }
}
