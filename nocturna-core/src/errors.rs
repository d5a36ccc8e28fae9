//! Error types for Nocturna operations.
//!
//! Every fallible operation in the crate returns [`NocturnaError`]. Errors carry
//! a stable numeric [`NocturnaErrorCode`] so the mobile bindings can branch on
//! them, and [`NocturnaError::user_message`] produces the text shown in alerts.

/// Error codes for FFI and mobile integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum NocturnaErrorCode {
    /// Transport/network layer error
    Transport = 2000,
    /// Request timed out
    Timeout = 2001,
    /// Backend answered with a non-success status
    Http = 2002,
    /// Bearer token rejected (HTTP 401)
    Unauthorized = 3000,
    /// Authentication flow failed
    Auth = 3001,
    /// Identity provider failed (not a cancellation)
    IdentityProvider = 3002,
    /// Resource not found
    NotFound = 4000,
    /// Invalid request/data
    InvalidData = 5000,
    /// Client-side validation failed before any request
    Validation = 5001,
    /// Serialization error
    Serialization = 5002,
    /// Payment-specific errors
    Payment = 6000,
    /// Local storage error
    Storage = 7000,
    /// Internal/unexpected error
    Internal = 9999,
}

/// Comprehensive error type for Nocturna operations.
#[derive(Debug, thiserror::Error)]
pub enum NocturnaError {
    /// Network failure before a response was received.
    #[error("transport error: {0}")]
    Transport(String),

    /// Request did not complete in time.
    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout {
        /// Operation that timed out
        operation: String,
        /// Timeout duration in milliseconds
        timeout_ms: u64,
    },

    /// Backend answered with a non-2xx status other than 401.
    #[error("backend returned {status}: {message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Best-effort message extracted from the response body
        message: String,
    },

    /// The stored bearer token was rejected. The token has already been cleared.
    #[error("session is no longer valid, please sign in again")]
    Unauthorized,

    /// Authentication flow failed.
    #[error("authentication error: {0}")]
    Auth(String),

    /// The identity provider reported an error.
    #[error("identity provider error: {0}")]
    IdentityProvider(String),

    /// Resource not found.
    #[error("{resource_type} not found: {identifier}")]
    NotFound {
        /// Type of resource (e.g., "role", "venue")
        resource_type: String,
        /// Resource identifier
        identifier: String,
    },

    /// Invalid data provided or received.
    #[error("invalid {field}: {reason}")]
    InvalidData {
        /// Field or parameter name
        field: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Input rejected before reaching the backend.
    #[error("{0}")]
    Validation(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Payment verification or checkout failed.
    #[error("payment failed: {reason}")]
    Payment {
        /// Payment ID if available
        payment_id: Option<String>,
        /// Failure reason
        reason: String,
    },

    /// Local storage operation failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Internal/unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl NocturnaError {
    /// Get the error code for FFI/mobile integration.
    pub fn code(&self) -> NocturnaErrorCode {
        match self {
            Self::Transport(_) => NocturnaErrorCode::Transport,
            Self::Timeout { .. } => NocturnaErrorCode::Timeout,
            Self::Http { .. } => NocturnaErrorCode::Http,
            Self::Unauthorized => NocturnaErrorCode::Unauthorized,
            Self::Auth(_) => NocturnaErrorCode::Auth,
            Self::IdentityProvider(_) => NocturnaErrorCode::IdentityProvider,
            Self::NotFound { .. } => NocturnaErrorCode::NotFound,
            Self::InvalidData { .. } => NocturnaErrorCode::InvalidData,
            Self::Validation(_) => NocturnaErrorCode::Validation,
            Self::Serialization(_) => NocturnaErrorCode::Serialization,
            Self::Payment { .. } => NocturnaErrorCode::Payment,
            Self::Storage(_) => NocturnaErrorCode::Storage,
            Self::Internal(_) => NocturnaErrorCode::Internal,
        }
    }

    /// Returns true if repeating the same action may succeed.
    ///
    /// Nothing in the crate retries automatically; this only tells the UI
    /// whether offering a "try again" button makes sense.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout { .. } => true,
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Text suitable for a modal alert.
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport(_) | Self::Timeout { .. } => {
                "No se pudo conectar con el servidor. Intentá de nuevo.".to_string()
            }
            Self::Http { message, .. } if !message.is_empty() => message.clone(),
            Self::Http { status, .. } => format!("El servidor respondió con error {}", status),
            Self::Unauthorized => "Tu sesión expiró. Iniciá sesión nuevamente.".to_string(),
            Self::Validation(msg) => msg.clone(),
            Self::Payment { reason, .. } => reason.clone(),
            other => other.to_string(),
        }
    }

    /// Create a not found error.
    pub fn not_found(resource_type: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            identifier: identifier.into(),
        }
    }

    /// Create an invalid data error.
    pub fn invalid_data(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidData {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<serde_json::Error> for NocturnaError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<crate::storage::StorageError> for NocturnaError {
    fn from(err: crate::storage::StorageError) -> Self {
        Self::Storage(err.to_string())
    }
}
