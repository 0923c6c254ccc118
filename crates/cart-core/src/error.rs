//! # Shop Error Types
//!
//! Typed error handling for the dairy-cart client core.
//! Every fallible operation returns `Result<T, ShopError>`, and every variant
//! carries a human-readable message the UI can display.

use crate::validation::CartFinding;
use thiserror::Error;

/// Message shown when the remote API cannot be reached at all
pub const NETWORK_ERROR_MESSAGE: &str =
    "Could not reach the server. Please check your connection and try again.";

/// Core error type for all storefront client operations
#[derive(Debug, Error)]
pub enum ShopError {
    /// Transport failure talking to the API or payment processor
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response carrying the server's message
    #[error("{message}")]
    Api { status: u16, message: String },

    /// Client-side form or cart check failed; never sent over the network
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Payment processor reported an error
    #[error("Payment failed: {message}")]
    Payment {
        message: String,
        code: Option<String>,
    },

    /// Cart items are no longer purchasable as captured
    #[error("Cart has {} item(s) that cannot be purchased", errors.len())]
    StaleState { errors: Vec<CartFinding> },

    /// Persistence port failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration errors (missing keys, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Requested entity does not exist locally
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation not allowed in the current state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Waiting was abandoned because the owner went away
    #[error("Operation cancelled")]
    Cancelled,

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ShopError {
    /// Build an API error from a status code and an optional server message.
    pub fn api(status: u16, message: Option<String>) -> Self {
        ShopError::Api {
            status,
            message: message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| format!("HTTP error! status: {}", status)),
        }
    }

    /// Build a payment error without a processor code.
    pub fn payment(message: impl Into<String>) -> Self {
        ShopError::Payment {
            message: message.into(),
            code: None,
        }
    }

    /// Message suitable for direct display to the shopper
    pub fn user_message(&self) -> String {
        match self {
            ShopError::Network(_) => NETWORK_ERROR_MESSAGE.to_string(),
            ShopError::Api { message, .. } => message.clone(),
            ShopError::Validation(message) => message.clone(),
            ShopError::Payment { message, .. } => message.clone(),
            ShopError::StaleState { errors } => errors
                .iter()
                .map(|f| f.message.as_str())
                .collect::<Vec<_>>()
                .join("; "),
            other => other.to_string(),
        }
    }

    /// Returns true if the caller may reasonably try again
    pub fn is_retryable(&self) -> bool {
        match self {
            ShopError::Network(_) => true,
            ShopError::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Returns true if the server rejected our credentials
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ShopError::Api { status: 401, .. })
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ShopError::Network(_) => 503,
            ShopError::Api { status, .. } => *status,
            ShopError::Validation(_) => 400,
            ShopError::Payment { .. } => 402,
            ShopError::StaleState { .. } => 409,
            ShopError::Storage(_) => 500,
            ShopError::Serialization(_) => 500,
            ShopError::Configuration(_) => 500,
            ShopError::NotFound(_) => 404,
            ShopError::InvalidState(_) => 409,
            ShopError::Cancelled => 499,
            ShopError::Internal(_) => 500,
        }
    }
}

impl From<serde_json::Error> for ShopError {
    fn from(err: serde_json::Error) -> Self {
        ShopError::Serialization(err.to_string())
    }
}

/// Result type alias for storefront operations
pub type ShopResult<T> = Result<T, ShopError>;
