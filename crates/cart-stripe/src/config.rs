//! # Stripe Configuration
//!
//! The browser-side half of Stripe only ever holds the publishable key,
//! loaded from the environment.

use cart_core::ShopError;
use std::env;

const DEFAULT_API_BASE: &str = "https://api.stripe.com";
const DEFAULT_API_VERSION: &str = "2024-12-18.acacia";

/// Stripe client configuration
#[derive(Debug, Clone)]
pub struct StripeConfig {
    /// Publishable key (pk_test_... or pk_live_...)
    pub publishable_key: String,

    /// API base URL (for testing/mocking)
    pub api_base_url: String,

    /// API version
    pub api_version: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl StripeConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `STRIPE_PUBLISHABLE_KEY`
    ///
    /// Optional:
    /// - `STRIPE_API_BASE_URL`
    pub fn from_env() -> Result<Self, ShopError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let publishable_key = env::var("STRIPE_PUBLISHABLE_KEY").map_err(|_| {
            ShopError::Configuration("STRIPE_PUBLISHABLE_KEY not set".to_string())
        })?;

        if !publishable_key.starts_with("pk_test_") && !publishable_key.starts_with("pk_live_") {
            return Err(ShopError::Configuration(
                "STRIPE_PUBLISHABLE_KEY must start with pk_test_ or pk_live_".to_string(),
            ));
        }

        let mut config = Self::new(publishable_key);
        if let Ok(base) = env::var("STRIPE_API_BASE_URL") {
            config.api_base_url = base;
        }
        Ok(config)
    }

    /// Create config with an explicit key (for testing)
    pub fn new(publishable_key: impl Into<String>) -> Self {
        Self {
            publishable_key: publishable_key.into(),
            api_base_url: DEFAULT_API_BASE.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout_secs: 30,
        }
    }

    /// Check if using test keys
    pub fn is_test_mode(&self) -> bool {
        self.publishable_key.starts_with("pk_test_")
    }

    /// Get authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.publishable_key)
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_test_mode() {
        assert!(StripeConfig::new("pk_test_abc").is_test_mode());
        assert!(!StripeConfig::new("pk_live_abc").is_test_mode());
    }

    #[test]
    fn test_auth_header() {
        let config = StripeConfig::new("pk_test_xyz789");
        assert_eq!(config.auth_header(), "Bearer pk_test_xyz789");
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let config = StripeConfig::new("pk_test_x").with_api_base_url("http://127.0.0.1:9000/");
        assert_eq!(config.api_base_url, "http://127.0.0.1:9000");
    }

    #[test]
    fn test_from_env_missing_key() {
        env::remove_var("STRIPE_PUBLISHABLE_KEY");

        let result = StripeConfig::from_env();
        assert!(result.is_err());
    }
}
