//! # Client Configuration
//!
//! Settings for the storefront client: where the shop API lives, where local
//! state is kept and how checkout behaves. Loaded from an optional
//! `config/shop.toml`, then overridden by environment variables.

use cart_core::{PricingPolicy, ShopError, ShopResult};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

const CONFIG_PATHS: [&str; 3] = [
    "config/shop.toml",
    "../config/shop.toml",
    "../../config/shop.toml",
];

/// Client configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Shop API base URL (without the `/api` suffix)
    pub api_url: String,
    /// Directory holding the persisted token, cart and wishlist
    pub storage_dir: PathBuf,
    /// Storefront origin the payment processor redirects back to
    pub return_url: String,
    /// Pause between a succeeded payment and the success callback
    pub success_grace_ms: u64,
    /// HTTP request timeout in seconds
    pub http_timeout_secs: u64,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Delivery charge rules
    pub pricing: PricingPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:5000".to_string(),
            storage_dir: PathBuf::from(".dairy-shop"),
            return_url: "http://localhost:3000".to_string(),
            success_grace_ms: 1500,
            http_timeout_secs: 30,
            environment: "development".to_string(),
            pricing: PricingPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Load `config/shop.toml` if present, then apply env overrides
    pub fn load() -> ShopResult<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();
        for path in CONFIG_PATHS {
            if let Ok(content) = std::fs::read_to_string(path) {
                config = toml::from_str(&content)
                    .map_err(|e| ShopError::Configuration(format!("Failed to parse {}: {}", path, e)))?;
                tracing::info!("Loaded client config from {}", path);
                break;
            }
        }

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a TOML document; missing keys take their defaults
    pub fn from_toml(content: &str) -> ShopResult<Self> {
        toml::from_str(content).map_err(|e| ShopError::Configuration(e.to_string()))
    }

    /// Apply overrides from a variable lookup (the process env in `load`)
    pub fn apply_env<F>(&mut self, lookup: F) -> ShopResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("SHOP_API_URL") {
            self.api_url = url;
        }
        if let Some(dir) = lookup("SHOP_STORAGE_DIR") {
            self.storage_dir = PathBuf::from(dir);
        }
        if let Some(url) = lookup("SHOP_RETURN_URL") {
            self.return_url = url;
        }
        if let Some(ms) = lookup("SHOP_SUCCESS_GRACE_MS") {
            self.success_grace_ms = parse_number("SHOP_SUCCESS_GRACE_MS", &ms)?;
        }
        if let Some(secs) = lookup("SHOP_HTTP_TIMEOUT_SECS") {
            self.http_timeout_secs = parse_number("SHOP_HTTP_TIMEOUT_SECS", &secs)?;
        }
        if let Some(env) = lookup("ENVIRONMENT") {
            self.environment = env;
        }

        self.api_url = self.api_url.trim_end_matches('/').to_string();
        self.return_url = self.return_url.trim_end_matches('/').to_string();
        Ok(())
    }

    /// Full URL for an API path such as `/api/products`
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    pub fn success_grace(&self) -> Duration {
        Duration::from_millis(self.success_grace_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parse_number(key: &str, value: &str) -> ShopResult<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| ShopError::Configuration(format!("{} must be a whole number, got {:?}", key, value)))
}
