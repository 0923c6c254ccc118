//! # Stripe Card Payments
//!
//! `PaymentCapability` backed by Stripe's PaymentIntents API, using only
//! the publishable key: the intent itself is created server-side, the client
//! confirms it with the client secret the API handed back.

use crate::card::CardInput;
use crate::config::StripeConfig;
use async_trait::async_trait;
use cart_core::{IntentStatus, PaymentCapability, PaymentIntent, ShopError, ShopResult};
use reqwest::Client;
use serde::Deserialize;
use std::sync::RwLock;
use tracing::{debug, error, info, instrument};

/// Stripe card capability
///
/// Holds the card the shopper entered until the checkout flow submits it.
pub struct StripeCardCapability {
    config: StripeConfig,
    client: Client,
    card: RwLock<Option<CardInput>>,
}

impl std::fmt::Debug for StripeCardCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeCardCapability")
            .field("api_base_url", &self.config.api_base_url)
            .field("test_mode", &self.config.is_test_mode())
            .finish_non_exhaustive()
    }
}

impl StripeCardCapability {
    /// Create a new capability with its own HTTP client
    pub fn new(config: StripeConfig) -> ShopResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ShopError::Configuration(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self::with_client(config, client))
    }

    /// Create a capability sharing an existing HTTP client
    pub fn with_client(config: StripeConfig, client: Client) -> Self {
        Self {
            config,
            client,
            card: RwLock::new(None),
        }
    }

    /// Create from environment variables
    pub fn from_env() -> ShopResult<Self> {
        Self::new(StripeConfig::from_env()?)
    }

    /// Record the card the shopper entered
    pub fn set_card(&self, card: CardInput) {
        *self.card.write().unwrap_or_else(|e| e.into_inner()) = Some(card);
    }

    /// Forget the entered card
    pub fn clear_card(&self) {
        *self.card.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    fn current_card(&self) -> Option<CardInput> {
        self.card.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn intent_url(&self, intent_id: &str) -> String {
        format!("{}/v1/payment_intents/{}", self.config.api_base_url, intent_id)
    }

    /// Turn a Stripe HTTP response into an intent or a payment error
    async fn read_intent(response: reqwest::Response) -> ShopResult<PaymentIntent> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ShopError::Network(e.to_string()))?;

        if !status.is_success() {
            error!("Stripe API error: status={}, body={}", status, body);

            if let Ok(error_response) = serde_json::from_str::<StripeErrorResponse>(&body) {
                let err = error_response.error;
                return Err(ShopError::Payment {
                    message: err
                        .message
                        .unwrap_or_else(|| "Your payment could not be processed.".to_string()),
                    code: err.decline_code.or(err.code),
                });
            }

            return Err(ShopError::payment(format!("HTTP {}: {}", status, body)));
        }

        let intent: StripePaymentIntentResponse = serde_json::from_str(&body).map_err(|e| {
            ShopError::Serialization(format!("Failed to parse Stripe response: {}", e))
        })?;

        Ok(intent.into())
    }
}

/// Intent id embedded in a client secret (`pi_123_secret_abc` → `pi_123`)
pub fn intent_id_from_secret(client_secret: &str) -> ShopResult<&str> {
    match client_secret.find("_secret_") {
        Some(idx) if idx > 0 && client_secret.starts_with("pi_") => Ok(&client_secret[..idx]),
        _ => Err(ShopError::payment("Invalid payment client secret")),
    }
}

#[async_trait]
impl PaymentCapability for StripeCardCapability {
    async fn collect_details(&self) -> ShopResult<()> {
        match self.current_card() {
            None => Err(ShopError::Validation(
                "Please enter your card details.".to_string(),
            )),
            Some(CardInput::PaymentMethod(id)) if id.trim().is_empty() => Err(
                ShopError::Validation("Please enter your card details.".to_string()),
            ),
            Some(CardInput::PaymentMethod(_)) => Ok(()),
            Some(CardInput::Card(card)) => card.validate().map_err(ShopError::Validation),
        }
    }

    #[instrument(skip(self, client_secret, return_url))]
    async fn confirm(&self, client_secret: &str, return_url: &str) -> ShopResult<PaymentIntent> {
        let intent_id = intent_id_from_secret(client_secret)?;
        let card = self
            .current_card()
            .ok_or_else(|| ShopError::Validation("Please enter your card details.".to_string()))?;

        let mut form_params: Vec<(String, String)> = vec![
            ("client_secret".to_string(), client_secret.to_string()),
            ("return_url".to_string(), return_url.to_string()),
        ];
        match card {
            CardInput::PaymentMethod(id) => form_params.push(("payment_method".to_string(), id)),
            CardInput::Card(details) => form_params.extend(details.form_params()),
        }

        debug!("Confirming Stripe payment intent: id={}", intent_id);

        let response = self
            .client
            .post(format!("{}/confirm", self.intent_url(intent_id)))
            .header("Authorization", self.config.auth_header())
            .header("Stripe-Version", &self.config.api_version)
            .form(&form_params)
            .send()
            .await
            .map_err(|e| ShopError::Network(e.to_string()))?;

        let intent = Self::read_intent(response).await?;

        info!(
            "Stripe payment intent confirmed: id={}, status={:?}",
            intent.id, intent.status
        );

        Ok(intent)
    }

    #[instrument(skip(self, client_secret))]
    async fn retrieve(&self, client_secret: &str) -> ShopResult<PaymentIntent> {
        let intent_id = intent_id_from_secret(client_secret)?;

        let response = self
            .client
            .get(self.intent_url(intent_id))
            .header("Authorization", self.config.auth_header())
            .header("Stripe-Version", &self.config.api_version)
            .query(&[("client_secret", client_secret)])
            .send()
            .await
            .map_err(|e| ShopError::Network(e.to_string()))?;

        Self::read_intent(response).await
    }

    fn provider_name(&self) -> &'static str {
        "stripe"
    }
}

// =============================================================================
// Stripe API Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct StripePaymentIntentResponse {
    id: String,
    status: String,
    #[serde(default)]
    amount: i64,
    #[serde(default)]
    currency: String,
    #[serde(default)]
    last_payment_error: Option<StripeError>,
}

impl From<StripePaymentIntentResponse> for PaymentIntent {
    fn from(intent: StripePaymentIntentResponse) -> Self {
        PaymentIntent {
            id: intent.id,
            status: IntentStatus::parse(&intent.status),
            amount: intent.amount,
            currency: intent.currency,
            last_error: intent.last_payment_error.and_then(|e| e.message),
        }
    }
}

#[derive(Debug, Deserialize)]
struct StripeErrorResponse {
    error: StripeError,
}

#[derive(Debug, Deserialize)]
struct StripeError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    decline_code: Option<String>,
}
