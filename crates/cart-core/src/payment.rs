//! # Payment Capability
//!
//! The card-payment processor seen from the checkout flow: something that
//! can pre-validate the card form and confirm a payment intent given its
//! client secret. Everything processor-specific stays behind this trait.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 PaymentCapability (trait)                   │
//! │  ├── collect_details()                                      │
//! │  ├── confirm(client_secret, return_url)                     │
//! │  └── retrieve(client_secret)                                │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!              ┌─────────────┴─────────────┐
//!              │                           │
//!  ┌───────────┴──────────┐     ┌──────────┴──────────┐
//!  │ StripeCardCapability │     │   other processors  │
//!  └──────────────────────┘     └─────────────────────┘
//! ```

use crate::error::ShopResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Processor-reported state of a payment intent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    Succeeded,
    Processing,
    RequiresAction,
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresCapture,
    Canceled,
    #[serde(untagged)]
    Other(String),
}

impl IntentStatus {
    /// Parse the processor's status string
    pub fn parse(status: &str) -> Self {
        match status {
            "succeeded" => IntentStatus::Succeeded,
            "processing" => IntentStatus::Processing,
            "requires_action" => IntentStatus::RequiresAction,
            "requires_payment_method" => IntentStatus::RequiresPaymentMethod,
            "requires_confirmation" => IntentStatus::RequiresConfirmation,
            "requires_capture" => IntentStatus::RequiresCapture,
            "canceled" => IntentStatus::Canceled,
            other => IntentStatus::Other(other.to_string()),
        }
    }

    pub fn is_succeeded(&self) -> bool {
        matches!(self, IntentStatus::Succeeded)
    }

    /// Not finished yet: the shopper or the bank still has to act
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            IntentStatus::Processing | IntentStatus::RequiresAction | IntentStatus::RequiresCapture
        )
    }
}

/// A payment intent as reported by the processor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub status: IntentStatus,
    /// Amount in smallest currency unit
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub currency: String,
    /// Processor message explaining the last failed attempt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Client-side view of a checkout attempt's payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Uninitialized,
    Pending,
    Processing,
    Succeeded,
    Failed,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Succeeded | PaymentStatus::Failed)
    }
}

/// One checkout attempt. Lives only in memory; after a reload the order's
/// payment status is fetched again from the API instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentSession {
    pub attempt_id: Uuid,
    pub order_id: Option<String>,
    #[serde(skip_serializing)]
    pub client_secret: Option<String>,
    pub status: PaymentStatus,
}

impl PaymentSession {
    pub fn new() -> Self {
        Self {
            attempt_id: Uuid::new_v4(),
            order_id: None,
            client_secret: None,
            status: PaymentStatus::Uninitialized,
        }
    }
}

impl Default for PaymentSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Narrow interface to a card-payment processor.
///
/// `confirm` reports processor declines as `Err(ShopError::Payment)` and
/// returns the intent otherwise; callers must still inspect
/// [`PaymentIntent::status`], since "no error" is not the same as success.
#[async_trait]
pub trait PaymentCapability: Send + Sync {
    /// Pre-submit validation of the card form. Fails with
    /// `ShopError::Validation` without any network call.
    async fn collect_details(&self) -> ShopResult<()>;

    /// Confirm the intent identified by `client_secret`.
    ///
    /// `return_url` is where the processor sends the shopper after any
    /// out-of-band authentication.
    async fn confirm(&self, client_secret: &str, return_url: &str) -> ShopResult<PaymentIntent>;

    /// Fetch the current state of the intent
    async fn retrieve(&self, client_secret: &str) -> ShopResult<PaymentIntent>;

    /// Processor name (for logging)
    fn provider_name(&self) -> &'static str;
}

/// Type alias for a shared payment capability (dynamic dispatch)
pub type BoxedPaymentCapability = Arc<dyn PaymentCapability>;
