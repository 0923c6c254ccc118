//! # cart-stripe
//!
//! Stripe card payments for the dairy-cart storefront client.
//!
//! The storefront never creates payment intents itself: the shop API does
//! that server-side and hands back a client secret. This crate confirms the
//! intent with the publishable key and the card the shopper entered.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cart_stripe::{CardDetails, CardInput, StripeCardCapability};
//! use cart_core::PaymentCapability;
//!
//! let stripe = StripeCardCapability::from_env()?;
//! stripe.set_card(CardInput::Card(CardDetails::new("4242424242424242", 12, 2030, "123")));
//!
//! stripe.collect_details().await?;
//! let intent = stripe
//!     .confirm(&client_secret, "https://shop.example/order/42/payment-complete")
//!     .await?;
//!
//! if intent.status.is_succeeded() {
//!     // confirm with the shop API
//! }
//! ```

pub mod capability;
pub mod card;
pub mod config;

// Re-exports
pub use capability::{intent_id_from_secret, StripeCardCapability};
pub use card::{CardDetails, CardInput};
pub use config::StripeConfig;
