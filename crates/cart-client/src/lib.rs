//! # cart-client
//!
//! Talks to the dairy shop API on behalf of a storefront.
//!
//! This crate provides:
//! - `ApiGateway`: the single request primitive, token lifecycle and typed
//!   endpoint wrappers
//! - `AuthService`: login, logout and session restore
//! - `CheckoutService`: stock re-check, order creation and post-payment cleanup
//! - `CheckoutOrchestrator`: the payment state machine for one attempt
//! - `ClientConfig`: file + environment configuration

pub mod api;
pub mod checkout;
pub mod checkout_service;
pub mod config;
pub mod gateway;
pub mod session;

pub use api::{OrderPaymentStatus, PaymentIntentTicket};
pub use checkout::{
    CheckoutCallbacks, CheckoutOrchestrator, CheckoutState, PaymentIntentSource, SubmitOutcome,
    DEFAULT_SUCCESS_GRACE,
};
pub use checkout_service::CheckoutService;
pub use config::ClientConfig;
pub use gateway::{ApiGateway, ApiResponse, RequestBody, RequestOptions};
pub use session::AuthService;
