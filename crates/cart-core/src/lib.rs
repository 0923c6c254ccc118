//! # cart-core
//!
//! Core types and state for the dairy-cart storefront client.
//!
//! This crate provides:
//! - `CartStore` for the persisted cart and wishlist
//! - `KeyValueStore` persistence port with memory and file backends
//! - `validate_cart` / `validate_cart_live` stock checks before checkout
//! - `PaymentCapability` trait for card-payment processors
//! - `Product`, `Order`, `User`, `Review` API types
//! - `ShopError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use cart_core::{CartStore, FileStore, PricingPolicy, validate_cart};
//! use std::sync::Arc;
//!
//! let store = CartStore::new(Arc::new(FileStore::open("~/.dairy-shop")?));
//! store.add_to_cart(&product, 2)?;
//!
//! let summary = store.summary(&PricingPolicy::default());
//! validate_cart(&store.items()).into_result()?;
//! ```

pub mod auth;
pub mod cart;
pub mod error;
pub mod order;
pub mod payment;
pub mod product;
pub mod review;
pub mod storage;
pub mod store;
pub mod validation;

// Re-exports for convenience
pub use auth::{AuthPayload, AuthSession, LoginRequest, ProfileUpdate, RegisterRequest, User, UserRole};
pub use cart::{Cart, CartItem, Wishlist};
pub use error::{ShopError, ShopResult, NETWORK_ERROR_MESSAGE};
pub use order::{Address, NewOrder, Order, OrderItem, OrderStatus, OrderSummary, PricingPolicy};
pub use payment::{
    BoxedPaymentCapability, IntentStatus, PaymentCapability, PaymentIntent, PaymentSession,
    PaymentStatus,
};
pub use product::{
    Currency, ImageUpload, Price, Product, ProductForm, ProductImage, ProductPage, ProductQuery,
    ProductSnapshot,
};
pub use review::{NewReview, Review, Reviewer};
pub use storage::{
    FileStore, KeyValueStore, MemoryStore, SharedStore, CART_KEY, TOKEN_KEY, WISHLIST_KEY,
};
pub use store::CartStore;
pub use validation::{
    validate_cart, validate_cart_live, CartFinding, CartValidation, FindingKind,
    LOW_STOCK_THRESHOLD,
};
