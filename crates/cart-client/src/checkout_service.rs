//! # Checkout Service
//!
//! Everything around the payment step: re-checking the cart against live
//! stock, turning it into an order, and tidying up once payment succeeds.

use crate::checkout::{CheckoutCallbacks, CheckoutOrchestrator};
use crate::gateway::ApiGateway;
use cart_core::{
    validate_cart_live, Address, BoxedPaymentCapability, CartItem, CartStore, CartValidation, NewOrder,
    Order, OrderSummary, PaymentIntent, PricingPolicy, ShopError, ShopResult,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

pub struct CheckoutService {
    gateway: Arc<ApiGateway>,
    cart: Arc<CartStore>,
    pricing: PricingPolicy,
}

impl CheckoutService {
    pub fn new(gateway: Arc<ApiGateway>, cart: Arc<CartStore>, pricing: PricingPolicy) -> Self {
        Self {
            gateway,
            cart,
            pricing,
        }
    }

    pub fn summary(&self) -> OrderSummary {
        self.cart.summary(&self.pricing)
    }

    /// Check the cart against the server's current stock
    #[instrument(skip(self))]
    pub async fn validate(&self) -> ShopResult<CartValidation> {
        self.validate_items(&self.cart.items()).await
    }

    async fn validate_items(&self, items: &[CartItem]) -> ShopResult<CartValidation> {
        let ids: Vec<String> = items.iter().map(|i| i.product_id().to_string()).collect();
        let live = self.gateway.products_by_id(&ids).await?;
        Ok(validate_cart_live(items, &live))
    }

    /// Create an order from the current cart.
    ///
    /// Fails with `StaleState` and sends nothing if any entry can no longer
    /// be bought as captured.
    #[instrument(skip(self, shipping_address))]
    pub async fn place_order(&self, shipping_address: Address) -> ShopResult<Order> {
        if self.cart.is_empty() {
            return Err(ShopError::Validation("Your cart is empty".to_string()));
        }
        if !shipping_address.is_complete() {
            return Err(ShopError::Validation(
                "Please complete your shipping address".to_string(),
            ));
        }

        // validate and order the same snapshot
        let items = self.cart.items();
        let warnings = self.validate_items(&items).await?.into_result()?;
        for warning in &warnings {
            warn!(product = %warning.product_id, "{}", warning.message);
        }

        let order = NewOrder::from_cart(&items, shipping_address, &self.pricing);
        let created = self.gateway.create_order(&order).await?;
        info!(
            "Order {} created: {} item(s), total {:.2}",
            created.id,
            order.items.len(),
            order.total_price
        );
        Ok(created)
    }

    /// Orchestrator for paying `order`, with intents from the shop API
    pub fn orchestrator(
        &self,
        capability: BoxedPaymentCapability,
        callbacks: Arc<dyn CheckoutCallbacks>,
        return_base: &str,
        success_grace: Duration,
    ) -> CheckoutOrchestrator {
        CheckoutOrchestrator::new(self.gateway.clone(), capability, callbacks, return_base)
            .with_success_grace(success_grace)
    }

    /// After a succeeded intent: drop the ordered entries from the cart and
    /// have the server mark the order paid.
    ///
    /// Entries added to the cart after the order was placed are kept.
    #[instrument(skip(self, order, intent), fields(order_id = %order.id))]
    pub async fn complete_payment(&self, order: &Order, intent: &PaymentIntent) -> ShopResult<Order> {
        if !intent.status.is_succeeded() {
            return Err(ShopError::InvalidState(format!(
                "payment {} has not succeeded",
                intent.id
            )));
        }

        let ordered: Vec<String> = order.items.iter().map(|i| i.product_id.clone()).collect();
        let removed = self.cart.remove_items(&ordered)?;
        info!("Removed {} ordered item(s) from the cart", removed);

        self.gateway.confirm_payment(&order.id, &intent.id).await
    }
}
