//! # Order Types
//!
//! Checkout-time order snapshots, server order records and the pricing
//! policy that turns a cart into an order total.

use crate::cart::CartItem;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A line of an order, copied from the cart at submission time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(alias = "product")]
    pub product_id: String,
    pub name: String,
    pub quantity: u32,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl OrderItem {
    pub fn from_cart_item(item: &CartItem) -> Self {
        Self {
            product_id: item.product.id.clone(),
            name: item.product.name.clone(),
            quantity: item.quantity,
            price: item.product.price,
            image: item.product.primary_image().map(String::from),
        }
    }

    pub fn total(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

/// Postal address saved on a user profile or attached to an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

fn default_country() -> String {
    "India".to_string()
}

impl Default for Address {
    fn default() -> Self {
        Self {
            id: None,
            street: String::new(),
            city: String::new(),
            state: String::new(),
            postal_code: String::new(),
            country: default_country(),
            phone: None,
            is_default: false,
        }
    }
}

impl Address {
    /// Required fields present (the server rejects anything less)
    pub fn is_complete(&self) -> bool {
        [&self.street, &self.city, &self.state, &self.postal_code, &self.country]
            .iter()
            .all(|f| !f.trim().is_empty())
    }
}

/// Delivery charge rules
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingPolicy {
    /// Subtotal at or above which delivery is free
    pub free_delivery_threshold: f64,
    /// Flat fee below the threshold
    pub delivery_fee: f64,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            free_delivery_threshold: 500.0,
            delivery_fee: 40.0,
        }
    }
}

impl PricingPolicy {
    pub fn delivery_for(&self, subtotal: f64) -> f64 {
        if subtotal <= 0.0 || subtotal >= self.free_delivery_threshold {
            0.0
        } else {
            self.delivery_fee
        }
    }

    pub fn summarize(&self, subtotal: f64) -> OrderSummary {
        let delivery_fee = self.delivery_for(subtotal);
        OrderSummary {
            subtotal,
            delivery_fee,
            total: subtotal + delivery_fee,
        }
    }
}

/// Price breakdown shown at checkout
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub subtotal: f64,
    pub delivery_fee: f64,
    pub total: f64,
}

impl OrderSummary {
    pub fn has_free_delivery(&self) -> bool {
        self.delivery_fee == 0.0
    }
}

/// Body of `POST /api/orders`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    #[serde(rename = "orderItems")]
    pub items: Vec<OrderItem>,
    pub shipping_address: Address,
    pub payment_method: String,
    pub items_price: f64,
    #[serde(rename = "shippingPrice")]
    pub delivery_price: f64,
    pub total_price: f64,
}

impl NewOrder {
    /// Snapshot the given cart entries into an order priced by `policy`
    pub fn from_cart(items: &[CartItem], shipping_address: Address, policy: &PricingPolicy) -> Self {
        let items: Vec<OrderItem> = items.iter().map(OrderItem::from_cart_item).collect();
        let subtotal = items.iter().map(OrderItem::total).sum();
        let summary = policy.summarize(subtotal);
        Self {
            items,
            shipping_address,
            payment_method: "card".to_string(),
            items_price: summary.subtotal,
            delivery_price: summary.delivery_fee,
            total_price: summary.total,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn product_ids(&self) -> Vec<String> {
        self.items.iter().map(|i| i.product_id.clone()).collect()
    }
}

/// Order lifecycle as tracked by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Shoppers may cancel until the order leaves the warehouse
    pub fn is_cancellable(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Processing)
    }
}

/// An order as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default, rename = "orderItems", alias = "items")]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub shipping_address: Option<Address>,
    #[serde(default)]
    pub items_price: f64,
    #[serde(default, rename = "shippingPrice")]
    pub delivery_price: f64,
    #[serde(default)]
    pub total_price: f64,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}
