//! # Cart and Wishlist Collections
//!
//! Plain in-memory collections with the cart's uniqueness and
//! positive-quantity rules. Persistence and locking live in
//! [`crate::store::CartStore`].

use crate::product::{Product, ProductSnapshot};
use serde::{Deserialize, Serialize};

/// A product and how many units of it the shopper wants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product: ProductSnapshot,
    pub quantity: u32,
}

impl CartItem {
    pub fn new(product: &Product, quantity: u32) -> Self {
        Self {
            product: ProductSnapshot::capture(product),
            quantity,
        }
    }

    pub fn product_id(&self) -> &str {
        &self.product.id
    }

    /// Price times quantity
    pub fn line_total(&self) -> f64 {
        self.product.price * f64::from(self.quantity)
    }
}

/// Ordered cart entries, unique by product id, every quantity ≥ 1
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cart from possibly untrusted entries (e.g. loaded from
    /// storage), dropping zero quantities and merging duplicate ids.
    pub fn from_items(items: Vec<CartItem>) -> Self {
        let mut cart = Self::new();
        for item in items {
            if item.quantity == 0 {
                continue;
            }
            match cart.position(item.product_id()) {
                Some(idx) => {
                    let existing = &mut cart.items[idx];
                    existing.quantity = existing.quantity.saturating_add(item.quantity);
                }
                None => cart.items.push(item),
            }
        }
        cart
    }

    fn position(&self, product_id: &str) -> Option<usize> {
        self.items.iter().position(|i| i.product_id() == product_id)
    }

    /// Add `quantity` units; increments an existing entry instead of
    /// appending. A zero quantity is ignored.
    pub fn add(&mut self, product: &Product, quantity: u32) {
        if quantity == 0 {
            return;
        }
        match self.position(&product.id) {
            Some(idx) => {
                let existing = &mut self.items[idx];
                existing.quantity = existing.quantity.saturating_add(quantity);
            }
            None => self.items.push(CartItem::new(product, quantity)),
        }
    }

    /// Set the quantity of an existing entry. Returns false if the product
    /// is not in the cart. Quantities ≤ 0 remove the entry.
    pub fn set_quantity(&mut self, product_id: &str, quantity: i64) -> bool {
        let Some(idx) = self.position(product_id) else {
            return false;
        };
        if quantity <= 0 {
            self.items.remove(idx);
        } else {
            self.items[idx].quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        }
        true
    }

    /// Remove an entry; returns whether anything was removed
    pub fn remove(&mut self, product_id: &str) -> bool {
        match self.position(product_id) {
            Some(idx) => {
                self.items.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn get(&self, product_id: &str) -> Option<&CartItem> {
        self.items.iter().find(|i| i.product_id() == product_id)
    }

    pub fn contains(&self, product_id: &str) -> bool {
        self.position(product_id).is_some()
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of price × quantity
    pub fn total(&self) -> f64 {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Distinct entries, used for the cart badge
    pub fn unique_count(&self) -> usize {
        self.items.len()
    }

    /// Total units across all entries
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

/// Saved-for-later products, keyed by product id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Wishlist {
    products: Vec<Product>,
}

impl Wishlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from stored entries, keeping the first of any duplicate ids
    pub fn from_products(products: Vec<Product>) -> Self {
        let mut wishlist = Self::new();
        for product in products {
            wishlist.add(product);
        }
        wishlist
    }

    /// Insert; returns false if the product was already present
    pub fn add(&mut self, product: Product) -> bool {
        if self.contains(&product.id) {
            return false;
        }
        self.products.push(product);
        true
    }

    /// Remove and return the product, if present
    pub fn take(&mut self, product_id: &str) -> Option<Product> {
        let idx = self.products.iter().position(|p| p.id == product_id)?;
        Some(self.products.remove(idx))
    }

    pub fn contains(&self, product_id: &str) -> bool {
        self.products.iter().any(|p| p.id == product_id)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
