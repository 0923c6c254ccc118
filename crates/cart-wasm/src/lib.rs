//! # cart-wasm
//!
//! WebAssembly bindings for the dairy-cart storefront.
//!
//! This crate provides:
//! - `WasmCart`: the cart and wishlist store persisted in `localStorage`
//! - `validate_cart`: stock checks before checkout, on snapshot or live data
//! - `cart_total` / `format_price` / `order_summary` price helpers
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { WasmCart, format_price } from 'dairy-cart-wasm';
//!
//! await init();
//!
//! const cart = new WasmCart();
//! cart.add(product, 2);
//!
//! const check = cart.validate_live(await fetchLiveProducts(cart.product_ids()));
//! if (!check.isValid) showErrors(check.errors);
//!
//! console.log('Total:', format_price(cart.total()));
//! ```
//!
//! ## Building
//!
//! ```bash
//! wasm-pack build --target web
//! ```

mod storage;

pub use storage::LocalStorage;

use cart_core::{
    validate_cart as validate_snapshot, validate_cart_live, CartItem, CartStore, Currency,
    PricingPolicy, Price, Product, ShopError,
};
use serde::Serialize;
use std::sync::Arc;
use wasm_bindgen::prelude::*;

fn js_error(err: ShopError) -> JsValue {
    js_sys::Error::new(&err.user_message()).into()
}

fn from_js<T: serde::de::DeserializeOwned>(value: JsValue, what: &str) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value)
        .map_err(|e| js_sys::Error::new(&format!("Invalid {}: {}", what, e)).into())
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|e| js_sys::Error::new(&format!("Could not convert result: {}", e)).into())
}

/// Cart and wishlist backed by `localStorage`
#[wasm_bindgen]
pub struct WasmCart {
    store: CartStore,
    pricing: PricingPolicy,
}

#[wasm_bindgen]
impl WasmCart {
    /// Restore the persisted cart and wishlist (empty if none or unreadable)
    #[wasm_bindgen(constructor)]
    pub fn new() -> WasmCart {
        WasmCart {
            store: CartStore::new(Arc::new(LocalStorage)),
            pricing: PricingPolicy::default(),
        }
    }

    /// Override the delivery rules used by `summary`
    pub fn set_pricing(&mut self, free_delivery_threshold: f64, delivery_fee: f64) {
        self.pricing = PricingPolicy {
            free_delivery_threshold,
            delivery_fee,
        };
    }

    pub fn add(&self, product: JsValue, quantity: u32) -> Result<(), JsValue> {
        let product: Product = from_js(product, "product")?;
        self.store.add_to_cart(&product, quantity).map_err(js_error)
    }

    /// Zero or less removes the entry
    pub fn update_quantity(&self, product_id: &str, quantity: i32) -> Result<(), JsValue> {
        self.store
            .update_quantity(product_id, i64::from(quantity))
            .map_err(js_error)
    }

    pub fn remove(&self, product_id: &str) -> Result<(), JsValue> {
        self.store.remove_from_cart(product_id).map_err(js_error)
    }

    pub fn clear(&self) -> Result<(), JsValue> {
        self.store.clear_cart().map_err(js_error)
    }

    /// Re-read `localStorage`, e.g. after another tab changed it
    pub fn reload(&self) {
        self.store.reload();
    }

    pub fn items(&self) -> Result<JsValue, JsValue> {
        to_js(&self.store.items())
    }

    pub fn product_ids(&self) -> Vec<String> {
        self.store
            .items()
            .iter()
            .map(|i| i.product_id().to_string())
            .collect()
    }

    pub fn total(&self) -> f64 {
        self.store.cart_total()
    }

    pub fn unique_count(&self) -> u32 {
        self.store.unique_product_count() as u32
    }

    pub fn item_count(&self) -> u32 {
        self.store.item_count()
    }

    /// Changes whenever the cart or wishlist changes
    pub fn version(&self) -> f64 {
        self.store.version() as f64
    }

    pub fn summary(&self) -> Result<JsValue, JsValue> {
        to_js(&self.store.summary(&self.pricing))
    }

    pub fn add_to_wishlist(&self, product: JsValue) -> Result<(), JsValue> {
        let product: Product = from_js(product, "product")?;
        self.store.add_to_wishlist(&product).map_err(js_error)
    }

    pub fn remove_from_wishlist(&self, product_id: &str) -> Result<(), JsValue> {
        self.store.remove_from_wishlist(product_id).map_err(js_error)
    }

    pub fn is_in_wishlist(&self, product_id: &str) -> bool {
        self.store.is_in_wishlist(product_id)
    }

    /// False if the product was not in the wishlist
    pub fn move_to_cart(&self, product_id: &str) -> Result<bool, JsValue> {
        self.store.move_to_cart(product_id).map_err(js_error)
    }

    pub fn wishlist(&self) -> Result<JsValue, JsValue> {
        to_js(&self.store.wishlist())
    }

    /// Stock check against the snapshots taken when items were added
    pub fn validate(&self) -> Result<JsValue, JsValue> {
        to_js(&validate_snapshot(&self.store.items()))
    }

    /// Stock check against freshly fetched products
    pub fn validate_live(&self, products: JsValue) -> Result<JsValue, JsValue> {
        let live: Vec<Product> = from_js(products, "products")?;
        to_js(&validate_cart_live(&self.store.items(), &live))
    }
}

impl Default for WasmCart {
    fn default() -> Self {
        Self::new()
    }
}

/// Total of a list of cart items
#[wasm_bindgen]
pub fn cart_total(items: JsValue) -> Result<f64, JsValue> {
    let items: Vec<CartItem> = from_js(items, "cart items")?;
    Ok(items.iter().map(CartItem::line_total).sum())
}

/// Validate cart items; pass live products to check current stock instead
/// of the snapshots
#[wasm_bindgen]
pub fn validate_cart(items: JsValue, live: JsValue) -> Result<JsValue, JsValue> {
    let items: Vec<CartItem> = from_js(items, "cart items")?;
    if live.is_undefined() || live.is_null() {
        return to_js(&validate_snapshot(&items));
    }
    let live: Vec<Product> = from_js(live, "products")?;
    to_js(&validate_cart_live(&items, &live))
}

/// Subtotal, delivery and total under the default delivery rules
#[wasm_bindgen]
pub fn order_summary(subtotal: f64) -> Result<JsValue, JsValue> {
    to_js(&PricingPolicy::default().summarize(subtotal))
}

/// Format a rupee amount for display ("₹120.00")
#[wasm_bindgen]
pub fn format_price(amount: f64) -> String {
    Price::new(amount, Currency::INR).display()
}

/// Log to browser console
#[wasm_bindgen]
pub fn log(message: &str) {
    web_sys::console::log_1(&JsValue::from_str(message));
}

/// Get library version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
