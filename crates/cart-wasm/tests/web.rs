//! Browser tests: `wasm-pack test --headless --firefox crates/cart-wasm`

#![cfg(target_arch = "wasm32")]

use cart_core::{CartStore, KeyValueStore, Product, CART_KEY};
use cart_wasm::LocalStorage;
use std::sync::Arc;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn local_storage_round_trip() {
    let store = LocalStorage;
    store.set("dairy-test-key", "value").unwrap();
    assert_eq!(store.get("dairy-test-key").unwrap().as_deref(), Some("value"));

    store.remove("dairy-test-key").unwrap();
    assert!(store.get("dairy-test-key").unwrap().is_none());
}

#[wasm_bindgen_test]
fn cart_survives_reload() {
    LocalStorage.remove(CART_KEY).unwrap();

    let store = CartStore::new(Arc::new(LocalStorage));
    store
        .add_to_cart(&Product::new("p1", "Paneer", 90.0, 12), 2)
        .unwrap();

    let reopened = CartStore::new(Arc::new(LocalStorage));
    assert_eq!(reopened.quantity_of("p1"), 2);
    assert_eq!(reopened.cart_total(), 180.0);

    reopened.clear_cart().unwrap();
}
