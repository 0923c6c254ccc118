//! Browser `localStorage` as a [`KeyValueStore`].

use cart_core::{KeyValueStore, ShopError, ShopResult};
use wasm_bindgen::JsValue;

/// `window.localStorage`, looked up on every call so the store itself
/// holds no JS handles
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

fn js_message(value: JsValue) -> String {
    value
        .as_string()
        .unwrap_or_else(|| format!("{:?}", value))
}

fn local_storage() -> ShopResult<web_sys::Storage> {
    let window = web_sys::window()
        .ok_or_else(|| ShopError::Storage("no window object available".to_string()))?;
    window
        .local_storage()
        .map_err(|e| ShopError::Storage(js_message(e)))?
        .ok_or_else(|| ShopError::Storage("localStorage is disabled".to_string()))
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> ShopResult<Option<String>> {
        local_storage()?
            .get_item(key)
            .map_err(|e| ShopError::Storage(js_message(e)))
    }

    fn set(&self, key: &str, value: &str) -> ShopResult<()> {
        // quota errors surface here
        local_storage()?
            .set_item(key, value)
            .map_err(|e| ShopError::Storage(js_message(e)))
    }

    fn remove(&self, key: &str) -> ShopResult<()> {
        local_storage()?
            .remove_item(key)
            .map_err(|e| ShopError::Storage(js_message(e)))
    }
}
