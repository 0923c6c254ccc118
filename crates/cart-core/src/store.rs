//! # Cart/Wishlist Store
//!
//! Single owner of cart and wishlist state. Constructed once with a
//! persistence backend and shared by reference (`Arc<CartStore>`) with
//! everything that reads or edits the cart.
//!
//! Every mutation is applied to a draft copy, written to storage, and only
//! then committed in memory. A failed write therefore leaves both memory and
//! storage as they were, which is what makes compound operations such as
//! [`CartStore::move_to_cart`] all-or-nothing.

use crate::cart::{Cart, CartItem, Wishlist};
use crate::error::ShopResult;
use crate::order::{OrderItem, OrderSummary, PricingPolicy};
use crate::product::Product;
use crate::storage::{SharedStore, CART_KEY, WISHLIST_KEY};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
struct CartState {
    cart: Cart,
    wishlist: Wishlist,
    /// Bumped on every committed mutation
    version: u64,
}

/// Which collections a mutation touched
#[derive(Debug, Clone, Copy, Default)]
struct Touched {
    cart: bool,
    wishlist: bool,
}

impl Touched {
    const NONE: Touched = Touched {
        cart: false,
        wishlist: false,
    };
    const CART: Touched = Touched {
        cart: true,
        wishlist: false,
    };
    const WISHLIST: Touched = Touched {
        cart: false,
        wishlist: true,
    };
    const BOTH: Touched = Touched {
        cart: true,
        wishlist: true,
    };

    fn any(&self) -> bool {
        self.cart || self.wishlist
    }
}

/// Persistent cart and wishlist with derived totals
pub struct CartStore {
    storage: SharedStore,
    state: RwLock<CartState>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read();
        f.debug_struct("CartStore")
            .field("items", &state.cart.unique_count())
            .field("wishlist", &state.wishlist.len())
            .field("version", &state.version)
            .finish()
    }
}

/// Read a JSON collection, treating anything unreadable as empty
fn load_or_default<T>(storage: &SharedStore, key: &str) -> T
where
    T: DeserializeOwned + Default,
{
    let raw = match storage.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return T::default(),
        Err(e) => {
            warn!(key, error = %e, "failed to read stored state, starting empty");
            return T::default();
        }
    };
    if raw.trim().is_empty() {
        return T::default();
    }
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            warn!(key, error = %e, "malformed stored state, starting empty");
            T::default()
        }
    }
}

fn encode<T: Serialize>(value: &T) -> ShopResult<String> {
    Ok(serde_json::to_string(value)?)
}

impl CartStore {
    /// Create a store over `storage`, restoring any persisted state.
    /// Missing or malformed content yields empty collections.
    pub fn new(storage: SharedStore) -> Self {
        let state = Self::load_state(&storage);
        debug!(
            items = state.cart.unique_count(),
            wishlist = state.wishlist.len(),
            "cart store loaded"
        );
        Self {
            storage,
            state: RwLock::new(state),
        }
    }

    fn load_state(storage: &SharedStore) -> CartState {
        let items: Vec<CartItem> = load_or_default(storage, CART_KEY);
        let products: Vec<Product> = load_or_default(storage, WISHLIST_KEY);
        CartState {
            cart: Cart::from_items(items),
            wishlist: Wishlist::from_products(products),
            version: 0,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, CartState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, CartState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Apply `f` to a draft, persist what it touched, then commit.
    fn mutate<R>(&self, op: &'static str, f: impl FnOnce(&mut CartState) -> (R, Touched)) -> ShopResult<R> {
        let mut state = self.write();
        let mut draft = state.clone();
        let (result, touched) = f(&mut draft);

        if !touched.any() {
            return Ok(result);
        }

        self.persist(&state, &draft, touched)?;

        draft.version = state.version + 1;
        *state = draft;
        debug!(
            op,
            version = state.version,
            items = state.cart.unique_count(),
            wishlist = state.wishlist.len(),
            "cart state committed"
        );
        Ok(result)
    }

    fn persist(&self, current: &CartState, draft: &CartState, touched: Touched) -> ShopResult<()> {
        if touched.cart {
            self.storage.set(CART_KEY, &encode(&draft.cart)?)?;
        }
        if touched.wishlist {
            let written = encode(&draft.wishlist).and_then(|json| self.storage.set(WISHLIST_KEY, &json));
            if let Err(e) = written {
                if touched.cart {
                    // put the cart back so storage matches memory again
                    if let Err(restore) = encode(&current.cart)
                        .and_then(|json| self.storage.set(CART_KEY, &json))
                    {
                        warn!(error = %restore, "failed to roll back cart after wishlist write error");
                    }
                }
                return Err(e);
            }
        }
        Ok(())
    }

    /// Re-read persisted state, replacing what is in memory
    pub fn reload(&self) {
        let fresh = Self::load_state(&self.storage);
        let mut state = self.write();
        let version = state.version + 1;
        *state = CartState { version, ..fresh };
    }

    /// Empty the in-memory cart without writing, re-reading the wishlist.
    /// For logout, where the stored cart was already removed (or removing
    /// it failed) and the shopper must not keep seeing it either way.
    pub fn discard_cart(&self) {
        let fresh = Self::load_state(&self.storage);
        let mut state = self.write();
        let version = state.version + 1;
        *state = CartState {
            cart: Cart::new(),
            version,
            ..fresh
        };
    }

    // ---------------------------------------------------------------------
    // Cart
    // ---------------------------------------------------------------------

    /// Add `quantity` units of `product`. An existing entry has its quantity
    /// increased; otherwise a snapshot of the product is appended. No stock
    /// bound is applied here; see [`crate::validation`].
    pub fn add_to_cart(&self, product: &Product, quantity: u32) -> ShopResult<()> {
        if quantity == 0 {
            return Ok(());
        }
        self.mutate("add_to_cart", |state| {
            state.cart.add(product, quantity);
            ((), Touched::CART)
        })
    }

    /// Set an entry's quantity; ≤ 0 removes it, an unknown id is a no-op
    pub fn update_quantity(&self, product_id: &str, quantity: i64) -> ShopResult<()> {
        self.mutate("update_quantity", |state| {
            let changed = state.cart.set_quantity(product_id, quantity);
            ((), if changed { Touched::CART } else { Touched::NONE })
        })
    }

    /// Remove an entry if present
    pub fn remove_from_cart(&self, product_id: &str) -> ShopResult<()> {
        self.mutate("remove_from_cart", |state| {
            let removed = state.cart.remove(product_id);
            ((), if removed { Touched::CART } else { Touched::NONE })
        })
    }

    /// Remove several entries at once (e.g. the ones just paid for).
    /// Returns how many were removed.
    pub fn remove_items(&self, product_ids: &[String]) -> ShopResult<usize> {
        self.mutate("remove_items", |state| {
            let removed = product_ids
                .iter()
                .filter(|id| state.cart.remove(id))
                .count();
            (removed, if removed > 0 { Touched::CART } else { Touched::NONE })
        })
    }

    /// Empty the cart and persist the empty state
    pub fn clear_cart(&self) -> ShopResult<()> {
        self.mutate("clear_cart", |state| {
            state.cart.clear();
            ((), Touched::CART)
        })
    }

    /// Snapshot of the cart entries
    pub fn items(&self) -> Vec<CartItem> {
        self.read().cart.items().to_vec()
    }

    pub fn cart(&self) -> Cart {
        self.read().cart.clone()
    }

    pub fn quantity_of(&self, product_id: &str) -> u32 {
        self.read()
            .cart
            .get(product_id)
            .map(|i| i.quantity)
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.read().cart.is_empty()
    }

    /// Sum of price × quantity. Pure; never mutates.
    pub fn cart_total(&self) -> f64 {
        self.read().cart.total()
    }

    /// Number of distinct entries (badge count), not total units
    pub fn unique_product_count(&self) -> usize {
        self.read().cart.unique_count()
    }

    /// Total units across all entries
    pub fn item_count(&self) -> u32 {
        self.read().cart.item_count()
    }

    /// Subtotal, delivery and total under `policy`
    pub fn summary(&self, policy: &PricingPolicy) -> OrderSummary {
        policy.summarize(self.cart_total())
    }

    /// Checkout-time copy of the cart, independent of later edits
    pub fn order_items(&self) -> Vec<OrderItem> {
        self.read()
            .cart
            .items()
            .iter()
            .map(OrderItem::from_cart_item)
            .collect()
    }

    /// Mutation counter; equal versions mean equal state
    pub fn version(&self) -> u64 {
        self.read().version
    }

    // ---------------------------------------------------------------------
    // Wishlist
    // ---------------------------------------------------------------------

    /// Insert; already-present products are left as they are
    pub fn add_to_wishlist(&self, product: &Product) -> ShopResult<()> {
        self.mutate("add_to_wishlist", |state| {
            let added = state.wishlist.add(product.clone());
            ((), if added { Touched::WISHLIST } else { Touched::NONE })
        })
    }

    pub fn remove_from_wishlist(&self, product_id: &str) -> ShopResult<()> {
        self.mutate("remove_from_wishlist", |state| {
            let removed = state.wishlist.take(product_id).is_some();
            ((), if removed { Touched::WISHLIST } else { Touched::NONE })
        })
    }

    pub fn is_in_wishlist(&self, product_id: &str) -> bool {
        self.read().wishlist.contains(product_id)
    }

    pub fn wishlist(&self) -> Vec<Product> {
        self.read().wishlist.products().to_vec()
    }

    /// Move a wishlisted product into the cart (one unit).
    ///
    /// The product must be in the wishlist; otherwise nothing changes and
    /// `false` is returned. Both halves are persisted together or not at all.
    pub fn move_to_cart(&self, product_id: &str) -> ShopResult<bool> {
        self.mutate("move_to_cart", |state| match state.wishlist.take(product_id) {
            Some(product) => {
                state.cart.add(&product, 1);
                (true, Touched::BOTH)
            }
            None => (false, Touched::NONE),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ShopError;
    use crate::storage::{KeyValueStore, MemoryStore};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// Memory store whose writes to one key can be made to fail
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail_key: std::sync::Mutex<Option<&'static str>>,
        failing: AtomicBool,
    }

    impl FlakyStore {
        fn fail_writes_to(&self, key: &'static str) {
            *self.fail_key.lock().unwrap() = Some(key);
            self.failing.store(true, Ordering::SeqCst);
        }
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> ShopResult<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> ShopResult<()> {
            if self.failing.load(Ordering::SeqCst) && *self.fail_key.lock().unwrap() == Some(key) {
                return Err(ShopError::Storage("disk full".into()));
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> ShopResult<()> {
            self.inner.remove(key)
        }
    }

    fn product(id: &str, price: f64) -> Product {
        Product::new(id, format!("Product {}", id), price, 25)
    }

    fn new_store() -> (Arc<MemoryStore>, CartStore) {
        let storage = Arc::new(MemoryStore::new());
        let store = CartStore::new(storage.clone());
        (storage, store)
    }

    fn assert_persisted(storage: &Arc<MemoryStore>, store: &CartStore) {
        let reloaded = CartStore::new(storage.clone());
        assert_eq!(reloaded.cart(), store.cart());
        assert_eq!(reloaded.wishlist(), store.wishlist());
    }

    #[test]
    fn test_persisted_cart_tracks_every_mutation() {
        let (storage, store) = new_store();
        let milk = product("milk", 56.0);
        let paneer = product("paneer", 90.0);

        store.add_to_cart(&milk, 2).unwrap();
        assert_persisted(&storage, &store);
        store.add_to_cart(&paneer, 1).unwrap();
        assert_persisted(&storage, &store);
        store.update_quantity("milk", 7).unwrap();
        assert_persisted(&storage, &store);
        store.remove_from_cart("paneer").unwrap();
        assert_persisted(&storage, &store);
        store.update_quantity("missing", 3).unwrap();
        assert_persisted(&storage, &store);
        store.clear_cart().unwrap();
        assert_persisted(&storage, &store);

        assert_eq!(storage.get(CART_KEY).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_repeat_add_increments_single_entry() {
        let (_, store) = new_store();
        let butter = product("butter", 250.0);

        store.add_to_cart(&butter, 2).unwrap();
        store.add_to_cart(&butter, 3).unwrap();

        assert_eq!(store.unique_product_count(), 1);
        assert_eq!(store.quantity_of("butter"), 5);
    }

    #[test]
    fn test_update_to_zero_equals_remove() {
        let (_, a) = new_store();
        let (_, b) = new_store();
        for store in [&a, &b] {
            store.add_to_cart(&product("x", 10.0), 2).unwrap();
            store.add_to_cart(&product("y", 20.0), 1).unwrap();
        }

        a.update_quantity("x", 0).unwrap();
        b.remove_from_cart("x").unwrap();

        assert_eq!(a.cart(), b.cart());
        assert!(!a.cart().contains("x"));
    }

    #[test]
    fn test_cart_total_is_pure() {
        let (_, store) = new_store();
        store.add_to_cart(&product("a", 100.0), 2).unwrap();
        store.add_to_cart(&product("b", 50.0), 3).unwrap();
        let version = store.version();

        assert_eq!(store.cart_total(), 350.0);
        assert_eq!(store.cart_total(), 350.0);
        assert_eq!(store.version(), version);
        assert_eq!(store.unique_product_count(), 2);
        assert_eq!(store.item_count(), 5);
    }

    #[test]
    fn test_summary_applies_delivery() {
        let (_, store) = new_store();
        store.add_to_cart(&product("a", 100.0), 2).unwrap();

        let summary = store.summary(&PricingPolicy::default());
        assert_eq!(summary.subtotal, 200.0);
        assert_eq!(summary.delivery_fee, 40.0);
        assert_eq!(summary.total, 240.0);
    }

    #[test]
    fn test_move_to_cart() {
        let (storage, store) = new_store();
        let cheese = product("cheese", 300.0);
        store.add_to_wishlist(&cheese).unwrap();

        assert!(store.move_to_cart("cheese").unwrap());

        assert!(!store.is_in_wishlist("cheese"));
        assert_eq!(store.quantity_of("cheese"), 1);
        assert_eq!(store.cart().get("cheese").map(|i| i.product.name.as_str()), Some("Product cheese"));
        assert_persisted(&storage, &store);
    }

    #[test]
    fn test_move_to_cart_requires_wishlist_entry() {
        let (_, store) = new_store();
        let version = store.version();

        assert!(!store.move_to_cart("ghost").unwrap());

        assert!(store.is_empty());
        assert_eq!(store.version(), version);
    }

    #[test]
    fn test_move_to_cart_is_all_or_nothing() {
        let storage = Arc::new(FlakyStore::default());
        let store = CartStore::new(storage.clone());
        store.add_to_wishlist(&product("ghee", 550.0)).unwrap();

        storage.fail_writes_to(WISHLIST_KEY);
        let result = store.move_to_cart("ghee");

        assert!(matches!(result, Err(ShopError::Storage(_))));
        assert!(store.is_in_wishlist("ghee"));
        assert!(store.is_empty());

        // storage was rolled back too
        let reloaded = CartStore::new(storage.clone());
        assert!(reloaded.is_empty());
        assert!(reloaded.is_in_wishlist("ghee"));
    }

    #[test]
    fn test_failed_write_leaves_memory_untouched() {
        let storage = Arc::new(FlakyStore::default());
        let store = CartStore::new(storage.clone());
        store.add_to_cart(&product("milk", 56.0), 1).unwrap();

        storage.fail_writes_to(CART_KEY);
        assert!(store.add_to_cart(&product("milk", 56.0), 4).is_err());

        assert_eq!(store.quantity_of("milk"), 1);
    }

    #[test]
    fn test_malformed_storage_loads_empty() {
        let storage = Arc::new(MemoryStore::new());
        storage.set(CART_KEY, "{not json").unwrap();
        storage.set(WISHLIST_KEY, "42").unwrap();

        let store = CartStore::new(storage.clone());

        assert!(store.is_empty());
        assert!(store.wishlist().is_empty());

        store.add_to_cart(&product("curd", 40.0), 1).unwrap();
        assert_persisted(&storage, &store);
    }

    #[test]
    fn test_wishlist_set_semantics() {
        let (_, store) = new_store();
        let lassi = product("lassi", 30.0);

        store.add_to_wishlist(&lassi).unwrap();
        let version = store.version();
        store.add_to_wishlist(&lassi).unwrap();

        assert_eq!(store.wishlist().len(), 1);
        assert_eq!(store.version(), version);

        store.remove_from_wishlist("lassi").unwrap();
        assert!(!store.is_in_wishlist("lassi"));
    }

    #[test]
    fn test_product_in_cart_and_wishlist() {
        let (_, store) = new_store();
        let milk = product("milk", 56.0);

        store.add_to_cart(&milk, 1).unwrap();
        store.add_to_wishlist(&milk).unwrap();

        assert!(store.is_in_wishlist("milk"));
        assert_eq!(store.quantity_of("milk"), 1);
    }

    #[test]
    fn test_order_items_are_independent_snapshot() {
        let (_, store) = new_store();
        store.add_to_cart(&product("milk", 56.0), 2).unwrap();

        let snapshot = store.order_items();
        store.update_quantity("milk", 9).unwrap();

        assert_eq!(snapshot[0].quantity, 2);
        assert_eq!(store.quantity_of("milk"), 9);
    }

    #[test]
    fn test_remove_items_after_order() {
        let (_, store) = new_store();
        store.add_to_cart(&product("a", 1.0), 1).unwrap();
        store.add_to_cart(&product("b", 1.0), 1).unwrap();
        store.add_to_cart(&product("c", 1.0), 1).unwrap();

        let removed = store
            .remove_items(&["a".to_string(), "c".to_string(), "zzz".to_string()])
            .unwrap();

        assert_eq!(removed, 2);
        assert_eq!(store.items().len(), 1);
        assert!(store.cart().contains("b"));
    }

    #[test]
    fn test_reload_picks_up_external_writes() {
        let (storage, store) = new_store();
        let other = CartStore::new(storage.clone());
        other.add_to_cart(&product("milk", 56.0), 3).unwrap();

        assert!(store.is_empty());
        store.reload();
        assert_eq!(store.quantity_of("milk"), 3);
    }

    #[test]
    fn test_discard_cart_keeps_wishlist() {
        let (storage, store) = new_store();
        store.add_to_cart(&product("milk", 56.0), 2).unwrap();
        store.add_to_wishlist(&product("ghee", 420.0)).unwrap();
        let before = store.version();

        store.discard_cart();

        assert!(store.is_empty());
        assert!(store.is_in_wishlist("ghee"));
        assert!(store.version() > before);
        // nothing written
        assert!(storage.get(CART_KEY).unwrap().is_some());
    }
}
