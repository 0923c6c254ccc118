//! # Cart Validation
//!
//! Reconciles cart entries against product availability and stock before
//! checkout. Validation is a pure function of its inputs: run it as often as
//! you like, it never touches the cart.
//!
//! | Finding | Condition |
//! |---------|-----------|
//! | error   | product unavailable, missing from the live catalog, or quantity above stock |
//! | warning | otherwise fine, but stock below [`LOW_STOCK_THRESHOLD`] |

use crate::cart::CartItem;
use crate::error::{ShopError, ShopResult};
use crate::product::Product;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Stock level below which a warning (not an error) is raised
pub const LOW_STOCK_THRESHOLD: u32 = 5;

/// What a finding is about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum FindingKind {
    /// Availability flag is off
    Unavailable,
    /// Product no longer exists in the live catalog
    Discontinued,
    /// More requested than is in stock
    InsufficientStock { requested: u32, available: u32 },
    /// Few units left
    LowStock { remaining: u32 },
}

/// One itemized validation result, targeted at a cart row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartFinding {
    pub product_id: String,
    pub name: String,
    pub message: String,
    #[serde(flatten)]
    pub kind: FindingKind,
    /// When the cart's copy of the product was taken
    pub snapshot_at: DateTime<Utc>,
    /// Whether live product data was used for the check
    pub live: bool,
}

/// Aggregate result of validating a cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartValidation {
    /// True iff there are no errors; warnings do not invalidate
    pub is_valid: bool,
    pub errors: Vec<CartFinding>,
    pub warnings: Vec<CartFinding>,
}

impl CartValidation {
    /// Gate for checkout: errors become [`ShopError::StaleState`]
    pub fn into_result(self) -> ShopResult<Vec<CartFinding>> {
        if self.is_valid {
            Ok(self.warnings)
        } else {
            Err(ShopError::StaleState {
                errors: self.errors,
            })
        }
    }

    pub fn error_for(&self, product_id: &str) -> Option<&CartFinding> {
        self.errors.iter().find(|f| f.product_id == product_id)
    }

    pub fn warning_for(&self, product_id: &str) -> Option<&CartFinding> {
        self.warnings.iter().find(|f| f.product_id == product_id)
    }
}

/// Availability and stock as seen by one check
struct StockView {
    name: String,
    is_available: bool,
    quantity: u32,
    live: bool,
}

enum Classification {
    Error(FindingKind, String),
    Warning(FindingKind, String),
    Clear,
}

fn classify(item: &CartItem, view: &StockView) -> Classification {
    if !view.is_available {
        return Classification::Error(
            FindingKind::Unavailable,
            format!("{} is currently unavailable", view.name),
        );
    }
    if item.quantity > view.quantity {
        return Classification::Error(
            FindingKind::InsufficientStock {
                requested: item.quantity,
                available: view.quantity,
            },
            format!(
                "Only {} unit(s) of {} in stock, but {} requested",
                view.quantity, view.name, item.quantity
            ),
        );
    }
    if view.quantity < LOW_STOCK_THRESHOLD {
        return Classification::Warning(
            FindingKind::LowStock {
                remaining: view.quantity,
            },
            format!("Only {} unit(s) of {} left", view.quantity, view.name),
        );
    }
    Classification::Clear
}

fn finding(item: &CartItem, kind: FindingKind, message: String, live: bool) -> CartFinding {
    CartFinding {
        product_id: item.product.id.clone(),
        name: item.product.name.clone(),
        message,
        kind,
        snapshot_at: item.product.captured_at,
        live,
    }
}

fn run<F>(items: &[CartItem], mut view_for: F) -> CartValidation
where
    F: FnMut(&CartItem) -> Option<StockView>,
{
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for item in items {
        let Some(view) = view_for(item) else {
            errors.push(finding(
                item,
                FindingKind::Discontinued,
                format!("{} is no longer sold", item.product.name),
                true,
            ));
            continue;
        };
        match classify(item, &view) {
            Classification::Error(kind, message) => {
                errors.push(finding(item, kind, message, view.live))
            }
            Classification::Warning(kind, message) => {
                warnings.push(finding(item, kind, message, view.live))
            }
            Classification::Clear => {}
        }
    }

    CartValidation {
        is_valid: errors.is_empty(),
        errors,
        warnings,
    }
}

/// Validate against the product data captured in the cart itself
pub fn validate_cart(items: &[CartItem]) -> CartValidation {
    run(items, |item| {
        Some(StockView {
            name: item.product.name.clone(),
            is_available: item.product.is_available,
            quantity: item.product.quantity,
            live: false,
        })
    })
}

/// Validate against freshly fetched products; cart entries whose product is
/// absent from `live` are errors
pub fn validate_cart_live(items: &[CartItem], live: &[Product]) -> CartValidation {
    let by_id: HashMap<&str, &Product> = live.iter().map(|p| (p.id.as_str(), p)).collect();
    run(items, |item| {
        by_id.get(item.product.id.as_str()).map(|p| StockView {
            name: p.name.clone(),
            is_available: p.is_available,
            quantity: p.quantity,
            live: true,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, stock: u32, quantity: u32) -> CartItem {
        CartItem::new(&Product::new(id, format!("Item {}", id), 10.0, stock), quantity)
    }

    #[test]
    fn test_quantity_above_stock_is_single_error() {
        let result = validate_cart(&[item("p1", 5, 10)]);

        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 1);
        assert!(result.warnings.is_empty());
        assert_eq!(result.errors[0].product_id, "p1");
        assert_eq!(
            result.errors[0].kind,
            FindingKind::InsufficientStock {
                requested: 10,
                available: 5
            }
        );
    }

    #[test]
    fn test_low_stock_is_warning_only() {
        let result = validate_cart(&[item("p1", 3, 2)]);

        assert!(result.is_valid);
        assert!(result.errors.is_empty());
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].kind, FindingKind::LowStock { remaining: 3 });
    }

    #[test]
    fn test_unavailable_is_error() {
        let product = Product::new("p1", "Lassi", 30.0, 50).with_availability(false);
        let result = validate_cart(&[CartItem::new(&product, 1)]);

        assert_eq!(result.error_for("p1").map(|f| &f.kind), Some(&FindingKind::Unavailable));
    }

    #[test]
    fn test_plenty_of_stock_has_no_findings() {
        let result = validate_cart(&[item("p1", LOW_STOCK_THRESHOLD, 5), item("p2", 40, 1)]);

        assert!(result.is_valid);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_validation_is_idempotent() {
        let items = vec![item("a", 2, 4), item("b", 4, 1), item("c", 100, 1)];
        let first = validate_cart(&items);
        let second = validate_cart(&items);

        assert_eq!(first, second);
        assert_eq!(first.errors.len(), 1);
        assert_eq!(first.warnings.len(), 1);
    }

    #[test]
    fn test_live_data_detects_stale_snapshot() {
        let items = vec![item("p1", 50, 10), item("gone", 50, 1)];
        let live = vec![Product::new("p1", "Item p1", 10.0, 6)];

        let result = validate_cart_live(&items, &live);

        assert_eq!(result.errors.len(), 2);
        let stale = result.error_for("p1").unwrap();
        assert!(stale.live);
        assert_eq!(
            stale.kind,
            FindingKind::InsufficientStock {
                requested: 10,
                available: 6
            }
        );
        assert_eq!(
            result.error_for("gone").map(|f| &f.kind),
            Some(&FindingKind::Discontinued)
        );
    }

    #[test]
    fn test_into_result_gates_checkout() {
        let ok = validate_cart(&[item("p1", 3, 1)]).into_result().unwrap();
        assert_eq!(ok.len(), 1);

        match validate_cart(&[item("p1", 1, 2)]).into_result() {
            Err(ShopError::StaleState { errors }) => assert_eq!(errors[0].product_id, "p1"),
            other => panic!("expected stale state, got {:?}", other),
        }
    }
}
