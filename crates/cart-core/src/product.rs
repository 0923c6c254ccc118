//! # Product Types
//!
//! Catalog types as served by the storefront API, plus the
//! `ProductSnapshot` the cart keeps of a product at add time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Supported currencies (ISO 4217)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    #[default]
    INR,
    USD,
    EUR,
    GBP,
}

impl Currency {
    /// Returns the ISO 4217 currency code
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::INR => "inr",
            Currency::USD => "usd",
            Currency::EUR => "eur",
            Currency::GBP => "gbp",
        }
    }

    /// Display symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::INR => "₹",
            Currency::USD => "$",
            Currency::EUR => "€",
            Currency::GBP => "£",
        }
    }

    /// Convert a decimal amount to the smallest currency unit (paise, cents)
    pub fn to_smallest_unit(&self, amount: f64) -> i64 {
        (amount * 100.0).round() as i64
    }

    /// Convert from smallest unit back to decimal
    pub fn from_smallest_unit(&self, amount: i64) -> f64 {
        amount as f64 / 100.0
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}

/// Price with amount in smallest currency unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in smallest currency unit
    pub amount: i64,
    /// Currency
    pub currency: Currency,
}

impl Price {
    /// Create a new price from decimal amount
    pub fn new(amount: f64, currency: Currency) -> Self {
        Self {
            amount: currency.to_smallest_unit(amount),
            currency,
        }
    }

    /// Get the decimal amount
    pub fn as_decimal(&self) -> f64 {
        self.currency.from_smallest_unit(self.amount)
    }

    /// Format for display (e.g., "₹120.00")
    pub fn display(&self) -> String {
        format!("{}{:.2}", self.currency.symbol(), self.as_decimal())
    }
}

/// Product image as returned by the API.
///
/// Older records store bare URLs, newer ones an object with the URL and the
/// upload id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductImage {
    Url(String),
    Stored {
        url: String,
        #[serde(default, rename = "public_id", skip_serializing_if = "Option::is_none")]
        public_id: Option<String>,
    },
}

impl ProductImage {
    pub fn url(&self) -> &str {
        match self {
            ProductImage::Url(url) => url,
            ProductImage::Stored { url, .. } => url,
        }
    }
}

/// A product in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Server-assigned id
    #[serde(rename = "_id", alias = "id")]
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Unit price in major currency units
    pub price: f64,

    #[serde(default)]
    pub images: Vec<ProductImage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Sales unit (e.g., "500 ml", "1 kg")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    /// Units currently in stock
    #[serde(default)]
    pub quantity: u32,

    #[serde(default = "default_true")]
    pub is_available: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shelf_life: Option<String>,

    #[serde(default)]
    pub rating: f64,

    #[serde(default)]
    pub num_reviews: u32,
}

fn default_true() -> bool {
    true
}

impl Product {
    /// Create an available product with the given stock
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: f64, quantity: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            price,
            images: Vec::new(),
            brand: None,
            category: None,
            unit: None,
            quantity,
            is_available: true,
            shelf_life: None,
            rating: 0.0,
            num_reviews: 0,
        }
    }

    /// Builder: set brand
    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    /// Builder: set category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Builder: set unit
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Builder: add image URL
    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.images.push(ProductImage::Url(url.into()));
        self
    }

    /// Builder: set availability flag
    pub fn with_availability(mut self, available: bool) -> Self {
        self.is_available = available;
        self
    }

    /// First image URL, if any
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(ProductImage::url)
    }

    /// Purchasable right now (flag set and stock left)
    pub fn in_stock(&self) -> bool {
        self.is_available && self.quantity > 0
    }
}

/// Display fields of a product captured when it entered the cart.
///
/// Not a live reference: `captured_at` records when the copy was taken so
/// that stock checks against it can be audited as possibly stale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default = "default_true")]
    pub is_available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shelf_life: Option<String>,
    #[serde(default = "Utc::now")]
    pub captured_at: DateTime<Utc>,
}

impl ProductSnapshot {
    /// Copy the display fields of `product` as of now
    pub fn capture(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            images: product.images.clone(),
            brand: product.brand.clone(),
            unit: product.unit.clone(),
            quantity: product.quantity,
            is_available: product.is_available,
            shelf_life: product.shelf_life.clone(),
            captured_at: Utc::now(),
        }
    }

    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(ProductImage::url)
    }
}

/// Filters for `GET /api/products`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// Server sort key (e.g., "price", "-createdAt")
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ProductQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn price_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    pub fn page(mut self, page: u32, limit: u32) -> Self {
        self.page = Some(page);
        self.limit = Some(limit);
        self
    }

    /// Query-string pairs in the API's parameter names
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(ref search) = self.search {
            pairs.push(("search".to_string(), search.clone()));
        }
        if let Some(ref category) = self.category {
            pairs.push(("category".to_string(), category.clone()));
        }
        if let Some(ref brand) = self.brand {
            pairs.push(("brand".to_string(), brand.clone()));
        }
        if let Some(min) = self.min_price {
            pairs.push(("minPrice".to_string(), min.to_string()));
        }
        if let Some(max) = self.max_price {
            pairs.push(("maxPrice".to_string(), max.to_string()));
        }
        if let Some(ref sort) = self.sort {
            pairs.push(("sort".to_string(), sort.clone()));
        }
        if let Some(page) = self.page {
            pairs.push(("page".to_string(), page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        pairs
    }
}

/// One page of products
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub total: u32,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default = "first_page")]
    pub pages: u32,
}

fn first_page() -> u32 {
    1
}

/// Image file attached to an admin product form
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Admin create/update payload; sent as a multipart form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductForm {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub quantity: Option<u32>,
    pub is_available: Option<bool>,
    pub shelf_life: Option<String>,
    pub images: Vec<ImageUpload>,
}

impl ProductForm {
    /// Text fields in the API's form-field names; unset fields are omitted
    pub fn text_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::new();
        if let Some(ref v) = self.name {
            fields.push(("name", v.clone()));
        }
        if let Some(ref v) = self.description {
            fields.push(("description", v.clone()));
        }
        if let Some(v) = self.price {
            fields.push(("price", v.to_string()));
        }
        if let Some(ref v) = self.brand {
            fields.push(("brand", v.clone()));
        }
        if let Some(ref v) = self.category {
            fields.push(("category", v.clone()));
        }
        if let Some(ref v) = self.unit {
            fields.push(("unit", v.clone()));
        }
        if let Some(v) = self.quantity {
            fields.push(("quantity", v.to_string()));
        }
        if let Some(v) = self.is_available {
            fields.push(("isAvailable", v.to_string()));
        }
        if let Some(ref v) = self.shelf_life {
            fields.push(("shelfLife", v.clone()));
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_price_display() {
        assert_eq!(Price::new(120.0, Currency::INR).display(), "₹120.00");
        assert_eq!(Price::new(19.99, Currency::EUR).display(), "€19.99");
        assert_eq!(Currency::INR.to_smallest_unit(10.99), 1099);
    }

    #[test]
    fn test_product_from_api_json() {
        let product: Product = serde_json::from_value(json!({
            "_id": "64f1",
            "name": "Toned Milk",
            "price": 56,
            "images": ["https://cdn/milk.jpg", {"url": "https://cdn/milk2.jpg", "public_id": "m2"}],
            "brand": "Amul",
            "unit": "1 L",
            "quantity": 12,
            "isAvailable": true,
            "shelfLife": "2 days",
            "numReviews": 4
        }))
        .unwrap();

        assert_eq!(product.id, "64f1");
        assert_eq!(product.price, 56.0);
        assert_eq!(product.primary_image(), Some("https://cdn/milk.jpg"));
        assert_eq!(product.images[1].url(), "https://cdn/milk2.jpg");
        assert_eq!(product.shelf_life.as_deref(), Some("2 days"));
        assert_eq!(product.num_reviews, 4);
        assert!(product.in_stock());
    }

    #[test]
    fn test_product_defaults_when_fields_missing() {
        let product: Product =
            serde_json::from_value(json!({"id": "p1", "name": "Paneer", "price": 90.5})).unwrap();

        assert_eq!(product.id, "p1");
        assert!(product.is_available);
        assert_eq!(product.quantity, 0);
        assert!(!product.in_stock());
    }

    #[test]
    fn test_snapshot_captures_display_fields() {
        let product = Product::new("p1", "Curd", 40.0, 8)
            .with_brand("Mother Dairy")
            .with_unit("400 g")
            .with_image("https://cdn/curd.jpg");
        let snapshot = ProductSnapshot::capture(&product);

        assert_eq!(snapshot.id, "p1");
        assert_eq!(snapshot.brand.as_deref(), Some("Mother Dairy"));
        assert_eq!(snapshot.quantity, 8);
        assert_eq!(snapshot.primary_image(), Some("https://cdn/curd.jpg"));
    }

    #[test]
    fn test_query_pairs() {
        let query = ProductQuery::new()
            .category("cheese")
            .price_range(Some(100.0), None)
            .page(2, 12);

        assert_eq!(
            query.to_query_pairs(),
            vec![
                ("category".to_string(), "cheese".to_string()),
                ("minPrice".to_string(), "100".to_string()),
                ("page".to_string(), "2".to_string()),
                ("limit".to_string(), "12".to_string()),
            ]
        );
    }

    #[test]
    fn test_product_form_fields() {
        let form = ProductForm {
            name: Some("Ghee".into()),
            price: Some(550.0),
            is_available: Some(false),
            ..Default::default()
        };

        assert_eq!(
            form.text_fields(),
            vec![
                ("name", "Ghee".to_string()),
                ("price", "550".to_string()),
                ("isAvailable", "false".to_string()),
            ]
        );
    }
}
