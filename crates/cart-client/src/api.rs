//! # Shop API Endpoints
//!
//! Typed wrappers over [`ApiGateway::request`], one per endpoint.

use crate::checkout::PaymentIntentSource;
use crate::gateway::{path_segment, ApiGateway, RequestOptions};
use async_trait::async_trait;
use cart_core::{
    Address, AuthPayload, LoginRequest, NewOrder, NewReview, Order, OrderStatus, Product,
    ProductForm, ProductPage, ProductQuery, ProfileUpdate, RegisterRequest, Review, ShopError,
    ShopResult, User,
};
use chrono::{DateTime, Utc};
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

/// `data` of `POST /api/orders/:id/pay`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentTicket {
    pub client_secret: String,
    #[serde(default)]
    pub payment_intent_id: Option<String>,
}

/// `data` of `GET /api/orders/:id/payment-status`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPaymentStatus {
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfirmPaymentRequest<'a> {
    payment_intent_id: &'a str,
}

// =============================================================================
// Auth
// =============================================================================

impl ApiGateway {
    /// Create an account; the returned token is captured
    pub async fn register(&self, request: &RegisterRequest) -> ShopResult<AuthPayload> {
        let options = RequestOptions::post().json(request)?.skip_auth();
        let payload: AuthPayload = self.fetch("/api/auth/register", options).await?;
        self.set_token(payload.token.clone())?;
        info!("Registered user {}", payload.user.email);
        Ok(payload)
    }

    /// Sign in; the returned token is captured in the same call
    pub async fn login(&self, request: &LoginRequest) -> ShopResult<AuthPayload> {
        let options = RequestOptions::post().json(request)?.skip_auth();
        let payload: AuthPayload = self.fetch("/api/auth/login", options).await?;
        self.set_token(payload.token.clone())?;
        info!("Logged in as {}", payload.user.email);
        Ok(payload)
    }

    /// Profile for the held token
    pub async fn me(&self) -> ShopResult<User> {
        self.fetch("/api/auth/me", RequestOptions::get()).await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> ShopResult<User> {
        self.fetch("/api/auth/profile", RequestOptions::put().json(update)?)
            .await
    }
}

// =============================================================================
// Products
// =============================================================================

impl ApiGateway {
    pub async fn products(&self, query: &ProductQuery) -> ShopResult<ProductPage> {
        let options = RequestOptions::get().query(query.to_query_pairs());
        self.fetch("/api/products", options).await
    }

    pub async fn product(&self, id: &str) -> ShopResult<Product> {
        self.fetch(&format!("/api/products/{}", path_segment(id)?), RequestOptions::get())
            .await
    }

    pub async fn categories(&self) -> ShopResult<Vec<String>> {
        self.fetch("/api/products/categories", RequestOptions::get())
            .await
    }

    pub async fn brands(&self) -> ShopResult<Vec<String>> {
        self.fetch("/api/products/brands", RequestOptions::get())
            .await
    }

    /// Current server view of each id; ids the server no longer knows are
    /// left out of the result
    pub async fn products_by_id(&self, ids: &[String]) -> ShopResult<Vec<Product>> {
        let mut products = Vec::with_capacity(ids.len());
        for id in ids {
            match self.product(id).await {
                Ok(product) => products.push(product),
                Err(ShopError::Api { status: 404, .. }) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(products)
    }

    /// Admin: create a product with its images
    pub async fn create_product(&self, form: &ProductForm) -> ShopResult<Product> {
        let options = RequestOptions::post().multipart(product_form(form)?);
        self.fetch("/api/products", options).await
    }

    /// Admin: update a product; only set fields are sent
    pub async fn update_product(&self, id: &str, form: &ProductForm) -> ShopResult<Product> {
        let options = RequestOptions::put().multipart(product_form(form)?);
        self.fetch(&format!("/api/products/{}", path_segment(id)?), options).await
    }

    /// Admin
    pub async fn delete_product(&self, id: &str) -> ShopResult<()> {
        self.send(&format!("/api/products/{}", path_segment(id)?), RequestOptions::delete())
            .await
    }
}

fn product_form(form: &ProductForm) -> ShopResult<Form> {
    let mut multipart = Form::new();
    for (name, value) in form.text_fields() {
        multipart = multipart.text(name, value);
    }
    for image in &form.images {
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.mime_type)
            .map_err(|e| {
                ShopError::Validation(format!("Unsupported image type {}: {}", image.mime_type, e))
            })?;
        multipart = multipart.part("images", part);
    }
    Ok(multipart)
}

// =============================================================================
// Orders
// =============================================================================

impl ApiGateway {
    pub async fn create_order(&self, order: &NewOrder) -> ShopResult<Order> {
        self.fetch("/api/orders", RequestOptions::post().json(order)?)
            .await
    }

    pub async fn my_orders(&self) -> ShopResult<Vec<Order>> {
        self.fetch("/api/orders/user/my-orders", RequestOptions::get())
            .await
    }

    pub async fn order(&self, id: &str) -> ShopResult<Order> {
        self.fetch(&format!("/api/orders/{}", path_segment(id)?), RequestOptions::get())
            .await
    }

    pub async fn cancel_order(&self, id: &str) -> ShopResult<Order> {
        self.fetch(&format!("/api/orders/{}/cancel", path_segment(id)?), RequestOptions::put())
            .await
    }

    /// Admin
    pub async fn all_orders(&self) -> ShopResult<Vec<Order>> {
        self.fetch("/api/orders", RequestOptions::get()).await
    }

    /// Admin
    pub async fn update_order_status(&self, id: &str, status: OrderStatus) -> ShopResult<Order> {
        let options = RequestOptions::put().json(&json!({ "status": status }))?;
        self.fetch(&format!("/api/orders/{}/status", path_segment(id)?), options)
            .await
    }
}

// =============================================================================
// Payment
// =============================================================================

impl ApiGateway {
    /// Ask the server to create (or reuse) the payment intent for an order
    pub async fn create_payment_intent(&self, order_id: &str) -> ShopResult<PaymentIntentTicket> {
        self.fetch(&format!("/api/orders/{}/pay", path_segment(order_id)?), RequestOptions::post())
            .await
    }

    pub async fn payment_status(&self, order_id: &str) -> ShopResult<OrderPaymentStatus> {
        self.fetch(
            &format!("/api/orders/{}/payment-status", path_segment(order_id)?),
            RequestOptions::get(),
        )
        .await
    }

    /// Tell the server the processor reported success so it marks the order paid
    pub async fn confirm_payment(&self, order_id: &str, payment_intent_id: &str) -> ShopResult<Order> {
        let options =
            RequestOptions::post().json(&ConfirmPaymentRequest { payment_intent_id })?;
        self.fetch(&format!("/api/orders/{}/confirm-payment", path_segment(order_id)?), options)
            .await
    }
}

#[async_trait]
impl PaymentIntentSource for ApiGateway {
    async fn create_intent(&self, order_id: &str) -> ShopResult<String> {
        let ticket = self.create_payment_intent(order_id).await?;
        if ticket.client_secret.is_empty() {
            return Err(ShopError::payment("Server returned an empty client secret"));
        }
        Ok(ticket.client_secret)
    }
}

// =============================================================================
// Reviews
// =============================================================================

impl ApiGateway {
    /// Checked locally before anything is sent
    pub async fn create_review(&self, review: &NewReview) -> ShopResult<Review> {
        review.validate().map_err(ShopError::Validation)?;
        self.fetch("/api/reviews", RequestOptions::post().json(review)?)
            .await
    }

    pub async fn product_reviews(&self, product_id: &str) -> ShopResult<Vec<Review>> {
        self.fetch(
            &format!("/api/reviews/product/{}", path_segment(product_id)?),
            RequestOptions::get().skip_auth(),
        )
        .await
    }

    /// Admin
    pub async fn all_reviews(&self) -> ShopResult<Vec<Review>> {
        self.fetch("/api/reviews", RequestOptions::get()).await
    }

    /// Admin
    pub async fn set_review_approval(&self, id: &str, approved: bool) -> ShopResult<Review> {
        let options = RequestOptions::put().json(&json!({ "isApproved": approved }))?;
        self.fetch(&format!("/api/reviews/{}/approval", path_segment(id)?), options)
            .await
    }

    pub async fn delete_review(&self, id: &str) -> ShopResult<()> {
        self.send(&format!("/api/reviews/{}", path_segment(id)?), RequestOptions::delete())
            .await
    }

    pub async fn mark_review_helpful(&self, id: &str) -> ShopResult<Review> {
        self.fetch(&format!("/api/reviews/{}/helpful", path_segment(id)?), RequestOptions::put())
            .await
    }
}

// =============================================================================
// Users & Addresses
// =============================================================================

impl ApiGateway {
    /// Admin
    pub async fn users(&self) -> ShopResult<Vec<User>> {
        self.fetch("/api/users", RequestOptions::get()).await
    }

    /// Admin
    pub async fn user(&self, id: &str) -> ShopResult<User> {
        self.fetch(&format!("/api/users/{}", path_segment(id)?), RequestOptions::get())
            .await
    }

    /// Admin
    pub async fn delete_user(&self, id: &str) -> ShopResult<()> {
        self.send(&format!("/api/users/{}", path_segment(id)?), RequestOptions::delete())
            .await
    }

    /// Returns the user's saved addresses after the change
    pub async fn add_address(&self, address: &Address) -> ShopResult<Vec<Address>> {
        self.fetch("/api/users/address", RequestOptions::post().json(address)?)
            .await
    }

    pub async fn update_address(&self, id: &str, address: &Address) -> ShopResult<Vec<Address>> {
        self.fetch(
            &format!("/api/users/address/{}", path_segment(id)?),
            RequestOptions::put().json(address)?,
        )
        .await
    }

    pub async fn delete_address(&self, id: &str) -> ShopResult<Vec<Address>> {
        self.fetch(&format!("/api/users/address/{}", path_segment(id)?), RequestOptions::delete())
            .await
    }
}

// =============================================================================
// Health
// =============================================================================

impl ApiGateway {
    /// Server health message
    pub async fn health(&self) -> ShopResult<String> {
        let response = self
            .request::<serde_json::Value>("/api/health", RequestOptions::get().skip_auth())
            .await?;
        if !response.success {
            return Err(ShopError::api(503, response.message));
        }
        Ok(response.message.unwrap_or_else(|| "ok".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cart_core::{ImageUpload, KeyValueStore, MemoryStore, TOKEN_KEY};
    use reqwest::Client;
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn user_json() -> serde_json::Value {
        json!({"_id": "u1", "name": "Asha", "email": "asha@example.com", "role": "user"})
    }

    fn product_json(id: &str, qty: u32) -> serde_json::Value {
        json!({"_id": id, "name": "Milk", "price": 60.0, "quantity": qty, "isAvailable": true})
    }

    fn gateway(server: &MockServer) -> (ApiGateway, Arc<MemoryStore>) {
        let storage = Arc::new(MemoryStore::new());
        (
            ApiGateway::with_client(server.uri(), Client::new(), storage.clone()),
            storage,
        )
    }

    #[tokio::test]
    async fn test_login_captures_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .and(body_json(json!({"email": "asha@example.com", "password": "pw"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"token": "jwt-1", "user": user_json()}
            })))
            .mount(&server)
            .await;

        let (api, storage) = gateway(&server);
        let payload = api
            .login(&LoginRequest {
                email: "asha@example.com".into(),
                password: "pw".into(),
            })
            .await
            .unwrap();

        assert_eq!(payload.user.id, "u1");
        assert_eq!(api.token().as_deref(), Some("jwt-1"));
        assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some("jwt-1"));
    }

    #[tokio::test]
    async fn test_failed_login_keeps_previous_state() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "success": false,
                "message": "Invalid credentials"
            })))
            .mount(&server)
            .await;

        let (api, _) = gateway(&server);
        let err = api
            .login(&LoginRequest {
                email: "x@example.com".into(),
                password: "bad".into(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), "Invalid credentials");
        assert!(api.token().is_none());
    }

    #[tokio::test]
    async fn test_products_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/products"))
            .and(query_param("category", "cheese"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"products": [product_json("p1", 3)], "total": 11, "page": 2, "pages": 2}
            })))
            .mount(&server)
            .await;

        let (api, _) = gateway(&server);
        let page = api
            .products(&ProductQuery::new().category("cheese").page(2, 10))
            .await
            .unwrap();

        assert_eq!(page.products.len(), 1);
        assert_eq!(page.total, 11);
    }

    #[tokio::test]
    async fn test_products_by_id_skips_missing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/products/p1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": product_json("p1", 4)
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/products/gone"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "success": false,
                "message": "Product not found"
            })))
            .mount(&server)
            .await;

        let (api, _) = gateway(&server);
        let live = api
            .products_by_id(&["p1".to_string(), "gone".to_string()])
            .await
            .unwrap();

        assert_eq!(live.len(), 1);
        assert_eq!(live[0].quantity, 4);
    }

    #[tokio::test]
    async fn test_ids_stay_inside_their_route() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/products/..%2Forders"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "success": false,
                "message": "Product not found"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (api, _) = gateway(&server);
        match api.product("../orders").await {
            Err(ShopError::Api { status: 404, .. }) => {}
            other => panic!("expected 404, got {:?}", other),
        }
        assert!(matches!(
            api.order("..").await,
            Err(ShopError::Validation(_))
        ));
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_product_multipart() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/products"))
            .and(header("authorization", "Bearer admin-jwt"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "success": true,
                "data": product_json("p9", 20)
            })))
            .mount(&server)
            .await;

        let (api, _) = gateway(&server);
        api.set_token("admin-jwt").unwrap();

        let form = ProductForm {
            name: Some("Ghee".into()),
            price: Some(550.0),
            images: vec![ImageUpload {
                file_name: "ghee.png".into(),
                mime_type: "image/png".into(),
                bytes: vec![0x89, 0x50, 0x4e, 0x47],
            }],
            ..Default::default()
        };
        let product = api.create_product(&form).await.unwrap();
        assert_eq!(product.id, "p9");

        let requests = server.received_requests().await.unwrap();
        let body = String::from_utf8_lossy(&requests[0].body).to_string();
        assert!(body.contains("name=\"name\""));
        assert!(body.contains("filename=\"ghee.png\""));
    }

    #[tokio::test]
    async fn test_payment_intent_source() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/orders/o1/pay"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"clientSecret": "pi_1_secret_2"}
            })))
            .mount(&server)
            .await;

        let (api, _) = gateway(&server);
        let secret = api.create_intent("o1").await.unwrap();
        assert_eq!(secret, "pi_1_secret_2");
    }

    #[tokio::test]
    async fn test_confirm_payment_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/orders/o1/confirm-payment"))
            .and(body_json(json!({"paymentIntentId": "pi_1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"_id": "o1", "isPaid": true, "status": "processing"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (api, _) = gateway(&server);
        let order = api.confirm_payment("o1", "pi_1").await.unwrap();
        assert!(order.is_paid);
        assert_eq!(order.status, OrderStatus::Processing);
    }

    #[tokio::test]
    async fn test_invalid_review_not_sent() {
        let server = MockServer::start().await;
        let (api, _) = gateway(&server);

        let err = api
            .create_review(&NewReview {
                product_id: "p1".into(),
                rating: 9,
                comment: "great".into(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ShopError::Validation(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_health() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "message": "Dairy API is running"
            })))
            .mount(&server)
            .await;

        let (api, _) = gateway(&server);
        assert_eq!(api.health().await.unwrap(), "Dairy API is running");
    }
}
