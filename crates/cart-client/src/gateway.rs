//! # API Gateway
//!
//! One request primitive for every call to the shop API. It builds the URL
//! against the configured base, attaches the bearer token unless told not
//! to, encodes the body and turns the `{success, message?, data?}` envelope
//! into either a value or a `ShopError`.
//!
//! No retries happen here: one attempt per call, failures go to the caller.

use crate::config::ClientConfig;
use cart_core::{ShopError, ShopResult, SharedStore, CART_KEY, TOKEN_KEY};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::Form;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use tracing::{debug, error, instrument, warn};

/// Request body
#[derive(Debug, Default)]
pub enum RequestBody {
    #[default]
    None,
    /// Serialized as JSON with `Content-Type: application/json`
    Json(serde_json::Value),
    /// Sent as-is; the transport sets the multipart boundary itself
    Multipart(Form),
}

/// Per-call options for [`ApiGateway::request`]
#[derive(Debug)]
pub struct RequestOptions {
    pub method: Method,
    pub body: RequestBody,
    /// Header overrides, applied last
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    /// Do not attach the bearer token even if one is held
    pub skip_auth: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::get()
    }
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            body: RequestBody::None,
            headers: Vec::new(),
            query: Vec::new(),
            skip_auth: false,
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    pub fn put() -> Self {
        Self::new(Method::PUT)
    }

    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    /// Builder: JSON body
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> ShopResult<Self> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Builder: multipart form body
    pub fn multipart(mut self, form: Form) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }

    /// Builder: add a header override
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Builder: add query parameters
    pub fn query(mut self, pairs: Vec<(String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    /// Builder: send without the bearer token
    pub fn skip_auth(mut self) -> Self {
        self.skip_auth = true;
        self
    }
}

/// Response envelope used by every shop API endpoint
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// The `data` field, or an error if the server sent none
    pub fn into_data(self) -> ShopResult<T> {
        match self.data {
            Some(data) => Ok(data),
            None => Err(ShopError::Internal(
                self.message
                    .unwrap_or_else(|| "response carried no data".to_string()),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Client for the shop API
pub struct ApiGateway {
    base_url: String,
    client: Client,
    storage: SharedStore,
    token: RwLock<Option<String>>,
}

impl std::fmt::Debug for ApiGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiGateway")
            .field("base_url", &self.base_url)
            .field("has_token", &self.token().is_some())
            .finish_non_exhaustive()
    }
}

impl ApiGateway {
    /// Create a gateway from configuration
    pub fn new(config: &ClientConfig, storage: SharedStore) -> ShopResult<Self> {
        let client = Client::builder()
            .timeout(config.http_timeout())
            .build()
            .map_err(|e| ShopError::Configuration(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self::with_client(&config.api_url, client, storage))
    }

    /// Create a gateway with an explicit base URL and HTTP client.
    ///
    /// Any token already persisted under `token` is picked up.
    pub fn with_client(base_url: impl Into<String>, client: Client, storage: SharedStore) -> Self {
        let token = match storage.get(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!("Could not read stored token: {}", e);
                None
            }
        };

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            storage,
            token: RwLock::new(token),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Current bearer token, if any
    pub fn token(&self) -> Option<String> {
        self.token.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Persist and hold a new token
    pub fn set_token(&self, token: impl Into<String>) -> ShopResult<()> {
        let token = token.into();
        self.storage.set(TOKEN_KEY, &token)?;
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = Some(token);
        Ok(())
    }

    /// Drop the token from memory and storage
    pub fn clear_token(&self) -> ShopResult<()> {
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = None;
        self.storage.remove(TOKEN_KEY)
    }

    /// Perform one API call and decode the envelope.
    ///
    /// Non-2xx statuses become `ShopError::Api` carrying the server's
    /// `message`; transport failures become `ShopError::Network`.
    #[instrument(skip(self, options), fields(method = %options.method))]
    pub async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> ShopResult<ApiResponse<T>> {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.client.request(options.method, &url);

        if !options.query.is_empty() {
            builder = builder.query(&options.query);
        }

        if !options.skip_auth {
            if let Some(token) = self.token() {
                builder = builder.bearer_auth(token);
            }
        }

        builder = match options.body {
            RequestBody::None => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(form) => builder.multipart(form),
        };

        if !options.headers.is_empty() {
            builder = builder.headers(header_map(&options.headers)?);
        }

        let response = builder.send().await.map_err(|e| {
            error!("Request to {} failed: {}", url, e);
            ShopError::Network(e.to_string())
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ShopError::Network(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.message);
            warn!("API error: status={}, message={:?}", status, message);
            return Err(ShopError::api(status.as_u16(), message));
        }

        debug!("API response: status={}", status);

        if body.trim().is_empty() {
            return Ok(ApiResponse {
                success: true,
                message: None,
                data: None,
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| ShopError::Serialization(format!("Failed to parse API response: {}", e)))
    }

    /// `request` returning just the `data` field
    pub async fn fetch<T: DeserializeOwned>(&self, path: &str, options: RequestOptions) -> ShopResult<T> {
        self.request::<T>(path, options).await?.into_data()
    }

    /// `request` for calls whose response data is not needed
    pub async fn send(&self, path: &str, options: RequestOptions) -> ShopResult<()> {
        self.request::<serde_json::Value>(path, options).await.map(|_| ())
    }

    /// End the session.
    ///
    /// The server is told best-effort; its failures are logged and swallowed.
    /// The token and the persisted cart are always cleared locally.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> ShopResult<()> {
        if let Err(e) = self.send("/api/auth/logout", RequestOptions::post()).await {
            warn!("Logout request failed, clearing local session anyway: {}", e);
        }

        let token_cleared = self.clear_token();
        let cart_cleared = self.storage.remove(CART_KEY);
        token_cleared.and(cart_cleared)
    }
}

fn header_map(headers: &[(String, String)]) -> ShopResult<HeaderMap> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ShopError::Internal(format!("invalid header name {}: {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| ShopError::Internal(format!("invalid header value: {}", e)))?;
        map.insert(name, value);
    }
    Ok(map)
}

/// Percent-encode one path segment so an id can never change the route.
///
/// Everything outside the unreserved set is escaped. Empty and dot-only
/// values are refused because URL parsing resolves them as `.`/`..` even
/// when escaped.
pub(crate) fn path_segment(raw: &str) -> ShopResult<String> {
    if raw.is_empty() || raw.chars().all(|c| c == '.') {
        return Err(ShopError::Validation(format!("invalid identifier {:?}", raw)));
    }
    let mut encoded = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                encoded.push(char::from(byte))
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    Ok(encoded)
}
