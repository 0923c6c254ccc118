//! # Auth Session
//!
//! Who the shopper is. A held token only means "attempted-authenticated";
//! the session is confirmed once a profile fetch with that token succeeds,
//! and any failed profile fetch is treated as an expired session.

use crate::gateway::ApiGateway;
use cart_core::{
    AuthSession, CartStore, LoginRequest, ProfileUpdate, RegisterRequest, ShopResult, User,
};
use std::sync::{Arc, RwLock};
use tracing::{info, instrument, warn};

/// Login, logout and profile state for one client
pub struct AuthService {
    gateway: Arc<ApiGateway>,
    cart: Arc<CartStore>,
    session: RwLock<AuthSession>,
}

impl AuthService {
    pub fn new(gateway: Arc<ApiGateway>, cart: Arc<CartStore>) -> Self {
        let session = AuthSession {
            token: gateway.token(),
            user: None,
        };
        Self {
            gateway,
            cart,
            session: RwLock::new(session),
        }
    }

    /// Snapshot of the current session
    pub fn session(&self) -> AuthSession {
        self.session.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn user(&self) -> Option<User> {
        self.session().user
    }

    pub fn is_admin(&self) -> bool {
        self.session().is_admin()
    }

    fn set_session(&self, token: Option<String>, user: Option<User>) {
        *self.session.write().unwrap_or_else(|e| e.into_inner()) = AuthSession { token, user };
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> ShopResult<User> {
        let payload = self
            .gateway
            .login(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;
        self.set_session(Some(payload.token), Some(payload.user.clone()));
        Ok(payload.user)
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: &RegisterRequest) -> ShopResult<User> {
        let payload = self.gateway.register(request).await?;
        self.set_session(Some(payload.token), Some(payload.user.clone()));
        Ok(payload.user)
    }

    /// Confirm a stored token by fetching the profile.
    ///
    /// Returns `Ok(None)` when there is no token, or when the fetch failed
    /// and the token was dropped.
    #[instrument(skip(self))]
    pub async fn restore(&self) -> ShopResult<Option<User>> {
        let Some(token) = self.gateway.token() else {
            self.set_session(None, None);
            return Ok(None);
        };

        match self.gateway.me().await {
            Ok(user) => {
                info!("Session restored for {}", user.email);
                self.set_session(Some(token), Some(user.clone()));
                Ok(Some(user))
            }
            Err(e) => {
                warn!("Profile fetch failed, treating session as expired: {}", e);
                self.set_session(None, None);
                self.gateway.clear_token()?;
                Ok(None)
            }
        }
    }

    /// Log out locally no matter what the server says; the cart goes too
    #[instrument(skip(self))]
    pub async fn logout(&self) -> ShopResult<()> {
        self.set_session(None, None);
        let cleared = self.gateway.logout().await;
        self.cart.discard_cart();
        cleared
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> ShopResult<User> {
        let user = self.gateway.update_profile(update).await?;
        let token = self.gateway.token();
        self.set_session(token, Some(user.clone()));
        Ok(user)
    }
}
