//! services/client/src/adapters/auth.rs
//!
//! This module contains the adapter for the backend's account endpoints.
//! It implements the `AuthService` port from the `core` crate.

use async_trait::async_trait;
use event_planner_core::domain::{Credentials, NewUser, User};
use event_planner_core::ports::{AuthService, PortResult};
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::adapters::http::ApiClient;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

#[derive(Clone)]
pub struct HttpAuthAdapter {
    api: ApiClient,
}

impl HttpAuthAdapter {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

//=========================================================================================
// Wire Records
//=========================================================================================

#[derive(Deserialize)]
struct UserRecord {
    id: i64,
    username: String,
    email: String,
    #[serde(default)]
    role: Option<String>,
}

impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            username: self.username,
            email: self.email,
            role: self.role,
        }
    }
}

/// Login and registration wrap the profile in a `user` key.
#[derive(Deserialize)]
struct AuthRecord {
    user: UserRecord,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    email: &'a str,
    username: &'a str,
    password: &'a str,
    password_confirm: &'a str,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

//=========================================================================================
// `AuthService` Trait Implementation
//=========================================================================================

#[async_trait]
impl AuthService for HttpAuthAdapter {
    async fn register(&self, new_user: &NewUser) -> PortResult<User> {
        let request = RegisterRequest {
            email: &new_user.email,
            username: &new_user.username,
            password: &new_user.password,
            password_confirm: &new_user.password_confirm,
        };
        let record: AuthRecord = self
            .api
            .send_json(Method::POST, &self.api.auth_url("register/"), &request, "Registration")
            .await?;
        // The backend rotates the anti-forgery token when a session starts.
        self.api.csrf().invalidate().await;
        Ok(record.user.to_domain())
    }

    async fn login(&self, credentials: &Credentials) -> PortResult<User> {
        let request = LoginRequest {
            email: &credentials.email,
            password: &credentials.password,
        };
        let record: AuthRecord = self
            .api
            .send_json(Method::POST, &self.api.auth_url("login/"), &request, "Login")
            .await?;
        self.api.csrf().invalidate().await;
        Ok(record.user.to_domain())
    }

    async fn logout(&self) -> PortResult<()> {
        let result = self
            .api
            .send_discard(Method::POST, &self.api.auth_url("logout/"), None, "Logout")
            .await;
        self.api.csrf().invalidate().await;
        result
    }

    async fn profile(&self) -> PortResult<User> {
        let record: UserRecord = self
            .api
            .get_json(&self.api.auth_url("profile/"), &[], "Fetching the profile")
            .await?;
        Ok(record.to_domain())
    }

    async fn refresh_token(&self) -> PortResult<()> {
        self.api
            .send_discard(
                Method::POST,
                &self.api.auth_url("token/refresh/"),
                None,
                "Refreshing the session",
            )
            .await
    }
}
