//! services/client/src/adapters/http.rs
//!
//! The HTTP client shared by all backend adapters.
//!
//! Every request goes through `dispatch`, which attaches the anti-forgery
//! token to state-changing methods, keeps the backend's cookies in a jar, and
//! turns non-success responses into `PortError`s with a readable message.
//! A 401 keeps the body's message: login answers it for bad credentials.

use std::sync::Arc;
use std::time::Duration;

use event_planner_core::ports::{PortError, PortResult};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::adapters::csrf::CsrfToken;
use crate::config::Endpoints;

pub const CSRF_HEADER: &str = "X-CSRFToken";

//=========================================================================================
// The Shared Client
//=========================================================================================

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    endpoints: Arc<Endpoints>,
    csrf: Arc<CsrfToken>,
}

#[derive(Deserialize)]
struct CsrfRecord {
    #[serde(rename = "csrfToken")]
    csrf_token: String,
}

impl ApiClient {
    /// Builds a client with its own cookie jar.
    pub fn new(endpoints: Endpoints, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            endpoints: Arc::new(endpoints),
            csrf: Arc::new(CsrfToken::new()),
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn csrf(&self) -> &CsrfToken {
        &self.csrf
    }

    pub fn auth_url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoints.auth, path)
    }

    pub fn events_url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoints.events, path)
    }

    pub fn location_url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoints.location, path)
    }

    /// Returns the cached anti-forgery token, fetching it on first use.
    async fn csrf_token(&self) -> PortResult<String> {
        if let Some(token) = self.csrf.get().await {
            return Ok(token);
        }

        let url = self.auth_url("csrf/");
        let response = self.http.get(&url).send().await.map_err(|e| {
            error!("Failed to fetch CSRF token: {}", e);
            PortError::Network(e.to_string())
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(PortError::Api {
                status: status.as_u16(),
                message: format!("Fetching the CSRF token failed with status {}", status.as_u16()),
            });
        }
        let record: CsrfRecord = response.json().await.map_err(invalid_body)?;
        debug!("Fetched a new CSRF token.");
        self.csrf.set(record.csrf_token.clone()).await;
        Ok(record.csrf_token)
    }

    async fn dispatch<F>(
        &self,
        method: Method,
        url: &str,
        action: &str,
        build: F,
    ) -> PortResult<Response>
    where
        F: FnOnce(RequestBuilder) -> RequestBuilder,
    {
        let mut request = self.http.request(method.clone(), url);
        if is_state_changing(&method) {
            let token = self.csrf_token().await?;
            request = request.header(CSRF_HEADER, token);
        }

        debug!(%method, url, "Sending request.");
        let response = build(request).send().await.map_err(|e| {
            error!("{} request to {} failed: {}", method, url, e);
            PortError::Network(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::UNAUTHORIZED {
            warn!(url, "Backend answered 401, dropping the cached CSRF token.");
            self.csrf.invalidate().await;
            return Err(PortError::Unauthorized(error_message(&body)));
        }
        let message = error_message(&body)
            .unwrap_or_else(|| format!("{} failed with status {}", action, status.as_u16()));
        error!(status = status.as_u16(), url, "{}", message);
        Err(PortError::Api {
            status: status.as_u16(),
            message,
        })
    }

    pub async fn get_json<T>(&self, url: &str, query: &[(&str, String)], action: &str) -> PortResult<T>
    where
        T: DeserializeOwned,
    {
        let response = self
            .dispatch(Method::GET, url, action, |r| r.query(query))
            .await?;
        response.json().await.map_err(invalid_body)
    }

    pub async fn send_json<B, T>(&self, method: Method, url: &str, body: &B, action: &str) -> PortResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.dispatch(method, url, action, |r| r.json(body)).await?;
        response.json().await.map_err(invalid_body)
    }

    /// Sends a request whose response body is not needed.
    pub async fn send_discard(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        action: &str,
    ) -> PortResult<()> {
        self.dispatch(method, url, action, |r| match body {
            Some(body) => r.json(body),
            None => r,
        })
        .await?;
        Ok(())
    }
}

fn is_state_changing(method: &Method) -> bool {
    ![Method::GET, Method::HEAD, Method::OPTIONS].contains(method)
}

fn invalid_body(e: reqwest::Error) -> PortError {
    error!("Failed to decode response body: {}", e);
    PortError::Unexpected(format!("Invalid response body: {}", e))
}

/// Pulls a human-readable message out of an error body: `detail`, `error` or
/// `message`, else the first entry of the first field error list.
pub fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;

    for key in ["detail", "error", "message"] {
        if let Some(text) = value.get(key).and_then(Value::as_str) {
            if !text.trim().is_empty() {
                return Some(text.to_string());
            }
        }
    }

    let fields = value.as_object()?;
    fields.iter().find_map(|(field, errors)| {
        let first = match errors {
            Value::Array(items) => items.iter().find_map(Value::as_str)?,
            Value::String(text) => text.as_str(),
            _ => return None,
        };
        if field == "non_field_errors" {
            Some(first.to_string())
        } else {
            Some(format!("{}: {}", field, first))
        }
    })
}
