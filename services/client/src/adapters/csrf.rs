//! services/client/src/adapters/csrf.rs
//!
//! In-memory holder for the backend's anti-forgery token.

use tokio::sync::RwLock;

/// Shared by every adapter. Emptied on logout and whenever the backend
/// answers 401, so the next mutating call fetches a fresh token.
#[derive(Debug, Default)]
pub struct CsrfToken {
    value: RwLock<Option<String>>,
}

impl CsrfToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self) -> Option<String> {
        self.value.read().await.clone()
    }

    pub async fn set(&self, token: String) {
        *self.value.write().await = Some(token);
    }

    pub async fn invalidate(&self) {
        *self.value.write().await = None;
    }

    pub async fn is_cached(&self) -> bool {
        self.value.read().await.is_some()
    }
}
