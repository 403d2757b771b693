//! crates/event_planner_core/src/session.rs
//!
//! The session manager owns the logged-in user for the lifetime of the
//! client. Callers receive clones of the session; only this type mutates it.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::domain::{Session, User};
use crate::ports::{AuthService, PortResult, SessionStore};
use crate::validation::{FieldErrors, LoginForm, PasswordPolicy, RegisterForm};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The form failed client-side checks; nothing was sent.
    #[error("validation failed: {0}")]
    Validation(FieldErrors),
    /// The backend refused the request; the message is ready to display.
    #[error("{0}")]
    Rejected(String),
    /// The stored session is no longer accepted and has been cleared.
    #[error("Your session has expired. Please log in again.")]
    Expired,
    #[error("Storage error: {0}")]
    Storage(String),
}

/// What happened when the user logged out. Local state is cleared either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoutOutcome {
    pub server_acknowledged: bool,
}

pub struct SessionManager {
    auth: Arc<dyn AuthService>,
    store: Arc<dyn SessionStore>,
    policy: PasswordPolicy,
    current: RwLock<Option<Session>>,
}

impl SessionManager {
    pub fn new(
        auth: Arc<dyn AuthService>,
        store: Arc<dyn SessionStore>,
        policy: PasswordPolicy,
    ) -> Self {
        Self {
            auth,
            store,
            policy,
            current: RwLock::new(None),
        }
    }

    /// Rehydrates the session from the persisted snapshot without a network
    /// call. An unreadable snapshot is discarded.
    pub async fn restore(&self) -> Option<Session> {
        match self.store.load() {
            Ok(Some(user)) => {
                info!(user_id = user.id, "Restored session from snapshot.");
                let session = Session::new(user);
                *self.current.write().await = Some(session.clone());
                Some(session)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Discarding unreadable session snapshot: {}", e);
                if let Err(e) = self.store.clear() {
                    error!("Failed to clear session snapshot: {}", e);
                }
                None
            }
        }
    }

    pub async fn register(&self, form: &RegisterForm) -> Result<Session, SessionError> {
        let new_user = form.check(self.policy).map_err(SessionError::Validation)?;

        let user = self.auth.register(&new_user).await.map_err(|e| {
            error!("Registration failed: {}", e);
            SessionError::Rejected(e.rejection_message("Registration failed"))
        })?;

        info!(user_id = user.id, "Registered new account.");
        self.establish(user).await
    }

    pub async fn login(&self, form: &LoginForm) -> Result<Session, SessionError> {
        let credentials = form.check().map_err(SessionError::Validation)?;

        let user = self.auth.login(&credentials).await.map_err(|e| {
            error!("Login failed: {}", e);
            SessionError::Rejected(e.rejection_message("Login failed"))
        })?;

        info!(user_id = user.id, "Logged in.");
        self.establish(user).await
    }

    /// Ends the session. Local state is cleared even when the remote call
    /// fails; the outcome only reports whether the server acknowledged it.
    pub async fn logout(&self) -> LogoutOutcome {
        let remote = self.auth.logout().await;
        self.clear_local().await;

        match remote {
            Ok(()) => {
                info!("Logged out.");
                LogoutOutcome {
                    server_acknowledged: true,
                }
            }
            Err(e) => {
                warn!("Logout was not acknowledged by the server, logged out locally: {}", e);
                LogoutOutcome {
                    server_acknowledged: false,
                }
            }
        }
    }

    /// Synchronous check against the persisted snapshot.
    pub fn is_authenticated(&self) -> bool {
        self.store.contains()
    }

    /// The in-memory session, if any.
    pub async fn session(&self) -> Option<Session> {
        self.current.read().await.clone()
    }

    /// Re-fetches the profile with the current cookies. Any failure means the
    /// session can no longer be trusted, so it is cleared.
    pub async fn current_user(&self) -> Result<User, SessionError> {
        match self.auth.profile().await {
            Ok(user) => {
                self.establish(user.clone()).await?;
                Ok(user)
            }
            Err(e) => {
                warn!("Profile fetch failed, clearing session: {}", e);
                self.clear_local().await;
                Err(SessionError::Expired)
            }
        }
    }

    /// Asks the backend for a fresh access cookie. A refusal ends the session.
    pub async fn refresh_token(&self) -> Result<(), SessionError> {
        if let Err(e) = self.auth.refresh_token().await {
            warn!("Token refresh failed, clearing session: {}", e);
            self.clear_local().await;
            return Err(SessionError::Expired);
        }
        Ok(())
    }

    /// Passes a port result through, forcing a local logout when the backend
    /// reports the session as unauthorized.
    pub async fn guard<T>(&self, result: PortResult<T>) -> PortResult<T> {
        if let Err(e) = &result {
            if e.is_unauthorized() {
                self.expire().await;
            }
        }
        result
    }

    /// Forces a local logout after the backend rejected the session.
    pub async fn expire(&self) {
        warn!("Backend rejected the session, logging out locally.");
        self.clear_local().await;
    }

    async fn establish(&self, user: User) -> Result<Session, SessionError> {
        self.store.save(&user).map_err(|e| {
            error!("Failed to persist session snapshot: {}", e);
            SessionError::Storage(e.to_string())
        })?;
        let session = Session::new(user);
        *self.current.write().await = Some(session.clone());
        Ok(session)
    }

    async fn clear_local(&self) {
        *self.current.write().await = None;
        if let Err(e) = self.store.clear() {
            error!("Failed to clear session snapshot: {}", e);
        }
    }
}
