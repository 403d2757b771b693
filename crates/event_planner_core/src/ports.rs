//! crates/event_planner_core/src/ports.rs
//!
//! Defines the service contracts (traits) the client core depends on.
//! These traits form the boundary of the hexagonal architecture: the core
//! never talks HTTP or touches the filesystem itself, it only calls these
//! ports, and the `client` service provides the concrete adapters.

use async_trait::async_trait;

use crate::domain::{
    ApproximateLocation, Category, Credentials, Event, EventDraft, EventId, LocationPrediction,
    NewUser, ProviderDetail, ProviderQuery, ProviderSearch, ProviderSummary, User,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (HTTP, disk).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// The backend answered with a non-success status. `message` is already
    /// readable: either taken from the response body or templated from the
    /// status code.
    #[error("{message}")]
    Api { status: u16, message: String },
    /// The backend answered 401. Carries the body's message when it had one;
    /// on most calls this means the session is missing or expired.
    #[error("Unauthorized")]
    Unauthorized(Option<String>),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl PortError {
    /// The text to show a user, falling back to `fallback` for errors whose
    /// message is not meant for end users.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            PortError::Api { message, .. } if !message.trim().is_empty() => message.clone(),
            PortError::NotFound(what) => format!("Not found: {what}"),
            PortError::Unauthorized(_) => {
                "Your session has expired. Please log in again.".to_string()
            }
            _ => fallback.to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, PortError::Unauthorized(_))
    }

    /// The backend's own wording for a refusal, when it sent one. Credential
    /// checks answer 401 with a message meant for the user.
    pub fn rejection_message(&self, fallback: &str) -> String {
        match self {
            PortError::Unauthorized(Some(message)) if !message.trim().is_empty() => {
                message.clone()
            }
            PortError::Unauthorized(_) => fallback.to_string(),
            other => other.user_message(fallback),
        }
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn register(&self, new_user: &NewUser) -> PortResult<User>;

    async fn login(&self, credentials: &Credentials) -> PortResult<User>;

    /// Ends the server-side session. Implementations must drop any cached
    /// anti-forgery token whether or not the call succeeds.
    async fn logout(&self) -> PortResult<()>;

    async fn profile(&self) -> PortResult<User>;

    async fn refresh_token(&self) -> PortResult<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventService: Send + Sync {
    async fn categories(&self) -> PortResult<Vec<Category>>;

    async fn create_event(&self, draft: &EventDraft) -> PortResult<Event>;

    async fn update_event(&self, event_id: EventId, draft: &EventDraft) -> PortResult<Event>;

    async fn delete_event(&self, event_id: EventId) -> PortResult<()>;

    async fn get_event(&self, event_id: EventId) -> PortResult<Event>;

    async fn list_all_events(&self) -> PortResult<Vec<Event>>;

    async fn list_my_events(&self) -> PortResult<Vec<Event>>;

    /// Links one provider record to an event.
    async fn create_provider(&self, event_id: EventId, provider: &ProviderDetail)
        -> PortResult<()>;

    /// Detaches every provider from an event without touching the event row.
    async fn clear_providers(&self, event_id: EventId) -> PortResult<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LocationService: Send + Sync {
    async fn initial_location(&self) -> PortResult<ApproximateLocation>;

    async fn search_locations(
        &self,
        query: &str,
        near: Option<ApproximateLocation>,
    ) -> PortResult<Vec<LocationPrediction>>;

    /// Providers suited to an event's name, category and place.
    async fn providers_for_event(&self, query: &ProviderQuery) -> PortResult<ProviderSearch>;

    /// Free-text provider search around a place description.
    async fn search_providers(&self, query: &str, area: &str) -> PortResult<Vec<ProviderSummary>>;
}

/// Local persistence for the logged-in user's profile snapshot.
///
/// Synchronous on purpose: `is_authenticated` must answer without awaiting.
#[cfg_attr(test, mockall::automock)]
pub trait SessionStore: Send + Sync {
    fn load(&self) -> PortResult<Option<User>>;

    fn save(&self, user: &User) -> PortResult<()>;

    fn clear(&self) -> PortResult<()>;

    fn contains(&self) -> bool;
}
