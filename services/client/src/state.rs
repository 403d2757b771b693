//! services/client/src/state.rs
//!
//! Defines the client's shared state: configuration, the session manager and
//! the backend adapters, wired once at startup.

use std::sync::Arc;

use event_planner_core::browse::{browse, EventPage, EventQuery};
use event_planner_core::domain::{CategoryId, Event};
use event_planner_core::ports::{EventService, LocationService, PortResult};
use event_planner_core::search::{
    LocationSearch, LocationSearchSource, ProviderFinder, ProviderSearchSource,
};
use event_planner_core::session::SessionManager;
use event_planner_core::wizard::{EventWizard, WizardError};

use crate::adapters::{
    ApiClient, FileSessionStore, HttpAuthAdapter, HttpEventAdapter, HttpLocationAdapter,
};
use crate::config::Config;
use crate::error::ClientError;

/// The shared application state, created once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub api: ApiClient,
    pub sessions: Arc<SessionManager>,
    pub events: Arc<dyn EventService>,
    pub locations: Arc<dyn LocationService>,
}

impl AppState {
    /// Wires the HTTP adapters and the file-backed session store.
    pub fn build(config: Arc<Config>) -> Result<Self, ClientError> {
        let api = ApiClient::new(config.endpoints.clone(), config.request_timeout)?;
        let auth = Arc::new(HttpAuthAdapter::new(api.clone()));
        let store = Arc::new(FileSessionStore::new(config.session_file.clone()));
        let sessions = Arc::new(SessionManager::new(auth, store, config.password_policy));

        Ok(Self {
            events: Arc::new(HttpEventAdapter::new(api.clone())),
            locations: Arc::new(HttpLocationAdapter::new(api.clone())),
            config,
            api,
            sessions,
        })
    }

    /// Opens the event-creation wizard on a category.
    pub async fn wizard(&self, category_id: CategoryId) -> Result<EventWizard, ClientError> {
        let wizard =
            EventWizard::start(self.events.clone(), self.locations.clone(), category_id).await;
        if let Err(WizardError::Load(e)) = &wizard {
            if e.is_unauthorized() {
                self.sessions.expire().await;
            }
        }
        wizard.map_err(ClientError::from)
    }

    /// Ends the local session if any wizard step was refused with a 401.
    /// Returns whether it did.
    pub async fn expire_if_rejected(&self, wizard: &EventWizard) -> bool {
        if wizard.session_rejected() {
            self.sessions.expire().await;
        }
        wizard.session_rejected()
    }

    pub async fn location_search(&self) -> LocationSearch {
        let source = LocationSearchSource::locate(self.locations.clone()).await;
        LocationSearch::new(source, self.config.search)
    }

    pub fn provider_finder(&self, area: &str) -> ProviderFinder {
        ProviderFinder::new(
            ProviderSearchSource::new(self.locations.clone(), area),
            self.config.search,
        )
    }

    pub async fn my_events(&self) -> PortResult<Vec<Event>> {
        self.sessions.guard(self.events.list_my_events().await).await
    }

    /// Fetches every public event and pages it through `query`.
    pub async fn browse_events(&self, query: &EventQuery) -> PortResult<EventPage> {
        let events = self
            .sessions
            .guard(self.events.list_all_events().await)
            .await?;
        Ok(browse(&events, query))
    }
}
