//! crates/event_planner_core/src/wizard.rs
//!
//! The event creation wizard. Step one collects the event details and creates
//! the event; step two loads service providers, lets the user pick some, and
//! links the picks to the already-created event. The second step can only
//! degrade to a warning: the event row exists once step one succeeds.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::domain::{
    Category, CategoryId, Event, EventId, Location, ProviderQuery, ProviderSource, ProviderSummary,
};
use crate::ports::{EventService, LocationService, PortError};
use crate::sanitize::sanitize_provider;
use crate::validation::{EventDetailsForm, FieldErrors};

pub const CREATED_NOTICE: &str = "Event created successfully!";
const CREATE_FAILED: &str = "Failed to create the event. Please try again.";
const PROVIDERS_FAILED: &str = "Failed to load service providers. Please try again.";
const PROVIDERS_UNAVAILABLE: &str =
    "API service is currently unavailable. Please try again later or contact support.";

#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("Category not found")]
    CategoryNotFound(CategoryId),
    #[error("Failed to load category information: {0}")]
    Load(#[from] PortError),
}

/// How the wizard finished.
#[derive(Debug, Clone, PartialEq)]
pub struct WizardOutcome {
    pub event: Event,
    pub saved_providers: usize,
    /// Set when some providers could not be saved.
    pub warning: Option<String>,
    pub notice: &'static str,
}

/// An enum representing the current step of the wizard.
#[derive(Debug, Clone, PartialEq)]
pub enum WizardState {
    CollectingDetails,
    Creating,
    SelectingProviders { event: Event },
    SavingProviders { event: Event },
    Done(WizardOutcome),
    Error { message: String },
}

/// Where the caller should navigate after `back`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackTarget {
    CategorySelection,
    /// The event already exists, so there is no earlier step to return to.
    Unavailable,
}

pub struct EventWizard {
    events: Arc<dyn EventService>,
    locations: Arc<dyn LocationService>,
    category: Category,
    details: EventDetailsForm,
    field_errors: FieldErrors,
    state: WizardState,
    candidates: Vec<ProviderSummary>,
    selected: Vec<ProviderSummary>,
    provider_warning: Option<String>,
    provider_error: Option<String>,
    provider_source: ProviderSource,
    session_rejected: bool,
}

impl EventWizard {
    pub fn new(
        events: Arc<dyn EventService>,
        locations: Arc<dyn LocationService>,
        category: Category,
    ) -> Self {
        Self {
            events,
            locations,
            category,
            details: EventDetailsForm::default(),
            field_errors: FieldErrors::default(),
            state: WizardState::CollectingDetails,
            candidates: Vec::new(),
            selected: Vec::new(),
            provider_warning: None,
            provider_error: None,
            provider_source: ProviderSource::RapidApi,
            session_rejected: false,
        }
    }

    /// Resolves `category_id` against the backend's category list and opens
    /// the wizard on it.
    pub async fn start(
        events: Arc<dyn EventService>,
        locations: Arc<dyn LocationService>,
        category_id: CategoryId,
    ) -> Result<Self, WizardError> {
        let categories = events.categories().await.map_err(|e| {
            error!("Failed to fetch categories: {}", e);
            WizardError::Load(e)
        })?;
        let category = categories
            .into_iter()
            .find(|c| c.id == category_id)
            .ok_or(WizardError::CategoryNotFound(category_id))?;
        Ok(Self::new(events, locations, category))
    }

    pub fn with_provider_source(mut self, source: ProviderSource) -> Self {
        self.provider_source = source;
        self
    }

    /// Set once any backend call answered 401. The caller must end the
    /// local session.
    pub fn session_rejected(&self) -> bool {
        self.session_rejected
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    pub fn details(&self) -> &EventDetailsForm {
        &self.details
    }

    /// Mutable access to the step one form. Editing a field does not clear its
    /// message; use `clear_field_error` for that.
    pub fn details_mut(&mut self) -> &mut EventDetailsForm {
        &mut self.details
    }

    pub fn set_location(&mut self, location: Location) {
        self.details.location = Some(location);
        self.field_errors.clear_field("location");
    }

    pub fn field_errors(&self) -> &FieldErrors {
        &self.field_errors
    }

    pub fn clear_field_error(&mut self, field: &str) {
        self.field_errors.clear_field(field);
    }

    /// The created event's id, once step one has succeeded.
    pub fn event_id(&self) -> Option<EventId> {
        match &self.state {
            WizardState::SelectingProviders { event } | WizardState::SavingProviders { event } => {
                Some(event.id)
            }
            WizardState::Done(outcome) => Some(outcome.event.id),
            _ => None,
        }
    }

    /// Validates step one and, if it passes, creates the event.
    pub async fn next(&mut self, now: DateTime<Utc>) -> &WizardState {
        if self.state != WizardState::CollectingDetails {
            warn!(state = ?self.state, "Ignoring next outside of the details step.");
            return &self.state;
        }

        let draft = match self.details.check(self.category.id, now) {
            Ok(draft) => draft,
            Err(errors) => {
                self.field_errors = errors;
                return &self.state;
            }
        };
        self.field_errors = FieldErrors::default();

        self.state = WizardState::Creating;
        self.state = match self.events.create_event(&draft).await {
            Ok(event) => {
                info!(event_id = event.id, "Event created.");
                WizardState::SelectingProviders { event }
            }
            Err(e) => {
                error!("Failed to create event: {}", e);
                self.session_rejected |= e.is_unauthorized();
                WizardState::Error {
                    message: e.user_message(CREATE_FAILED),
                }
            }
        };
        &self.state
    }

    /// Fetches providers suited to the created event. Failures are reported
    /// through `provider_error` and leave the step usable.
    pub async fn load_providers(&mut self) -> &[ProviderSummary] {
        let WizardState::SelectingProviders { event } = &self.state else {
            warn!("Providers can only be loaded once the event exists.");
            return &self.candidates;
        };

        let query = ProviderQuery {
            event_name: event.title.clone(),
            event_category: self.category.name.clone(),
            event_location: event.location.clone(),
        };

        self.provider_error = None;
        self.provider_warning = None;
        match self.locations.providers_for_event(&query).await {
            Ok(search) => {
                if search.is_sample_data() {
                    if let Some(note) = &search.note {
                        self.provider_warning = Some(format!(
                            "Note: {note}. The displayed providers are examples only."
                        ));
                    }
                }
                self.candidates = search.providers;
            }
            Err(e) => {
                error!("Error fetching service providers: {}", e);
                self.session_rejected |= e.is_unauthorized();
                self.provider_error = Some(if e.to_string().contains("RAPIDAPI") {
                    PROVIDERS_UNAVAILABLE.to_string()
                } else {
                    PROVIDERS_FAILED.to_string()
                });
            }
        }
        &self.candidates
    }

    pub fn candidates(&self) -> &[ProviderSummary] {
        &self.candidates
    }

    pub fn provider_warning(&self) -> Option<&str> {
        self.provider_warning.as_deref()
    }

    pub fn provider_error(&self) -> Option<&str> {
        self.provider_error.as_deref()
    }

    pub fn selected_providers(&self) -> &[ProviderSummary] {
        &self.selected
    }

    /// Flips the selection of the candidate called `name`. Returns whether it
    /// is selected afterwards.
    pub fn toggle_provider(&mut self, name: &str) -> bool {
        if let Some(pos) = self.selected.iter().position(|p| p.name == name) {
            self.selected.remove(pos);
            return false;
        }
        match self.candidates.iter().find(|p| p.name == name) {
            Some(provider) => {
                self.selected.push(provider.clone());
                true
            }
            None => false,
        }
    }

    /// Saves the selected providers one at a time and completes the wizard.
    /// With nothing selected no call is made.
    pub async fn finish(&mut self) -> &WizardState {
        let event = match &self.state {
            WizardState::SelectingProviders { event } => event.clone(),
            _ => {
                warn!(state = ?self.state, "Ignoring finish outside of provider selection.");
                return &self.state;
            }
        };

        if self.selected.is_empty() {
            self.state = WizardState::Done(WizardOutcome {
                event,
                saved_providers: 0,
                warning: None,
                notice: CREATED_NOTICE,
            });
            return &self.state;
        }

        self.state = WizardState::SavingProviders {
            event: event.clone(),
        };

        let mut saved = 0;
        let mut failed = Vec::new();
        for provider in &self.selected {
            let detail = sanitize_provider(provider, self.provider_source);
            match self.events.create_provider(event.id, &detail).await {
                Ok(()) => saved += 1,
                Err(e) if e.is_unauthorized() => {
                    error!(event_id = event.id, "Session rejected while saving providers.");
                    self.session_rejected = true;
                    self.state = WizardState::Error {
                        message: e.user_message(CREATE_FAILED),
                    };
                    return &self.state;
                }
                Err(e) => {
                    warn!(event_id = event.id, provider = %detail.name, "Failed to save provider: {}", e);
                    failed.push(detail.name);
                }
            }
        }

        let warning = (!failed.is_empty()).then(|| {
            format!(
                "Event created, but {} of {} service providers could not be saved: {}",
                failed.len(),
                self.selected.len(),
                failed.join(", ")
            )
        });

        self.state = WizardState::Done(WizardOutcome {
            event,
            saved_providers: saved,
            warning,
            notice: CREATED_NOTICE,
        });
        &self.state
    }

    /// Steps back. From the details step or after a failed creation the caller
    /// returns to category selection; the form is kept.
    pub fn back(&mut self) -> BackTarget {
        match self.state {
            WizardState::CollectingDetails => BackTarget::CategorySelection,
            WizardState::Error { .. } => {
                self.state = WizardState::CollectingDetails;
                BackTarget::CategorySelection
            }
            _ => BackTarget::Unavailable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EventDraft, ProviderSearch};
    use crate::ports::{MockEventService, MockLocationService};
    use chrono::Duration;

    fn category() -> Category {
        Category {
            id: 2,
            name: "Birthday Party".to_string(),
        }
    }

    fn event_from(draft: &EventDraft, id: EventId) -> Event {
        Event {
            id,
            title: draft.title.clone(),
            description: draft.description.clone(),
            category: draft.category,
            category_name: Some("Birthday Party".to_string()),
            start_date: draft.start_date,
            end_date: draft.end_date,
            location: draft.location.clone(),
            expected_attendance: draft.expected_attendance,
            budget: draft.budget,
            is_public: draft.is_public,
            organizer: Some(7),
            organizer_name: Some("ada".to_string()),
            service_providers: Vec::new(),
        }
    }

    fn acme() -> ProviderSummary {
        ProviderSummary {
            name: "Acme Catering".to_string(),
            address: "1 Main St".to_string(),
            rating: 4.5,
            user_rating_count: 10,
            phone_number: Some("(555) 123-4567 ext 9999999999".to_string()),
            website: Some("acme.example.com".to_string()),
            tags: vec!["catering".to_string()],
            description: None,
            place_id: None,
        }
    }

    fn globex() -> ProviderSummary {
        ProviderSummary {
            name: "Globex Sound".to_string(),
            address: "2 Side St".to_string(),
            rating: 3.9,
            user_rating_count: 4,
            phone_number: None,
            website: None,
            tags: Vec::new(),
            description: None,
            place_id: Some("g-1".to_string()),
        }
    }

    fn fill_launch_party(wizard: &mut EventWizard, now: DateTime<Utc>) {
        let details = wizard.details_mut();
        details.title = "Launch Party".to_string();
        details.start_date = Some(now + Duration::days(14));
        details.expected_attendance = 50;
        details.budget = 1000;
        wizard.set_location(Location::from_description("Central Park"));
    }

    fn created_events(id: EventId) -> MockEventService {
        let mut events = MockEventService::new();
        events
            .expect_create_event()
            .times(1)
            .returning(move |draft| Ok(event_from(draft, id)));
        events
    }

    fn providers(list: Vec<ProviderSummary>, note: Option<&str>) -> MockLocationService {
        let note = note.map(str::to_string);
        let mut locations = MockLocationService::new();
        locations
            .expect_providers_for_event()
            .withf(|q| q.event_name == "Launch Party" && q.event_category == "Birthday Party")
            .returning(move |_| {
                Ok(ProviderSearch {
                    providers: list.clone(),
                    note: note.clone(),
                })
            });
        locations
    }

    #[tokio::test]
    async fn invalid_details_stay_on_step_one_without_a_call() {
        let mut events = MockEventService::new();
        events.expect_create_event().times(0);
        let mut wizard = EventWizard::new(
            Arc::new(events),
            Arc::new(MockLocationService::new()),
            category(),
        );

        let state = wizard.next(Utc::now()).await.clone();
        assert_eq!(state, WizardState::CollectingDetails);
        assert_eq!(
            wizard.field_errors().get("title"),
            Some("Event title is required")
        );
        assert!(wizard.field_errors().contains("location"));
    }

    #[tokio::test]
    async fn created_event_id_is_kept_for_provider_saves() {
        let now = Utc::now();
        let mut events = created_events(42);
        events
            .expect_create_provider()
            .withf(|event_id, p| {
                *event_id == 42
                    && p.name == "Acme Catering"
                    && p.phone == "(555) 123-4567 99999"
                    && p.website.as_deref() == Some("http://acme.example.com")
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let mut wizard = EventWizard::new(
            Arc::new(events),
            Arc::new(providers(vec![acme(), globex()], None)),
            category(),
        );
        fill_launch_party(&mut wizard, now);

        let state = wizard.next(now).await.clone();
        assert!(matches!(state, WizardState::SelectingProviders { ref event } if event.id == 42));
        assert_eq!(wizard.event_id(), Some(42));

        assert_eq!(wizard.load_providers().await.len(), 2);
        assert!(wizard.toggle_provider("Acme Catering"));

        match wizard.finish().await {
            WizardState::Done(outcome) => {
                assert_eq!(outcome.event.id, 42);
                assert_eq!(outcome.saved_providers, 1);
                assert_eq!(outcome.warning, None);
                assert_eq!(outcome.notice, CREATED_NOTICE);
            }
            other => panic!("unexpected state: {other:?}"),
        }
    }

    #[tokio::test]
    async fn finishing_with_no_selection_skips_provider_calls() {
        let now = Utc::now();
        let mut events = created_events(5);
        events.expect_create_provider().times(0);

        let mut wizard = EventWizard::new(
            Arc::new(events),
            Arc::new(MockLocationService::new()),
            category(),
        );
        fill_launch_party(&mut wizard, now);
        wizard.next(now).await;

        match wizard.finish().await {
            WizardState::Done(outcome) => assert_eq!(outcome.saved_providers, 0),
            other => panic!("unexpected state: {other:?}"),
        }
    }

    #[tokio::test]
    async fn creation_failure_moves_to_error_with_way_back() {
        let now = Utc::now();
        let mut events = MockEventService::new();
        events.expect_create_event().returning(|_| {
            Err(PortError::Api {
                status: 400,
                message: "Event cannot be scheduled in the past".to_string(),
            })
        });

        let mut wizard = EventWizard::new(
            Arc::new(events),
            Arc::new(MockLocationService::new()),
            category(),
        );
        fill_launch_party(&mut wizard, now);

        let state = wizard.next(now).await.clone();
        assert_eq!(
            state,
            WizardState::Error {
                message: "Event cannot be scheduled in the past".to_string()
            }
        );
        assert_eq!(wizard.back(), BackTarget::CategorySelection);
        assert_eq!(wizard.state(), &WizardState::CollectingDetails);
        assert_eq!(wizard.details().title, "Launch Party");
    }

    #[tokio::test]
    async fn provider_save_failure_degrades_to_warning() {
        let now = Utc::now();
        let mut events = created_events(9);
        events
            .expect_create_provider()
            .times(2)
            .returning(|_, p| {
                if p.name == "Globex Sound" {
                    Err(PortError::Api {
                        status: 500,
                        message: "Provider creation failed with status 500".to_string(),
                    })
                } else {
                    Ok(())
                }
            });

        let mut wizard = EventWizard::new(
            Arc::new(events),
            Arc::new(providers(vec![acme(), globex()], None)),
            category(),
        );
        fill_launch_party(&mut wizard, now);
        wizard.next(now).await;
        wizard.load_providers().await;
        wizard.toggle_provider("Acme Catering");
        wizard.toggle_provider("Globex Sound");

        match wizard.finish().await {
            WizardState::Done(outcome) => {
                assert_eq!(outcome.saved_providers, 1);
                let warning = outcome.warning.clone().unwrap();
                assert!(warning.contains("1 of 2"));
                assert!(warning.contains("Globex Sound"));
            }
            other => panic!("unexpected state: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unauthorized_save_is_fatal() {
        let now = Utc::now();
        let mut events = created_events(9);
        events
            .expect_create_provider()
            .times(1)
            .returning(|_, _| Err(PortError::Unauthorized(None)));

        let mut wizard = EventWizard::new(
            Arc::new(events),
            Arc::new(providers(vec![acme(), globex()], None)),
            category(),
        );
        fill_launch_party(&mut wizard, now);
        wizard.next(now).await;
        wizard.load_providers().await;
        wizard.toggle_provider("Acme Catering");
        wizard.toggle_provider("Globex Sound");

        assert!(matches!(wizard.finish().await, WizardState::Error { .. }));
        assert!(wizard.session_rejected());
        assert_eq!(wizard.back(), BackTarget::CategorySelection);
    }

    #[tokio::test]
    async fn unauthorized_create_flags_the_session() {
        let now = Utc::now();
        let mut events = MockEventService::new();
        events.expect_create_event().times(1).returning(|_| {
            Err(PortError::Unauthorized(Some(
                "Authentication credentials were not provided.".to_string(),
            )))
        });

        let mut wizard = EventWizard::new(
            Arc::new(events),
            Arc::new(MockLocationService::new()),
            category(),
        );
        fill_launch_party(&mut wizard, now);
        assert!(!wizard.session_rejected());

        let state = wizard.next(now).await.clone();
        assert_eq!(
            state,
            WizardState::Error {
                message: "Your session has expired. Please log in again.".to_string()
            }
        );
        assert!(wizard.session_rejected());
    }

    #[tokio::test]
    async fn unauthorized_provider_lookup_flags_the_session() {
        let now = Utc::now();
        let mut locations = MockLocationService::new();
        locations
            .expect_providers_for_event()
            .returning(|_| Err(PortError::Unauthorized(None)));

        let mut wizard =
            EventWizard::new(Arc::new(created_events(3)), Arc::new(locations), category());
        fill_launch_party(&mut wizard, now);
        wizard.next(now).await;

        assert!(wizard.load_providers().await.is_empty());
        assert_eq!(wizard.provider_error(), Some(PROVIDERS_FAILED));
        assert!(wizard.session_rejected());
    }

    #[tokio::test]
    async fn chosen_provider_source_is_stamped_on_saves() {
        let now = Utc::now();
        let mut events = created_events(4);
        events
            .expect_create_provider()
            .withf(|_, p| p.api_source == ProviderSource::Yelp)
            .times(1)
            .returning(|_, _| Ok(()));

        let mut wizard = EventWizard::new(
            Arc::new(events),
            Arc::new(providers(vec![acme()], None)),
            category(),
        )
        .with_provider_source(ProviderSource::Yelp);
        fill_launch_party(&mut wizard, now);
        wizard.next(now).await;
        wizard.load_providers().await;
        wizard.toggle_provider("Acme Catering");

        assert!(matches!(wizard.finish().await, WizardState::Done(_)));
        assert!(!wizard.session_rejected());
    }

    #[tokio::test]
    async fn sample_data_note_becomes_warning() {
        let now = Utc::now();
        let mut wizard = EventWizard::new(
            Arc::new(created_events(1)),
            Arc::new(providers(
                vec![acme()],
                Some("Using sample data because the provider API is unavailable"),
            )),
            category(),
        );
        fill_launch_party(&mut wizard, now);
        wizard.next(now).await;
        wizard.load_providers().await;

        let warning = wizard.provider_warning().unwrap();
        assert!(warning.starts_with("Note: Using sample data"));
        assert!(warning.ends_with("The displayed providers are examples only."));
        assert_eq!(wizard.back(), BackTarget::Unavailable);
    }

    #[tokio::test]
    async fn toggling_twice_deselects() {
        let now = Utc::now();
        let mut wizard = EventWizard::new(
            Arc::new(created_events(1)),
            Arc::new(providers(vec![acme()], None)),
            category(),
        );
        fill_launch_party(&mut wizard, now);
        wizard.next(now).await;
        wizard.load_providers().await;

        assert!(wizard.toggle_provider("Acme Catering"));
        assert!(!wizard.toggle_provider("Acme Catering"));
        assert!(!wizard.toggle_provider("Nobody"));
        assert!(wizard.selected_providers().is_empty());
    }

    #[tokio::test]
    async fn start_rejects_unknown_category() {
        let mut events = MockEventService::new();
        events
            .expect_categories()
            .returning(|| Ok(vec![category()]));
        let result = EventWizard::start(
            Arc::new(events),
            Arc::new(MockLocationService::new()),
            99,
        )
        .await;
        assert!(matches!(result, Err(WizardError::CategoryNotFound(99))));
    }
}
