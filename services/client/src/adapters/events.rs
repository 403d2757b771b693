//! services/client/src/adapters/events.rs
//!
//! This module contains the adapter for the backend's event endpoints.
//! It implements the `EventService` port from the `core` crate.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use event_planner_core::domain::{
    Category, CategoryId, Event, EventDraft, EventId, Location, ProviderDetail, ProviderSource,
    UserId,
};
use event_planner_core::ports::{EventService, PortError, PortResult};
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::adapters::http::ApiClient;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

#[derive(Clone)]
pub struct HttpEventAdapter {
    api: ApiClient,
}

impl HttpEventAdapter {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

//=========================================================================================
// Wire Records
//=========================================================================================

#[derive(Deserialize)]
struct CategoryRecord {
    id: CategoryId,
    name: String,
}

impl CategoryRecord {
    fn to_domain(self) -> Category {
        Category {
            id: self.id,
            name: self.name,
        }
    }
}

#[derive(Serialize, Deserialize, Default)]
struct LocationRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    place_id: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    main_text: String,
    #[serde(default)]
    secondary_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    longitude: Option<f64>,
}

impl LocationRecord {
    fn from_domain(location: &Location) -> Self {
        Self {
            place_id: location.place_id.clone(),
            description: location.description.clone(),
            main_text: location.main_text.clone(),
            secondary_text: location.secondary_text.clone(),
            latitude: location.latitude,
            longitude: location.longitude,
        }
    }

    fn to_domain(self) -> Location {
        Location {
            place_id: self.place_id,
            description: self.description,
            main_text: self.main_text,
            secondary_text: self.secondary_text,
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// Older events store their location as a bare description.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredLocation {
    Text(String),
    Structured(LocationRecord),
}

impl StoredLocation {
    fn to_domain(self) -> Location {
        match self {
            StoredLocation::Text(description) => Location::from_description(description),
            StoredLocation::Structured(record) => record.to_domain(),
        }
    }
}

#[derive(Deserialize)]
struct ProviderRecord {
    name: String,
    #[serde(default)]
    address: String,
    #[serde(default)]
    phone: String,
    #[serde(default)]
    website: Option<String>,
    #[serde(default)]
    rating: Option<f64>,
    #[serde(default)]
    review_count: Option<u32>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    external_id: Option<String>,
    #[serde(default)]
    api_source: Option<String>,
}

impl ProviderRecord {
    fn to_domain(self) -> ProviderDetail {
        let api_source = match self.api_source.as_deref() {
            Some("YELP") => ProviderSource::Yelp,
            Some("GOOGLE") => ProviderSource::Google,
            _ => ProviderSource::RapidApi,
        };
        ProviderDetail {
            name: self.name,
            address: self.address,
            phone: self.phone,
            website: self.website.filter(|w| !w.is_empty()),
            rating: self.rating.unwrap_or(0.0),
            review_count: self.review_count.unwrap_or(0),
            tags: self.tags,
            description: self.description.filter(|d| !d.is_empty()),
            external_id: self.external_id.filter(|id| !id.is_empty()),
            api_source,
        }
    }
}

fn default_public() -> bool {
    true
}

#[derive(Deserialize)]
struct EventRecord {
    id: EventId,
    title: String,
    #[serde(default)]
    description: Option<String>,
    category: CategoryId,
    #[serde(default)]
    category_name: Option<String>,
    start_date: DateTime<Utc>,
    #[serde(default)]
    end_date: Option<DateTime<Utc>>,
    location: StoredLocation,
    #[serde(default)]
    expected_attendance: u32,
    budget: i64,
    #[serde(default = "default_public")]
    is_public: bool,
    #[serde(default)]
    organizer: Option<UserId>,
    #[serde(default)]
    organizer_name: Option<String>,
    #[serde(default)]
    service_providers: Vec<ProviderRecord>,
}

impl EventRecord {
    fn to_domain(self) -> Event {
        Event {
            id: self.id,
            title: self.title,
            description: self.description.filter(|d| !d.is_empty()),
            category: self.category,
            category_name: self.category_name,
            start_date: self.start_date,
            end_date: self.end_date,
            location: self.location.to_domain(),
            expected_attendance: self.expected_attendance,
            budget: self.budget,
            is_public: self.is_public,
            organizer: self.organizer,
            organizer_name: self.organizer_name,
            service_providers: self
                .service_providers
                .into_iter()
                .map(ProviderRecord::to_domain)
                .collect(),
        }
    }
}

#[derive(Serialize)]
struct EventRequest<'a> {
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    category: CategoryId,
    start_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_date: Option<DateTime<Utc>>,
    location: LocationRecord,
    expected_attendance: u32,
    budget: i64,
    is_public: bool,
}

impl<'a> EventRequest<'a> {
    fn from_domain(draft: &'a EventDraft) -> Self {
        Self {
            title: &draft.title,
            description: draft.description.as_deref(),
            category: draft.category,
            start_date: draft.start_date,
            end_date: draft.end_date,
            location: LocationRecord::from_domain(&draft.location),
            expected_attendance: draft.expected_attendance,
            budget: draft.budget,
            is_public: draft.is_public,
        }
    }
}

/// Optional text columns are blank strings on the backend, never null.
#[derive(Serialize)]
struct CreateProviderRequest<'a> {
    event_id: EventId,
    name: &'a str,
    address: &'a str,
    phone: &'a str,
    website: &'a str,
    rating: f64,
    review_count: u32,
    tags: &'a [String],
    description: &'a str,
    external_id: &'a str,
    api_source: &'static str,
}

impl<'a> CreateProviderRequest<'a> {
    fn from_domain(event_id: EventId, provider: &'a ProviderDetail) -> Self {
        Self {
            event_id,
            name: &provider.name,
            address: &provider.address,
            phone: &provider.phone,
            website: provider.website.as_deref().unwrap_or_default(),
            rating: provider.rating,
            review_count: provider.review_count,
            tags: &provider.tags,
            description: provider.description.as_deref().unwrap_or_default(),
            external_id: provider.external_id.as_deref().unwrap_or_default(),
            api_source: provider.api_source.as_str(),
        }
    }
}

//=========================================================================================
// `EventService` Trait Implementation
//=========================================================================================

#[async_trait]
impl EventService for HttpEventAdapter {
    async fn categories(&self) -> PortResult<Vec<Category>> {
        let records: Vec<CategoryRecord> = self
            .api
            .get_json(&self.api.events_url("categories/"), &[], "Fetching categories")
            .await?;
        Ok(records.into_iter().map(CategoryRecord::to_domain).collect())
    }

    async fn create_event(&self, draft: &EventDraft) -> PortResult<Event> {
        let record: EventRecord = self
            .api
            .send_json(
                Method::POST,
                &self.api.events_url("create/"),
                &EventRequest::from_domain(draft),
                "Creating the event",
            )
            .await?;
        Ok(record.to_domain())
    }

    async fn update_event(&self, event_id: EventId, draft: &EventDraft) -> PortResult<Event> {
        let record: EventRecord = self
            .api
            .send_json(
                Method::PUT,
                &self.api.events_url(&format!("{}/", event_id)),
                &EventRequest::from_domain(draft),
                "Updating the event",
            )
            .await?;
        Ok(record.to_domain())
    }

    async fn delete_event(&self, event_id: EventId) -> PortResult<()> {
        self.api
            .send_discard(
                Method::DELETE,
                &self.api.events_url(&format!("{}/delete/", event_id)),
                None,
                "Deleting the event",
            )
            .await
            .map_err(|e| not_found(e, event_id))
    }

    async fn get_event(&self, event_id: EventId) -> PortResult<Event> {
        let record: EventRecord = self
            .api
            .get_json(
                &self.api.events_url(&format!("{}/", event_id)),
                &[],
                "Fetching the event",
            )
            .await
            .map_err(|e| not_found(e, event_id))?;
        Ok(record.to_domain())
    }

    async fn list_all_events(&self) -> PortResult<Vec<Event>> {
        let records: Vec<EventRecord> = self
            .api
            .get_json(&self.api.events_url("all/"), &[], "Fetching events")
            .await?;
        Ok(records.into_iter().map(EventRecord::to_domain).collect())
    }

    async fn list_my_events(&self) -> PortResult<Vec<Event>> {
        let records: Vec<EventRecord> = self
            .api
            .get_json(&self.api.events_url("my-events/"), &[], "Fetching your events")
            .await?;
        Ok(records.into_iter().map(EventRecord::to_domain).collect())
    }

    async fn create_provider(&self, event_id: EventId, provider: &ProviderDetail) -> PortResult<()> {
        let request = CreateProviderRequest::from_domain(event_id, provider);
        let body = serde_json::to_value(&request)
            .map_err(|e| PortError::Unexpected(format!("Failed to encode provider: {}", e)))?;
        self.api
            .send_discard(
                Method::POST,
                &self.api.events_url("providers/create-from-api/"),
                Some(&body),
                "Saving the service provider",
            )
            .await
    }

    async fn clear_providers(&self, event_id: EventId) -> PortResult<()> {
        self.api
            .send_discard(
                Method::POST,
                &self.api.events_url(&format!("{}/providers/clear/", event_id)),
                None,
                "Clearing service providers",
            )
            .await
    }
}

fn not_found(error: PortError, event_id: EventId) -> PortError {
    match error {
        PortError::Api { status: 404, .. } => PortError::NotFound(format!("event {}", event_id)),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_events_with_either_location_shape() {
        let structured: EventRecord = serde_json::from_str(
            r#"{"id":1,"title":"Launch Party","category":2,"category_name":"Party",
                "start_date":"2030-05-01T18:00:00Z","budget":1000,
                "location":{"description":"Central Park","place_id":"p-1"},
                "organizer":7,"organizer_name":"ada"}"#,
        )
        .unwrap();
        let event = structured.to_domain();
        assert_eq!(event.location.place_id.as_deref(), Some("p-1"));
        assert_eq!(event.location.description, "Central Park");
        assert!(event.is_public);

        let text: EventRecord = serde_json::from_str(
            r#"{"id":2,"title":"Old","category":2,"start_date":"2030-05-01T18:00:00Z",
                "budget":0,"location":"Town Hall"}"#,
        )
        .unwrap();
        assert_eq!(text.to_domain().location.main_text, "Town Hall");
    }

    #[test]
    fn provider_request_uses_blank_strings_for_missing_text() {
        let provider = ProviderDetail {
            name: "Acme Catering".to_string(),
            address: String::new(),
            phone: "(555) 123-4567".to_string(),
            website: None,
            rating: 4.5,
            review_count: 0,
            tags: Vec::new(),
            description: None,
            external_id: None,
            api_source: ProviderSource::RapidApi,
        };
        let value = serde_json::to_value(CreateProviderRequest::from_domain(9, &provider)).unwrap();
        assert_eq!(value["event_id"], 9);
        assert_eq!(value["website"], "");
        assert_eq!(value["api_source"], "RAPIDAPI");
    }
}
