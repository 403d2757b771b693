//! crates/event_planner_core/src/domain.rs
//!
//! Defines the pure, core data structures for the event planner client.
//! These structs are independent of the wire format used by the backend; the
//! HTTP adapters translate their own records into these types.

use chrono::{DateTime, Utc};

pub type UserId = i64;
pub type EventId = i64;
pub type CategoryId = i64;

/// Represents an account as reported by the backend profile endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: Option<String>,
}

/// The client's view of a logged-in user.
///
/// The anti-forgery token is deliberately not part of this struct; it lives in
/// the HTTP layer where it is attached to outgoing requests.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user: User,
    pub established_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user: User) -> Self {
        Self {
            user,
            established_at: Utc::now(),
        }
    }
}

/// Data sent to the backend to create an account.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password: String,
    pub password_confirm: String,
}

/// Data sent to the backend to log in.
#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// A place attached to an event.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub place_id: Option<String>,
    pub description: String,
    pub main_text: String,
    pub secondary_text: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Location {
    /// A free-text location with no place identifier or coordinates.
    pub fn from_description(description: impl Into<String>) -> Self {
        let description = description.into();
        Self {
            place_id: None,
            main_text: description.clone(),
            description,
            secondary_text: String::new(),
            latitude: None,
            longitude: None,
        }
    }
}

/// The searcher's approximate position, derived by the backend from the
/// caller's IP address.
#[derive(Debug, Clone, PartialEq)]
pub struct ApproximateLocation {
    pub lat: f64,
    pub lng: f64,
    pub city: String,
    pub region: String,
    pub country: String,
}

/// A single autocomplete suggestion returned by the location search.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationPrediction {
    pub place_id: String,
    pub description: String,
    pub main_text: Option<String>,
    pub secondary_text: Option<String>,
}

impl LocationPrediction {
    /// Normalizes the suggestion into a `Location`, attaching the searcher's
    /// coordinates when they are known.
    pub fn to_location(&self, near: Option<&ApproximateLocation>) -> Location {
        Location {
            place_id: Some(self.place_id.clone()),
            description: self.description.clone(),
            main_text: self.main_text.clone().unwrap_or_default(),
            secondary_text: self.secondary_text.clone().unwrap_or_default(),
            latitude: near.map(|n| n.lat),
            longitude: near.map(|n| n.lng),
        }
    }

    /// The label shown in a result list.
    pub fn label(&self) -> &str {
        self.main_text.as_deref().unwrap_or(&self.description)
    }
}

/// A third-party business as returned by a provider search. Nothing about it
/// is durable until it is saved against an event.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSummary {
    pub name: String,
    pub address: String,
    pub rating: f64,
    pub user_rating_count: u32,
    pub phone_number: Option<String>,
    pub website: Option<String>,
    pub tags: Vec<String>,
    pub description: Option<String>,
    pub place_id: Option<String>,
}

/// Where a persisted provider record originally came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderSource {
    Yelp,
    Google,
    RapidApi,
}

impl ProviderSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderSource::Yelp => "YELP",
            ProviderSource::Google => "GOOGLE",
            ProviderSource::RapidApi => "RAPIDAPI",
        }
    }

    /// Accepts the backend's spelling in any case.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "YELP" => Some(ProviderSource::Yelp),
            "GOOGLE" => Some(ProviderSource::Google),
            "RAPIDAPI" => Some(ProviderSource::RapidApi),
            _ => None,
        }
    }
}

/// A provider record in the shape the backend stores it. Built from a
/// `ProviderSummary` by `sanitize::sanitize_provider`, which enforces the
/// column limits.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderDetail {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub website: Option<String>,
    pub rating: f64,
    pub review_count: u32,
    pub tags: Vec<String>,
    pub description: Option<String>,
    pub external_id: Option<String>,
    pub api_source: ProviderSource,
}

/// Parameters for the event-aware provider lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderQuery {
    pub event_name: String,
    pub event_category: String,
    pub event_location: Location,
}

/// Result of a provider lookup. `note` is set by the backend when it falls
/// back to canned data.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProviderSearch {
    pub providers: Vec<ProviderSummary>,
    pub note: Option<String>,
}

impl ProviderSearch {
    pub fn is_sample_data(&self) -> bool {
        self.note
            .as_deref()
            .map(|n| n.contains("sample data"))
            .unwrap_or(false)
    }
}

/// The fields needed to create or update an event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub title: String,
    pub description: Option<String>,
    pub category: CategoryId,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub location: Location,
    pub expected_attendance: u32,
    pub budget: i64,
    pub is_public: bool,
}

/// An event as stored by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub description: Option<String>,
    pub category: CategoryId,
    pub category_name: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub location: Location,
    pub expected_attendance: u32,
    pub budget: i64,
    pub is_public: bool,
    pub organizer: Option<UserId>,
    pub organizer_name: Option<String>,
    pub service_providers: Vec<ProviderDetail>,
}
