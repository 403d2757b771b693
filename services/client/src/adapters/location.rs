//! services/client/src/adapters/location.rs
//!
//! This module contains the adapter for the backend's place and provider
//! lookups. It implements the `LocationService` port from the `core` crate.

use async_trait::async_trait;
use event_planner_core::domain::{
    ApproximateLocation, Location, LocationPrediction, ProviderQuery, ProviderSearch,
    ProviderSummary,
};
use event_planner_core::ports::{LocationService, PortResult};
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::adapters::http::ApiClient;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

#[derive(Clone)]
pub struct HttpLocationAdapter {
    api: ApiClient,
}

impl HttpLocationAdapter {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

//=========================================================================================
// Wire Records
//=========================================================================================

#[derive(Deserialize)]
struct ApproximateLocationRecord {
    lat: f64,
    lng: f64,
    #[serde(default)]
    city: String,
    #[serde(default)]
    region: String,
    #[serde(default)]
    country: String,
}

impl ApproximateLocationRecord {
    fn to_domain(self) -> ApproximateLocation {
        ApproximateLocation {
            lat: self.lat,
            lng: self.lng,
            city: self.city,
            region: self.region,
            country: self.country,
        }
    }
}

#[derive(Deserialize, Default)]
struct StructuredFormatting {
    #[serde(default)]
    main_text: Option<String>,
    #[serde(default)]
    secondary_text: Option<String>,
}

#[derive(Deserialize)]
struct PredictionRecord {
    id: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    structured_formatting: StructuredFormatting,
}

impl PredictionRecord {
    fn to_domain(self) -> LocationPrediction {
        LocationPrediction {
            place_id: self.id,
            description: self.description,
            main_text: self.structured_formatting.main_text,
            secondary_text: self.structured_formatting.secondary_text,
        }
    }
}

#[derive(Deserialize)]
struct PredictionsRecord {
    #[serde(default)]
    results: Vec<PredictionRecord>,
}

#[derive(Deserialize)]
struct ProviderSummaryRecord {
    name: String,
    #[serde(default)]
    address: String,
    #[serde(default)]
    rating: Option<f64>,
    #[serde(default)]
    user_rating_count: Option<u32>,
    #[serde(default)]
    phone_number: Option<String>,
    #[serde(default)]
    website: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    place_id: Option<String>,
}

impl ProviderSummaryRecord {
    fn to_domain(self) -> ProviderSummary {
        ProviderSummary {
            name: self.name,
            address: self.address,
            rating: self.rating.unwrap_or(0.0),
            user_rating_count: self.user_rating_count.unwrap_or(0),
            phone_number: self.phone_number.filter(|p| !p.is_empty()),
            website: self.website.filter(|w| !w.is_empty()),
            tags: self.tags,
            description: self.description,
            place_id: self.place_id,
        }
    }
}

#[derive(Deserialize)]
struct ProvidersRecord {
    #[serde(default, alias = "providers", alias = "results")]
    service_providers: Vec<ProviderSummaryRecord>,
    #[serde(default)]
    note: Option<String>,
}

/// The provider lookup takes a place with coordinates, or just its text.
#[derive(Serialize)]
#[serde(untagged)]
enum EventLocationRequest<'a> {
    Pinned {
        description: &'a str,
        lat: f64,
        lng: f64,
        place_id: Option<&'a str>,
    },
    Text(&'a str),
}

impl<'a> EventLocationRequest<'a> {
    fn from_domain(location: &'a Location) -> Self {
        match (location.latitude, location.longitude) {
            (Some(lat), Some(lng)) => EventLocationRequest::Pinned {
                description: &location.description,
                lat,
                lng,
                place_id: location.place_id.as_deref(),
            },
            _ => EventLocationRequest::Text(&location.description),
        }
    }
}

#[derive(Serialize)]
struct ProviderQueryRequest<'a> {
    event_name: &'a str,
    event_category: &'a str,
    event_location: EventLocationRequest<'a>,
}

//=========================================================================================
// `LocationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl LocationService for HttpLocationAdapter {
    async fn initial_location(&self) -> PortResult<ApproximateLocation> {
        let record: ApproximateLocationRecord = self
            .api
            .get_json(
                &self.api.location_url("get-initial-location/"),
                &[],
                "Getting your location",
            )
            .await?;
        Ok(record.to_domain())
    }

    async fn search_locations(
        &self,
        query: &str,
        near: Option<ApproximateLocation>,
    ) -> PortResult<Vec<LocationPrediction>> {
        let mut params = vec![("query", query.to_string())];
        if let Some(near) = near {
            params.push(("lat", near.lat.to_string()));
            params.push(("lng", near.lng.to_string()));
        }
        let record: PredictionsRecord = self
            .api
            .get_json(
                &self.api.location_url("search-locations/"),
                &params,
                "Searching locations",
            )
            .await?;
        Ok(record
            .results
            .into_iter()
            .map(PredictionRecord::to_domain)
            .collect())
    }

    async fn providers_for_event(&self, query: &ProviderQuery) -> PortResult<ProviderSearch> {
        let request = ProviderQueryRequest {
            event_name: &query.event_name,
            event_category: &query.event_category,
            event_location: EventLocationRequest::from_domain(&query.event_location),
        };
        let record: ProvidersRecord = self
            .api
            .send_json(
                Method::POST,
                &self.api.location_url("providers/"),
                &request,
                "Loading service providers",
            )
            .await?;
        Ok(ProviderSearch {
            providers: record
                .service_providers
                .into_iter()
                .map(ProviderSummaryRecord::to_domain)
                .collect(),
            note: record.note,
        })
    }

    async fn search_providers(&self, query: &str, area: &str) -> PortResult<Vec<ProviderSummary>> {
        let params = [("query", query.to_string()), ("location", area.to_string())];
        let record: ProvidersRecord = self
            .api
            .get_json(
                &self.api.location_url("search-providers/"),
                &params,
                "Searching service providers",
            )
            .await?;
        Ok(record
            .service_providers
            .into_iter()
            .map(ProviderSummaryRecord::to_domain)
            .collect())
    }
}
