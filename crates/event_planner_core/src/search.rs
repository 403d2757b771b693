//! crates/event_planner_core/src/search.rs
//!
//! Debounced type-ahead search used by the location picker and the provider
//! finder.
//!
//! Every keystroke cancels the pending timer and starts a new one; a request
//! is only issued once input pauses. Each request is tagged with a sequence
//! number and its response is dropped if a newer request has been issued in
//! the meantime, so a slow response can never overwrite fresher results.
//! Requests already on the wire are not cancelled.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::domain::{ApproximateLocation, Location, LocationPrediction, ProviderSummary};
use crate::ports::{LocationService, PortResult};

pub const MIN_DEBOUNCE: Duration = Duration::from_millis(300);
pub const MAX_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    pub debounce: Duration,
    pub min_query_len: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce: MIN_DEBOUNCE,
            min_query_len: 3,
        }
    }
}

/// A backend query the search box can run.
#[async_trait]
pub trait SearchSource: Send + Sync + 'static {
    type Item: Clone + Send + Sync + 'static;
    /// What the parent receives when a result is picked.
    type Selection;

    async fn search(&self, query: &str) -> PortResult<Vec<Self::Item>>;

    fn normalize(&self, item: &Self::Item) -> Self::Selection;

    /// Text placed in the input once `item` is picked.
    fn label(&self, item: &Self::Item) -> String;

    fn failure_message(&self) -> &'static str {
        "Error searching"
    }
}

/// What the search box currently shows.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSnapshot<T> {
    pub query: String,
    pub results: Vec<T>,
    pub dropdown_open: bool,
    pub loading: bool,
    pub error: Option<String>,
    /// Sequence number of the request whose results are shown; 0 before any.
    pub sequence: u64,
}

impl<T> Default for SearchSnapshot<T> {
    fn default() -> Self {
        Self {
            query: String::new(),
            results: Vec::new(),
            dropdown_open: false,
            loading: false,
            error: None,
            sequence: 0,
        }
    }
}

pub struct DebouncedSearch<S: SearchSource> {
    source: Arc<S>,
    config: SearchConfig,
    latest: Arc<AtomicU64>,
    pending: Option<CancellationToken>,
    state: Arc<watch::Sender<SearchSnapshot<S::Item>>>,
}

impl<S: SearchSource> DebouncedSearch<S> {
    pub fn new(source: S, config: SearchConfig) -> Self {
        let (tx, _rx) = watch::channel(SearchSnapshot::default());
        Self {
            source: Arc::new(source),
            config,
            latest: Arc::new(AtomicU64::new(0)),
            pending: None,
            state: Arc::new(tx),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Observers are notified every time the shown state changes.
    pub fn subscribe(&self) -> watch::Receiver<SearchSnapshot<S::Item>> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> SearchSnapshot<S::Item> {
        self.state.borrow().clone()
    }

    /// Handles an input change. Must be called from within a tokio runtime.
    /// Returns whether a request was scheduled; queries below the minimum
    /// length only clear the results.
    pub fn input(&mut self, query: &str) -> bool {
        let seq = self.supersede();

        let query = query.to_string();
        if query.trim().chars().count() < self.config.min_query_len {
            self.state.send_modify(|s| {
                s.query = query;
                s.results.clear();
                s.dropdown_open = false;
                s.loading = false;
                s.error = None;
            });
            return false;
        }

        self.state.send_modify(|s| s.query = query.clone());

        let token = CancellationToken::new();
        self.pending = Some(token.clone());

        let source = Arc::clone(&self.source);
        let state = Arc::clone(&self.state);
        let latest = Arc::clone(&self.latest);
        let debounce = self.config.debounce;

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(debounce) => {}
            }

            state.send_if_modified(|s| {
                if latest.load(Ordering::SeqCst) != seq {
                    return false;
                }
                s.loading = true;
                s.error = None;
                true
            });

            let outcome = source.search(query.trim()).await;

            state.send_if_modified(|s| {
                if latest.load(Ordering::SeqCst) != seq {
                    debug!(seq, "Discarding stale search response.");
                    return false;
                }
                s.loading = false;
                match outcome {
                    Ok(items) => {
                        s.dropdown_open = !items.is_empty();
                        s.results = items;
                        s.error = None;
                        s.sequence = seq;
                    }
                    Err(e) => {
                        warn!("Search error: {}", e);
                        s.error = Some(source.failure_message().to_string());
                        s.results.clear();
                        s.dropdown_open = false;
                    }
                }
                true
            });
        });
        true
    }

    /// Cancels the pending timer and marks every earlier request stale.
    fn supersede(&mut self) -> u64 {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Picks the result at `index`, closes the dropdown and returns the
    /// normalized value for the parent. Searches still queued or in flight
    /// are dropped.
    pub fn select(&mut self, index: usize) -> Option<S::Selection> {
        let item = self.state.borrow().results.get(index).cloned()?;
        self.supersede();
        let label = self.source.label(&item);
        self.state.send_modify(|s| {
            s.query = label;
            s.dropdown_open = false;
            s.loading = false;
        });
        Some(self.source.normalize(&item))
    }

    /// Closes the dropdown, as a click outside the box does.
    pub fn dismiss(&self) {
        self.state.send_if_modified(|s| std::mem::replace(&mut s.dropdown_open, false));
    }

    /// Reopens the dropdown when there is something to show.
    pub fn focus(&self) {
        self.state.send_if_modified(|s| {
            let open = !s.results.is_empty();
            let changed = s.dropdown_open != open;
            s.dropdown_open = open;
            changed
        });
    }
}

impl<S: SearchSource> Drop for DebouncedSearch<S> {
    fn drop(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
    }
}

//=========================================================================================
// Sources
//=========================================================================================

/// Place autocomplete, biased towards the searcher's approximate position.
pub struct LocationSearchSource {
    locations: Arc<dyn LocationService>,
    near: Option<ApproximateLocation>,
}

impl LocationSearchSource {
    pub fn new(locations: Arc<dyn LocationService>, near: Option<ApproximateLocation>) -> Self {
        Self { locations, near }
    }

    /// Looks up the caller's approximate position first. The search still
    /// works without it.
    pub async fn locate(locations: Arc<dyn LocationService>) -> Self {
        let near = match locations.initial_location().await {
            Ok(near) => Some(near),
            Err(e) => {
                warn!("Failed to get initial location: {}", e);
                None
            }
        };
        Self { locations, near }
    }

    pub fn near(&self) -> Option<&ApproximateLocation> {
        self.near.as_ref()
    }
}

#[async_trait]
impl SearchSource for LocationSearchSource {
    type Item = LocationPrediction;
    type Selection = Location;

    async fn search(&self, query: &str) -> PortResult<Vec<LocationPrediction>> {
        self.locations.search_locations(query, self.near.clone()).await
    }

    fn normalize(&self, item: &LocationPrediction) -> Location {
        item.to_location(self.near.as_ref())
    }

    fn label(&self, item: &LocationPrediction) -> String {
        item.description.clone()
    }

    fn failure_message(&self) -> &'static str {
        "Error searching for locations"
    }
}

/// Free-text provider lookup around a place.
pub struct ProviderSearchSource {
    locations: Arc<dyn LocationService>,
    area: String,
}

impl ProviderSearchSource {
    pub fn new(locations: Arc<dyn LocationService>, area: impl Into<String>) -> Self {
        Self {
            locations,
            area: area.into(),
        }
    }
}

#[async_trait]
impl SearchSource for ProviderSearchSource {
    type Item = ProviderSummary;
    type Selection = ProviderSummary;

    async fn search(&self, query: &str) -> PortResult<Vec<ProviderSummary>> {
        self.locations.search_providers(query, &self.area).await
    }

    fn normalize(&self, item: &ProviderSummary) -> ProviderSummary {
        item.clone()
    }

    fn label(&self, item: &ProviderSummary) -> String {
        item.name.clone()
    }

    fn failure_message(&self) -> &'static str {
        "Error searching for providers"
    }
}

pub type LocationSearch = DebouncedSearch<LocationSearchSource>;
pub type ProviderFinder = DebouncedSearch<ProviderSearchSource>;
