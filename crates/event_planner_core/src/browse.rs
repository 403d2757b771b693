//! crates/event_planner_core/src/browse.rs
//!
//! Client-side filtering, sorting and paging for the public event list.

use std::cmp::Ordering;

use crate::domain::Event;

pub const PER_PAGE: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    DateAsc,
    #[default]
    DateDesc,
    TitleAsc,
    TitleDesc,
}

impl SortOrder {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "date-asc" => Some(Self::DateAsc),
            "date-desc" => Some(Self::DateDesc),
            "title-asc" => Some(Self::TitleAsc),
            "title-desc" => Some(Self::TitleDesc),
            _ => None,
        }
    }

    fn compare(self, a: &Event, b: &Event) -> Ordering {
        match self {
            Self::DateAsc => a.start_date.cmp(&b.start_date),
            Self::DateDesc => b.start_date.cmp(&a.start_date),
            Self::TitleAsc => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            Self::TitleDesc => b.title.to_lowercase().cmp(&a.title.to_lowercase()),
        }
    }
}

/// Browse controls. Changing the search text or sort order goes back to the
/// first page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    search: String,
    sort: SortOrder,
    page: usize,
}

impl Default for EventQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            sort: SortOrder::default(),
            page: 1,
        }
    }
}

impl EventQuery {
    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn sort(&self) -> SortOrder {
        self.sort
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
        self.page = 1;
    }

    pub fn set_sort(&mut self, sort: SortOrder) {
        self.sort = sort;
        self.page = 1;
    }

    /// Page numbers start at 1. Out of range pages are clamped when browsing.
    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    fn matches(&self, event: &Event) -> bool {
        let needle = self.search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        let contains = |field: Option<&str>| {
            field
                .map(|f| f.to_lowercase().contains(&needle))
                .unwrap_or(false)
        };
        contains(Some(&event.title))
            || contains(event.category_name.as_deref())
            || contains(event.organizer_name.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventPage {
    pub events: Vec<Event>,
    pub page: usize,
    pub total_pages: usize,
    /// Number of events that matched the search, across all pages.
    pub total: usize,
    /// 1-based position of the first event on this page; 0 when empty.
    pub first_index: usize,
    pub last_index: usize,
}

impl EventPage {
    pub fn summary(&self) -> String {
        format!(
            "Showing {}-{} of {} events",
            self.first_index, self.last_index, self.total
        )
    }
}

pub fn browse(events: &[Event], query: &EventQuery) -> EventPage {
    let mut matched: Vec<&Event> = events.iter().filter(|e| query.matches(e)).collect();
    matched.sort_by(|a, b| query.sort.compare(a, b));

    let total = matched.len();
    let total_pages = total.div_ceil(PER_PAGE).max(1);
    let page = query.page.clamp(1, total_pages);
    let start = (page - 1) * PER_PAGE;
    let end = (start + PER_PAGE).min(total);

    let page_events: Vec<Event> = matched[start..end].iter().map(|e| (*e).clone()).collect();
    let (first_index, last_index) = if page_events.is_empty() {
        (0, 0)
    } else {
        (start + 1, end)
    };

    EventPage {
        events: page_events,
        page,
        total_pages,
        total,
        first_index,
        last_index,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Location;
    use chrono::{Duration, TimeZone, Utc};

    fn event(id: i64, title: &str, day: i64, category: &str, organizer: &str) -> Event {
        Event {
            id,
            title: title.to_string(),
            description: None,
            category: 1,
            category_name: Some(category.to_string()),
            start_date: Utc.with_ymd_and_hms(2030, 1, 1, 18, 0, 0).unwrap() + Duration::days(day),
            end_date: None,
            location: Location::from_description("Hall"),
            expected_attendance: 10,
            budget: 0,
            is_public: true,
            organizer: Some(1),
            organizer_name: Some(organizer.to_string()),
            service_providers: Vec::new(),
        }
    }

    fn catalogue() -> Vec<Event> {
        (0..14)
            .map(|i| {
                let category = if i % 2 == 0 { "Music" } else { "Tech" };
                event(i, &format!("Event {i:02}"), i, category, "ada")
            })
            .collect()
    }

    #[test]
    fn defaults_to_newest_first() {
        let page = browse(&catalogue(), &EventQuery::default());
        assert_eq!(page.events.len(), PER_PAGE);
        assert_eq!(page.events[0].id, 13);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.summary(), "Showing 1-6 of 14 events");
    }

    #[test]
    fn last_page_is_partial_and_out_of_range_is_clamped() {
        let mut query = EventQuery::default();
        query.set_sort(SortOrder::DateAsc);
        query.set_page(9);
        let page = browse(&catalogue(), &query);
        assert_eq!(page.page, 3);
        assert_eq!(page.events.len(), 2);
        assert_eq!((page.first_index, page.last_index), (13, 14));
    }

    #[test]
    fn search_matches_title_category_and_organizer() {
        let mut events = catalogue();
        events.push(event(99, "Garden Party", 1, "Social", "Grace Hopper"));

        let mut query = EventQuery::default();
        query.set_search("tech");
        assert_eq!(browse(&events, &query).total, 7);

        query.set_search("HOPPER");
        let page = browse(&events, &query);
        assert_eq!(page.total, 1);
        assert_eq!(page.events[0].id, 99);
    }

    #[test]
    fn changing_filters_resets_page() {
        let mut query = EventQuery::default();
        query.set_page(3);
        query.set_search("music");
        assert_eq!(query.page(), 1);
        query.set_page(2);
        query.set_sort(SortOrder::TitleDesc);
        assert_eq!(query.page(), 1);
    }

    #[test]
    fn title_sort_ignores_case() {
        let events = vec![
            event(1, "banana", 0, "x", "y"),
            event(2, "Apple", 0, "x", "y"),
            event(3, "cherry", 0, "x", "y"),
        ];
        let mut query = EventQuery::default();
        query.set_sort(SortOrder::TitleAsc);
        let ids: Vec<i64> = browse(&events, &query).events.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn empty_result_reports_zero_range() {
        let mut query = EventQuery::default();
        query.set_search("nothing matches");
        let page = browse(&catalogue(), &query);
        assert!(page.events.is_empty());
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.summary(), "Showing 0-0 of 0 events");
    }
}
