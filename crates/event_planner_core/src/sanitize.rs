//! crates/event_planner_core/src/sanitize.rs
//!
//! Turns loosely-formatted provider search results into records that fit the
//! backend's provider columns.

use std::sync::OnceLock;

use regex::Regex;
use validator::ValidateUrl;

use crate::domain::{ProviderDetail, ProviderSource, ProviderSummary};

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_ADDRESS_LEN: usize = 255;
pub const MAX_PHONE_LEN: usize = 20;
pub const MAX_WEBSITE_LEN: usize = 200;
pub const MAX_EXTERNAL_ID_LEN: usize = 100;

fn phone_noise() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^0-9+()\-.\s]").expect("valid phone pattern"))
}

fn whitespace_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace pattern"))
}

/// Truncates to at most `max` characters (not bytes).
pub fn truncate_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

/// Keeps digits and phone punctuation, collapses whitespace, and caps the
/// result at `MAX_PHONE_LEN` characters.
///
/// `"(555) 123-4567 ext 9999999999"` becomes `"(555) 123-4567 99999"`.
pub fn sanitize_phone(raw: &str) -> String {
    let stripped = phone_noise().replace_all(raw, "");
    let collapsed = whitespace_runs().replace_all(stripped.trim(), " ");
    truncate_chars(&collapsed, MAX_PHONE_LEN).trim_end().to_string()
}

/// Returns an absolute URL of at most `MAX_WEBSITE_LEN` characters, or `None`
/// when nothing usable is left.
pub fn sanitize_website(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_ascii_lowercase();
    let absolute = if lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };
    let capped = truncate_chars(&absolute, MAX_WEBSITE_LEN);
    capped.validate_url().then_some(capped)
}

/// Builds the persistable record for a selected provider.
pub fn sanitize_provider(summary: &ProviderSummary, source: ProviderSource) -> ProviderDetail {
    let rating = if summary.rating.is_finite() {
        summary.rating.clamp(0.0, 5.0)
    } else {
        0.0
    };

    ProviderDetail {
        name: truncate_chars(summary.name.trim(), MAX_NAME_LEN),
        address: truncate_chars(summary.address.trim(), MAX_ADDRESS_LEN),
        phone: summary
            .phone_number
            .as_deref()
            .map(sanitize_phone)
            .unwrap_or_default(),
        website: summary.website.as_deref().and_then(sanitize_website),
        rating,
        review_count: summary.user_rating_count,
        tags: summary
            .tags
            .iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect(),
        description: summary
            .description
            .as_ref()
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty()),
        external_id: summary
            .place_id
            .as_deref()
            .map(|id| truncate_chars(id, MAX_EXTERNAL_ID_LEN)),
        api_source: source,
    }
}
