//! crates/event_planner_core/src/validation.rs
//!
//! Form structs for the screens that submit data, and the client-side checks
//! that gate every submission. A form that fails its check never reaches a
//! port, so no network call is made.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use validator::{Validate, ValidateEmail, ValidationErrors};

use crate::domain::{CategoryId, Credentials, Event, EventDraft, Location, NewUser};

//=========================================================================================
// Field Errors
//=========================================================================================

/// Per-field validation messages, keyed by form field name. Only the first
/// message recorded for a field is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn insert(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Drops the message for one field, as a form does when the user edits it.
    pub fn clear_field(&mut self, field: &str) {
        self.0.remove(field);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Merges `other`, keeping messages already present.
    pub fn merge(&mut self, other: FieldErrors) {
        for (field, message) in other.0 {
            self.0.entry(field).or_insert(message);
        }
    }

    fn into_result<T>(self, build: impl FnOnce() -> T) -> Result<T, FieldErrors> {
        if self.is_empty() {
            Ok(build())
        } else {
            Err(self)
        }
    }
}

impl Display for FieldErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(k, v)| format!("{k}: {v}")).collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for FieldErrors {}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut out = FieldErrors::default();
        for (field, list) in errors.field_errors() {
            if let Some(first) = list.first() {
                let message = first
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{field} is invalid"));
                out.insert(field.as_ref(), message);
            }
        }
        out
    }
}

//=========================================================================================
// Shared Checks
//=========================================================================================

fn require(errors: &mut FieldErrors, field: &str, value: &str, message: &str) -> bool {
    if value.trim().is_empty() {
        errors.insert(field, message);
        false
    } else {
        true
    }
}

/// Accepts addresses with a local part, an `@`, and a dotted domain.
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if !email.validate_email() {
        return false;
    }
    match email.rsplit_once('@') {
        Some((_, domain)) => {
            domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    }
}

//=========================================================================================
// Registration
//=========================================================================================

/// Minimum password length enforced before a registration is submitted.
/// The web screen asks for 8 characters, the mobile screen for 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub min_len: usize,
}

impl PasswordPolicy {
    pub const WEB: PasswordPolicy = PasswordPolicy { min_len: 8 };
    pub const MOBILE: PasswordPolicy = PasswordPolicy { min_len: 6 };
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self::WEB
    }
}

#[derive(Debug, Clone, Default, Validate)]
pub struct RegisterForm {
    pub email: String,
    #[validate(length(min = 3, message = "Username must be at least 3 characters"))]
    pub username: String,
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub password_confirm: String,
}

impl RegisterForm {
    pub fn check(&self, policy: PasswordPolicy) -> Result<NewUser, FieldErrors> {
        let mut errors = FieldErrors::default();

        if require(&mut errors, "email", &self.email, "Email is required")
            && !is_valid_email(&self.email)
        {
            errors.insert("email", "Please enter a valid email");
        }
        require(&mut errors, "username", &self.username, "Username is required");
        if require(&mut errors, "password", &self.password, "Password is required")
            && self.password.chars().count() < policy.min_len
        {
            errors.insert(
                "password",
                format!("Password must be at least {} characters", policy.min_len),
            );
        }
        require(
            &mut errors,
            "password_confirm",
            &self.password_confirm,
            "Please confirm your password",
        );

        if let Err(e) = self.validate() {
            errors.merge(e.into());
        }

        errors.into_result(|| NewUser {
            email: self.email.trim().to_string(),
            username: self.username.trim().to_string(),
            password: self.password.clone(),
            password_confirm: self.password_confirm.clone(),
        })
    }
}

//=========================================================================================
// Login
//=========================================================================================

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn check(&self) -> Result<Credentials, FieldErrors> {
        let mut errors = FieldErrors::default();

        if require(&mut errors, "email", &self.email, "Email is required")
            && !is_valid_email(&self.email)
        {
            errors.insert("email", "Please enter a valid email");
        }
        if self.password.is_empty() {
            errors.insert("password", "Password is required");
        }

        errors.into_result(|| Credentials {
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        })
    }
}

//=========================================================================================
// Event Details (wizard step 1 and the edit form)
//=========================================================================================

#[derive(Debug, Clone, Default, Validate)]
pub struct EventDetailsForm {
    #[validate(length(max = 200, message = "Event title must be at most 200 characters"))]
    pub title: String,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub location: Option<Location>,
    pub expected_attendance: u32,
    #[validate(range(min = 0, message = "Budget cannot be negative"))]
    pub budget: i64,
    pub is_public: bool,
}

impl EventDetailsForm {
    /// Prefills the edit form from a stored event.
    pub fn from_event(event: &Event) -> Self {
        Self {
            title: event.title.clone(),
            description: event.description.clone(),
            start_date: Some(event.start_date),
            end_date: event.end_date,
            location: Some(event.location.clone()),
            expected_attendance: event.expected_attendance,
            budget: event.budget,
            is_public: event.is_public,
        }
    }

    /// Validates the form as of `now` and builds the payload for `category`.
    pub fn check(
        &self,
        category: CategoryId,
        now: DateTime<Utc>,
    ) -> Result<EventDraft, FieldErrors> {
        let mut errors = FieldErrors::default();

        require(&mut errors, "title", &self.title, "Event title is required");

        match self.start_date {
            None => errors.insert("start_date", "Event date is required"),
            Some(start) if start < now => {
                errors.insert("start_date", "Event date cannot be in the past")
            }
            Some(start) => {
                if matches!(self.end_date, Some(end) if end < start) {
                    errors.insert("end_date", "End date cannot be before the start date");
                }
            }
        }

        if self.location.is_none() {
            errors.insert("location", "Event location is required");
        }

        if let Err(e) = self.validate() {
            errors.merge(e.into());
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let (Some(start_date), Some(location)) = (self.start_date, self.location.clone()) else {
            return Err(errors);
        };

        Ok(EventDraft {
            title: self.title.trim().to_string(),
            description: self
                .description
                .as_ref()
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            category,
            start_date,
            end_date: self.end_date,
            location,
            expected_attendance: self.expected_attendance,
            budget: self.budget,
            is_public: self.is_public,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn register_form() -> RegisterForm {
        RegisterForm {
            email: "ada@example.com".to_string(),
            username: "ada".to_string(),
            password: "correct horse".to_string(),
            password_confirm: "correct horse".to_string(),
        }
    }

    #[test]
    fn register_accepts_complete_form() {
        let new_user = register_form().check(PasswordPolicy::WEB).unwrap();
        assert_eq!(new_user.email, "ada@example.com");
        assert_eq!(new_user.username, "ada");
    }

    #[test]
    fn register_rejects_mismatched_confirmation() {
        let mut form = register_form();
        form.password_confirm = "correct horsf".to_string();

        let errors = form.check(PasswordPolicy::WEB).unwrap_err();
        assert_eq!(errors.get("password_confirm"), Some("Passwords do not match"));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn register_password_length_follows_policy() {
        let mut form = register_form();
        form.password = "sixsix".to_string();
        form.password_confirm = "sixsix".to_string();

        let errors = form.check(PasswordPolicy::WEB).unwrap_err();
        assert_eq!(
            errors.get("password"),
            Some("Password must be at least 8 characters")
        );
        assert!(form.check(PasswordPolicy::MOBILE).is_ok());
    }

    #[test]
    fn register_reports_required_fields_first() {
        let errors = RegisterForm::default()
            .check(PasswordPolicy::default())
            .unwrap_err();
        assert_eq!(errors.get("email"), Some("Email is required"));
        assert_eq!(errors.get("username"), Some("Username is required"));
        assert_eq!(errors.get("password"), Some("Password is required"));
        assert_eq!(
            errors.get("password_confirm"),
            Some("Please confirm your password")
        );
    }

    #[test]
    fn register_rejects_short_username() {
        let mut form = register_form();
        form.username = "al".to_string();
        let errors = form.check(PasswordPolicy::WEB).unwrap_err();
        assert_eq!(
            errors.get("username"),
            Some("Username must be at least 3 characters")
        );
    }

    #[test]
    fn login_rejects_malformed_emails() {
        for email in ["ada.example.com", "ada@", "ada@example", "@example.com"] {
            let form = LoginForm {
                email: email.to_string(),
                password: "secret".to_string(),
            };
            let errors = form.check().unwrap_err();
            assert_eq!(
                errors.get("email"),
                Some("Please enter a valid email"),
                "{email} should be rejected"
            );
        }
    }

    #[test]
    fn login_requires_password() {
        let form = LoginForm {
            email: "ada@example.com".to_string(),
            password: String::new(),
        };
        let errors = form.check().unwrap_err();
        assert_eq!(errors.get("password"), Some("Password is required"));
        assert!(!errors.contains("email"));
    }

    fn details_form(now: DateTime<Utc>) -> EventDetailsForm {
        EventDetailsForm {
            title: "Launch Party".to_string(),
            start_date: Some(now + Duration::days(7)),
            location: Some(Location::from_description("Central Park")),
            expected_attendance: 50,
            budget: 1000,
            ..Default::default()
        }
    }

    #[test]
    fn details_build_draft() {
        let now = Utc::now();
        let draft = details_form(now).check(3, now).unwrap();
        assert_eq!(draft.title, "Launch Party");
        assert_eq!(draft.category, 3);
        assert_eq!(draft.location.description, "Central Park");
        assert_eq!(draft.expected_attendance, 50);
        assert_eq!(draft.budget, 1000);
        assert_eq!(draft.description, None);
    }

    #[test]
    fn details_reject_past_date_and_missing_fields() {
        let now = Utc::now();
        let form = EventDetailsForm {
            title: "   ".to_string(),
            start_date: Some(now - Duration::hours(1)),
            ..Default::default()
        };
        let errors = form.check(1, now).unwrap_err();
        assert_eq!(errors.get("title"), Some("Event title is required"));
        assert_eq!(
            errors.get("start_date"),
            Some("Event date cannot be in the past")
        );
        assert_eq!(errors.get("location"), Some("Event location is required"));
    }

    #[test]
    fn details_reject_negative_budget() {
        let now = Utc::now();
        let mut form = details_form(now);
        form.budget = -5;
        let errors = form.check(1, now).unwrap_err();
        assert_eq!(errors.get("budget"), Some("Budget cannot be negative"));
    }

    #[test]
    fn details_reject_end_before_start() {
        let now = Utc::now();
        let mut form = details_form(now);
        form.end_date = Some(now + Duration::days(1));
        let errors = form.check(1, now).unwrap_err();
        assert!(errors.contains("end_date"));
    }

    #[test]
    fn edit_form_round_trips_a_stored_event() {
        let now = Utc::now();
        let draft = details_form(now).check(3, now).unwrap();
        let event = Event {
            id: 42,
            title: draft.title.clone(),
            description: None,
            category: 3,
            category_name: Some("Party".to_string()),
            start_date: draft.start_date,
            end_date: None,
            location: draft.location.clone(),
            expected_attendance: 50,
            budget: 1000,
            is_public: true,
            organizer: Some(7),
            organizer_name: Some("ada".to_string()),
            service_providers: Vec::new(),
        };

        let mut form = EventDetailsForm::from_event(&event);
        form.budget = 1500;
        let updated = form.check(event.category, now).unwrap();
        assert_eq!(updated.title, "Launch Party");
        assert_eq!(updated.budget, 1500);
        assert!(updated.is_public);
    }

    #[test]
    fn clearing_a_field_drops_its_message() {
        let mut errors = FieldErrors::default();
        errors.insert("title", "Event title is required");
        errors.insert("title", "ignored");
        assert_eq!(errors.get("title"), Some("Event title is required"));
        errors.clear_field("title");
        assert!(errors.is_empty());
    }
}
