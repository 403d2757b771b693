pub mod browse;
pub mod domain;
pub mod ports;
pub mod sanitize;
pub mod search;
pub mod session;
pub mod validation;
pub mod wizard;

pub use browse::{browse, EventPage, EventQuery, SortOrder};
pub use domain::{
    ApproximateLocation, Category, CategoryId, Credentials, Event, EventDraft, EventId, Location,
    LocationPrediction, NewUser, ProviderDetail, ProviderQuery, ProviderSearch, ProviderSource,
    ProviderSummary, Session, User, UserId,
};
pub use ports::{AuthService, EventService, LocationService, PortError, PortResult, SessionStore};
pub use search::{
    DebouncedSearch, LocationSearch, LocationSearchSource, ProviderFinder, ProviderSearchSource,
    SearchConfig, SearchSnapshot, SearchSource,
};
pub use session::{LogoutOutcome, SessionError, SessionManager};
pub use validation::{EventDetailsForm, FieldErrors, LoginForm, PasswordPolicy, RegisterForm};
pub use wizard::{BackTarget, EventWizard, WizardError, WizardOutcome, WizardState};
