pub mod auth;
pub mod csrf;
pub mod events;
pub mod http;
pub mod location;
pub mod storage;

pub use auth::HttpAuthAdapter;
pub use csrf::CsrfToken;
pub use events::HttpEventAdapter;
pub use http::ApiClient;
pub use location::HttpLocationAdapter;
pub use storage::FileSessionStore;
