//! services/client/src/bin/planner.rs

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use client_lib::{config::Config, error::ClientError, state::AppState};
use event_planner_core::browse::{EventQuery, SortOrder};
use event_planner_core::domain::{Event, Location, ProviderSource};
use event_planner_core::search::{DebouncedSearch, SearchSnapshot, SearchSource};
use event_planner_core::session::SessionError;
use event_planner_core::validation::{EventDetailsForm, LoginForm, RegisterForm};
use event_planner_core::wizard::WizardState;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "planner")]
#[command(about = "Plan events against the event planner backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and remember the session
    Login { email: String, password: String },
    /// Create an account and log in
    Register {
        email: String,
        username: String,
        password: String,
        confirm: String,
    },
    /// Show the logged-in profile
    Whoami,
    /// List event categories
    Categories,
    /// List your own events
    Events,
    /// Browse every public event
    Browse {
        search: Option<String>,
        #[arg(long, default_value = "date-desc", value_parser = parse_sort)]
        sort: SortOrder,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Create an event and attach service providers to it
    Create {
        #[arg(long)]
        category: i64,
        #[arg(long)]
        title: String,
        /// Start date, RFC 3339
        #[arg(long, value_parser = parse_date)]
        date: DateTime<Utc>,
        /// Place to search for; the first match is used
        #[arg(long)]
        location: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, default_value_t = 0)]
        attendance: u32,
        #[arg(long, default_value_t = 0)]
        budget: i64,
        #[arg(long)]
        public: bool,
        /// Name of a suggested provider to save, repeatable
        #[arg(long = "provider")]
        providers: Vec<String>,
        /// Provider directory the picks are recorded against
        #[arg(long, default_value = "RAPIDAPI", value_parser = parse_source)]
        source: ProviderSource,
    },
    /// Search places
    Places { query: String },
    /// Search service providers around a place
    Providers {
        query: String,
        #[arg(long)]
        area: String,
    },
    /// Show one event with its service providers
    Show { id: i64 },
    /// Change an existing event
    Edit {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, value_parser = parse_date)]
        date: Option<DateTime<Utc>>,
        #[arg(long)]
        attendance: Option<u32>,
        #[arg(long)]
        budget: Option<i64>,
        /// Detach every service provider from the event
        #[arg(long)]
        clear_providers: bool,
    },
    /// Delete one of your events
    Delete { id: i64 },
    /// Ask the backend for a fresh session cookie
    Refresh,
    /// Log out, locally even if the backend is unreachable
    Logout,
}

fn parse_sort(value: &str) -> Result<SortOrder, String> {
    SortOrder::parse(value)
        .ok_or_else(|| "expected date-asc, date-desc, title-asc or title-desc".to_string())
}

fn parse_source(value: &str) -> Result<ProviderSource, String> {
    ProviderSource::parse(value).ok_or_else(|| "expected YELP, GOOGLE or RAPIDAPI".to_string())
}

fn parse_date(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    let cli = Cli::parse();

    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!(base_url = %config.endpoints.base_url, "Configuration loaded.");

    // --- 2. Build the Shared State & Restore the Session ---
    let state = AppState::build(config)?;
    state.sessions.restore().await;

    // --- 3. Run the Command ---
    let wait = state.config.search.debounce + state.config.request_timeout;
    match cli.command {
        Commands::Login { email, password } => {
            let session = state.sessions.login(&LoginForm { email, password }).await?;
            println!("Logged in as {}", session.user.username);
        }
        Commands::Register {
            email,
            username,
            password,
            confirm,
        } => {
            let form = RegisterForm {
                email,
                username,
                password,
                password_confirm: confirm,
            };
            let session = state.sessions.register(&form).await?;
            println!("Welcome, {}", session.user.username);
        }
        Commands::Whoami => {
            let user = state.sessions.current_user().await?;
            println!("{} <{}> {}", user.username, user.email, user.role.unwrap_or_default());
        }
        Commands::Categories => {
            let categories = state.sessions.guard(state.events.categories().await).await?;
            for category in categories {
                println!("{:>4}  {}", category.id, category.name);
            }
        }
        Commands::Events => {
            for event in state.my_events().await? {
                print_event(&event);
            }
        }
        Commands::Browse { search, sort, page } => {
            let mut query = EventQuery::default();
            query.set_search(search.unwrap_or_default());
            query.set_sort(sort);
            query.set_page(page);
            let page = state.browse_events(&query).await?;
            for event in &page.events {
                print_event(event);
            }
            println!("{} (page {} of {})", page.summary(), page.page, page.total_pages);
        }
        Commands::Create {
            category,
            title,
            date,
            location,
            description,
            attendance,
            budget,
            public,
            providers,
            source,
        } => {
            let place = {
                let mut search = state.location_search().await;
                settle(&mut search, &location, wait).await;
                search
                    .select(0)
                    .unwrap_or_else(|| Location::from_description(location.clone()))
            };

            let mut wizard = state.wizard(category).await?.with_provider_source(source);
            {
                let details = wizard.details_mut();
                details.title = title;
                details.description = description;
                details.start_date = Some(date);
                details.expected_attendance = attendance;
                details.budget = budget;
                details.is_public = public;
            }
            wizard.set_location(place);

            let created = wizard.next(Utc::now()).await.clone();
            state.expire_if_rejected(&wizard).await;
            match created {
                WizardState::SelectingProviders { event } => {
                    println!("Created event {} ({})", event.id, event.title)
                }
                WizardState::Error { message } => return Err(ClientError::Internal(message)),
                _ => {
                    for (field, message) in wizard.field_errors().iter() {
                        eprintln!("{field}: {message}");
                    }
                    return Err(ClientError::Usage("event details are invalid".to_string()));
                }
            }

            if !providers.is_empty() {
                wizard.load_providers().await;
                if state.expire_if_rejected(&wizard).await {
                    return Err(ClientError::Session(SessionError::Expired));
                }
                if let Some(message) = wizard.provider_error() {
                    eprintln!("{message}");
                }
                if let Some(warning) = wizard.provider_warning() {
                    eprintln!("{warning}");
                }
                for name in &providers {
                    if !wizard.toggle_provider(name) {
                        eprintln!("No suggested provider is called {name}");
                    }
                }
            }

            let finished = wizard.finish().await.clone();
            state.expire_if_rejected(&wizard).await;
            match finished {
                WizardState::Done(outcome) => {
                    println!("{}", outcome.notice);
                    println!("Saved {} service provider(s)", outcome.saved_providers);
                    if let Some(warning) = &outcome.warning {
                        eprintln!("{warning}");
                    }
                }
                WizardState::Error { message } => return Err(ClientError::Internal(message)),
                other => return Err(ClientError::Internal(format!("unexpected state {other:?}"))),
            }
        }
        Commands::Places { query } => {
            let mut search = state.location_search().await;
            let snapshot = settle(&mut search, &query, wait).await;
            report(&snapshot, |p| p.description.clone());
        }
        Commands::Providers { query, area } => {
            let mut search = state.provider_finder(&area);
            let snapshot = settle(&mut search, &query, wait).await;
            report(&snapshot, |p| format!("{} ({:.1}) {}", p.name, p.rating, p.address));
        }
        Commands::Show { id } => {
            let event = state.sessions.guard(state.events.get_event(id).await).await?;
            print_event(&event);
            if let Some(description) = &event.description {
                println!("      {description}");
            }
            println!(
                "      {} guests, budget {}, organized by {}",
                event.expected_attendance,
                event.budget,
                event.organizer_name.as_deref().unwrap_or("-")
            );
            for provider in &event.service_providers {
                println!("      - {} {} {}", provider.name, provider.phone, provider.address);
            }
        }
        Commands::Edit {
            id,
            title,
            date,
            attendance,
            budget,
            clear_providers,
        } => {
            let event = state.sessions.guard(state.events.get_event(id).await).await?;
            let mut form = EventDetailsForm::from_event(&event);
            if let Some(title) = title {
                form.title = title;
            }
            if date.is_some() {
                form.start_date = date;
            }
            if let Some(attendance) = attendance {
                form.expected_attendance = attendance;
            }
            if let Some(budget) = budget {
                form.budget = budget;
            }

            let draft = form.check(event.category, Utc::now()).map_err(|errors| {
                for (field, message) in errors.iter() {
                    eprintln!("{field}: {message}");
                }
                ClientError::Usage("event details are invalid".to_string())
            })?;
            state
                .sessions
                .guard(state.events.update_event(id, &draft).await)
                .await?;
            if clear_providers {
                state
                    .sessions
                    .guard(state.events.clear_providers(id).await)
                    .await?;
            }
            println!("Event updated successfully!");
        }
        Commands::Delete { id } => {
            state.sessions.guard(state.events.delete_event(id).await).await?;
            println!("Deleted event {id}");
        }
        Commands::Refresh => {
            state.sessions.refresh_token().await?;
            println!("Session refreshed");
        }
        Commands::Logout => {
            let outcome = state.sessions.logout().await;
            if outcome.server_acknowledged {
                println!("Logged out");
            } else {
                println!("Logged out locally; the server could not be reached");
            }
        }
    }

    Ok(())
}

/// Types `query` into the search box and waits up to `wait` for the search
/// to settle. Queries too short to be sent return straight away.
async fn settle<S: SearchSource>(
    search: &mut DebouncedSearch<S>,
    query: &str,
    wait: Duration,
) -> SearchSnapshot<S::Item> {
    let mut updates = search.subscribe();
    if !search.input(query) {
        return search.snapshot();
    }
    let settled = async {
        loop {
            {
                let current = updates.borrow_and_update();
                if current.sequence > 0 || current.error.is_some() {
                    return;
                }
            }
            if updates.changed().await.is_err() {
                return;
            }
        }
    };
    if tokio::time::timeout(wait, settled).await.is_err() {
        info!(query, "Search did not settle in time.");
    }
    search.snapshot()
}

fn report<T>(snapshot: &SearchSnapshot<T>, line: impl Fn(&T) -> String) {
    if let Some(error) = &snapshot.error {
        eprintln!("{error}");
        return;
    }
    if snapshot.results.is_empty() {
        println!("No results");
    }
    for (i, item) in snapshot.results.iter().enumerate() {
        println!("{:>2}. {}", i + 1, line(item));
    }
}

fn print_event(event: &Event) {
    println!(
        "{:>4}  {}  {}  {}  {}",
        event.id,
        event.start_date.format("%Y-%m-%d %H:%M"),
        event.title,
        event.category_name.as_deref().unwrap_or("-"),
        event.location.description
    );
}
