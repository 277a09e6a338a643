//! # Finance Tracker Backend
//!
//! Personal finance tracking: users record dated expenses and income, and get
//! a chronological ledger with a running balance after every bill.
//!
//! ## Architecture
//!
//! ```text
//! HTTP clients
//!     ↓
//! IO Layer (REST handlers, sessions, DTO mapping)
//!     ↓
//! Domain Layer (form validation, normalizer, ledger, services)
//!     ↓
//! Storage Layer (CSV files per user, identity provider)
//! ```
//!
//! ## Key Responsibilities
//!
//! - Initialize the storage backends and services from [`AppConfig`]
//! - Set up the REST API router with CORS
//! - Keep each signed-in user's ledger current from the store's live query

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use anyhow::{Context, Result};
use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

pub use config::AppConfig;

use crate::domain::{AuthService, BillFormService, BillService, LedgerService};
use crate::storage::{Connection, CsvConnection, IdentityProvider, InMemoryIdentityProvider};

/// Bill store used by the running server
pub type BillRepository = <CsvConnection as Connection>::BillRepository;

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub bill_service: Arc<BillService<BillRepository>>,
    pub ledger_service: Arc<LedgerService<BillRepository>>,
}

impl AppState {
    /// Wire services to a storage connection and an identity provider
    pub fn new(
        connection: CsvConnection,
        identity_provider: Arc<dyn IdentityProvider>,
        ledger_timeout: Duration,
    ) -> Self {
        let auth_service = AuthService::new(
            identity_provider,
            Arc::new(connection.create_profile_repository()),
        );
        let bill_service = BillService::new(connection.create_bill_repository(), BillFormService::new());
        let ledger_service = LedgerService::with_timeout(connection.create_bill_repository(), ledger_timeout);

        Self {
            auth_service,
            bill_service: Arc::new(bill_service),
            ledger_service: Arc::new(ledger_service),
        }
    }
}

/// Initialize the backend with all required services
pub async fn initialize_backend(config: &AppConfig) -> Result<AppState> {
    info!("Setting up storage");
    let data_directory = config.data_directory()?;
    let connection = CsvConnection::new(&data_directory)?;

    info!("Setting up identity provider");
    let identity_provider: Arc<dyn IdentityProvider> = Arc::new(InMemoryIdentityProvider::new());

    info!("Setting up application state");
    Ok(AppState::new(connection, identity_provider, config.ledger_timeout()))
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState, cors_origin: &str) -> Result<Router> {
    let origin = cors_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid CORS origin '{}'", cors_origin))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/auth/sign-up", post(io::rest::sign_up))
        .route("/auth/sign-in", post(io::rest::sign_in))
        .route("/auth/sign-out", post(io::rest::sign_out))
        .route("/auth/me", get(io::rest::current_user))
        .route("/bills", post(io::rest::create_bill))
        .route("/bills/validate", post(io::rest::validate_bill))
        .route(
            "/bills/:id",
            get(io::rest::get_bill)
                .put(io::rest::update_bill)
                .delete(io::rest::delete_bill),
        )
        .route("/ledger", get(io::rest::get_ledger));

    Ok(Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .with_state(app_state))
}
