//! # REST API Interface Layer
//!
//! Provides HTTP REST endpoints for the finance tracker.
//!
//! ## Key Responsibilities
//!
//! - **API Endpoints**: JSON interfaces for auth, bills and the ledger
//! - **Sessions**: Resolving the bearer token to the signed-in user
//! - **Error Handling**: Converting domain errors to HTTP status codes
//! - **Logging**: One request log line per call
//!
//! Handlers contain no business logic; they translate and delegate.

pub mod auth_apis;
pub mod bill_apis;
pub mod errors;
pub mod ledger_apis;
pub mod mappers;
pub mod session;

pub use auth_apis::*;
pub use bill_apis::*;
pub use ledger_apis::*;
