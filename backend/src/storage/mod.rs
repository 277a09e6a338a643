//! # Storage Module
//!
//! Handles all data persistence for the finance tracker.
//!
//! The domain layer only sees the traits in [`traits`]; the concrete backends
//! can be swapped without touching services or the REST layer.
//!
//! ## Current Implementation
//!
//! - **Bills and profiles**: per-user directory with a `bills.csv` collection
//!   and a `profile.yaml` record ([`csv`])
//! - **Identity**: in-memory accounts and sessions for development and tests
//!   ([`identity`])

pub mod csv;
pub mod identity;
pub mod traits;

pub use self::csv::CsvConnection;
pub use self::identity::InMemoryIdentityProvider;
pub use traits::*;
