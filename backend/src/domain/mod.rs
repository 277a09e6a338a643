//! # Domain Module
//!
//! Contains the business logic of the finance tracker: how a typed bill
//! becomes a signed value, and how a user's bills become a ledger with
//! running balances. It works against the storage traits only.
//!
//! ## Module Organization
//!
//! - **bill_normalizer**: Signs a user-entered magnitude by category
//! - **ledger**: Running-balance accumulation over date-ordered bills
//! - **bill_form**: Bill form parsing and validation
//! - **bill_service**: Create, replace, delete and fetch bills
//! - **ledger_service**: Live ledger per signed-in user
//! - **auth_service**: Sign-up, sign-in and session lookup
//!
//! ## Business Rules
//!
//! - Expenses are stored negative, income positive; zero stays zero
//! - Bills are ordered by calendar date, same-day bills by creation time
//! - The running balance after a bill is the sum of every value up to it
//! - A user only ever sees and changes their own bills

pub mod auth_service;
pub mod bill_form;
pub mod bill_normalizer;
pub mod bill_service;
pub mod errors;
pub mod ledger;
pub mod ledger_service;
pub mod models;

pub use auth_service::AuthService;
pub use bill_form::BillFormService;
pub use bill_service::BillService;
pub use errors::{AuthError, DomainError, DomainResult};
pub use ledger_service::{LedgerService, LedgerView};
