//! Error types shared by the domain services.
use shared::BillValidationError;
use thiserror::Error;

/// Failures reported by an identity provider
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Please fill in email and password")]
    MissingCredentials,
    #[error("Please enter your name")]
    MissingName,
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("An account already exists for {0}")]
    EmailAlreadyRegistered(String),
    #[error("Session is not valid")]
    InvalidSession,
    #[error("Identity provider error: {0}")]
    Provider(String),
}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not signed in")]
    NotAuthenticated,
    #[error("Please fill in all fields")]
    InvalidForm(Vec<BillValidationError>),
    #[error("Bill not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("Store error: {0}")]
    Store(#[from] anyhow::Error),
    #[error("Ledger is not available yet")]
    LedgerUnavailable,
}

pub type DomainResult<T> = std::result::Result<T, DomainError>;
