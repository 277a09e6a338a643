//! Translation of domain errors into HTTP responses.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use shared::ErrorResponse;
use tracing::error;

use crate::domain::bill_form::BillFormService;
use crate::domain::errors::{AuthError, DomainError};

/// A failed request: status plus the JSON body sent to the client
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    /// Map a domain error; `action` names what failed for server-side errors,
    /// e.g. "add bill" becomes "Failed to add bill"
    pub fn new(err: DomainError, action: &str) -> Self {
        let (status, error, details) = match err {
            DomainError::NotAuthenticated => (StatusCode::UNAUTHORIZED, err.to_string(), Vec::new()),
            DomainError::InvalidForm(ref errors) => {
                let form_service = BillFormService::new();
                let details = errors.iter().map(|e| form_service.error_message(e)).collect();
                (StatusCode::UNPROCESSABLE_ENTITY, err.to_string(), details)
            }
            DomainError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string(), Vec::new()),
            DomainError::Auth(ref auth) => (auth_status(auth), err.to_string(), Vec::new()),
            DomainError::Store(ref e) => {
                error!("Failed to {}: {:#}", action, e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Failed to {}", action),
                    vec![e.to_string()],
                )
            }
            DomainError::LedgerUnavailable => (StatusCode::SERVICE_UNAVAILABLE, err.to_string(), Vec::new()),
        };
        Self {
            status,
            body: ErrorResponse { error, details },
        }
    }
}

fn auth_status(err: &AuthError) -> StatusCode {
    match err {
        AuthError::InvalidCredentials | AuthError::InvalidSession => StatusCode::UNAUTHORIZED,
        AuthError::EmailAlreadyRegistered(_) => StatusCode::CONFLICT,
        AuthError::MissingCredentials | AuthError::MissingName | AuthError::InvalidEmail(_) => {
            StatusCode::BAD_REQUEST
        }
        AuthError::Provider(_) => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
