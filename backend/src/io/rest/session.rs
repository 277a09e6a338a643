//! Bearer-token session extraction.
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::domain::errors::DomainError;
use crate::domain::models::user::Identity;
use crate::io::rest::errors::ApiError;
use crate::AppState;

/// The signed-in caller, resolved from `Authorization: Bearer <token>`.
///
/// Handlers taking a `Session` reject unauthenticated requests with 401
/// before any domain call is made.
#[derive(Debug, Clone)]
pub struct Session(pub Identity);

pub fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| ApiError::new(DomainError::NotAuthenticated, "authenticate"))?;
        let identity = state
            .auth_service
            .current_identity(token)
            .await
            .map_err(|e| ApiError::new(e, "authenticate"))?;
        Ok(Session(identity))
    }
}
