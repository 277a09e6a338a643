//! # REST API for Authentication
//!
//! Endpoints for signing up, signing in and out, and reading the current user.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use tracing::info;

use crate::io::rest::errors::ApiError;
use crate::io::rest::session::Session;
use crate::AppState;
use shared::{AuthResponse, CurrentUserResponse, MessageResponse, SignInRequest, SignUpRequest};

/// Register a new account and open a session
pub async fn sign_up(
    State(state): State<AppState>,
    Json(request): Json<SignUpRequest>,
) -> impl IntoResponse {
    info!("POST /api/auth/sign-up - email: {}", request.email);

    match state
        .auth_service
        .sign_up(&request.name, &request.email, &request.password)
        .await
    {
        Ok((identity, _profile)) => {
            let response = AuthResponse {
                user_id: identity.user_id,
                email: identity.email,
                session_token: identity.session_token,
                success_message: "Registration successful".to_string(),
            };
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(e) => ApiError::new(e, "register").into_response(),
    }
}

pub async fn sign_in(
    State(state): State<AppState>,
    Json(request): Json<SignInRequest>,
) -> impl IntoResponse {
    info!("POST /api/auth/sign-in - email: {}", request.email);

    match state.auth_service.sign_in(&request.email, &request.password).await {
        Ok(identity) => {
            let response = AuthResponse {
                user_id: identity.user_id,
                email: identity.email,
                session_token: identity.session_token,
                success_message: "Login successful".to_string(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => ApiError::new(e, "sign in").into_response(),
    }
}

/// Close the caller's session and stop their ledger watch
pub async fn sign_out(
    State(state): State<AppState>,
    Session(identity): Session,
) -> impl IntoResponse {
    info!("POST /api/auth/sign-out - user: {}", identity.user_id);

    match state.auth_service.sign_out(&identity.session_token).await {
        Ok(()) => {
            state.ledger_service.release(&identity.user_id);
            let response = MessageResponse {
                message: "Signed out".to_string(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => ApiError::new(e, "sign out").into_response(),
    }
}

pub async fn current_user(
    State(state): State<AppState>,
    Session(identity): Session,
) -> impl IntoResponse {
    info!("GET /api/auth/me - user: {}", identity.user_id);

    match state.auth_service.get_profile(&identity.user_id).await {
        Ok(profile) => {
            let response = CurrentUserResponse {
                user_id: identity.user_id,
                email: identity.email,
                name: profile.map(|p| p.name),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => ApiError::new(e, "load profile").into_response(),
    }
}
