//! # REST API for the Ledger
//!
//! Serves the caller's latest ledger with running balances.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use tracing::info;

use crate::io::rest::errors::ApiError;
use crate::io::rest::mappers::BillMapper;
use crate::io::rest::session::Session;
use crate::AppState;

pub async fn get_ledger(
    State(state): State<AppState>,
    Session(identity): Session,
) -> impl IntoResponse {
    info!("GET /api/ledger - user: {}", identity.user_id);

    match state.ledger_service.current(&identity.user_id).await {
        Ok(view) => (StatusCode::OK, Json(BillMapper::ledger_to_response(view))).into_response(),
        Err(e) => ApiError::new(e, "load ledger").into_response(),
    }
}
