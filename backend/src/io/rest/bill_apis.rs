//! # REST API for Bills
//!
//! Endpoints for adding, editing, deleting and validating the caller's bills.
//! Every write goes to the store only; the ledger picks changes up from the
//! store's live query.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use tracing::info;

use crate::io::rest::errors::ApiError;
use crate::io::rest::mappers::BillMapper;
use crate::io::rest::session::Session;
use crate::AppState;
use shared::{BillFormRequest, BillMutationResponse};

/// Get one bill, e.g. to prefill the edit form
pub async fn get_bill(
    State(state): State<AppState>,
    Session(identity): Session,
    Path(bill_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/bills/{}", bill_id);

    match state.bill_service.get_bill(&identity.user_id, &bill_id).await {
        Ok(bill) => (StatusCode::OK, Json(BillMapper::to_dto(bill))).into_response(),
        Err(e) => ApiError::new(e, "load bill").into_response(),
    }
}

pub async fn create_bill(
    State(state): State<AppState>,
    Session(identity): Session,
    Json(request): Json<BillFormRequest>,
) -> impl IntoResponse {
    info!("POST /api/bills - request: {:?}", request);

    match state.bill_service.submit_bill(&identity.user_id, None, &request).await {
        Ok(bill) => {
            let response = BillMutationResponse {
                bill: Some(BillMapper::to_dto(bill)),
                success_message: "Bill added successfully".to_string(),
            };
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(e) => ApiError::new(e, "add bill").into_response(),
    }
}

/// Replace an existing bill with the submitted form
pub async fn update_bill(
    State(state): State<AppState>,
    Session(identity): Session,
    Path(bill_id): Path<String>,
    Json(request): Json<BillFormRequest>,
) -> impl IntoResponse {
    info!("PUT /api/bills/{} - request: {:?}", bill_id, request);

    match state
        .bill_service
        .submit_bill(&identity.user_id, Some(&bill_id), &request)
        .await
    {
        Ok(bill) => {
            let response = BillMutationResponse {
                bill: Some(BillMapper::to_dto(bill)),
                success_message: "Bill updated successfully".to_string(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => ApiError::new(e, "update bill").into_response(),
    }
}

pub async fn delete_bill(
    State(state): State<AppState>,
    Session(identity): Session,
    Path(bill_id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/bills/{}", bill_id);

    match state.bill_service.delete_bill(&identity.user_id, &bill_id).await {
        Ok(()) => {
            let response = BillMutationResponse {
                bill: None,
                success_message: "Bill deleted successfully".to_string(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => ApiError::new(e, "delete bill").into_response(),
    }
}

/// Check a bill form without storing anything
pub async fn validate_bill(
    State(state): State<AppState>,
    Json(request): Json<BillFormRequest>,
) -> impl IntoResponse {
    info!("POST /api/bills/validate - request: {:?}", request);

    let validation = state.bill_service.form_service().validate(&request);
    (StatusCode::OK, Json(validation))
}
