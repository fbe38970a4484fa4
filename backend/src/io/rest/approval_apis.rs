//! # REST API for Approvals
//!
//! Operators accept or reject pending transactions. Both endpoints are safe
//! to retry: deciding a transaction the same way twice returns it unchanged.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use log::info;

use crate::domain::models::actor::Actor;
use crate::io::rest::errors::error_response;
use crate::io::rest::mappers::TransactionMapper;
use crate::AppState;
use shared::RejectTransactionRequest;

pub async fn approve_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
    actor: Actor,
) -> impl IntoResponse {
    info!("POST /api/transactions/{}/approve by {}", transaction_id, actor.id);

    match state.approval_service.approve(&transaction_id, &actor).await {
        Ok(transaction) => {
            (StatusCode::OK, Json(TransactionMapper::to_dto(transaction))).into_response()
        }
        Err(e) => error_response("Failed to approve transaction", e),
    }
}

pub async fn reject_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
    actor: Actor,
    Json(request): Json<RejectTransactionRequest>,
) -> impl IntoResponse {
    info!("POST /api/transactions/{}/reject by {}", transaction_id, actor.id);

    match state
        .approval_service
        .reject(&transaction_id, &actor, &request.reason)
        .await
    {
        Ok(transaction) => {
            (StatusCode::OK, Json(TransactionMapper::to_dto(transaction))).into_response()
        }
        Err(e) => error_response("Failed to reject transaction", e),
    }
}
