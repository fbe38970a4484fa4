//! # REST API for Transactions
//!
//! Endpoints for requesting deposits and withdrawals and for reading the
//! transaction log.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use log::info;
use serde::Deserialize;

use crate::domain::models::actor::Actor;
use crate::io::rest::errors::error_response;
use crate::io::rest::mappers::TransactionMapper;
use crate::AppState;
use shared::{CreateTransactionRequest, PendingTransactionsResponse, TransactionListRequest};

// Query parameters for transaction listing API
#[derive(Debug, Deserialize)]
pub struct TransactionListParams {
    pub after: Option<String>,
    pub limit: Option<u32>,
}

/// Request a deposit or withdrawal; it stays PENDING until decided
pub async fn create_transaction(
    State(state): State<AppState>,
    actor: Actor,
    Json(request): Json<CreateTransactionRequest>,
) -> impl IntoResponse {
    info!("POST /api/transactions - request: {:?}", request);

    let command = TransactionMapper::to_create_command(request);
    match state
        .transaction_service
        .create_transaction(command, &actor)
        .await
    {
        Ok(transaction) => {
            (StatusCode::CREATED, Json(TransactionMapper::to_dto(transaction))).into_response()
        }
        Err(e) => error_response("Failed to create transaction", e),
    }
}

pub async fn get_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/transactions/{}", transaction_id);

    match state.transaction_service.get_transaction(&transaction_id).await {
        Ok(transaction) => {
            (StatusCode::OK, Json(TransactionMapper::to_dto(transaction))).into_response()
        }
        Err(e) => error_response("Failed to get transaction", e),
    }
}

/// List an account's transactions, newest first, with cursor pagination
pub async fn list_account_transactions(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    Query(params): Query<TransactionListParams>,
) -> impl IntoResponse {
    info!(
        "GET /api/accounts/{}/transactions - query: {:?}",
        account_id, params
    );

    let query = TransactionMapper::to_list_query(TransactionListRequest {
        after: params.after,
        limit: params.limit,
    });
    match state
        .transaction_service
        .list_by_account(&account_id, query)
        .await
    {
        Ok(result) => {
            (StatusCode::OK, Json(TransactionMapper::to_list_response(result))).into_response()
        }
        Err(e) => error_response("Failed to list transactions", e),
    }
}

/// Operator queue of a group's pending requests
pub async fn list_pending_transactions(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/groups/{}/pending", group_id);

    match state.transaction_service.list_pending_by_group(&group_id).await {
        Ok(transactions) => (
            StatusCode::OK,
            Json(PendingTransactionsResponse {
                group_id,
                transactions: TransactionMapper::to_dto_list(transactions),
            }),
        )
            .into_response(),
        Err(e) => error_response("Failed to list pending transactions", e),
    }
}
