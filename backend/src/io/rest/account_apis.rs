//! # REST API for Accounts
//!
//! Opening accounts, status changes, balance and progress reads, and the
//! QR card payload.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use log::info;
use serde::Deserialize;

use crate::domain::account_card;
use crate::domain::models::actor::Actor;
use crate::io::rest::errors::error_response;
use crate::io::rest::mappers::AccountMapper;
use crate::AppState;
use shared::{
    AccountCardResponse, AccountListResponse, BalanceResponse, CreateAccountRequest,
    ProgressResponse, ResolveCardRequest, UpdateAccountStatusRequest,
};

#[derive(Debug, Deserialize)]
pub struct AccountListQuery {
    pub group_id: String,
}

/// Open a new savings account
pub async fn create_account(
    State(state): State<AppState>,
    actor: Actor,
    Json(request): Json<CreateAccountRequest>,
) -> impl IntoResponse {
    info!("POST /api/accounts - request: {:?}", request);

    let command = AccountMapper::to_create_command(request);
    match state.account_service.create_account(command, &actor).await {
        Ok(account) => (StatusCode::CREATED, Json(AccountMapper::to_dto(account))).into_response(),
        Err(e) => error_response("Failed to create account", e),
    }
}

/// List the accounts of one group
pub async fn list_accounts(
    State(state): State<AppState>,
    Query(query): Query<AccountListQuery>,
) -> impl IntoResponse {
    info!("GET /api/accounts - group: {}", query.group_id);

    match state.account_service.list_accounts(&query.group_id).await {
        Ok(accounts) => {
            let response = AccountListResponse {
                accounts: accounts.into_iter().map(AccountMapper::to_dto).collect(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => error_response("Failed to list accounts", e),
    }
}

pub async fn get_account(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/accounts/{}", account_id);

    match state.account_service.get_account(&account_id).await {
        Ok(account) => (StatusCode::OK, Json(AccountMapper::to_dto(account))).into_response(),
        Err(e) => error_response("Failed to get account", e),
    }
}

/// Activate or deactivate an account
pub async fn update_account_status(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    actor: Actor,
    Json(request): Json<UpdateAccountStatusRequest>,
) -> impl IntoResponse {
    info!("PUT /api/accounts/{}/status - request: {:?}", account_id, request);

    let status = AccountMapper::to_domain_status(request.status);
    match state
        .account_service
        .set_status(&account_id, status, &actor)
        .await
    {
        Ok(account) => (StatusCode::OK, Json(AccountMapper::to_dto(account))).into_response(),
        Err(e) => error_response("Failed to update account status", e),
    }
}

pub async fn get_balance(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/accounts/{}/balance", account_id);

    match state.account_service.get_balance(&account_id).await {
        Ok(balance) => (
            StatusCode::OK,
            Json(BalanceResponse {
                account_id,
                balance,
            }),
        )
            .into_response(),
        Err(e) => error_response("Failed to get balance", e),
    }
}

pub async fn get_progress(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/accounts/{}/progress", account_id);

    match state.reporting_service.progress(&account_id).await {
        Ok((account, progress)) => (
            StatusCode::OK,
            Json(ProgressResponse {
                account_id: account.id,
                balance: account.balance,
                target: account.target,
                progress,
            }),
        )
            .into_response(),
        Err(e) => error_response("Failed to get progress", e),
    }
}

/// Card payload for printing as a QR code
pub async fn get_account_card(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/accounts/{}/card", account_id);

    let account = match state.account_service.get_account(&account_id).await {
        Ok(account) => account,
        Err(e) => return error_response("Failed to get account card", e),
    };
    let card = account_card::card_for(&account);
    match account_card::encode_payload(&card) {
        Ok(payload) => (StatusCode::OK, Json(AccountCardResponse { card, payload })).into_response(),
        Err(e) => error_response("Failed to encode account card", e),
    }
}

/// Resolve a scanned card payload to its account
pub async fn resolve_account_card(
    State(state): State<AppState>,
    Json(request): Json<ResolveCardRequest>,
) -> impl IntoResponse {
    info!("POST /api/cards/resolve");

    let card = match account_card::decode_payload(&request.payload) {
        Ok(card) => card,
        Err(e) => return error_response("Failed to read account card", e),
    };
    match state.account_service.get_account(&card.account_id).await {
        Ok(account) => (StatusCode::OK, Json(AccountMapper::to_dto(account))).into_response(),
        Err(e) => error_response("Failed to resolve account card", e),
    }
}
