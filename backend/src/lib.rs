//! # Kencleng Backend
//!
//! Savings ledger for community "kencleng" piggy banks: residents request
//! deposits and withdrawals, block operators approve or reject them, and
//! admins read aggregated reports.
//!
//! ## Architecture
//!
//! ```text
//! IO Layer (REST API, handlers)
//!     ↓
//! Domain Layer (services, approval workflow)
//!     ↓
//! Storage Layer (SQLite via sqlx)
//! ```
//!
//! This crate wires the layers together: [`initialize_backend`] opens the
//! database and builds the services, [`create_router`] exposes them over HTTP.

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use anyhow::{Context, Result};
use axum::{
    http::{HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use log::info;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::AppConfig;
use crate::domain::notification::{LogNotificationSink, NotificationSink};
use crate::domain::{AccountService, ApprovalService, ReportingService, TransactionService};
use crate::storage::DbConnection;

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub account_service: AccountService<DbConnection>,
    pub transaction_service: TransactionService<DbConnection>,
    pub approval_service: ApprovalService<DbConnection>,
    pub reporting_service: ReportingService<DbConnection>,
}

impl AppState {
    pub fn new(
        connection: Arc<DbConnection>,
        config: &AppConfig,
        notifications: Arc<dyn NotificationSink>,
    ) -> Self {
        let ledger = &config.ledger;
        let store = &config.store;
        Self {
            account_service: AccountService::new(connection.clone(), ledger.clone(), store.clone()),
            transaction_service: TransactionService::new(
                connection.clone(),
                ledger.clone(),
                store.clone(),
            ),
            approval_service: ApprovalService::new(connection.clone(), store.clone(), notifications),
            reporting_service: ReportingService::new(connection, ledger.clone(), store.clone()),
        }
    }
}

/// Initialize the backend with all required services
pub async fn initialize_backend(config: &AppConfig) -> Result<AppState> {
    info!("Setting up database at {}", config.database.url);
    let connection = Arc::new(DbConnection::new(&config.database).await?);

    info!("Setting up domain services");
    let app_state = AppState::new(connection, config, Arc::new(LogNotificationSink));

    Ok(app_state)
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState, cors_origin: &str) -> Result<Router> {
    let origin = cors_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid CORS origin: {}", cors_origin))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/accounts", get(io::list_accounts).post(io::create_account))
        .route("/accounts/:id", get(io::get_account))
        .route("/accounts/:id/status", put(io::update_account_status))
        .route("/accounts/:id/balance", get(io::get_balance))
        .route("/accounts/:id/progress", get(io::get_progress))
        .route("/accounts/:id/transactions", get(io::list_account_transactions))
        .route("/accounts/:id/history", get(io::get_daily_history))
        .route("/accounts/:id/card", get(io::get_account_card))
        .route("/cards/resolve", post(io::resolve_account_card))
        .route("/transactions", post(io::create_transaction))
        .route("/transactions/:id", get(io::get_transaction))
        .route("/transactions/:id/approve", post(io::approve_transaction))
        .route("/transactions/:id/reject", post(io::reject_transaction))
        .route("/groups/:group_id/pending", get(io::list_pending_transactions))
        .route("/groups/:group_id/leaderboard", get(io::get_leaderboard))
        .route("/groups/:group_id/totals", get(io::get_period_totals));

    Ok(Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .with_state(app_state))
}
