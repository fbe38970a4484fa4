//! # REST API for Reports

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use log::info;
use serde::Deserialize;
use shared::Period;

use crate::io::rest::errors::error_response;
use crate::io::rest::mappers::ReportMapper;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    /// week, month or year; defaults to month
    pub period: Option<Period>,
}

pub async fn get_leaderboard(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    Query(query): Query<PeriodQuery>,
) -> impl IntoResponse {
    let period = query.period.unwrap_or(Period::Month);
    info!("GET /api/groups/{}/leaderboard - period: {}", group_id, period);

    match state.reporting_service.leaderboard(&group_id, period).await {
        Ok(result) => (StatusCode::OK, Json(ReportMapper::to_leaderboard_dto(result))).into_response(),
        Err(e) => error_response("Failed to build leaderboard", e),
    }
}

pub async fn get_period_totals(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    Query(query): Query<PeriodQuery>,
) -> impl IntoResponse {
    let period = query.period.unwrap_or(Period::Month);
    info!("GET /api/groups/{}/totals - period: {}", group_id, period);

    match state.reporting_service.period_totals(&group_id, period).await {
        Ok(result) => (StatusCode::OK, Json(ReportMapper::to_totals_dto(result))).into_response(),
        Err(e) => error_response("Failed to compute period totals", e),
    }
}

pub async fn get_daily_history(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/accounts/{}/history", account_id);

    match state.reporting_service.daily_history(&account_id).await {
        Ok(days) => (
            StatusCode::OK,
            Json(ReportMapper::to_history_dto(&account_id, days)),
        )
            .into_response(),
        Err(e) => error_response("Failed to build daily history", e),
    }
}
