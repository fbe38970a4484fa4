//! Caller identity extraction.
//!
//! The upstream session provider authenticates the user and forwards the
//! result in two headers. The ledger trusts them as given.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::Json,
};
use log::warn;
use shared::ErrorResponse;

use crate::domain::models::actor::{Actor, Role};

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
        };

        let id = header(ACTOR_ID_HEADER)
            .ok_or_else(|| unauthorized(format!("Missing {} header", ACTOR_ID_HEADER)))?;
        let role = header(ACTOR_ROLE_HEADER)
            .ok_or_else(|| unauthorized(format!("Missing {} header", ACTOR_ROLE_HEADER)))?
            .parse::<Role>()
            .map_err(|e| unauthorized(e.to_string()))?;

        Ok(Actor::new(id, role))
    }
}

fn unauthorized(message: String) -> (StatusCode, Json<ErrorResponse>) {
    warn!("Rejected request without a valid identity: {}", message);
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            kind: "unauthorized".to_string(),
            message,
        }),
    )
}
