use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;

use super::authorization;
use super::bookings::{parse_scope, BookingsQuery, StatusRequest};
use crate::errors::AppError;
use crate::models::schedule::studio_now;
use crate::models::BookingSummary;
use crate::services::auth::bearer;
use crate::services::lifecycle::{self, Actor, TransitionOutcome};
use crate::state::AppState;

fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let token = bearer(authorization(headers))?;
    if token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

// GET /api/admin/bookings?filter=upcoming|history|all
pub async fn get_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<BookingsQuery>,
) -> Result<Json<Vec<BookingSummary>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let scope = parse_scope(params.filter.as_deref())?;

    let bookings = lifecycle::list(state.store.as_ref(), None, scope, studio_now()).await?;
    Ok(Json(bookings))
}

// POST /api/admin/bookings/:id/status
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<StatusRequest>,
) -> Result<Json<TransitionOutcome>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let outcome = lifecycle::transition(state.store.as_ref(), &id, Actor::Admin, &body.status, studio_now()).await?;
    tracing::info!(booking_id = %id, status = %body.status, "admin updated booking status");
    Ok(Json(outcome))
}
