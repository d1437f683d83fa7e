use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{current_user, parse_date};
use crate::db::queries;
use crate::errors::AppError;
use crate::models::schedule::studio_now;
use crate::models::{BookingScope, BookingSummary};
use crate::services::booking::{book_slot, BookingRequest};
use crate::services::lifecycle::{self, Actor, TransitionOutcome};
use crate::state::AppState;

pub(crate) fn parse_scope(filter: Option<&str>) -> Result<BookingScope, AppError> {
    let raw = filter.unwrap_or("");
    BookingScope::parse(raw)
        .ok_or_else(|| AppError::InvalidInput(format!("unknown filter {raw:?}, expected upcoming, history or all")))
}

// POST /api/bookings
#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub trainer_id: i64,
    pub class_id: i64,
    pub date: String,
    pub time_slot: String,
    pub price: i64,
    /// Defaults to the account name.
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Serialize)]
pub struct CreateBookingResponse {
    pub id: String,
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<CreateBookingResponse>), AppError> {
    let user_id = current_user(&headers, &state)?;
    let date = parse_date(&body.date)?;

    let account = {
        let db = state.conn()?;
        queries::get_user(&db, &user_id)?.ok_or(AppError::Unauthorized)?
    };

    let req = BookingRequest {
        user_id,
        trainer_id: body.trainer_id,
        class_id: body.class_id,
        date,
        time_slot: body.time_slot,
        price: body.price,
        name: body.name.filter(|n| !n.trim().is_empty()).unwrap_or(account.name),
        email: body.email.filter(|e| !e.trim().is_empty()).or(account.email),
    };

    let id = book_slot(state.store.as_ref(), &state.config.policy, req, studio_now()).await?;
    Ok((StatusCode::CREATED, Json(CreateBookingResponse { id })))
}

// GET /api/my-bookings?filter=upcoming|history|all
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub filter: Option<String>,
}

pub async fn my_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<BookingsQuery>,
) -> Result<Json<Vec<BookingSummary>>, AppError> {
    let user_id = current_user(&headers, &state)?;
    let scope = parse_scope(params.filter.as_deref())?;

    let bookings = lifecycle::list(state.store.as_ref(), Some(user_id.as_str()), scope, studio_now()).await?;
    Ok(Json(bookings))
}

// DELETE /api/bookings/:id
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let user_id = current_user(&headers, &state)?;
    lifecycle::cancel(state.store.as_ref(), &id, Actor::User(&user_id), studio_now()).await?;
    Ok(StatusCode::NO_CONTENT)
}

// PATCH /api/bookings/:id/status
#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<StatusRequest>,
) -> Result<Json<TransitionOutcome>, AppError> {
    let user_id = current_user(&headers, &state)?;
    let outcome = lifecycle::transition(
        state.store.as_ref(),
        &id,
        Actor::User(&user_id),
        &body.status,
        studio_now(),
    )
    .await?;
    Ok(Json(outcome))
}
