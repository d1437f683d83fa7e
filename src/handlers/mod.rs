pub mod admin;
pub mod auth;
pub mod bookings;
pub mod health;
pub mod trainers;

use std::sync::Arc;

use axum::http::{header, HeaderMap};
use axum::routing::{delete, get, patch, post};
use axum::Router;
use chrono::NaiveDate;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::errors::AppError;
use crate::services::auth::{bearer, verify_token};
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/register", post(auth::register))
        .route("/api/login", post(auth::login))
        .route("/api/session", get(auth::session))
        .route("/api/trainers", get(trainers::list_trainers))
        .route("/api/classes/:id", get(trainers::get_class))
        .route("/api/trainers/:id/slots", get(trainers::slots))
        .route("/api/trainers/:id/next-available", get(trainers::next_available))
        .route("/api/trainers/:id/calendar", get(trainers::calendar))
        .route("/api/bookings", post(bookings::create_booking))
        .route("/api/bookings/:id", delete(bookings::cancel_booking))
        .route("/api/bookings/:id/status", patch(bookings::update_status))
        .route("/api/my-bookings", get(bookings::my_bookings))
        .route("/api/admin/bookings", get(admin::get_bookings))
        .route("/api/admin/bookings/:id/status", post(admin::update_status))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub(crate) fn authorization(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok())
}

/// User id carried by the request's session token.
pub(crate) fn current_user(headers: &HeaderMap, state: &AppState) -> Result<String, AppError> {
    let token = bearer(authorization(headers))?;
    verify_token(&state.config.session_secret, token).ok_or(AppError::Unauthorized)
}

pub(crate) fn parse_date(s: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::InvalidInput(format!("invalid date {s:?}, expected YYYY-MM-DD")))
}
