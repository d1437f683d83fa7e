use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::current_user;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::User;
use crate::services::auth::{hash_password, issue_token, verify_password};
use crate::state::AppState;

#[derive(Serialize)]
pub struct SessionResponse {
    pub user: User,
    pub token: String,
}

// POST /api/register
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub password: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    let name = body.name.trim();
    if name.is_empty() || body.password.is_empty() {
        return Err(AppError::InvalidInput("name and password are required".to_string()));
    }

    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        name: name.to_string(),
        password_hash: hash_password(&body.password)?,
        email: body.email.filter(|e| !e.trim().is_empty()),
        phone: body.phone.filter(|p| !p.trim().is_empty()),
        created_at: Utc::now(),
    };

    {
        let db = state.conn()?;
        queries::create_user(&db, &user).map_err(|e| {
            if queries::is_unique_violation(&e) {
                AppError::Conflict(format!("user {} already exists", user.name))
            } else {
                e.into()
            }
        })?;
    }

    tracing::info!(user_id = %user.id, "user registered");
    let token = issue_token(&state.config.session_secret, &user.id);
    Ok((StatusCode::CREATED, Json(SessionResponse { user, token })))
}

// POST /api/login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub name: String,
    pub password: String,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let user = {
        let db = state.conn()?;
        queries::get_user_by_name(&db, body.name.trim())?
    };

    let Some(user) = user.filter(|u| verify_password(&body.password, &u.password_hash)) else {
        tracing::warn!(name = %body.name, "failed login");
        return Err(AppError::Unauthorized);
    };

    let token = issue_token(&state.config.session_secret, &user.id);
    Ok(Json(SessionResponse { user, token }))
}

// GET /api/session
pub async fn session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let user_id = current_user(&headers, &state)?;
    let db = state.conn()?;
    let user = queries::get_user(&db, &user_id)?.ok_or(AppError::Unauthorized)?;

    Ok(Json(serde_json::json!({ "user": user })))
}
