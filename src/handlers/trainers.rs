use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::parse_date;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::schedule::{studio_now, weekday_symbol};
use crate::models::{CandidateSlot, StudioClass, TimeRange, Trainer};
use crate::services::booking::load_trainer;
use crate::services::slots::{next_available_date, slots_between, slots_on, BookingWindow};
use crate::state::AppState;

const DEFAULT_CALENDAR_DAYS: u32 = 14;
const MAX_CALENDAR_DAYS: u32 = 92;

// GET /api/trainers
#[derive(Serialize)]
pub struct TrainerResponse {
    #[serde(flatten)]
    pub trainer: Trainer,
    pub schedule_text: String,
}

pub async fn list_trainers(State(state): State<Arc<AppState>>) -> Result<Json<Vec<TrainerResponse>>, AppError> {
    let trainers = {
        let db = state.conn()?;
        queries::list_trainers(&db)?
    };

    Ok(Json(
        trainers
            .into_iter()
            .map(|trainer| TrainerResponse {
                schedule_text: trainer.schedule.to_human_readable(),
                trainer,
            })
            .collect(),
    ))
}

// GET /api/classes/:id
pub async fn get_class(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<StudioClass>, AppError> {
    let db = state.conn()?;
    queries::get_class(&db, id)?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("class {id}")))
}

#[derive(Serialize)]
pub struct DaySlots {
    pub trainer_id: i64,
    pub date: NaiveDate,
    pub weekday: &'static str,
    pub slots: Vec<TimeRange>,
    /// Whether the date is inside the booking window.
    pub bookable: bool,
}

// GET /api/trainers/:id/slots?date=YYYY-MM-DD
#[derive(Deserialize)]
pub struct SlotsQuery {
    pub date: String,
}

pub async fn slots(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(params): Query<SlotsQuery>,
) -> Result<Json<DaySlots>, AppError> {
    let date = parse_date(&params.date)?;
    let trainer = load_trainer(state.store.as_ref(), id).await?;
    let window = BookingWindow::new(studio_now().date_naive(), &state.config.policy);

    Ok(Json(DaySlots {
        trainer_id: trainer.id,
        date,
        weekday: weekday_symbol(date.weekday()),
        slots: slots_on(&trainer.schedule, date).to_vec(),
        bookable: window.contains(date),
    }))
}

// GET /api/trainers/:id/next-available?from=YYYY-MM-DD
#[derive(Deserialize)]
pub struct NextAvailableQuery {
    pub from: Option<String>,
}

#[derive(Serialize)]
pub struct NextAvailableResponse {
    #[serde(flatten)]
    pub day: DaySlots,
    /// False when nothing opened up within the search horizon and `date`
    /// is just the start date handed back.
    pub found: bool,
}

pub async fn next_available(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(params): Query<NextAvailableQuery>,
) -> Result<Json<NextAvailableResponse>, AppError> {
    let today = studio_now().date_naive();
    let from = params.from.as_deref().map(parse_date).transpose()?.unwrap_or(today);
    let trainer = load_trainer(state.store.as_ref(), id).await?;

    let date = next_available_date(&trainer.schedule, from, state.config.policy.search_horizon_days);
    let slots = slots_on(&trainer.schedule, date).to_vec();
    let window = BookingWindow::new(today, &state.config.policy);

    Ok(Json(NextAvailableResponse {
        found: !slots.is_empty(),
        day: DaySlots {
            trainer_id: trainer.id,
            date,
            weekday: weekday_symbol(date.weekday()),
            slots,
            bookable: window.contains(date),
        },
    }))
}

// GET /api/trainers/:id/calendar?from=YYYY-MM-DD&days=N
#[derive(Deserialize)]
pub struct CalendarQuery {
    pub from: Option<String>,
    pub days: Option<u32>,
}

#[derive(Serialize)]
pub struct CalendarResponse {
    pub trainer_id: i64,
    pub slots: Vec<CandidateSlot>,
}

/// Concrete sessions over a span of days, clipped to the booking window.
pub async fn calendar(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(params): Query<CalendarQuery>,
) -> Result<Json<CalendarResponse>, AppError> {
    let today = studio_now().date_naive();
    let from = params.from.as_deref().map(parse_date).transpose()?.unwrap_or(today);
    let days = params.days.unwrap_or(DEFAULT_CALENDAR_DAYS).clamp(1, MAX_CALENDAR_DAYS);
    let to = from
        .checked_add_signed(Duration::days(i64::from(days) - 1))
        .ok_or_else(|| AppError::InvalidInput(format!("calendar range from {from} is out of range")))?;

    let trainer = load_trainer(state.store.as_ref(), id).await?;
    let window = BookingWindow::new(today, &state.config.policy);

    let slots = match window.clamp(from, to) {
        Some((from, to)) => slots_between(&trainer.schedule, from, to),
        None => vec![],
    };

    Ok(Json(CalendarResponse {
        trainer_id: trainer.id,
        slots,
    }))
}
