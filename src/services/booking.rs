use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::config::BookingPolicy;
use crate::errors::{AppError, StoreError};
use crate::models::schedule::{extract_first_time, weekday_symbol};
use crate::models::{
    Booking, BookingConflict, BookingFilter, BookingStatus, BookingSummary, CandidateSlot, Trainer,
    WeeklySchedule,
};
use crate::services::slots::{slots_on, BookingWindow};

/// Narrow view of persisted studio state used by the booking core.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn find_trainer(&self, trainer_id: i64) -> Result<Option<Trainer>, StoreError>;

    async fn find_active_booking(
        &self,
        user_id: &str,
        trainer_id: i64,
        booked_time: DateTime<Utc>,
    ) -> Result<Option<Booking>, StoreError>;

    /// Fails with [`StoreError::Duplicate`] when an active booking already
    /// holds the same (user, trainer, booked time).
    async fn insert_booking(&self, booking: &Booking) -> Result<String, StoreError>;

    async fn find_booking(&self, booking_id: &str) -> Result<Option<Booking>, StoreError>;

    /// Moves a booking owned by `user_id` from `from` to `to`. Matches
    /// nothing (0 rows) when the stored status is no longer `from`.
    async fn update_booking_status(
        &self,
        booking_id: &str,
        user_id: &str,
        from: BookingStatus,
        to: BookingStatus,
    ) -> Result<usize, StoreError>;

    /// Sorted by booked time, latest first.
    async fn list_bookings(&self, filter: &BookingFilter) -> Result<Vec<BookingSummary>, StoreError>;

    async fn find_trainer_schedule(&self, trainer_id: i64) -> Result<Option<WeeklySchedule>, StoreError> {
        Ok(self.find_trainer(trainer_id).await?.map(|t| t.schedule))
    }
}

/// The active booking holding (user, trainer, booked time), if any.
pub async fn find_conflict(
    store: &dyn BookingStore,
    user_id: &str,
    trainer_id: i64,
    booked_time: DateTime<Utc>,
) -> Result<Option<Booking>, AppError> {
    Ok(store.find_active_booking(user_id, trainer_id, booked_time).await?)
}

pub async fn has_active_conflict(
    store: &dyn BookingStore,
    user_id: &str,
    trainer_id: i64,
    booked_time: DateTime<Utc>,
) -> Result<bool, AppError> {
    Ok(find_conflict(store, user_id, trainer_id, booked_time).await?.is_some())
}

#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub user_id: String,
    pub trainer_id: i64,
    pub class_id: i64,
    pub date: NaiveDate,
    /// Free-form slot text; the first `HH:MM` in it picks the session.
    pub time_slot: String,
    pub price: i64,
    pub name: String,
    pub email: Option<String>,
}

pub async fn load_trainer(store: &dyn BookingStore, trainer_id: i64) -> Result<Trainer, AppError> {
    store
        .find_trainer(trainer_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("trainer {trainer_id}")))
}

/// Resolves the requested date and slot text to one of the trainer's
/// sessions.
pub fn resolve_slot(schedule: &WeeklySchedule, date: NaiveDate, time_slot: &str) -> Result<CandidateSlot, AppError> {
    let start = extract_first_time(time_slot).map_err(|e| AppError::InvalidInput(e.to_string()))?;

    slots_on(schedule, date)
        .iter()
        .find(|range| range.start == start)
        .map(|&range| CandidateSlot { date, range })
        .ok_or_else(|| {
            AppError::InvalidInput(format!(
                "no session starts at {} on {} {date}",
                start.format("%H:%M"),
                weekday_symbol(date.weekday()),
            ))
        })
}

fn conflict_details(existing: &Booking, trainer: &Trainer) -> Box<BookingConflict> {
    Box::new(BookingConflict {
        booking_id: existing.id.clone(),
        booked_time: existing.booked_time,
        trainer_name: trainer.name.clone(),
        class_name: trainer.class_name.clone(),
    })
}

/// Books a slot for a user. Returns the new booking's id.
///
/// The pre-check only produces a friendlier answer; the store's unique
/// index is what keeps one active booking per (user, trainer, instant) when
/// two requests race.
pub async fn book_slot(
    store: &dyn BookingStore,
    policy: &BookingPolicy,
    req: BookingRequest,
    now: DateTime<Utc>,
) -> Result<String, AppError> {
    let trainer = load_trainer(store, req.trainer_id).await?;

    if req.class_id != trainer.class_id {
        return Err(AppError::InvalidInput(format!(
            "{} does not teach class {}",
            trainer.name, req.class_id
        )));
    }
    if req.price < 0 {
        return Err(AppError::InvalidInput("price must not be negative".to_string()));
    }
    if req.name.trim().is_empty() {
        return Err(AppError::InvalidInput("missing name".to_string()));
    }

    let window = BookingWindow::new(now.date_naive(), policy);
    if !window.contains(req.date) {
        return Err(AppError::InvalidInput(format!(
            "date must be between {} and {}",
            window.first, window.last
        )));
    }

    let slot = resolve_slot(&trainer.schedule, req.date, &req.time_slot)?;
    let booked_time = slot.instant();

    if let Some(existing) = find_conflict(store, &req.user_id, trainer.id, booked_time).await? {
        tracing::warn!(user_id = %req.user_id, trainer_id = trainer.id, %booked_time, "duplicate booking rejected");
        return Err(AppError::DuplicateBooking(conflict_details(&existing, &trainer)));
    }

    let booking = Booking {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: req.user_id,
        trainer_id: trainer.id,
        class_id: trainer.class_id,
        name: req.name.trim().to_string(),
        email: req.email.filter(|e| !e.trim().is_empty()),
        price: req.price,
        created_at: now,
        booked_time,
        status: BookingStatus::Booked,
    };

    match store.insert_booking(&booking).await {
        Ok(id) => {
            tracing::info!(
                booking_id = %id,
                user_id = %booking.user_id,
                trainer = %trainer.name,
                %booked_time,
                "booking created"
            );
            Ok(id)
        }
        Err(StoreError::Duplicate) => {
            tracing::warn!(user_id = %booking.user_id, trainer_id = trainer.id, %booked_time, "duplicate booking lost insert race");
            match find_conflict(store, &booking.user_id, trainer.id, booked_time).await? {
                Some(existing) => Err(AppError::DuplicateBooking(conflict_details(&existing, &trainer))),
                // The winner was cancelled before it could be read back.
                None => Err(AppError::Conflict(
                    "an active booking already exists for this slot".to_string(),
                )),
            }
        }
        Err(e) => Err(e.into()),
    }
}
