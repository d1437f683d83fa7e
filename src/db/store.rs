use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::StoreError;
use crate::models::{Booking, BookingFilter, BookingStatus, BookingSummary, ScheduleError, Trainer};
use crate::services::booking::BookingStore;

/// [`BookingStore`] backed by the shared SQLite connection.
#[derive(Clone)]
pub struct SqliteStore {
    db: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn new(db: Arc<Mutex<Connection>>) -> Self {
        Self { db }
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.db
            .lock()
            .map_err(|_| StoreError::Unavailable(anyhow::anyhow!("database lock poisoned")))
    }
}

fn classify(err: anyhow::Error) -> StoreError {
    if queries::is_unique_violation(&err) {
        return StoreError::Duplicate;
    }
    match err.downcast::<ScheduleError>() {
        Ok(e) => StoreError::InvalidSchedule(e),
        Err(err) => StoreError::Unavailable(err),
    }
}

#[async_trait]
impl BookingStore for SqliteStore {
    async fn find_trainer(&self, trainer_id: i64) -> Result<Option<Trainer>, StoreError> {
        let db = self.conn()?;
        queries::get_trainer(&db, trainer_id).map_err(classify)
    }

    async fn find_active_booking(
        &self,
        user_id: &str,
        trainer_id: i64,
        booked_time: DateTime<Utc>,
    ) -> Result<Option<Booking>, StoreError> {
        let db = self.conn()?;
        queries::find_active_booking(&db, user_id, trainer_id, &booked_time).map_err(classify)
    }

    async fn insert_booking(&self, booking: &Booking) -> Result<String, StoreError> {
        let db = self.conn()?;
        queries::create_booking(&db, booking).map_err(classify)?;
        Ok(booking.id.clone())
    }

    async fn find_booking(&self, booking_id: &str) -> Result<Option<Booking>, StoreError> {
        let db = self.conn()?;
        queries::get_booking_by_id(&db, booking_id).map_err(classify)
    }

    async fn update_booking_status(
        &self,
        booking_id: &str,
        user_id: &str,
        from: BookingStatus,
        to: BookingStatus,
    ) -> Result<usize, StoreError> {
        let db = self.conn()?;
        queries::update_booking_status(&db, booking_id, user_id, from, to).map_err(classify)
    }

    async fn list_bookings(&self, filter: &BookingFilter) -> Result<Vec<BookingSummary>, StoreError> {
        let db = self.conn()?;
        queries::list_bookings(&db, filter).map_err(classify)
    }
}
