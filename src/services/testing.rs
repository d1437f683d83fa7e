//! In-memory [`BookingStore`] for service tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::StoreError;
use crate::models::{
    Booking, BookingFilter, BookingScope, BookingStatus, BookingSummary, Trainer, WeeklySchedule,
};
use crate::services::booking::BookingStore;

pub fn john_carter() -> Trainer {
    Trainer {
        id: 1,
        name: "John Carter".to_string(),
        class_id: 1,
        class_name: "Strength".to_string(),
        schedule: WeeklySchedule::from_entries(["Mon 09:00–11:00", "Thu 09:00–11:00"]).unwrap(),
    }
}

#[derive(Default)]
pub struct MemoryStore {
    trainers: Vec<Trainer>,
    bookings: Mutex<Vec<Booking>>,
    /// Number of upcoming active-booking lookups that see nothing, as if a
    /// concurrent insert had not landed yet.
    blind_reads: AtomicUsize,
}

impl MemoryStore {
    pub fn with_trainer(trainer: Trainer) -> Self {
        Self {
            trainers: vec![trainer],
            ..Default::default()
        }
    }

    pub fn hide_active_bookings(&self, reads: usize) {
        self.blind_reads.store(reads, Ordering::SeqCst);
    }

    pub fn set_status(&self, booking_id: &str, status: BookingStatus) {
        let mut bookings = self.bookings.lock().unwrap();
        if let Some(b) = bookings.iter_mut().find(|b| b.id == booking_id) {
            b.status = status;
        }
    }

    fn find_active(&self, user_id: &str, trainer_id: i64, booked_time: DateTime<Utc>) -> Option<Booking> {
        self.bookings
            .lock()
            .unwrap()
            .iter()
            .find(|b| {
                b.user_id == user_id
                    && b.trainer_id == trainer_id
                    && b.booked_time == booked_time
                    && b.is_active()
            })
            .cloned()
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn find_trainer(&self, trainer_id: i64) -> Result<Option<Trainer>, StoreError> {
        Ok(self.trainers.iter().find(|t| t.id == trainer_id).cloned())
    }

    async fn find_active_booking(
        &self,
        user_id: &str,
        trainer_id: i64,
        booked_time: DateTime<Utc>,
    ) -> Result<Option<Booking>, StoreError> {
        let blind = self
            .blind_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if blind {
            return Ok(None);
        }
        Ok(self.find_active(user_id, trainer_id, booked_time))
    }

    async fn insert_booking(&self, booking: &Booking) -> Result<String, StoreError> {
        if booking.is_active()
            && self
                .find_active(&booking.user_id, booking.trainer_id, booking.booked_time)
                .is_some()
        {
            return Err(StoreError::Duplicate);
        }
        self.bookings.lock().unwrap().push(booking.clone());
        Ok(booking.id.clone())
    }

    async fn find_booking(&self, booking_id: &str) -> Result<Option<Booking>, StoreError> {
        Ok(self
            .bookings
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.id == booking_id)
            .cloned())
    }

    async fn update_booking_status(
        &self,
        booking_id: &str,
        user_id: &str,
        from: BookingStatus,
        to: BookingStatus,
    ) -> Result<usize, StoreError> {
        let mut bookings = self.bookings.lock().unwrap();
        let mut count = 0;
        for b in bookings
            .iter_mut()
            .filter(|b| b.id == booking_id && b.user_id == user_id && b.status == from)
        {
            b.status = to;
            count += 1;
        }
        Ok(count)
    }

    async fn list_bookings(&self, filter: &BookingFilter) -> Result<Vec<BookingSummary>, StoreError> {
        let mut out: Vec<BookingSummary> = self
            .bookings
            .lock()
            .unwrap()
            .iter()
            .filter(|b| filter.user_id.as_deref().map_or(true, |u| b.user_id == u))
            .filter(|b| match filter.scope {
                BookingScope::All => true,
                BookingScope::Upcoming => b.is_active() && b.booked_time >= filter.now,
                BookingScope::History => b.status.is_terminal() || b.booked_time < filter.now,
            })
            .map(|b| {
                let trainer = self.trainers.iter().find(|t| t.id == b.trainer_id);
                BookingSummary {
                    booking: b.clone(),
                    trainer_name: trainer.map(|t| t.name.clone()).unwrap_or_default(),
                    class_name: trainer.map(|t| t.class_name.clone()).unwrap_or_default(),
                    effective_status: b.effective_status(filter.now),
                }
            })
            .collect();
        out.sort_by(|a, b| b.booking.booked_time.cmp(&a.booking.booked_time));
        Ok(out)
    }
}
