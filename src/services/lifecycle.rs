use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::errors::AppError;
use crate::models::{Booking, BookingFilter, BookingScope, BookingStatus, BookingSummary};
use crate::services::booking::BookingStore;

/// Who is asking for a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor<'a> {
    User(&'a str),
    Admin,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TransitionOutcome {
    pub booking_id: String,
    pub status: BookingStatus,
    pub rows_affected: usize,
}

pub fn parse_status(raw: &str) -> Result<BookingStatus, AppError> {
    BookingStatus::parse(raw).ok_or_else(|| AppError::InvalidStatus(format!("unknown status {raw:?}")))
}

/// Moves a booking to `target`.
///
/// A user can only touch their own bookings; anything else reads as "not
/// found" so booking ids do not leak across accounts. Re-applying the
/// current status succeeds. Cancelling has no time gate.
///
/// The write only lands if the stored status is still the one the rules
/// were checked against. When another request got there first the booking
/// is re-read and the rules run again on its new status.
pub async fn transition(
    store: &dyn BookingStore,
    booking_id: &str,
    actor: Actor<'_>,
    target: &str,
    now: DateTime<Utc>,
) -> Result<TransitionOutcome, AppError> {
    let target = parse_status(target)?;
    let mut booking = load_owned(store, booking_id, actor).await?;

    loop {
        check_transition(&booking, actor, target, now)?;

        let rows_affected = store
            .update_booking_status(&booking.id, &booking.user_id, booking.status, target)
            .await?;
        if rows_affected > 0 {
            tracing::info!(
                booking_id,
                from = booking.status.as_str(),
                to = target.as_str(),
                admin = matches!(actor, Actor::Admin),
                "booking status changed"
            );
            return Ok(TransitionOutcome {
                booking_id: booking.id,
                status: target,
                rows_affected,
            });
        }

        let current = load_owned(store, booking_id, actor).await?;
        // Status only ever leaves `booked` once, so this retries at most once.
        if current.status == booking.status {
            return Err(AppError::NotFound(format!("booking {booking_id}")));
        }
        tracing::warn!(
            booking_id,
            expected = booking.status.as_str(),
            found = current.status.as_str(),
            "booking status changed concurrently"
        );
        booking = current;
    }
}

async fn load_owned(store: &dyn BookingStore, booking_id: &str, actor: Actor<'_>) -> Result<Booking, AppError> {
    store
        .find_booking(booking_id)
        .await?
        .filter(|b| match actor {
            Actor::User(user_id) => b.user_id == user_id,
            Actor::Admin => true,
        })
        .ok_or_else(|| AppError::NotFound(format!("booking {booking_id}")))
}

fn check_transition(
    booking: &Booking,
    actor: Actor<'_>,
    target: BookingStatus,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    if !booking.status.can_transition_to(target) {
        return Err(AppError::InvalidStatus(format!(
            "cannot change a {} booking to {}",
            booking.status.as_str(),
            target.as_str()
        )));
    }

    if target == BookingStatus::Finished
        && booking.status == BookingStatus::Booked
        && actor != Actor::Admin
        && booking.booked_time > now
    {
        return Err(AppError::InvalidStatus(
            "a session can only be marked finished once it has started".to_string(),
        ));
    }
    Ok(())
}

pub async fn cancel(
    store: &dyn BookingStore,
    booking_id: &str,
    actor: Actor<'_>,
    now: DateTime<Utc>,
) -> Result<TransitionOutcome, AppError> {
    transition(store, booking_id, actor, BookingStatus::Cancelled.as_str(), now).await
}

/// Bookings for one user, or everyone when `user_id` is `None`, latest
/// booked time first.
pub async fn list(
    store: &dyn BookingStore,
    user_id: Option<&str>,
    scope: BookingScope,
    now: DateTime<Utc>,
) -> Result<Vec<BookingSummary>, AppError> {
    let filter = BookingFilter {
        user_id: user_id.map(str::to_string),
        scope,
        now,
    };
    Ok(store.list_bookings(&filter).await?)
}
