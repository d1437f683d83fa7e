use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed-width storage form: string equality is instant equality and string
/// order is chronological order.
pub const INSTANT_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

pub fn format_instant(dt: &DateTime<Utc>) -> String {
    dt.format(INSTANT_FORMAT).to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub user_id: String,
    pub trainer_id: i64,
    pub class_id: i64,
    pub name: String,
    pub email: Option<String>,
    pub price: i64,
    pub created_at: DateTime<Utc>,
    pub booked_time: DateTime<Utc>,
    pub status: BookingStatus,
}

impl Booking {
    /// Status as shown to people: a `booked` session whose start has passed
    /// reads as `finished` even though nothing was written.
    pub fn effective_status(&self, now: DateTime<Utc>) -> BookingStatus {
        match self.status {
            BookingStatus::Booked if self.booked_time < now => BookingStatus::Finished,
            status => status,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == BookingStatus::Booked
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Booked,
    Cancelled,
    Finished,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Booked => "booked",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Finished => "finished",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "booked" => Some(BookingStatus::Booked),
            "cancelled" => Some(BookingStatus::Cancelled),
            "finished" => Some(BookingStatus::Finished),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, BookingStatus::Booked)
    }

    /// Allowed moves: booked -> cancelled | finished, plus re-applying the
    /// current state. Nothing leaves a terminal state.
    pub fn can_transition_to(&self, target: BookingStatus) -> bool {
        *self == target || (*self == BookingStatus::Booked && target.is_terminal())
    }
}

/// Which slice of bookings a listing shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingScope {
    /// booked and not yet started
    Upcoming,
    /// cancelled, finished, or already started
    History,
    #[default]
    All,
}

impl BookingScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingScope::Upcoming => "upcoming",
            BookingScope::History => "history",
            BookingScope::All => "all",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "upcoming" => Some(BookingScope::Upcoming),
            "history" => Some(BookingScope::History),
            "all" | "" => Some(BookingScope::All),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BookingFilter {
    /// `None` lists every user's bookings (admin view).
    pub user_id: Option<String>,
    pub scope: BookingScope,
    pub now: DateTime<Utc>,
}

/// A booking joined with the names needed to display it.
#[derive(Debug, Clone, Serialize)]
pub struct BookingSummary {
    #[serde(flatten)]
    pub booking: Booking,
    pub trainer_name: String,
    pub class_name: String,
    pub effective_status: BookingStatus,
}

/// Details of the active booking that blocked a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingConflict {
    pub booking_id: String,
    pub booked_time: DateTime<Utc>,
    pub trainer_name: String,
    pub class_name: String,
}
