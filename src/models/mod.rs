pub mod booking;
pub mod schedule;
pub mod trainer;
pub mod user;

pub use booking::{
    Booking, BookingConflict, BookingFilter, BookingScope, BookingStatus, BookingSummary,
};
pub use schedule::{CandidateSlot, ScheduleError, TimeRange, WeeklySchedule};
pub use trainer::{StudioClass, Trainer};
pub use user::User;
