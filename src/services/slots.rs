use chrono::{Datelike, Duration, NaiveDate};

use crate::config::BookingPolicy;
use crate::models::{CandidateSlot, TimeRange, WeeklySchedule};

/// Ranges bookable on `date`, ascending by start. Empty when the trainer
/// has no session that weekday.
pub fn slots_on(schedule: &WeeklySchedule, date: NaiveDate) -> &[TimeRange] {
    schedule.ranges_for(date.weekday())
}

/// First date from `from` (inclusive) within `horizon_days` that has at
/// least one range.
///
/// When nothing is found the scan gives up and returns `from` unchanged, so
/// callers must check `slots_on(schedule, result)` before offering the date.
pub fn next_available_date(schedule: &WeeklySchedule, from: NaiveDate, horizon_days: u32) -> NaiveDate {
    from.iter_days()
        .take(horizon_days as usize)
        .find(|&date| !slots_on(schedule, date).is_empty())
        .unwrap_or(from)
}

/// Every candidate slot on dates `from..=to`, in chronological order.
pub fn slots_between(schedule: &WeeklySchedule, from: NaiveDate, to: NaiveDate) -> Vec<CandidateSlot> {
    from.iter_days()
        .take_while(|&date| date <= to)
        .flat_map(|date| {
            slots_on(schedule, date)
                .iter()
                .map(move |&range| CandidateSlot { date, range })
        })
        .collect()
}

/// Range of dates a user may pick: today through `booking_horizon_days`
/// ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingWindow {
    pub first: NaiveDate,
    pub last: NaiveDate,
}

impl BookingWindow {
    pub fn new(today: NaiveDate, policy: &BookingPolicy) -> Self {
        Self {
            first: today,
            last: today + Duration::days(i64::from(policy.booking_horizon_days)),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.first <= date && date <= self.last
    }

    /// Clips `from..=to` to the window; `None` when they do not intersect.
    pub fn clamp(&self, from: NaiveDate, to: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        let from = from.max(self.first);
        let to = to.min(self.last);
        (from <= to).then_some((from, to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn john_carter() -> WeeklySchedule {
        WeeklySchedule::from_entries(["Mon 09:00–11:00", "Thu 09:00–11:00"]).unwrap()
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_slots_on_weekday_without_sessions_is_empty() {
        // 2025-11-05 is a Wednesday
        assert!(slots_on(&john_carter(), d("2025-11-05")).is_empty());
    }

    #[test]
    fn test_slots_on_monday() {
        // 2025-11-03 is a Monday
        let sched = john_carter();
        let slots = slots_on(&sched, d("2025-11-03"));
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].to_string(), "09:00–11:00");
    }

    #[test]
    fn test_every_empty_weekday_yields_no_slots() {
        let sched = john_carter();
        for date in d("2025-11-02").iter_days().take(14) {
            let expected_empty = !matches!(date.weekday(), Weekday::Mon | Weekday::Thu);
            assert_eq!(slots_on(&sched, date).is_empty(), expected_empty, "{date}");
        }
    }

    #[test]
    fn test_next_available_from_tuesday_is_thursday() {
        // 2025-11-04 is a Tuesday; Thursday is two days out, Monday six
        assert_eq!(next_available_date(&john_carter(), d("2025-11-04"), 60), d("2025-11-06"));
    }

    #[test]
    fn test_next_available_is_fixed_point_on_open_day() {
        let sched = john_carter();
        for date in [d("2025-11-03"), d("2025-11-06"), d("2025-12-01")] {
            assert_eq!(next_available_date(&sched, date, 60), date);
        }
    }

    #[test]
    fn test_next_available_falls_back_to_start() {
        let empty = WeeklySchedule::default();
        assert_eq!(next_available_date(&empty, d("2025-11-04"), 60), d("2025-11-04"));
    }

    #[test]
    fn test_next_available_respects_horizon() {
        // Tuesday start, horizon of two days covers Tue and Wed only
        assert_eq!(next_available_date(&john_carter(), d("2025-11-04"), 2), d("2025-11-04"));
        assert_eq!(next_available_date(&john_carter(), d("2025-11-04"), 3), d("2025-11-06"));
        assert_eq!(next_available_date(&john_carter(), d("2025-11-04"), 0), d("2025-11-04"));
    }

    #[test]
    fn test_slots_between() {
        let slots = slots_between(&john_carter(), d("2025-11-03"), d("2025-11-10"));
        let dates: Vec<_> = slots.iter().map(|s| s.date).collect();
        assert_eq!(dates, vec![d("2025-11-03"), d("2025-11-06"), d("2025-11-10")]);
        assert!(slots_between(&john_carter(), d("2025-11-10"), d("2025-11-03")).is_empty());
    }

    #[test]
    fn test_booking_window() {
        let window = BookingWindow::new(d("2025-11-01"), &BookingPolicy::default());
        assert_eq!(window.last, d("2025-12-16"));
        assert!(window.contains(d("2025-11-01")));
        assert!(window.contains(d("2025-12-16")));
        assert!(!window.contains(d("2025-10-31")));
        assert!(!window.contains(d("2025-12-17")));

        assert_eq!(
            window.clamp(d("2025-10-20"), d("2025-11-05")),
            Some((d("2025-11-01"), d("2025-11-05")))
        );
        assert_eq!(window.clamp(d("2026-01-01"), d("2026-01-05")), None);
    }
}
