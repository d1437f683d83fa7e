use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Week order used for storage and display: Sun..Sat.
pub const WEEK: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("malformed schedule entry: {0:?}")]
    InvalidEntry(String),

    #[error("invalid weekday: {0:?}")]
    InvalidWeekday(String),

    #[error("invalid time of day: {0:?}")]
    InvalidTime(String),

    #[error("range must start before it ends: {0}")]
    EmptyRange(String),

    #[error("overlapping ranges on {day}: {first} and {second}")]
    Overlap {
        day: &'static str,
        first: String,
        second: String,
    },

    #[error("schedule is not a JSON list of entries: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn weekday_symbol(day: Weekday) -> &'static str {
    match day {
        Weekday::Sun => "Sun",
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
    }
}

pub fn parse_weekday(s: &str) -> Result<Weekday, ScheduleError> {
    s.trim()
        .parse::<Weekday>()
        .map_err(|_| ScheduleError::InvalidWeekday(s.to_string()))
}

pub fn parse_time(s: &str) -> Result<NaiveTime, ScheduleError> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M").map_err(|_| ScheduleError::InvalidTime(s.to_string()))
}

/// Pulls the first `H:MM` / `HH:MM` token out of free-form text such as
/// `"09:00–11:00"` or `"starts at 9:30"`.
pub fn extract_first_time(input: &str) -> Result<NaiveTime, ScheduleError> {
    let bytes = input.as_bytes();

    for (i, &b) in bytes.iter().enumerate() {
        if b != b':' {
            continue;
        }

        let mut start = i;
        while start > 0 && i - start < 2 && bytes[start - 1].is_ascii_digit() {
            start -= 1;
        }
        let has_hour = start < i;
        let has_minutes = bytes.len() >= i + 3
            && bytes[i + 1].is_ascii_digit()
            && bytes[i + 2].is_ascii_digit();

        if has_hour && has_minutes {
            return parse_time(&input[start..i + 3]);
        }
    }

    Err(ScheduleError::InvalidTime(input.to_string()))
}

fn serialize_hhmm<S: Serializer>(time: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(&time.format("%H:%M"))
}

/// A time-of-day range within one day, minute granularity, `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TimeRange {
    #[serde(serialize_with = "serialize_hhmm")]
    pub start: NaiveTime,
    #[serde(serialize_with = "serialize_hhmm")]
    pub end: NaiveTime,
}

impl TimeRange {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, ScheduleError> {
        if start >= end {
            return Err(ScheduleError::EmptyRange(format!(
                "{}–{}",
                start.format("%H:%M"),
                end.format("%H:%M")
            )));
        }
        Ok(Self { start, end })
    }

    /// Parses `"09:00–11:00"` or `"09:00-11:00"`.
    pub fn parse(s: &str) -> Result<Self, ScheduleError> {
        let (start, end) = s
            .split_once(|c| c == '–' || c == '-')
            .ok_or_else(|| ScheduleError::InvalidEntry(s.to_string()))?;
        Self::new(parse_time(start)?, parse_time(end)?)
    }

    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}–{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

/// A trainer's recurring availability. Ranges for a day are sorted by start
/// and never overlap; construction rejects anything else.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeeklySchedule {
    days: [Vec<TimeRange>; 7],
}

impl WeeklySchedule {
    /// Builds a schedule from entries like `"Mon 09:00–11:00"`.
    pub fn from_entries<I, S>(entries: I) -> Result<Self, ScheduleError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut days: [Vec<TimeRange>; 7] = Default::default();

        for entry in entries {
            let entry = entry.as_ref().trim();
            let (day, range) = entry
                .split_once(char::is_whitespace)
                .ok_or_else(|| ScheduleError::InvalidEntry(entry.to_string()))?;
            let day = parse_weekday(day)?;
            days[day.num_days_from_sunday() as usize].push(TimeRange::parse(range)?);
        }

        for (idx, ranges) in days.iter_mut().enumerate() {
            ranges.sort_by_key(|r| r.start);
            for pair in ranges.windows(2) {
                if pair[0].overlaps(&pair[1]) {
                    return Err(ScheduleError::Overlap {
                        day: weekday_symbol(WEEK[idx]),
                        first: pair[0].to_string(),
                        second: pair[1].to_string(),
                    });
                }
            }
        }

        Ok(Self { days })
    }

    /// Parses the stored form: a JSON list of entries.
    pub fn from_json(s: &str) -> Result<Self, ScheduleError> {
        let entries: Vec<String> = serde_json::from_str(s)?;
        Self::from_entries(entries)
    }

    pub fn ranges_for(&self, day: Weekday) -> &[TimeRange] {
        &self.days[day.num_days_from_sunday() as usize]
    }

    pub fn is_empty(&self) -> bool {
        self.days.iter().all(Vec::is_empty)
    }

    pub fn to_entries(&self) -> Vec<String> {
        WEEK.iter()
            .flat_map(|&day| {
                self.ranges_for(day)
                    .iter()
                    .map(move |r| format!("{} {r}", weekday_symbol(day)))
            })
            .collect()
    }

    pub fn to_human_readable(&self) -> String {
        WEEK.iter()
            .filter(|&&day| !self.ranges_for(day).is_empty())
            .map(|&day| {
                let ranges: Vec<String> = self.ranges_for(day).iter().map(|r| r.to_string()).collect();
                format!("{}: {}", weekday_symbol(day), ranges.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl Serialize for WeeklySchedule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let busy = WEEK.iter().filter(|&&d| !self.ranges_for(d).is_empty());
        let mut map = serializer.serialize_map(Some(busy.clone().count()))?;
        for &day in busy {
            let labels: Vec<String> = self.ranges_for(day).iter().map(|r| r.to_string()).collect();
            map.serialize_entry(weekday_symbol(day), &labels)?;
        }
        map.end()
    }
}

/// A concrete bookable slot: a date plus one of that weekday's ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CandidateSlot {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub range: TimeRange,
}

impl CandidateSlot {
    pub fn weekday(&self) -> Weekday {
        self.date.weekday()
    }

    /// The absolute instant the session starts.
    pub fn instant(&self) -> DateTime<Utc> {
        booked_instant(self.date, self.range.start)
    }
}

/// Current wall-clock time on the studio's clock, in the same form as
/// stored booked-time instants.
pub fn studio_now() -> DateTime<Utc> {
    Utc.from_utc_datetime(&chrono::Local::now().naive_local())
}

/// Combines a calendar date and time-of-day into the stored booked-time
/// instant. The studio runs on a single local clock, stored as UTC.
pub fn booked_instant(date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(time))
}
