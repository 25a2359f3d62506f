use chrono::{Duration, NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// A bookable one-hour window. Slots are created free and flip to booked
/// only through the reservation transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    pub id: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_booked: bool,
}

impl AvailabilitySlot {
    /// End time is always start + 1 hour; chrono's time addition wraps
    /// around midnight, so a 23:30 slot ends at 00:30.
    pub fn new(date: NaiveDate, start_time: NaiveTime) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            date,
            start_time,
            end_time: start_time + Duration::hours(1),
            is_booked: false,
        }
    }
}

pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| anyhow::anyhow!("invalid date (expected YYYY-MM-DD): {s}"))
}

/// Accepts HH:MM or HH:MM:SS; seconds are dropped.
pub fn parse_time(s: &str) -> anyhow::Result<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map(|t| t.with_second(0).unwrap_or(t))
        .map_err(|_| anyhow::anyhow!("invalid time (expected HH:MM): {s}"))
}

pub fn format_time(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}
