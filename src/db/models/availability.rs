use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use time::{Date, OffsetDateTime, Weekday};
use validator::Validate;

pub const MINUTES_PER_DAY: i32 = 1440;

/// A bookable window in minutes from midnight, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start_minute: i32,
    pub end_minute: i32,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct AvailabilityRule {
    pub id: Uuid,
    pub coach_id: Uuid,
    pub weekday: i16,
    pub start_minute: i32,
    pub end_minute: i32,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewAvailabilityRule {
    #[validate(range(min = 0, max = 6, message = "Weekday must be 0 (Sunday) to 6 (Saturday)"))]
    pub weekday: i16,
    #[validate(range(min = 0, max = 1439))]
    pub start_minute: i32,
    #[validate(range(min = 1, max = 1440))]
    pub end_minute: i32,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAvailabilityRule {
    #[validate(range(min = 0, max = 1439))]
    pub start_minute: Option<i32>,
    #[validate(range(min = 1, max = 1440))]
    pub end_minute: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct AvailabilityException {
    pub id: Uuid,
    pub coach_id: Uuid,
    pub date: Date,
    pub start_minute: Option<i32>,
    pub end_minute: Option<i32>,
    pub is_available: bool,
    pub note: Option<String>,
    pub created_at: OffsetDateTime,
}

/// Upsert payload; replaces any prior exception for the same (coach, date).
#[derive(Debug, Deserialize, Validate)]
pub struct NewAvailabilityException {
    pub date: Date,
    #[validate(range(min = 0, max = 1439))]
    pub start_minute: Option<i32>,
    #[validate(range(min = 1, max = 1440))]
    pub end_minute: Option<i32>,
    pub is_available: bool,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

impl NewAvailabilityException {
    /// An available-day override must carry a well-formed window.
    pub fn window_is_valid(&self) -> bool {
        if !self.is_available {
            return true;
        }
        matches!((self.start_minute, self.end_minute), (Some(s), Some(e)) if s < e)
    }
}

/// Weekday index with the fixed contract 0=Sunday .. 6=Saturday.
pub fn weekday_index(date: Date) -> i16 {
    match date.weekday() {
        Weekday::Sunday => 0,
        Weekday::Monday => 1,
        Weekday::Tuesday => 2,
        Weekday::Wednesday => 3,
        Weekday::Thursday => 4,
        Weekday::Friday => 5,
        Weekday::Saturday => 6,
    }
}

/// Normalize windows: sort ascending and merge overlapping or touching ones.
pub fn merge_windows(mut windows: Vec<TimeWindow>) -> Vec<TimeWindow> {
    windows.retain(|w| w.start_minute < w.end_minute);
    windows.sort_by_key(|w| (w.start_minute, w.end_minute));

    let mut merged: Vec<TimeWindow> = Vec::with_capacity(windows.len());
    for window in windows {
        match merged.last_mut() {
            Some(last) if window.start_minute <= last.end_minute => {
                last.end_minute = last.end_minute.max(window.end_minute);
            }
            _ => merged.push(window),
        }
    }
    merged
}

/// Effective windows for one date: a date exception fully overrides weekly
/// rules; without one, the active rules for that weekday are merged.
pub fn resolve_windows(
    exception: Option<&AvailabilityException>,
    rules: &[AvailabilityRule],
) -> Vec<TimeWindow> {
    if let Some(exception) = exception {
        if !exception.is_available {
            return Vec::new();
        }
        return match (exception.start_minute, exception.end_minute) {
            (Some(start_minute), Some(end_minute)) if start_minute < end_minute => {
                vec![TimeWindow {
                    start_minute,
                    end_minute,
                }]
            }
            _ => Vec::new(),
        };
    }

    merge_windows(
        rules
            .iter()
            .filter(|rule| rule.is_active)
            .map(|rule| TimeWindow {
                start_minute: rule.start_minute,
                end_minute: rule.end_minute,
            })
            .collect(),
    )
}

/// True when two half-open windows share any minute.
pub fn windows_overlap(a_start: i32, a_end: i32, b_start: i32, b_end: i32) -> bool {
    a_start < b_end && b_start < a_end
}
