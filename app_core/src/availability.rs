//! a single weekly-recurring availability window for a user

use crate::utils::validation::FieldError;
use chrono::{NaiveTime, Timelike, Weekday};
use uuid::Uuid;

pub const SECONDS_PER_WEEK: i64 = 7 * 86_400;
const MAX_SPAN_SECONDS: i64 = 16 * 3600;

#[derive(Debug, Clone)]
pub struct UserAvailability {
    pub id: Uuid,
    pub user_id: Uuid,
    pub start_day: Weekday,
    pub start_time: NaiveTime,
    pub end_day: Weekday,
    pub end_time: NaiveTime,
}

/// offset of a (day, time) pair into a Monday-anchored week, in seconds.
pub fn to_offset(day: Weekday, time: NaiveTime) -> i64 {
    day.num_days_from_monday() as i64 * 86_400 + time.num_seconds_from_midnight() as i64
}

impl UserAvailability {
    pub fn start_offset(&self) -> i64 {
        to_offset(self.start_day, self.start_time)
    }

    pub fn end_offset(&self) -> i64 {
        to_offset(self.end_day, self.end_time)
    }

    /// enforces the window ordering and 16h max-span invariant; does not allow
    /// windows that wrap across the end of the week.
    pub fn validate(&self) -> Result<(), FieldError> {
        let start = self.start_offset();
        let end = self.end_offset();
        if end <= start {
            return Err(FieldError::builder()
                .set_field("end_time")
                .add_user_defined_code("must_be_after_start")
                .add_message("availability end must be after its start within the same week")
                .build());
        }
        if end - start > MAX_SPAN_SECONDS {
            return Err(FieldError::builder()
                .set_field("end_time")
                .add_user_defined_code("span_too_long")
                .add_message("availability window cannot span more than 16 hours")
                .build());
        }
        Ok(())
    }
}
