//! the 15-minute calendar grid matches are scheduled onto.

use crate::errors::{CoreError, CoreResult};
use chrono::{DateTime, Duration, Timelike, Utc};

pub const SLOT_MINUTES: i64 = 15;
const BASE_MATCH_MINUTES: i64 = 60;

fn ceil_div(a: i64, b: i64) -> i64 {
    (a + b - 1) / b
}

/// number of 15-minute slots a best-of-`best_of` match occupies.
pub fn duration_slots(best_of: i32) -> usize {
    ceil_div(BASE_MATCH_MINUTES * best_of as i64, SLOT_MINUTES) as usize
}

/// number of 15-minute slots the mandatory post-match cooldown occupies.
pub fn gap_slots(game_gaps_minutes: i32) -> usize {
    ceil_div(game_gaps_minutes.max(0) as i64, SLOT_MINUTES) as usize
}

fn round_up_to_grid(t: DateTime<Utc>) -> DateTime<Utc> {
    let minute = t.minute() as i64;
    let remainder = minute % SLOT_MINUTES;
    let base = t
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .expect("zeroing seconds/nanos never fails");
    if remainder == 0 {
        base
    } else {
        base + Duration::minutes(SLOT_MINUTES - remainder)
    }
}

/// the ordered list of slot instants in `[starts_at, ends_at)`, rounded up to the grid.
pub fn build_slot_grid(
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
) -> CoreResult<Vec<DateTime<Utc>>> {
    let first = round_up_to_grid(starts_at);
    let mut slots = Vec::new();
    let mut t = first;
    while t < ends_at {
        slots.push(t);
        t += Duration::minutes(SLOT_MINUTES);
    }
    if slots.is_empty() {
        return Err(CoreError::Validation(
            "scheduling window has no available slots".into(),
        ));
    }
    Ok(slots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn duration_slots_matches_formula() {
        assert_eq!(duration_slots(1), 4);
        assert_eq!(duration_slots(3), 12);
        assert_eq!(duration_slots(5), 20);
    }

    #[test]
    fn gap_slots_rounds_up() {
        assert_eq!(gap_slots(0), 0);
        assert_eq!(gap_slots(15), 1);
        assert_eq!(gap_slots(20), 2);
        assert_eq!(gap_slots(60), 4);
    }

    #[test]
    fn grid_rounds_up_to_next_boundary() {
        let start = Utc.with_ymd_and_hms(2026, 1, 5, 10, 7, 30).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 1, 5, 11, 0, 0).unwrap();
        let slots = build_slot_grid(start, end).unwrap();
        assert_eq!(slots[0], Utc.with_ymd_and_hms(2026, 1, 5, 10, 15, 0).unwrap());
        assert_eq!(slots.len(), 3);
    }

    #[test]
    fn empty_window_is_rejected() {
        let start = Utc.with_ymd_and_hms(2026, 1, 5, 10, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 1, 5, 10, 5, 0).unwrap();
        assert!(build_slot_grid(start, end).is_err());
    }
}
