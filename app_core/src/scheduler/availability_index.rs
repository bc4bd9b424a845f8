//! expands weekly-recurring availability into concrete intervals clipped to the
//! tournament window, then derives per-duration available-start-slot indices.

use crate::availability::to_offset;
use crate::scheduler::slots::SLOT_MINUTES;
use crate::UserAvailability;
use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use chrono_tz::Tz;
use std::collections::HashMap;
use uuid::Uuid;

/// per-user sorted, non-overlap-checked list of concrete availability intervals.
pub fn expand_weekly_availability(
    rows: &[UserAvailability],
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    tz: Tz,
) -> HashMap<Uuid, Vec<(DateTime<Utc>, DateTime<Utc>)>> {
    let local_start = tz.from_utc_datetime(&starts_at.naive_utc());
    let local_end = tz.from_utc_datetime(&ends_at.naive_utc());

    let days_since_monday = local_start.weekday().num_days_from_monday() as i64;
    let monday = local_start.date_naive() - Duration::days(days_since_monday);
    let monday_midnight = monday.and_hms_opt(0, 0, 0).expect("midnight is a valid time");
    let mut week_start = tz
        .from_local_datetime(&monday_midnight)
        .single()
        .unwrap_or_else(|| tz.from_utc_datetime(&monday_midnight));

    let mut out: HashMap<Uuid, Vec<(DateTime<Utc>, DateTime<Utc>)>> = HashMap::new();
    while week_start < local_end {
        for row in rows {
            let win_start = week_start + Duration::seconds(to_offset(row.start_day, row.start_time));
            let win_end = week_start + Duration::seconds(to_offset(row.end_day, row.end_time));
            let clipped_start = win_start.max(local_start);
            let clipped_end = win_end.min(local_end);
            if clipped_start >= clipped_end {
                continue;
            }
            out.entry(row.user_id)
                .or_default()
                .push((clipped_start.with_timezone(&Utc), clipped_end.with_timezone(&Utc)));
        }
        week_start += Duration::weeks(1);
    }

    for intervals in out.values_mut() {
        intervals.sort_by_key(|(s, _)| *s);
    }
    out
}

/// difference-array sweep: for every slot index `i`, a user is available for a
/// `duration_slots`-long match starting at `i` iff some interval fully contains
/// `[slots[i], slots[i] + duration_slots * 15m)`.
pub fn compute_available_start_indices(
    slots: &[DateTime<Utc>],
    intervals: &[(DateTime<Utc>, DateTime<Utc>)],
    duration_slots: usize,
) -> Vec<usize> {
    let n = slots.len();
    if duration_slots == 0 || duration_slots > n {
        return Vec::new();
    }
    let span = Duration::minutes(SLOT_MINUTES * duration_slots as i64);
    let mut diff = vec![0i32; n + 1];
    for &(start, end) in intervals {
        let lo = slots.partition_point(|&t| t < start);
        let cutoff = end - span;
        let hi = slots.partition_point(|&t| t <= cutoff).min(n);
        if lo < hi {
            diff[lo] += 1;
            diff[hi] -= 1;
        }
    }
    let mut running = 0i32;
    let mut result = Vec::new();
    for (i, d) in diff.iter().take(n).enumerate() {
        running += d;
        if running > 0 {
            result.push(i);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::slots::build_slot_grid;
    use chrono::NaiveTime;
    use chrono::Weekday;

    #[test]
    fn expansion_clips_to_window_and_sorts() {
        let starts = Utc.with_ymd_and_hms(2026, 1, 5, 0, 0, 0).unwrap(); // Monday
        let ends = Utc.with_ymd_and_hms(2026, 1, 12, 0, 0, 0).unwrap();
        let user = Uuid::from_u128(1);
        let rows = vec![UserAvailability {
            id: Uuid::from_u128(100),
            user_id: user,
            start_day: Weekday::Mon,
            start_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            end_day: Weekday::Mon,
            end_time: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
        }];
        let expanded = expand_weekly_availability(&rows, starts, ends, Tz::UTC);
        let intervals = &expanded[&user];
        assert_eq!(intervals.len(), 1);
        assert_eq!(intervals[0].0, Utc.with_ymd_and_hms(2026, 1, 5, 18, 0, 0).unwrap());
    }

    #[test]
    fn available_start_indices_cover_exact_fitting_window() {
        let start = Utc.with_ymd_and_hms(2026, 1, 5, 18, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 1, 5, 19, 0, 0).unwrap();
        let slots = build_slot_grid(start, end).unwrap();
        assert_eq!(slots.len(), 4);
        let indices = compute_available_start_indices(&slots, &[(start, end)], 4);
        assert_eq!(indices, vec![0]);
        let indices_small = compute_available_start_indices(&slots, &[(start, end)], 1);
        assert_eq!(indices_small, vec![0, 1, 2, 3]);
    }
}
