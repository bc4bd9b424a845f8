//! match scheduler: assigns every unscheduled match of a tournament to a concrete
//! calendar slot, respecting captain availability, per-user non-overlap, and the
//! tournament's calendar window.

mod availability_index;
mod reservation;
mod slots;

use crate::errors::{CoreError, CoreResult};
use crate::settings::SchedulerSettings;
use crate::{DatabasePort, Match, MatchUpdate};
use availability_index::{compute_available_start_indices, expand_weekly_availability};
use chrono::{DateTime, TimeZone, Timelike, Utc};
use reservation::ReservationTracker;
use serde::{Deserialize, Serialize};
use slots::{build_slot_grid, duration_slots, gap_slots, SLOT_MINUTES};
use std::collections::{HashMap, HashSet};
use tracing::instrument;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulingResult {
    pub tournament_id: Uuid,
    pub scheduled: usize,
    pub skipped: usize,
}

#[instrument(name = "match_scheduler.schedule", skip(db, settings), fields(tournament_id = %tournament_id))]
pub async fn schedule_tournament_matches(
    db: &dyn DatabasePort,
    tournament_id: Uuid,
    settings: &SchedulerSettings,
) -> CoreResult<SchedulingResult> {
    let tournament = db
        .load_tournament_for_update(tournament_id)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("tournament {tournament_id}")))?;

    let slot_grid = build_slot_grid(tournament.starts_at, tournament.ends_at)?;

    let intake = db.load_unscheduled_matches(tournament_id).await?;
    if intake.is_empty() {
        return Ok(SchedulingResult {
            tournament_id,
            scheduled: 0,
            skipped: 0,
        });
    }

    let entrant_ids: Vec<Uuid> = {
        let mut set = HashSet::new();
        for m in &intake {
            set.extend(m.captains_entrants());
        }
        set.into_iter().collect()
    };

    let captains = db.load_captains(&entrant_ids).await?;
    let missing_captains: Vec<Uuid> = entrant_ids
        .iter()
        .copied()
        .filter(|e| !captains.contains_key(e))
        .collect();
    if !missing_captains.is_empty() {
        return Err(CoreError::Validation(format!(
            "entrants missing captain: {missing_captains:?}"
        )));
    }

    let user_ids: Vec<Uuid> = {
        let mut set: HashSet<Uuid> = captains.values().copied().collect();
        set.drain().collect()
    };

    let availability_rows = db.load_availabilities(&user_ids).await?;
    let mut malformed = crate::utils::validation::ValidationErrors::new();
    for row in &availability_rows {
        if let Err(field_error) = row.validate() {
            malformed.add(field_error);
        }
    }
    if !malformed.is_empty() {
        return Err(CoreError::Fields(malformed));
    }

    let users_with_rows: HashSet<Uuid> = availability_rows.iter().map(|a| a.user_id).collect();
    let missing_rows: Vec<Uuid> = user_ids
        .iter()
        .copied()
        .filter(|u| !users_with_rows.contains(u))
        .collect();
    if !missing_rows.is_empty() {
        return Err(CoreError::Validation(format!(
            "users missing availability: {missing_rows:?}"
        )));
    }

    let expanded = expand_weekly_availability(
        &availability_rows,
        tournament.starts_at,
        tournament.ends_at,
        settings.local_tz,
    );
    let empty_after_clip: Vec<Uuid> = user_ids
        .iter()
        .copied()
        .filter(|u| expanded.get(u).map(|v| v.is_empty()).unwrap_or(true))
        .collect();
    if !empty_after_clip.is_empty() {
        return Err(CoreError::Validation(format!(
            "users have no availability within tournament window: {empty_after_clip:?}"
        )));
    }

    let gap = gap_slots(tournament.game_gaps);

    let mut index_cache: HashMap<(Uuid, usize), Vec<usize>> = HashMap::new();
    let mut available_for = |user: Uuid, duration: usize| -> Vec<usize> {
        index_cache
            .entry((user, duration))
            .or_insert_with(|| {
                let empty = Vec::new();
                let intervals = expanded.get(&user).unwrap_or(&empty);
                compute_available_start_indices(&slot_grid, intervals, duration)
            })
            .clone()
    };

    let mut tracker = ReservationTracker::new();
    let already_scheduled = db
        .load_already_scheduled_matches_touching(&entrant_ids)
        .await?;
    for m in &already_scheduled {
        let Some(scheduled_at) = m.scheduled_at else {
            continue;
        };
        let d = duration_slots(m.best_of) + gap;
        let idx = slot_index_of(scheduled_at, slot_grid[0]);
        for entrant in m.captains_entrants() {
            if let Some(&user) = captains.get(&entrant) {
                tracker.reserve(user, idx, idx + d);
            }
        }
    }

    // all matches currently come from a single stage per tournament; stage ordering
    // will matter once multi-stage tournaments exist, so this sort is duration-scarcity
    // first and match id as the tie-break.
    let mut ordered: Vec<&Match> = intake.iter().collect();
    ordered.sort_by_key(|m| {
        let d = duration_slots(m.best_of);
        let [e1, e2] = [m.entrant1.unwrap(), m.entrant2.unwrap()];
        let u1 = captains[&e1];
        let u2 = captains[&e2];
        let flex = intersection_count(&available_for(u1, d), &available_for(u2, d));
        (flex, m.id)
    });

    let mut updates = Vec::with_capacity(ordered.len());
    for m in ordered {
        let d = duration_slots(m.best_of);
        let e1 = m.entrant1.unwrap();
        let e2 = m.entrant2.unwrap();
        let u1 = captains[&e1];
        let u2 = captains[&e2];
        let idx_a = available_for(u1, d);
        let idx_b = available_for(u2, d);

        let chosen = pick_best_slot_index(
            &idx_a,
            &idx_b,
            slot_grid.len(),
            d,
            gap,
            &tracker,
            u1,
            u2,
            &slot_grid,
            settings,
        );

        let Some(idx) = chosen else {
            return Err(CoreError::Validation(
                "Could not schedule all matches within tournament time range".into(),
            ));
        };

        tracker.reserve(u1, idx, idx + d + gap);
        tracker.reserve(u2, idx, idx + d + gap);

        let mut update = MatchUpdate::new(m.id);
        update.scheduled_at = Some(slot_grid[idx]);
        updates.push(update);
    }

    let scheduled = updates.len();
    db.bulk_update_matches(&updates).await?;

    Ok(SchedulingResult {
        tournament_id,
        scheduled,
        skipped: 0,
    })
}

fn slot_index_of(at: DateTime<Utc>, grid_start: DateTime<Utc>) -> usize {
    let minutes = (at - grid_start).num_minutes();
    (minutes / SLOT_MINUTES).max(0) as usize
}

fn intersection_count(a: &[usize], b: &[usize]) -> usize {
    let (mut i, mut j, mut count) = (0, 0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                count += 1;
                i += 1;
                j += 1;
            }
        }
    }
    count
}

fn dist_to_list(x: usize, list: &[usize]) -> usize {
    if list.is_empty() {
        return 0;
    }
    let pos = list.partition_point(|&v| v < x);
    let mut best = usize::MAX;
    if pos < list.len() {
        best = best.min(list[pos].abs_diff(x));
    }
    if pos > 0 {
        best = best.min(list[pos - 1].abs_diff(x));
    }
    best
}

fn is_pm_slot(idx: usize, slots: &[DateTime<Utc>], settings: &SchedulerSettings) -> bool {
    let local = settings.local_tz.from_utc_datetime(&slots[idx].naive_utc());
    local.hour() >= 12
}

#[allow(clippy::too_many_arguments)]
fn pick_best_slot_index(
    idx_a: &[usize],
    idx_b: &[usize],
    num_slots: usize,
    duration: usize,
    gap: usize,
    tracker: &ReservationTracker,
    user_a: Uuid,
    user_b: Uuid,
    slots: &[DateTime<Utc>],
    settings: &SchedulerSettings,
) -> Option<usize> {
    // phase A: first mutually-available index that also clears both reservations.
    let (mut i, mut j) = (0, 0);
    while i < idx_a.len() && j < idx_b.len() {
        match idx_a[i].cmp(&idx_b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                let idx = idx_a[i];
                let end = idx + duration + gap;
                if tracker.fits(user_a, idx, end) && tracker.fits(user_b, idx, end) {
                    return Some(idx);
                }
                i += 1;
                j += 1;
            }
        }
    }

    // phase B: best-effort fallback, weighted toward afternoon/evening slots.
    if duration > num_slots {
        return None;
    }
    let mut best_any: Option<(usize, usize)> = None; // (cost, idx)
    let mut best_pm: Option<(usize, usize)> = None;
    for idx in 0..=(num_slots - duration) {
        let end = idx + duration + gap;
        if end > num_slots {
            continue;
        }
        if !tracker.fits(user_a, idx, end) || !tracker.fits(user_b, idx, end) {
            continue;
        }
        let cost = (dist_to_list(idx, idx_a) + dist_to_list(idx, idx_b)) * SLOT_MINUTES as usize;
        if best_any.is_none_or(|(c, _)| cost < c) {
            best_any = Some((cost, idx));
        }
        if is_pm_slot(idx, slots, settings) && best_pm.is_none_or(|(c, _)| cost < c) {
            best_pm = Some((cost, idx));
        }
    }
    best_pm.or(best_any).map(|(_, idx)| idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeDb;
    use crate::{DbpMatch, DbpStage};
    use crate::{
        EntrantStatus, MatchStatus, Tournament, TournamentStatus, TournamentVisibility,
        UserAvailability,
    };
    use chrono::{NaiveTime, TimeZone, Weekday};
    use std::collections::HashMap as Map;
    use uuid::Uuid;

    fn tournament(starts: DateTime<Utc>, ends: DateTime<Utc>, game_gaps: i32) -> Tournament {
        Tournament {
            id: Uuid::from_u128(1),
            version: 0,
            owner_id: Uuid::from_u128(9),
            name: "t".into(),
            visibility: TournamentVisibility::Public,
            status: TournamentStatus::Running,
            starts_at: starts,
            ends_at: ends,
            game_gaps,
            team_size: 1,
        }
    }

    fn availability(user: Uuid, start_h: u32, end_h: u32) -> UserAvailability {
        UserAvailability {
            id: Uuid::new_v4(),
            user_id: user,
            start_day: Weekday::Mon,
            start_time: NaiveTime::from_hms_opt(start_h, 0, 0).unwrap(),
            end_day: Weekday::Mon,
            end_time: NaiveTime::from_hms_opt(end_h, 0, 0).unwrap(),
        }
    }

    async fn stage_with_match(
        db: &FakeDb,
        tournament_id: Uuid,
        entrant1: Uuid,
        entrant2: Uuid,
        best_of: i32,
    ) {
        let stage_id = db
            .insert_stage(
                tournament_id,
                crate::TournamentFormat::League,
                serde_json::json!({}),
            )
            .await
            .unwrap();
        db.bulk_insert_matches(&[crate::NewMatch {
            stage_id,
            round_number: 1,
            match_order: 0,
            best_of,
            status: MatchStatus::Scheduled,
            entrant1: Some(entrant1),
            entrant2: Some(entrant2),
        }])
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn schedules_single_match_at_first_mutual_slot() {
        let monday = Utc.with_ymd_and_hms(2026, 1, 5, 10, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 1, 6, 22, 0, 0).unwrap();
        let t = tournament(monday, end, 60);
        let db = FakeDb::default();
        db.set_tournament(t.clone());

        let e1 = Uuid::from_u128(1);
        let e2 = Uuid::from_u128(2);
        let u1 = Uuid::from_u128(10);
        let u2 = Uuid::from_u128(20);
        let mut captains = Map::new();
        captains.insert(e1, u1);
        captains.insert(e2, u2);
        db.set_captains(captains);
        db.set_availabilities(vec![availability(u1, 18, 22), availability(u2, 18, 22)]);

        stage_with_match(&db, t.id, e1, e2, 1).await;

        let settings = SchedulerSettings::default();
        let result = schedule_tournament_matches(&db, t.id, &settings).await.unwrap();
        assert_eq!(result.scheduled, 1);

        let matches = db.matches.lock().unwrap().clone();
        let scheduled_at = matches[0].scheduled_at.unwrap();
        assert_eq!(scheduled_at, Utc.with_ymd_and_hms(2026, 1, 5, 18, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn infeasible_window_errors_without_partial_scheduling() {
        let monday = Utc.with_ymd_and_hms(2026, 1, 5, 18, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 1, 5, 19, 0, 0).unwrap(); // 1h window, best_of=1 needs 1h+gap
        let t = tournament(monday, end, 60);
        let db = FakeDb::default();
        db.set_tournament(t.clone());

        let e1 = Uuid::from_u128(1);
        let e2 = Uuid::from_u128(2);
        let u1 = Uuid::from_u128(10);
        let u2 = Uuid::from_u128(20);
        let mut captains = Map::new();
        captains.insert(e1, u1);
        captains.insert(e2, u2);
        db.set_captains(captains);
        db.set_availabilities(vec![availability(u1, 18, 19), availability(u2, 18, 19)]);

        stage_with_match(&db, t.id, e1, e2, 1).await;
        // second match forces a conflict: same captains need back-to-back matches but
        // the window only fits one hour-long + gap reservation.
        let stage_id = {
            let stages = db.stages.lock().unwrap();
            stages.last().unwrap().0
        };
        db.bulk_insert_matches(&[crate::NewMatch {
            stage_id,
            round_number: 1,
            match_order: 1,
            best_of: 1,
            status: MatchStatus::Scheduled,
            entrant1: Some(e1),
            entrant2: Some(e2),
        }])
        .await
        .unwrap();

        let settings = SchedulerSettings::default();
        let result = schedule_tournament_matches(&db, t.id, &settings).await;
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }
}
