//! single-elimination bracket generation with standard seeding and bye auto-advance

use crate::errors::{CoreError, CoreResult};
use crate::helper::{bracket_seed_positions, next_power_of_two, wins_needed};
use crate::{
    DatabasePort, Entrant, Match, MatchStatus, MatchUpdate, NewMatch, Stage, Tournament,
    TournamentFormat,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde_json::json;
use tracing::instrument;

#[instrument(name = "format.single_elim.build", skip(db, tournament, entrants, rng), fields(tournament_id = %tournament.id, entrants = entrants.len()))]
pub async fn build(
    db: &dyn DatabasePort,
    tournament: &Tournament,
    entrants: &[Entrant],
    rng: &mut StdRng,
) -> CoreResult<(Stage, usize)> {
    if entrants.len() < 2 {
        return Err(CoreError::Validation(
            "single elimination format requires at least 2 entrants".into(),
        ));
    }

    let mut shuffled: Vec<_> = entrants.to_vec();
    shuffled.shuffle(rng);

    let size = next_power_of_two(shuffled.len());
    let positions = bracket_seed_positions(size as u32);

    // ordered[bracket_slot] = entrant placed there, 0-indexed; None is a bye.
    let mut ordered: Vec<Option<uuid::Uuid>> = vec![None; size];
    for (i, entrant) in shuffled.iter().enumerate() {
        let seed = i as u32 + 1;
        let slot = positions
            .iter()
            .position(|&s| s == seed)
            .expect("seed is present in bracket_seed_positions output");
        ordered[slot] = Some(entrant.id);
    }

    let config = json!({ "bracket_size": size });
    let stage_id = db
        .insert_stage(tournament.id, TournamentFormat::SingleElim, config.clone())
        .await?;

    let rounds_count = size.trailing_zeros();
    let mut new_matches = Vec::new();
    for r in 1..=rounds_count {
        let matches_in_round = size >> r;
        for o in 0..matches_in_round {
            let (e1, e2) = if r == 1 {
                (ordered[2 * o], ordered[2 * o + 1])
            } else {
                (None, None)
            };
            new_matches.push(NewMatch {
                stage_id,
                round_number: r as i32,
                match_order: o as i32,
                best_of: 1,
                status: MatchStatus::Scheduled,
                entrant1: e1,
                entrant2: e2,
            });
        }
    }
    let total_matches = new_matches.len();
    db.bulk_insert_matches(&new_matches).await?;

    advance_byes(db, stage_id).await?;

    let stage = Stage {
        id: stage_id,
        tournament_id: tournament.id,
        stage_type: TournamentFormat::SingleElim,
        stage_order: 0,
        best_of_default: 1,
        config,
    };
    Ok((stage, total_matches))
}

/// finds round-1 matches with exactly one entrant, finishes them as byes, and
/// propagates the winner into the corresponding round-2 slot.
async fn advance_byes(db: &dyn DatabasePort, stage_id: uuid::Uuid) -> CoreResult<()> {
    let rows = db.load_stage_matches(stage_id).await?;
    let round1: Vec<&Match> = rows.iter().filter(|m| m.round_number == 1).collect();
    let round2: Vec<&Match> = rows.iter().filter(|m| m.round_number == 2).collect();
    if round1.is_empty() {
        return Ok(());
    }

    let mut updates: std::collections::HashMap<uuid::Uuid, MatchUpdate> = std::collections::HashMap::new();
    for m in &round1 {
        let present = match (m.entrant1, m.entrant2) {
            (Some(e), None) => Some((1u8, e)),
            (None, Some(e)) => Some((2u8, e)),
            _ => None,
        };
        let Some((slot, winner)) = present else {
            continue;
        };
        let wins = wins_needed(m.best_of)?;
        let mut bye_update = MatchUpdate::new(m.id);
        bye_update.status = Some(MatchStatus::Finished);
        bye_update.winner_slot = Some(slot);
        bye_update.score1 = Some(if slot == 1 { wins } else { 0 });
        bye_update.score2 = Some(if slot == 2 { wins } else { 0 });
        updates.insert(m.id, bye_update);

        if let Some(&target) = round2.get((m.match_order / 2) as usize) {
            let entry = updates
                .entry(target.id)
                .or_insert_with(|| MatchUpdate::new(target.id));
            if m.match_order % 2 == 0 {
                entry.entrant1 = Some(winner);
            } else {
                entry.entrant2 = Some(winner);
            }
        }
    }

    if updates.is_empty() {
        return Ok(());
    }
    let batch: Vec<_> = updates.into_values().collect();
    db.bulk_update_matches(&batch).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper::deterministic_rng;
    use crate::test_support::FakeDb;
    use crate::{EntrantStatus, MatchStatus, TournamentStatus, TournamentVisibility};
    use chrono::Utc;
    use uuid::Uuid;

    fn tournament(id: u128) -> Tournament {
        Tournament {
            id: Uuid::from_u128(id),
            version: 0,
            owner_id: Uuid::from_u128(1),
            name: "t".into(),
            visibility: TournamentVisibility::Public,
            status: TournamentStatus::Registration,
            starts_at: Utc::now(),
            ends_at: Utc::now(),
            game_gaps: 0,
            team_size: 1,
        }
    }

    fn entrants(n: u128) -> Vec<Entrant> {
        (1..=n)
            .map(|i| Entrant {
                id: Uuid::from_u128(i),
                tournament_id: Uuid::from_u128(1),
                name: format!("e{i}"),
                status: EntrantStatus::Active,
            })
            .collect()
    }

    #[tokio::test]
    async fn five_entrants_create_seven_matches_with_one_bye_advanced() {
        let db = FakeDb::default();
        let t = tournament(7);
        let mut rng = deterministic_rng(t.id, "SINGLE_ELIM");
        let (_, count) = build(&db, &t, &entrants(5), &mut rng).await.unwrap();
        assert_eq!(count, 7);

        let rows = db.matches.lock().unwrap().clone();
        let round1: Vec<_> = rows.iter().filter(|m| m.round_number == 1).collect();
        assert_eq!(round1.len(), 4);
        let byes: Vec<_> = round1
            .iter()
            .filter(|m| m.status == MatchStatus::Finished)
            .collect();
        assert_eq!(byes.len(), 1);
        let bye = byes[0];
        assert!(bye.winner_slot.is_some());

        let round2: Vec<_> = rows.iter().filter(|m| m.round_number == 2).collect();
        assert_eq!(round2.len(), 2);
        let target = &round2[(bye.match_order / 2) as usize];
        let winner = if bye.winner_slot == Some(1) {
            bye.entrant1
        } else {
            bye.entrant2
        };
        if bye.match_order % 2 == 0 {
            assert_eq!(target.entrant1, winner);
        } else {
            assert_eq!(target.entrant2, winner);
        }
    }

    #[tokio::test]
    async fn build_is_deterministic_for_same_tournament_and_format() {
        let t = tournament(42);
        let db1 = FakeDb::default();
        let mut rng1 = deterministic_rng(t.id, "SINGLE_ELIM");
        build(&db1, &t, &entrants(6), &mut rng1).await.unwrap();

        let db2 = FakeDb::default();
        let mut rng2 = deterministic_rng(t.id, "SINGLE_ELIM");
        build(&db2, &t, &entrants(6), &mut rng2).await.unwrap();

        let mut rows1 = db1.matches.lock().unwrap().clone();
        let mut rows2 = db2.matches.lock().unwrap().clone();
        for rows in [&mut rows1, &mut rows2] {
            rows.sort_by_key(|m| (m.round_number, m.match_order));
        }
        let tuples = |rows: &[Match]| -> Vec<_> {
            rows.iter()
                .map(|m| (m.round_number, m.match_order, m.entrant1, m.entrant2))
                .collect()
        };
        assert_eq!(tuples(&rows1), tuples(&rows2));
    }
}
