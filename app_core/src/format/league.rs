//! round-robin league structure generation

use crate::errors::{CoreError, CoreResult};
use crate::helper::round_robin_rounds;
use crate::{DatabasePort, Entrant, MatchStatus, NewMatch, Stage, Tournament, TournamentFormat};
use serde_json::json;
use tracing::instrument;

#[instrument(name = "format.league.build", skip(db, tournament, entrants), fields(tournament_id = %tournament.id, entrants = entrants.len()))]
pub async fn build(
    db: &dyn DatabasePort,
    tournament: &Tournament,
    entrants: &[Entrant],
) -> CoreResult<(Stage, usize)> {
    if entrants.len() < 2 {
        return Err(CoreError::Validation(
            "league format requires at least 2 entrants".into(),
        ));
    }

    let config = json!({
        "points": {"win": 1, "loss": 0},
        "tiebreakers": ["diff", "wins"],
    });
    let stage_id = db
        .insert_stage(tournament.id, TournamentFormat::League, config.clone())
        .await?;

    let ids: Vec<_> = entrants.iter().map(|e| e.id).collect();
    let rounds = round_robin_rounds(&ids);

    let mut new_matches = Vec::new();
    for (round_index, pairs) in rounds.iter().enumerate() {
        for (order, &(a, b)) in pairs.iter().enumerate() {
            new_matches.push(NewMatch {
                stage_id,
                round_number: round_index as i32 + 1,
                match_order: order as i32,
                best_of: 1,
                status: MatchStatus::Scheduled,
                entrant1: Some(a),
                entrant2: Some(b),
            });
        }
    }
    let match_count = new_matches.len();
    db.bulk_insert_matches(&new_matches).await?;

    let stage = Stage {
        id: stage_id,
        tournament_id: tournament.id,
        stage_type: TournamentFormat::League,
        stage_order: 0,
        best_of_default: 1,
        config,
    };
    Ok((stage, match_count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeDb;
    use crate::{EntrantStatus, TournamentStatus, TournamentVisibility};
    use chrono::Utc;
    use uuid::Uuid;

    fn tournament() -> Tournament {
        Tournament {
            id: Uuid::from_u128(100),
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
                tournament_id: Uuid::from_u128(100),
                name: format!("e{i}"),
                status: EntrantStatus::Active,
            })
            .collect()
    }

    #[tokio::test]
    async fn rejects_fewer_than_two_entrants() {
        let db = FakeDb::default();
        let t = tournament();
        let result = build(&db, &t, &entrants(1)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn four_entrants_produce_six_matches_in_three_rounds() {
        let db = FakeDb::default();
        let t = tournament();
        let (_, count) = build(&db, &t, &entrants(4)).await.unwrap();
        assert_eq!(count, 6);
        let rounds: std::collections::HashSet<_> =
            db.matches.lock().unwrap().iter().map(|m| m.round_number).collect();
        assert_eq!(rounds.len(), 3);
    }
}
