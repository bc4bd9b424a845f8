//! orchestrates a single tournament's bracket build: lock, validate, dispatch, flip to running.

use crate::errors::{CoreError, CoreResult};
use crate::format::{league, single_elim};
use crate::helper::deterministic_rng;
use crate::{DatabasePort, Entrant, TournamentFormat, TournamentStatus};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructureBuildResult {
    pub tournament_id: Uuid,
    pub stage_id: Uuid,
    pub matches_created: usize,
}

#[instrument(name = "structure_builder.build", skip(db), fields(tournament_id = %tournament_id, format = format.as_seed_str()))]
pub async fn build_structure(
    db: &dyn DatabasePort,
    tournament_id: Uuid,
    format: TournamentFormat,
) -> CoreResult<StructureBuildResult> {
    let mut tournament = db
        .load_tournament_for_update(tournament_id)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("tournament {tournament_id}")))?;

    if tournament.is_locked_for_build() {
        return Err(CoreError::Conflict(
            "tournament already started or finished".into(),
        ));
    }
    if db.tournament_has_stage(tournament_id).await? {
        return Err(CoreError::Conflict("structure already exists".into()));
    }

    let with_counts = db
        .load_active_entrants_with_member_counts(tournament_id)
        .await?;

    let mut eligible: Vec<Entrant> = Vec::with_capacity(with_counts.len());
    let mut incomplete: Vec<Uuid> = Vec::new();
    for (entrant, member_count) in with_counts {
        if tournament.team_size > 1 && member_count as i32 != tournament.team_size {
            incomplete.push(entrant.id);
        } else {
            eligible.push(entrant);
        }
    }
    if !incomplete.is_empty() {
        db.delete_entrants_by_id(&incomplete).await?;
    }

    if eligible.len() < 2 {
        return Err(CoreError::Validation(
            "at least 2 entrants are required to build a structure".into(),
        ));
    }

    let mut rng = deterministic_rng(tournament_id, format.as_seed_str());
    let (stage, matches_created) = match format {
        TournamentFormat::League => league::build(db, &tournament, &eligible).await?,
        TournamentFormat::SingleElim => {
            single_elim::build(db, &tournament, &eligible, &mut rng).await?
        }
    };

    tournament.status = TournamentStatus::Running;
    db.save_tournament(&tournament).await?;

    Ok(StructureBuildResult {
        tournament_id,
        stage_id: stage.id,
        matches_created,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeDb;
    use crate::{EntrantStatus, Tournament, TournamentVisibility};
    use chrono::Utc;

    fn tournament(team_size: i32) -> Tournament {
        Tournament {
            id: Uuid::from_u128(1),
            version: 0,
            owner_id: Uuid::from_u128(9),
            name: "t".into(),
            visibility: TournamentVisibility::Public,
            status: TournamentStatus::Registration,
            starts_at: Utc::now(),
            ends_at: Utc::now(),
            game_gaps: 0,
            team_size,
        }
    }

    fn entrant(i: u128, tournament_id: Uuid) -> Entrant {
        Entrant {
            id: Uuid::from_u128(i),
            tournament_id,
            name: format!("e{i}"),
            status: EntrantStatus::Active,
        }
    }

    #[tokio::test]
    async fn rejects_already_running_tournament() {
        let db = FakeDb::default();
        let mut t = tournament(1);
        t.status = TournamentStatus::Running;
        db.set_tournament(t.clone());
        let result = build_structure(&db, t.id, TournamentFormat::League).await;
        assert!(matches!(result, Err(CoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn prunes_incomplete_teams_then_builds() {
        let db = FakeDb::default();
        let t = tournament(2);
        db.set_tournament(t.clone());
        db.set_entrants(vec![
            (entrant(1, t.id), 2),
            (entrant(2, t.id), 2),
            (entrant(3, t.id), 1), // incomplete, gets pruned
        ]);
        let result = build_structure(&db, t.id, TournamentFormat::League).await.unwrap();
        assert_eq!(result.matches_created, 1);
        assert_eq!(db.entrants.lock().unwrap().len(), 2);
        assert_eq!(
            db.tournament.lock().unwrap().as_ref().unwrap().status,
            TournamentStatus::Running
        );
    }

    #[tokio::test]
    async fn rejects_fewer_than_two_eligible_entrants() {
        let db = FakeDb::default();
        let t = tournament(1);
        db.set_tournament(t.clone());
        db.set_entrants(vec![(entrant(1, t.id), 1)]);
        let result = build_structure(&db, t.id, TournamentFormat::League).await;
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }
}
