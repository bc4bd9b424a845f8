//! the async job that drives one tournament from registration to a scheduled bracket.

use crate::errors::CoreResult;
use crate::scheduler::{schedule_tournament_matches, SchedulingResult};
use crate::settings::SchedulerSettings;
use crate::structure_builder::{build_structure, StructureBuildResult};
use crate::{DatabasePort, TournamentFormat};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildTournamentStructureResult {
    pub tournament_id: Uuid,
    pub stage_id: Uuid,
    pub matches_created: usize,
    pub scheduling: SchedulingResult,
}

/// runs `build_structure` then `schedule_tournament_matches` for one tournament.
///
/// a validation failure from the scheduler is downgraded to a zero-scheduled result
/// so the bracket still exists even when nobody could be slotted in; any other error
/// (including a validation failure from the builder itself) propagates so the caller's
/// retry policy (autoretry, exponential backoff, up to 5 attempts) can take over.
#[instrument(name = "structure_build_task.run", skip(db, settings), fields(tournament_id = %tournament_id, format = format.as_seed_str()))]
pub async fn run_structure_build_task(
    db: &dyn DatabasePort,
    tournament_id: Uuid,
    format: TournamentFormat,
    settings: &SchedulerSettings,
) -> CoreResult<BuildTournamentStructureResult> {
    let StructureBuildResult {
        tournament_id,
        stage_id,
        matches_created,
    } = build_structure(db, tournament_id, format).await?;

    let scheduling = match schedule_tournament_matches(db, tournament_id, settings).await {
        Ok(result) => result,
        Err(e) if e.is_validation() => {
            warn!(error = %e, "scheduling_skipped");
            SchedulingResult {
                tournament_id,
                scheduled: 0,
                skipped: 0,
            }
        }
        Err(e) => return Err(e),
    };

    info!(
        matches_created,
        scheduled = scheduling.scheduled,
        "structure_build_task_complete"
    );
    Ok(BuildTournamentStructureResult {
        tournament_id,
        stage_id,
        matches_created,
        scheduling,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeDb;
    use crate::{EntrantStatus, Entrant, Tournament, TournamentStatus, TournamentVisibility};
    use chrono::Utc;

    fn tournament() -> Tournament {
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
            team_size: 1,
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
    async fn scheduler_validation_failure_is_downgraded_not_propagated() {
        let db = FakeDb::default();
        let t = tournament();
        db.set_tournament(t.clone());
        db.set_entrants(vec![(entrant(1, t.id), 1), (entrant(2, t.id), 1)]);
        // no captains registered: the scheduler's own captain-lookup validation fires.
        let settings = SchedulerSettings::default();

        let result = run_structure_build_task(&db, t.id, TournamentFormat::League, &settings)
            .await
            .unwrap();
        assert_eq!(result.matches_created, 1);
        assert_eq!(result.scheduling.scheduled, 0);
    }
}
