//! in-memory fake of [`crate::DatabasePort`] used by unit tests across the crate.
//! not a production adapter; see `db_postgres` for the real one.

use crate::{
    DbError, DbResult, DbpAvailability, DbpMatch, DbpStage, DbpTournament, Entrant, Match,
    MatchStatus, MatchUpdate, NewMatch, Tournament, TournamentFormat, UserAvailability,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
pub struct FakeDb {
    pub tournament: Mutex<Option<Tournament>>,
    pub entrants: Mutex<Vec<(Entrant, usize)>>,
    pub stages: Mutex<Vec<(Uuid, Uuid)>>,
    pub matches: Mutex<Vec<Match>>,
    pub captains: Mutex<HashMap<Uuid, Uuid>>,
    pub availabilities: Mutex<Vec<UserAvailability>>,
}

impl FakeDb {
    pub fn set_tournament(&self, t: Tournament) {
        *self.tournament.lock().unwrap() = Some(t);
    }

    pub fn set_entrants(&self, entrants: Vec<(Entrant, usize)>) {
        *self.entrants.lock().unwrap() = entrants;
    }

    pub fn set_captains(&self, captains: HashMap<Uuid, Uuid>) {
        *self.captains.lock().unwrap() = captains;
    }

    pub fn set_availabilities(&self, rows: Vec<UserAvailability>) {
        *self.availabilities.lock().unwrap() = rows;
    }
}

#[async_trait]
impl DbpTournament for FakeDb {
    async fn load_tournament_for_update(&self, tournament_id: Uuid) -> DbResult<Option<Tournament>> {
        Ok(self
            .tournament
            .lock()
            .unwrap()
            .clone()
            .filter(|t| t.id == tournament_id))
    }

    async fn save_tournament(&self, tournament: &Tournament) -> DbResult<()> {
        *self.tournament.lock().unwrap() = Some(tournament.clone());
        Ok(())
    }

    async fn load_active_entrants_with_member_counts(
        &self,
        _tournament_id: Uuid,
    ) -> DbResult<Vec<(Entrant, usize)>> {
        Ok(self.entrants.lock().unwrap().clone())
    }

    async fn delete_entrants_by_id(&self, entrant_ids: &[Uuid]) -> DbResult<()> {
        self.entrants
            .lock()
            .unwrap()
            .retain(|(e, _)| !entrant_ids.contains(&e.id));
        Ok(())
    }

    async fn load_captains(&self, entrant_ids: &[Uuid]) -> DbResult<HashMap<Uuid, Uuid>> {
        let all = self.captains.lock().unwrap();
        Ok(entrant_ids
            .iter()
            .filter_map(|id| all.get(id).map(|u| (*id, *u)))
            .collect())
    }
}

#[async_trait]
impl DbpStage for FakeDb {
    async fn tournament_has_stage(&self, tournament_id: Uuid) -> DbResult<bool> {
        Ok(self
            .stages
            .lock()
            .unwrap()
            .iter()
            .any(|(_, t)| *t == tournament_id))
    }

    async fn insert_stage(
        &self,
        tournament_id: Uuid,
        _format: TournamentFormat,
        _config: serde_json::Value,
    ) -> DbResult<Uuid> {
        let stage_id = Uuid::new_v4();
        self.stages.lock().unwrap().push((stage_id, tournament_id));
        Ok(stage_id)
    }
}

#[async_trait]
impl DbpMatch for FakeDb {
    async fn bulk_insert_matches(&self, matches: &[NewMatch]) -> DbResult<Vec<Match>> {
        let mut store = self.matches.lock().unwrap();
        let mut inserted = Vec::with_capacity(matches.len());
        for m in matches {
            let row = Match {
                id: Uuid::new_v4(),
                version: 0,
                stage_id: m.stage_id,
                round_number: m.round_number,
                match_order: m.match_order,
                best_of: m.best_of,
                status: m.status,
                entrant1: m.entrant1,
                entrant2: m.entrant2,
                score1: None,
                score2: None,
                winner_slot: None,
                scheduled_at: None,
            };
            store.push(row.clone());
            inserted.push(row);
        }
        Ok(inserted)
    }

    async fn bulk_update_matches(&self, updates: &[MatchUpdate]) -> DbResult<()> {
        let mut store = self.matches.lock().unwrap();
        for u in updates {
            let Some(row) = store.iter_mut().find(|m| m.id == u.id) else {
                return Err(DbError::NotFound);
            };
            if let Some(status) = u.status {
                row.status = status;
            }
            if u.entrant1.is_some() {
                row.entrant1 = u.entrant1;
            }
            if u.entrant2.is_some() {
                row.entrant2 = u.entrant2;
            }
            if u.score1.is_some() {
                row.score1 = u.score1;
            }
            if u.score2.is_some() {
                row.score2 = u.score2;
            }
            if u.winner_slot.is_some() {
                row.winner_slot = u.winner_slot;
            }
            if u.scheduled_at.is_some() {
                row.scheduled_at = u.scheduled_at;
            }
        }
        Ok(())
    }

    async fn load_stage_matches(&self, stage_id: Uuid) -> DbResult<Vec<Match>> {
        let mut rows: Vec<Match> = self
            .matches
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.stage_id == stage_id)
            .cloned()
            .collect();
        rows.sort_by_key(|m| (m.round_number, m.match_order));
        Ok(rows)
    }

    async fn load_already_scheduled_matches_touching(
        &self,
        entrant_ids: &[Uuid],
    ) -> DbResult<Vec<Match>> {
        Ok(self
            .matches
            .lock()
            .unwrap()
            .iter()
            .filter(|m| {
                m.scheduled_at.is_some()
                    && (m.entrant1.is_some_and(|e| entrant_ids.contains(&e))
                        || m.entrant2.is_some_and(|e| entrant_ids.contains(&e)))
            })
            .cloned()
            .collect())
    }

    async fn load_unscheduled_matches(&self, tournament_id: Uuid) -> DbResult<Vec<Match>> {
        let stage_ids: Vec<Uuid> = self
            .stages
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, t)| *t == tournament_id)
            .map(|(s, _)| *s)
            .collect();
        let mut rows: Vec<Match> = self
            .matches
            .lock()
            .unwrap()
            .iter()
            .filter(|m| {
                stage_ids.contains(&m.stage_id)
                    && m.status == MatchStatus::Scheduled
                    && m.scheduled_at.is_none()
                    && m.has_both_entrants()
            })
            .cloned()
            .collect();
        rows.sort_by_key(|m| m.id);
        Ok(rows)
    }
}

#[async_trait]
impl DbpAvailability for FakeDb {
    async fn load_availabilities(&self, user_ids: &[Uuid]) -> DbResult<Vec<UserAvailability>> {
        Ok(self
            .availabilities
            .lock()
            .unwrap()
            .iter()
            .filter(|a| user_ids.contains(&a.user_id))
            .cloned()
            .collect())
    }
}
