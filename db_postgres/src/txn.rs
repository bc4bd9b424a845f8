//! a `DatabasePort` bound to one already-open connection, handed out by
//! [`crate::PgDb::transaction`] so every port call a job makes during one attempt
//! shares the same Postgres transaction and the same row locks.

use crate::{availability, entrant, match_, stage, tournament};
use app_core::{
    DbResult, DbpAvailability, DbpMatch, DbpStage, DbpTournament, Entrant, Match, MatchUpdate,
    NewMatch, Tournament, TournamentFormat, UserAvailability,
};
use async_trait::async_trait;
use diesel_async::AsyncPgConnection;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

pub struct PgTxn<'a> {
    conn: Mutex<&'a mut AsyncPgConnection>,
}

impl<'a> PgTxn<'a> {
    pub fn new(conn: &'a mut AsyncPgConnection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

#[async_trait]
impl DbpTournament for PgTxn<'_> {
    async fn load_tournament_for_update(&self, tournament_id: Uuid) -> DbResult<Option<Tournament>> {
        let mut guard = self.conn.lock().await;
        tournament::load_for_update(&mut **guard, tournament_id).await
    }

    async fn save_tournament(&self, tournament_row: &Tournament) -> DbResult<()> {
        let mut guard = self.conn.lock().await;
        tournament::save(&mut **guard, tournament_row).await
    }

    async fn load_active_entrants_with_member_counts(
        &self,
        tournament_id: Uuid,
    ) -> DbResult<Vec<(Entrant, usize)>> {
        let mut guard = self.conn.lock().await;
        entrant::load_active_with_member_counts(&mut **guard, tournament_id).await
    }

    async fn delete_entrants_by_id(&self, entrant_ids: &[Uuid]) -> DbResult<()> {
        let mut guard = self.conn.lock().await;
        entrant::delete_by_id(&mut **guard, entrant_ids).await
    }

    async fn load_captains(&self, entrant_ids: &[Uuid]) -> DbResult<HashMap<Uuid, Uuid>> {
        let mut guard = self.conn.lock().await;
        entrant::load_captains_map(&mut **guard, entrant_ids).await
    }
}

#[async_trait]
impl DbpStage for PgTxn<'_> {
    async fn tournament_has_stage(&self, tournament_id: Uuid) -> DbResult<bool> {
        let mut guard = self.conn.lock().await;
        stage::has_stage(&mut **guard, tournament_id).await
    }

    async fn insert_stage(
        &self,
        tournament_id: Uuid,
        format: TournamentFormat,
        config: serde_json::Value,
    ) -> DbResult<Uuid> {
        let mut guard = self.conn.lock().await;
        stage::insert(&mut **guard, tournament_id, format, config).await
    }
}

#[async_trait]
impl DbpMatch for PgTxn<'_> {
    async fn bulk_insert_matches(&self, new_matches: &[NewMatch]) -> DbResult<Vec<Match>> {
        let mut guard = self.conn.lock().await;
        match_::bulk_insert(&mut **guard, new_matches).await
    }

    async fn bulk_update_matches(&self, updates: &[MatchUpdate]) -> DbResult<()> {
        let mut guard = self.conn.lock().await;
        match_::bulk_update(&mut **guard, updates).await
    }

    async fn load_stage_matches(&self, stage_id: Uuid) -> DbResult<Vec<Match>> {
        let mut guard = self.conn.lock().await;
        match_::load_stage(&mut **guard, stage_id).await
    }

    async fn load_already_scheduled_matches_touching(
        &self,
        entrant_ids: &[Uuid],
    ) -> DbResult<Vec<Match>> {
        let mut guard = self.conn.lock().await;
        match_::load_scheduled_touching(&mut **guard, entrant_ids).await
    }

    async fn load_unscheduled_matches(&self, tournament_id: Uuid) -> DbResult<Vec<Match>> {
        let mut guard = self.conn.lock().await;
        match_::load_unscheduled(&mut **guard, tournament_id).await
    }
}

#[async_trait]
impl DbpAvailability for PgTxn<'_> {
    async fn load_availabilities(&self, user_ids: &[Uuid]) -> DbResult<Vec<UserAvailability>> {
        let mut guard = self.conn.lock().await;
        availability::load(&mut **guard, user_ids).await
    }
}
