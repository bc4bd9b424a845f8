//! implementation of the tournament-shaped half of the database port

use crate::entrant;
use crate::schema::tournaments;
use crate::{map_db_err, PgDb};
use app_core::{
    DbError, DbResult, DbpTournament, Entrant, Tournament, TournamentStatus, TournamentVisibility,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use std::collections::HashMap;
use tracing::{debug, warn, instrument};
use uuid::Uuid;

fn visibility_to_db(v: TournamentVisibility) -> &'static str {
    match v {
        TournamentVisibility::Public => "PUBLIC",
        TournamentVisibility::Private => "PRIVATE",
    }
}

fn visibility_from_db(v: &str) -> DbResult<TournamentVisibility> {
    match v {
        "PUBLIC" => Ok(TournamentVisibility::Public),
        "PRIVATE" => Ok(TournamentVisibility::Private),
        other => Err(DbError::Other(anyhow::anyhow!(
            "unknown tournament visibility {other:?}"
        ))),
    }
}

fn status_to_db(s: TournamentStatus) -> &'static str {
    match s {
        TournamentStatus::Registration => "REGISTRATION",
        TournamentStatus::Running => "RUNNING",
        TournamentStatus::Finished => "FINISHED",
    }
}

fn status_from_db(s: &str) -> DbResult<TournamentStatus> {
    match s {
        "REGISTRATION" => Ok(TournamentStatus::Registration),
        "RUNNING" => Ok(TournamentStatus::Running),
        "FINISHED" => Ok(TournamentStatus::Finished),
        other => Err(DbError::Other(anyhow::anyhow!(
            "unknown tournament status {other:?}"
        ))),
    }
}

#[derive(Debug, Queryable)]
struct DbTournament {
    id: Uuid,
    version: i64,
    owner_id: Uuid,
    name: String,
    visibility: String,
    status: String,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    game_gaps: i32,
    team_size: i32,
}

impl TryFrom<DbTournament> for Tournament {
    type Error = DbError;

    fn try_from(r: DbTournament) -> Result<Self, Self::Error> {
        Ok(Tournament {
            id: r.id,
            version: r.version,
            owner_id: r.owner_id,
            name: r.name,
            visibility: visibility_from_db(&r.visibility)?,
            status: status_from_db(&r.status)?,
            starts_at: r.starts_at,
            ends_at: r.ends_at,
            game_gaps: r.game_gaps,
            team_size: r.team_size,
        })
    }
}

/// loads and row-locks a tournament for the life of `conn`'s current transaction.
/// outside an explicit transaction postgres still honors `FOR UPDATE`, it just
/// releases the lock as soon as this statement finishes.
pub(crate) async fn load_for_update(
    conn: &mut AsyncPgConnection,
    tournament_id: Uuid,
) -> DbResult<Option<Tournament>> {
    use self::tournaments::dsl::*;

    let row = tournaments
        .filter(id.eq(tournament_id))
        .select((
            id, version, owner_id, name, visibility, status, starts_at, ends_at, game_gaps,
            team_size,
        ))
        .for_update()
        .first::<DbTournament>(conn)
        .await
        .optional()
        .map_err(map_db_err)?;

    match row {
        Some(row) => Ok(Some(Tournament::try_from(row)?)),
        None => {
            debug!("tournament_not_found");
            Ok(None)
        }
    }
}

pub(crate) async fn save(conn: &mut AsyncPgConnection, tournament: &Tournament) -> DbResult<()> {
    use self::tournaments::dsl::*;

    let res = diesel::update(
        tournaments.filter(id.eq(tournament.id).and(version.eq(tournament.version))),
    )
    .set((
        status.eq(status_to_db(tournament.status)),
        visibility.eq(visibility_to_db(tournament.visibility)),
        version.eq(tournament.version + 1),
        updated_at.eq(diesel::dsl::now),
    ))
    .execute(conn)
    .await
    .map_err(map_db_err)?;

    if res == 0 {
        let exists = diesel::select(diesel::dsl::exists(tournaments.filter(id.eq(tournament.id))))
            .get_result::<bool>(conn)
            .await
            .map_err(map_db_err)?;
        if exists {
            warn!("optimistic_lock_conflict");
            return Err(DbError::OptimisticLockConflict);
        }
        return Err(DbError::NotFound);
    }
    Ok(())
}

#[async_trait]
impl DbpTournament for PgDb {
    #[instrument(name = "db.tournament.load_for_update", skip(self), fields(id = %tournament_id))]
    async fn load_tournament_for_update(&self, tournament_id: Uuid) -> DbResult<Option<Tournament>> {
        let mut conn = self.new_connection().await?;
        load_for_update(&mut conn, tournament_id).await
    }

    #[instrument(
        name = "db.tournament.save",
        skip(self, tournament),
        fields(id = %tournament.id, version = tournament.version)
    )]
    async fn save_tournament(&self, tournament: &Tournament) -> DbResult<()> {
        let mut conn = self.new_connection().await?;
        save(&mut conn, tournament).await
    }

    #[instrument(name = "db.tournament.load_active_entrants", skip(self), fields(tournament_id = %tournament_id))]
    async fn load_active_entrants_with_member_counts(
        &self,
        tournament_id: Uuid,
    ) -> DbResult<Vec<(Entrant, usize)>> {
        let mut conn = self.new_connection().await?;
        entrant::load_active_with_member_counts(&mut conn, tournament_id).await
    }

    #[instrument(name = "db.tournament.delete_entrants", skip(self, entrant_ids))]
    async fn delete_entrants_by_id(&self, entrant_ids: &[Uuid]) -> DbResult<()> {
        let mut conn = self.new_connection().await?;
        entrant::delete_by_id(&mut conn, entrant_ids).await
    }

    #[instrument(name = "db.tournament.load_captains", skip(self, entrant_ids))]
    async fn load_captains(&self, entrant_ids: &[Uuid]) -> DbResult<HashMap<Uuid, Uuid>> {
        let mut conn = self.new_connection().await?;
        entrant::load_captains_map(&mut conn, entrant_ids).await
    }
}
