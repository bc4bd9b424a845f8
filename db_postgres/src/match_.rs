//! implementation of the match-shaped half of the database port

use crate::schema::matches;
use crate::{map_db_err, PgDb};
use app_core::{DbError, DbResult, DbpMatch, Match, MatchStatus, MatchUpdate, NewMatch};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use tracing::instrument;
use uuid::Uuid;

fn status_to_db(s: MatchStatus) -> &'static str {
    match s {
        MatchStatus::Scheduled => "SCHEDULED",
        MatchStatus::Live => "LIVE",
        MatchStatus::Finished => "FINISHED",
        MatchStatus::Canceled => "CANCELED",
    }
}

fn status_from_db(s: &str) -> DbResult<MatchStatus> {
    match s {
        "SCHEDULED" => Ok(MatchStatus::Scheduled),
        "LIVE" => Ok(MatchStatus::Live),
        "FINISHED" => Ok(MatchStatus::Finished),
        "CANCELED" => Ok(MatchStatus::Canceled),
        other => Err(DbError::Other(anyhow::anyhow!(
            "unknown match status {other:?}"
        ))),
    }
}

#[derive(Debug, Queryable)]
struct DbMatch {
    id: Uuid,
    version: i64,
    stage_id: Uuid,
    round_number: i32,
    match_order: i32,
    best_of: i32,
    status: String,
    entrant1_id: Option<Uuid>,
    entrant2_id: Option<Uuid>,
    score1: Option<i32>,
    score2: Option<i32>,
    winner_slot: Option<i16>,
    scheduled_at: Option<DateTime<Utc>>,
}

impl TryFrom<DbMatch> for Match {
    type Error = DbError;

    fn try_from(r: DbMatch) -> Result<Self, Self::Error> {
        Ok(Match {
            id: r.id,
            version: r.version,
            stage_id: r.stage_id,
            round_number: r.round_number,
            match_order: r.match_order,
            best_of: r.best_of,
            status: status_from_db(&r.status)?,
            entrant1: r.entrant1_id,
            entrant2: r.entrant2_id,
            score1: r.score1,
            score2: r.score2,
            winner_slot: r.winner_slot.map(|v| v as u8),
            scheduled_at: r.scheduled_at,
        })
    }
}

const MATCH_COLUMNS: (
    matches::id,
    matches::version,
    matches::stage_id,
    matches::round_number,
    matches::match_order,
    matches::best_of,
    matches::status,
    matches::entrant1_id,
    matches::entrant2_id,
    matches::score1,
    matches::score2,
    matches::winner_slot,
    matches::scheduled_at,
) = (
    matches::id,
    matches::version,
    matches::stage_id,
    matches::round_number,
    matches::match_order,
    matches::best_of,
    matches::status,
    matches::entrant1_id,
    matches::entrant2_id,
    matches::score1,
    matches::score2,
    matches::winner_slot,
    matches::scheduled_at,
);

#[derive(Debug, Insertable)]
#[diesel(table_name = matches)]
struct NewDbMatch {
    stage_id: Uuid,
    round_number: i32,
    match_order: i32,
    best_of: i32,
    status: &'static str,
    entrant1_id: Option<Uuid>,
    entrant2_id: Option<Uuid>,
}

impl From<&NewMatch> for NewDbMatch {
    fn from(m: &NewMatch) -> Self {
        NewDbMatch {
            stage_id: m.stage_id,
            round_number: m.round_number,
            match_order: m.match_order,
            best_of: m.best_of,
            status: status_to_db(m.status),
            entrant1_id: m.entrant1,
            entrant2_id: m.entrant2,
        }
    }
}

pub(crate) async fn bulk_insert(
    conn: &mut AsyncPgConnection,
    new_matches: &[NewMatch],
) -> DbResult<Vec<Match>> {
    let rows: Vec<NewDbMatch> = new_matches.iter().map(NewDbMatch::from).collect();

    let inserted: Vec<DbMatch> = diesel::insert_into(matches::table)
        .values(rows)
        .returning(MATCH_COLUMNS)
        .get_results(conn)
        .await
        .map_err(map_db_err)?;

    inserted.into_iter().map(Match::try_from).collect()
}

pub(crate) async fn bulk_update(conn: &mut AsyncPgConnection, updates: &[MatchUpdate]) -> DbResult<()> {
    use matches::dsl;

    for u in updates {
        let affected = diesel::update(matches::table.filter(dsl::id.eq(u.id)))
            .set((
                u.status.map(|s| dsl::status.eq(status_to_db(s))),
                u.entrant1.map(|e| dsl::entrant1_id.eq(e)),
                u.entrant2.map(|e| dsl::entrant2_id.eq(e)),
                u.score1.map(|s| dsl::score1.eq(s)),
                u.score2.map(|s| dsl::score2.eq(s)),
                u.winner_slot.map(|w| dsl::winner_slot.eq(w as i16)),
                u.scheduled_at.map(|s| dsl::scheduled_at.eq(s)),
                dsl::version.eq(dsl::version + 1),
                dsl::updated_at.eq(diesel::dsl::now),
            ))
            .execute(conn)
            .await
            .map_err(map_db_err)?;

        if affected == 0 {
            return Err(DbError::NotFound);
        }
    }
    Ok(())
}

pub(crate) async fn load_stage(conn: &mut AsyncPgConnection, stage_id: Uuid) -> DbResult<Vec<Match>> {
    use matches::dsl;

    let rows: Vec<DbMatch> = matches::table
        .filter(dsl::stage_id.eq(stage_id))
        .select(MATCH_COLUMNS)
        .order((dsl::round_number.asc(), dsl::match_order.asc()))
        .load(conn)
        .await
        .map_err(map_db_err)?;

    rows.into_iter().map(Match::try_from).collect()
}

pub(crate) async fn load_scheduled_touching(
    conn: &mut AsyncPgConnection,
    entrant_ids: &[Uuid],
) -> DbResult<Vec<Match>> {
    use matches::dsl;

    let rows: Vec<DbMatch> = matches::table
        .filter(dsl::scheduled_at.is_not_null())
        .filter(
            dsl::entrant1_id
                .eq_any(entrant_ids)
                .or(dsl::entrant2_id.eq_any(entrant_ids)),
        )
        .select(MATCH_COLUMNS)
        .load(conn)
        .await
        .map_err(map_db_err)?;

    rows.into_iter().map(Match::try_from).collect()
}

/// loads the matches the scheduler is about to assign a slot to, row-locked so two
/// concurrent scheduling runs for the same tournament can't both claim the same match.
pub(crate) async fn load_unscheduled(
    conn: &mut AsyncPgConnection,
    tournament_id: Uuid,
) -> DbResult<Vec<Match>> {
    use crate::schema::tournament_stages;
    use matches::dsl;

    let rows: Vec<DbMatch> = matches::table
        .inner_join(tournament_stages::table)
        .filter(tournament_stages::tournament_id.eq(tournament_id))
        .filter(dsl::status.eq(status_to_db(MatchStatus::Scheduled)))
        .filter(dsl::scheduled_at.is_null())
        .filter(dsl::entrant1_id.is_not_null())
        .filter(dsl::entrant2_id.is_not_null())
        .select(MATCH_COLUMNS)
        .order(dsl::id.asc())
        .for_update()
        .load(conn)
        .await
        .map_err(map_db_err)?;

    rows.into_iter().map(Match::try_from).collect()
}

#[async_trait]
impl DbpMatch for PgDb {
    #[instrument(name = "db.match.bulk_insert", skip(self, new_matches), fields(count = new_matches.len()))]
    async fn bulk_insert_matches(&self, new_matches: &[NewMatch]) -> DbResult<Vec<Match>> {
        let mut conn = self.new_connection().await?;
        bulk_insert(&mut conn, new_matches).await
    }

    #[instrument(name = "db.match.bulk_update", skip(self, updates), fields(count = updates.len()))]
    async fn bulk_update_matches(&self, updates: &[MatchUpdate]) -> DbResult<()> {
        let mut conn = self.new_connection().await?;
        bulk_update(&mut conn, updates).await
    }

    #[instrument(name = "db.match.load_stage", skip(self), fields(stage_id = %stage_id))]
    async fn load_stage_matches(&self, stage_id: Uuid) -> DbResult<Vec<Match>> {
        let mut conn = self.new_connection().await?;
        load_stage(&mut conn, stage_id).await
    }

    #[instrument(name = "db.match.load_scheduled_touching", skip(self, entrant_ids))]
    async fn load_already_scheduled_matches_touching(
        &self,
        entrant_ids: &[Uuid],
    ) -> DbResult<Vec<Match>> {
        let mut conn = self.new_connection().await?;
        load_scheduled_touching(&mut conn, entrant_ids).await
    }

    #[instrument(name = "db.match.load_unscheduled", skip(self), fields(tournament_id = %tournament_id))]
    async fn load_unscheduled_matches(&self, tournament_id: Uuid) -> DbResult<Vec<Match>> {
        let mut conn = self.new_connection().await?;
        load_unscheduled(&mut conn, tournament_id).await
    }
}
