//! entrant row mapping and the queries `tournament.rs` delegates to for the
//! entrant-shaped parts of [`app_core::DbpTournament`].

use crate::map_db_err;
use crate::schema::{tournament_entrant_members, tournament_entrants};
use app_core::{DbError, DbResult, Entrant, EntrantStatus};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use std::collections::HashMap;
use uuid::Uuid;

fn status_to_db(s: EntrantStatus) -> &'static str {
    match s {
        EntrantStatus::Active => "ACTIVE",
        EntrantStatus::Dropped => "DROPPED",
        EntrantStatus::Disqualified => "DISQUALIFIED",
    }
}

fn status_from_db(s: &str) -> DbResult<EntrantStatus> {
    match s {
        "ACTIVE" => Ok(EntrantStatus::Active),
        "DROPPED" => Ok(EntrantStatus::Dropped),
        "DISQUALIFIED" => Ok(EntrantStatus::Disqualified),
        other => Err(DbError::Other(anyhow::anyhow!(
            "unknown entrant status {other:?}"
        ))),
    }
}

#[derive(Debug, Queryable)]
struct DbEntrant {
    id: Uuid,
    tournament_id: Uuid,
    name: String,
    status: String,
}

impl TryFrom<DbEntrant> for Entrant {
    type Error = DbError;

    fn try_from(r: DbEntrant) -> Result<Self, Self::Error> {
        Ok(Entrant {
            id: r.id,
            tournament_id: r.tournament_id,
            name: r.name,
            status: status_from_db(&r.status)?,
        })
    }
}

pub(crate) async fn load_active_with_member_counts(
    conn: &mut AsyncPgConnection,
    tid: Uuid,
) -> DbResult<Vec<(Entrant, usize)>> {
    use tournament_entrant_members::dsl as tem;
    use tournament_entrants::dsl as te;

    let rows: Vec<DbEntrant> = tournament_entrants::table
        .filter(te::tournament_id.eq(tid))
        .filter(te::status.eq(status_to_db(EntrantStatus::Active)))
        .select((te::id, te::tournament_id, te::name, te::status))
        .load(conn)
        .await
        .map_err(map_db_err)?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let count: i64 = tem::tournament_entrant_members
            .filter(tem::entrant_id.eq(row.id))
            .count()
            .get_result(conn)
            .await
            .map_err(map_db_err)?;
        out.push((Entrant::try_from(row)?, count as usize));
    }
    Ok(out)
}

pub(crate) async fn delete_by_id(conn: &mut AsyncPgConnection, ids: &[Uuid]) -> DbResult<()> {
    use self::tournament_entrants::dsl::*;
    diesel::delete(tournament_entrants.filter(id.eq_any(ids)))
        .execute(conn)
        .await
        .map_err(map_db_err)?;
    Ok(())
}

pub(crate) async fn load_captains_map(
    conn: &mut AsyncPgConnection,
    entrant_ids: &[Uuid],
) -> DbResult<HashMap<Uuid, Uuid>> {
    use self::tournament_entrant_members::dsl::*;

    let rows: Vec<(Uuid, Uuid)> = tournament_entrant_members
        .filter(entrant_id.eq_any(entrant_ids))
        .filter(is_captain.eq(true))
        .select((entrant_id, user_id))
        .load(conn)
        .await
        .map_err(map_db_err)?;

    Ok(rows.into_iter().collect())
}
