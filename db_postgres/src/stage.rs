//! implementation of the stage-shaped half of the database port

use crate::schema::tournament_stages;
use crate::{map_db_err, PgDb};
use app_core::{DbResult, DbpStage, TournamentFormat};
use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use tracing::instrument;
use uuid::Uuid;

#[derive(Debug, Insertable)]
#[diesel(table_name = tournament_stages)]
struct NewDbStage {
    tournament_id: Uuid,
    stage_type: &'static str,
    stage_order: i32,
    best_of_default: i32,
    config: serde_json::Value,
}

pub(crate) async fn has_stage(conn: &mut AsyncPgConnection, tournament_id: Uuid) -> DbResult<bool> {
    use tournament_stages::dsl;

    diesel::select(diesel::dsl::exists(
        tournament_stages::table.filter(dsl::tournament_id.eq(tournament_id)),
    ))
    .get_result(conn)
    .await
    .map_err(map_db_err)
}

pub(crate) async fn insert(
    conn: &mut AsyncPgConnection,
    tournament_id: Uuid,
    format: TournamentFormat,
    config: serde_json::Value,
) -> DbResult<Uuid> {
    use tournament_stages::dsl;

    let new_row = NewDbStage {
        tournament_id,
        stage_type: format.as_seed_str(),
        stage_order: 0,
        best_of_default: 1,
        config,
    };

    let stage_id = diesel::insert_into(tournament_stages::table)
        .values(new_row)
        .returning(dsl::id)
        .get_result(conn)
        .await
        .map_err(map_db_err)?;

    Ok(stage_id)
}

#[async_trait]
impl DbpStage for PgDb {
    #[instrument(name = "db.stage.exists", skip(self), fields(tournament_id = %tournament_id))]
    async fn tournament_has_stage(&self, tournament_id: Uuid) -> DbResult<bool> {
        let mut conn = self.new_connection().await?;
        has_stage(&mut conn, tournament_id).await
    }

    #[instrument(name = "db.stage.insert", skip(self, config), fields(tournament_id = %tournament_id))]
    async fn insert_stage(
        &self,
        tournament_id: Uuid,
        format: TournamentFormat,
        config: serde_json::Value,
    ) -> DbResult<Uuid> {
        let mut conn = self.new_connection().await?;
        insert(&mut conn, tournament_id, format, config).await
    }
}
