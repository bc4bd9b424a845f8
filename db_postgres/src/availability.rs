//! implementation of the availability-shaped half of the database port

use crate::schema::user_availabilities;
use crate::{map_db_err, PgDb};
use app_core::{DbError, DbResult, DbpAvailability, UserAvailability};
use async_trait::async_trait;
use chrono::{NaiveTime, Weekday};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use tracing::instrument;
use uuid::Uuid;

fn day_from_db(d: i16) -> DbResult<Weekday> {
    Weekday::try_from(d as u8).map_err(|_| DbError::Other(anyhow::anyhow!("invalid weekday {d}")))
}

#[derive(Debug, Queryable)]
struct DbAvailability {
    id: Uuid,
    user_id: Uuid,
    start_day: i16,
    start_time: NaiveTime,
    end_day: i16,
    end_time: NaiveTime,
}

impl TryFrom<DbAvailability> for UserAvailability {
    type Error = DbError;

    fn try_from(r: DbAvailability) -> Result<Self, Self::Error> {
        Ok(UserAvailability {
            id: r.id,
            user_id: r.user_id,
            start_day: day_from_db(r.start_day)?,
            start_time: r.start_time,
            end_day: day_from_db(r.end_day)?,
            end_time: r.end_time,
        })
    }
}

pub(crate) async fn load(
    conn: &mut AsyncPgConnection,
    user_ids: &[Uuid],
) -> DbResult<Vec<UserAvailability>> {
    use self::user_availabilities::dsl::*;

    let rows: Vec<DbAvailability> = user_availabilities
        .filter(user_id.eq_any(user_ids))
        .select((id, user_id, start_day, start_time, end_day, end_time))
        .load(conn)
        .await
        .map_err(map_db_err)?;

    rows.into_iter().map(UserAvailability::try_from).collect()
}

#[async_trait]
impl DbpAvailability for PgDb {
    #[instrument(name = "db.availability.load", skip(self, user_ids))]
    async fn load_availabilities(&self, user_ids: &[Uuid]) -> DbResult<Vec<UserAvailability>> {
        let mut conn = self.new_connection().await?;
        load(&mut conn, user_ids).await
    }
}
