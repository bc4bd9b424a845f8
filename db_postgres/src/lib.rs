// diesel postgres implementation of database port

pub mod availability;
pub mod entrant;
pub mod match_;
pub mod schema;
pub mod stage;
pub mod tournament;
pub mod txn;

pub use txn::PgTxn;

use anyhow::{Context, Result, anyhow};
use app_core::{CoreError, CoreResult, DbError, DbResult};
use diesel_async::scoped_futures::ScopedBoxFuture;
use diesel_async::{
    AsyncConnection, AsyncMigrationHarness, AsyncPgConnection,
    pooled_connection::{
        AsyncDieselConnectionManager,
        bb8::{Pool, PooledConnection},
    },
};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{info, instrument, warn};
use url::Url;

/// embed migrations
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

pub struct PgDb {
    pool: Pool<AsyncPgConnection>,
}

impl PgDb {
    pub async fn new(database: Url) -> Result<Self> {
        let config = AsyncDieselConnectionManager::new(database);
        Ok(PgDb {
            pool: Pool::builder().build(config).await?,
        })
    }

    #[instrument(name = "db.migration", skip(self))]
    pub async fn run_migration(&self) -> DbResult<()> {
        let conn = self
            .pool
            .get_owned()
            .await
            .map_err(|e| DbError::Other(e.into()))?;
        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut harness = AsyncMigrationHarness::new(conn);
            harness
                .run_pending_migrations(MIGRATIONS)
                .map_err(|e| anyhow!("migration failed: {e}"))?;
            Ok(())
        })
        .await
        .context("join error while running migrations")??;

        info!("migrations applied successfully");
        Ok(())
    }

    #[instrument(name = "db.conn.get", skip(self))]
    pub async fn new_connection(&self) -> DbResult<PooledConnection<'_, AsyncPgConnection>> {
        match self.pool.get().await {
            Ok(conn) => Ok(conn),
            Err(e) => {
                warn!(error = %e, "pool_get_failed");
                Err(DbError::Other(e.into()))
            }
        }
    }

    /// runs `callback` against one connection wrapped in a real Postgres transaction,
    /// committing on `Ok` and rolling back on `Err`. `callback` is handed a [`PgTxn`]-
    /// backing connection so every port call it makes through a [`PgTxn`] shares the
    /// same lock scope, satisfying the "for the duration of the caller's transaction"
    /// contract on [`app_core::DbpTournament::load_tournament_for_update`].
    #[instrument(name = "db.transaction", skip(self, callback))]
    pub async fn transaction<'a, R, F>(&self, callback: F) -> CoreResult<R>
    where
        F: for<'r> FnOnce(&'r mut AsyncPgConnection) -> ScopedBoxFuture<'a, 'r, Result<R, TxnError>>
            + Send
            + 'a,
        R: Send + 'a,
    {
        let mut conn = self.new_connection().await?;
        AsyncConnection::transaction(&mut *conn, callback)
            .await
            .map_err(TxnError::into_core_error)
    }
}

/// error type threaded through [`PgDb::transaction`]'s closure: diesel's transaction
/// combinator requires an error type that converts from its own rollback-triggering
/// `diesel::result::Error`, which `app_core::CoreError` cannot do without pulling
/// diesel into `app_core`, so this wraps both sides instead.
#[derive(Debug)]
pub enum TxnError {
    Diesel(diesel::result::Error),
    Core(CoreError),
}

impl From<diesel::result::Error> for TxnError {
    fn from(e: diesel::result::Error) -> Self {
        TxnError::Diesel(e)
    }
}

impl TxnError {
    fn into_core_error(self) -> CoreError {
        match self {
            TxnError::Diesel(e) => CoreError::Db(map_db_err(e)),
            TxnError::Core(e) => e,
        }
    }
}

use diesel::result::{DatabaseErrorKind as K, Error as DE};

fn map_db_err(e: DE) -> DbError {
    match &e {
        DE::NotFound => DbError::NotFound,
        DE::DatabaseError(kind, info) => {
            let c = info.constraint_name().map(|s| s.to_string());
            match kind {
                K::UniqueViolation => DbError::UniqueViolation(c),
                K::ForeignKeyViolation => DbError::ForeignKeyViolation(c),
                K::CheckViolation => DbError::CheckViolation(c),
                K::SerializationFailure => DbError::SerializationFailure,
                _ => DbError::Other(anyhow::anyhow!(e)),
            }
        }
        _ => DbError::Other(anyhow::anyhow!(e)),
    }
}
