mod queue;
mod runner;

use anyhow::{Context, Result};
use app_core::{JobQueuePort, SchedulerSettings};
use db_postgres::PgDb;
use queue::MpscJobQueue;
use std::env;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_error::ErrorLayer;
use tracing_log::LogTracer;
use tracing_subscriber::{EnvFilter, Registry, prelude::*};
use url::Url;

fn init_tracing_bunyan() -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let formatting_layer = BunyanFormattingLayer::new("tournament-worker".into(), std::io::stdout);

    let subscriber = Registry::default()
        .with(env_filter)
        .with(JsonStorageLayer)
        .with(formatting_layer)
        .with(ErrorLayer::default());

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    LogTracer::init()?;
    init_tracing_bunyan()?;

    let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let database_url = Url::parse(&database_url).context("DATABASE_URL is not a valid url")?;

    let db = PgDb::new(database_url).await?;
    db.run_migration().await?;

    let settings = SchedulerSettings::from_env();
    let queue = MpscJobQueue::new(64);

    tracing::info!("worker_started");
    loop {
        match queue.dequeue().await? {
            Some(job) => runner::process_job(&db, &settings, job).await,
            None => {
                tracing::info!("queue_closed_shutting_down");
                break;
            }
        }
    }
    Ok(())
}
