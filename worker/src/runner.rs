//! drives queued structure-build jobs with bounded exponential backoff.

use app_core::task::run_structure_build_task;
use app_core::{BuildStructureJob, SchedulerSettings};
use db_postgres::{PgDb, PgTxn, TxnError};
use diesel_async::scoped_futures::ScopedFutureExt;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

const MAX_ATTEMPTS: u32 = 5;
const BASE_DELAY: Duration = Duration::from_secs(1);

#[instrument(name = "worker.process_job", skip(db, settings), fields(tournament_id = %job.tournament_id))]
pub async fn process_job(db: &PgDb, settings: &SchedulerSettings, job: BuildStructureJob) {
    let tournament_id = job.tournament_id;
    let format = job.format;

    for attempt in 0..MAX_ATTEMPTS {
        // each attempt gets its own transaction: the whole load/validate/build/schedule
        // sequence commits or rolls back together, with the tournament row (and the
        // matches the scheduler claims) locked for the attempt's duration.
        let attempt_result = db
            .transaction(move |conn| {
                async move {
                    let txn = PgTxn::new(conn);
                    run_structure_build_task(&txn, tournament_id, format, settings)
                        .await
                        .map_err(TxnError::Core)
                }
                .scope_boxed()
            })
            .await;

        match attempt_result {
            Ok(result) => {
                info!(
                    matches_created = result.matches_created,
                    scheduled = result.scheduling.scheduled,
                    attempt,
                    "job_complete"
                );
                return;
            }
            Err(e) if e.is_validation() => {
                warn!(error = %e, "job_rejected_not_retried");
                return;
            }
            Err(e) => {
                let delay = BASE_DELAY * 2u32.pow(attempt);
                warn!(error = %e, attempt, delay_secs = delay.as_secs(), "job_failed_retrying");
                tokio::time::sleep(delay).await;
            }
        }
    }
    error!(tournament_id = %job.tournament_id, "job_failed_after_max_attempts");
}
