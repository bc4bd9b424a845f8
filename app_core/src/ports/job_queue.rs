//! job queue port: the collaborator contract the worker needs from the broker.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::TournamentFormat;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildStructureJob {
    pub tournament_id: Uuid,
    pub format: TournamentFormat,
}

#[derive(Debug, Error)]
pub enum JobQueueError {
    #[error("queue closed")]
    Closed,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type JobQueueResult<T> = Result<T, JobQueueError>;

/// a durable (or, for the shipped worker binary, in-process) single-consumer job queue.
#[async_trait]
pub trait JobQueuePort: Send + Sync {
    async fn enqueue(&self, job: BuildStructureJob) -> JobQueueResult<()>;

    /// blocks until a job is available or the queue is closed
    async fn dequeue(&self) -> JobQueueResult<Option<BuildStructureJob>>;
}
