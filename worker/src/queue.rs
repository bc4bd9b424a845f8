//! in-process stand-in for a durable job broker, backed by a bounded mpsc channel.

use app_core::{BuildStructureJob, JobQueueError, JobQueuePort, JobQueueResult};
use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

pub struct MpscJobQueue {
    tx: mpsc::Sender<BuildStructureJob>,
    rx: Mutex<mpsc::Receiver<BuildStructureJob>>,
}

impl MpscJobQueue {
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        Self {
            tx,
            rx: Mutex::new(rx),
        }
    }
}

#[async_trait]
impl JobQueuePort for MpscJobQueue {
    async fn enqueue(&self, job: BuildStructureJob) -> JobQueueResult<()> {
        self.tx
            .send(job)
            .await
            .map_err(|_| JobQueueError::Closed)
    }

    async fn dequeue(&self) -> JobQueueResult<Option<BuildStructureJob>> {
        Ok(self.rx.lock().await.recv().await)
    }
}
