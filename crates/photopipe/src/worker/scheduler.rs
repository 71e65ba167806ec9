//! Job schedulers: where the state machine hands follow-up stages.

use std::collections::VecDeque;
use std::sync::Mutex;

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{debug, info, warn};

use crate::db::{job_repo, Database};
use crate::error::WorkerError;
use crate::processing::StateMachine;

use super::job::{JobResult, StageJob};

pub trait JobScheduler: Send + Sync {
    fn enqueue(&self, job: StageJob) -> Result<(), WorkerError>;
}

/// Channel-backed queue feeding a [`WorkerPool`](super::WorkerPool).
///
/// The channel is unbounded: workers enqueue follow-up stages themselves
/// and would deadlock on a full bounded channel. With a database attached,
/// every job is also written to the `jobs` table so that unfinished work
/// survives a restart.
#[derive(Clone)]
pub struct JobQueue {
    sender: Sender<StageJob>,
    receiver: Receiver<StageJob>,
    db: Option<Database>,
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl JobQueue {
    /// In-memory queue without bookkeeping.
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self {
            sender,
            receiver,
            db: None,
        }
    }

    pub fn persistent(db: Database) -> Self {
        let (sender, receiver) = unbounded();
        Self {
            sender,
            receiver,
            db: Some(db),
        }
    }

    pub fn receiver(&self) -> Receiver<StageJob> {
        self.receiver.clone()
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Puts every job left `queued` or `running` by a previous process back
    /// on the channel. Returns how many were re-delivered.
    pub fn requeue_pending(&self) -> Result<usize, WorkerError> {
        let Some(db) = &self.db else {
            return Ok(0);
        };

        let rows = job_repo::pending(db)?;
        let count = rows.len();
        for row in rows {
            debug!("Re-delivering job {} ({}) for record {}", row.id, row.name, row.record_id);
            self.sender
                .send(StageJob::restore(row.id, row.name, row.record_id))
                .map_err(|_| WorkerError::ChannelClosed)?;
        }

        if count > 0 {
            info!("Re-delivered {} unfinished jobs", count);
        }
        Ok(count)
    }

    pub fn mark_running(&self, job: &StageJob) -> Result<(), WorkerError> {
        if let Some(db) = &self.db {
            job_repo::mark_running(db, &job.id)?;
        }
        Ok(())
    }

    pub fn mark_finished(&self, job: &StageJob, error: Option<&str>) -> Result<(), WorkerError> {
        if let Some(db) = &self.db {
            job_repo::mark_finished(db, &job.id, error)?;
        }
        Ok(())
    }
}

impl JobScheduler for JobQueue {
    fn enqueue(&self, job: StageJob) -> Result<(), WorkerError> {
        if let Some(db) = &self.db {
            job_repo::insert(db, &job.id, &job.name, job.record_id)?;
        }
        debug!("Enqueued {} for record {}", job.name, job.record_id);
        self.sender
            .send(job)
            .map_err(|_| WorkerError::ChannelClosed)
    }
}

/// In-process FIFO drained on the caller's thread.
#[derive(Default)]
pub struct ManualScheduler {
    queue: Mutex<VecDeque<StageJob>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the jobs waiting to run, in order.
    pub fn pending(&self) -> Vec<StageJob> {
        self.queue
            .lock()
            .map(|queue| queue.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().map(|queue| queue.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pop(&self) -> Option<StageJob> {
        self.queue.lock().ok()?.pop_front()
    }

    /// Runs queued jobs, including the follow-ups they enqueue, until the
    /// queue is empty. A failed job does not stop the others.
    pub fn run_until_idle(&self, machine: &StateMachine) -> Vec<JobResult> {
        let mut results = Vec::new();
        while let Some(job) = self.pop() {
            match machine.run_job(&job) {
                Ok(()) => results.push(JobResult::success(&job)),
                Err(e) => {
                    warn!("Job {} for record {} failed: {}", job.name, job.record_id, e);
                    results.push(JobResult::failure(&job, e.to_string()));
                }
            }
        }
        results
    }
}

impl JobScheduler for ManualScheduler {
    fn enqueue(&self, job: StageJob) -> Result<(), WorkerError> {
        self.queue
            .lock()
            .map_err(|_| WorkerError::LockPoisoned)?
            .push_back(job);
        Ok(())
    }
}
