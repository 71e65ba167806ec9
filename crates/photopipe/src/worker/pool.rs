use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{debug, error, info, warn};

use crate::error::WorkerError;
use crate::processing::StateMachine;

use super::job::{JobResult, StageJob};
use super::scheduler::{JobQueue, JobScheduler};

pub struct WorkerPool {
    queue: Arc<JobQueue>,
    result_receiver: Receiver<JobResult>,
    workers: Vec<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl WorkerPool {
    /// Starts `worker_count` threads pulling stage jobs from `queue`.
    ///
    /// `machine` should enqueue its follow-up stages on the same queue.
    ///
    /// # Panics
    /// Panics if `worker_count` is 0.
    pub fn new(machine: Arc<StateMachine>, queue: Arc<JobQueue>, worker_count: usize) -> Self {
        assert!(worker_count > 0, "worker_count must be > 0");
        let (result_sender, result_receiver) = unbounded::<JobResult>();
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(worker_count);

        for worker_id in 0..worker_count {
            let job_rx = queue.receiver();
            let result_tx = result_sender.clone();
            let shutdown_flag = Arc::clone(&shutdown);
            let worker_machine = Arc::clone(&machine);
            let worker_queue = Arc::clone(&queue);

            let handle = thread::spawn(move || {
                run_worker(
                    worker_id,
                    job_rx,
                    result_tx,
                    shutdown_flag,
                    worker_machine,
                    worker_queue,
                );
            });

            workers.push(handle);
        }

        info!("Started {} workers", worker_count);

        Self {
            queue,
            result_receiver,
            workers,
            shutdown,
        }
    }

    pub fn submit(&self, job: StageJob) -> Result<(), WorkerError> {
        if self.shutdown.load(Ordering::Relaxed) {
            return Err(WorkerError::ChannelClosed);
        }

        self.queue.enqueue(job)
    }

    pub fn try_recv_result(&self) -> Option<JobResult> {
        self.result_receiver.try_recv().ok()
    }

    pub fn recv_result_timeout(&self, timeout: Duration) -> Option<JobResult> {
        self.result_receiver.recv_timeout(timeout).ok()
    }

    pub fn shutdown(&self) {
        info!("Shutting down worker pool...");
        self.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn wait(self) {
        for (i, worker) in self.workers.into_iter().enumerate() {
            if let Err(e) = worker.join() {
                error!("Worker {} panicked: {:?}", i, e);
            } else {
                debug!("Worker {} finished", i);
            }
        }

        info!("All workers have stopped");
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }
}

fn run_worker(
    worker_id: usize,
    job_receiver: Receiver<StageJob>,
    result_sender: Sender<JobResult>,
    shutdown: Arc<AtomicBool>,
    machine: Arc<StateMachine>,
    queue: Arc<JobQueue>,
) {
    debug!("Worker {} started", worker_id);

    loop {
        if shutdown.load(Ordering::Relaxed) {
            debug!("Worker {} received shutdown signal", worker_id);
            break;
        }

        match job_receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(job) => {
                debug!(
                    "Worker {} running {} for record {}",
                    worker_id, job.name, job.record_id
                );

                if let Err(e) = queue.mark_running(&job) {
                    warn!("Worker {} could not mark job {} running: {}", worker_id, job.id, e);
                }

                let result = match machine.run_job(&job) {
                    Ok(()) => JobResult::success(&job),
                    Err(e) => {
                        warn!(
                            "Worker {} job {} for record {} failed: {}",
                            worker_id, job.name, job.record_id, e
                        );
                        JobResult::failure(&job, e.to_string())
                    }
                };

                if let Err(e) = queue.mark_finished(&job, result.error.as_deref()) {
                    warn!("Worker {} could not mark job {} finished: {}", worker_id, job.id, e);
                }

                if let Err(e) = result_sender.send(result) {
                    error!("Worker {} failed to send result: {}", worker_id, e);
                    break;
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                continue;
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                debug!("Worker {} job channel disconnected", worker_id);
                break;
            }
        }
    }

    debug!("Worker {} stopped", worker_id);
}
