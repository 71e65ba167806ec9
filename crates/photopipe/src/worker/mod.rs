pub mod job;
pub mod pool;
pub mod scheduler;

pub use job::{JobResult, StageJob};
pub use pool::WorkerPool;
pub use scheduler::{JobQueue, JobScheduler, ManualScheduler};

