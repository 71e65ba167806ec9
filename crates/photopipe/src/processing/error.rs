use thiserror::Error;

use crate::db::DatabaseError;
use crate::error::WorkerError;
use crate::pipeline::{PipelineError, RegistryError};

#[derive(Error, Debug)]
pub enum StateError {
    #[error("Unknown processing state code {0}")]
    UnknownState(i32),

    #[error("Unknown stage job '{0}'")]
    UnknownJob(String),

    #[error("Invalid stage table: {0}")]
    InvalidStageTable(String),

    #[error("Stage {code} failed: {source}")]
    Stage {
        code: i32,
        #[source]
        source: PipelineError,
    },

    #[error("Failed to update record: {0}")]
    Store(#[from] DatabaseError),

    #[error("Failed to schedule next stage: {0}")]
    Schedule(#[from] WorkerError),

    #[error("Failed to build stage pipeline: {0}")]
    Registry(#[from] RegistryError),

    #[error("Nothing selected for replay: pass record ids, --all or --failed")]
    EmptyReplay,
}
