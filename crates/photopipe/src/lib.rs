pub mod broadcast;
pub mod config;
pub mod db;
pub mod error;
pub mod media;
pub mod pipeline;
pub mod processing;
pub mod processor;
pub mod sanitize;
pub mod storage;
pub mod telemetry;
#[doc(hidden)]
pub mod testing;
pub mod tools;
pub mod upload;
pub mod worker;

pub use broadcast::{MediaEvent, MediaEventBroadcaster, MediaEventKind};
pub use config::{load_config, Config};
pub use db::{Database, MediaRepository};
pub use error::{
    ConfigError, PhotopipeError, ProcessError, Result, StorageError, TelemetryError, UploadError,
    WorkerError,
};
pub use media::{Category, Fields, MediaType, RecordId, Value};
pub use pipeline::{
    Pipeline, PipelineError, ProcessingContext, ProcessingSettings, ProcessorRegistry,
};
pub use processing::{ReplayRequest, StageTable, StateError, StateMachine};
pub use storage::{ContentStorage, RecordStore};
pub use tools::{CommandTools, MediaTools};
pub use upload::{Intake, UploadForm, UploadOutcome};
pub use worker::{JobQueue, JobScheduler, ManualScheduler, StageJob, WorkerPool};
