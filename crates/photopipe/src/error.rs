use std::path::PathBuf;
use thiserror::Error;

use crate::db::DatabaseError;
use crate::tools::ProbeError;

#[derive(Error, Debug)]
pub enum PhotopipeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Processing error: {0}")]
    Process(#[from] ProcessError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Registry error: {0}")]
    Registry(#[from] crate::pipeline::RegistryError),

    #[error("State error: {0}")]
    State(#[from] crate::processing::StateError),

    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Unknown timezone '{name}'")]
    InvalidTimezone { name: String },
}

/// Failures raised by a single processor while a pipeline runs.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Field '{field}' is missing or has the wrong type (expected {expected})")]
    InvalidInput {
        field: &'static str,
        expected: &'static str,
    },

    #[error("Unsupported orientation value '{0}'")]
    UnsupportedOrientation(String),

    #[error("Unsupported rotation of {0} degrees")]
    UnsupportedRotation(i64),

    #[error("Unparseable timestamp '{0}'")]
    UnparseableTimestamp(String),

    #[error("Local time '{0}' is ambiguous or does not exist in the server timezone")]
    AmbiguousLocalTime(String),

    #[error("Width and height could not be determined from metadata")]
    MissingDimensions,

    #[error("No video stream found")]
    NoVideoStream,

    #[error("Found {0} video streams, only one is supported")]
    MultipleVideoStreams(usize),

    #[error("No embedded image could be extracted")]
    NoEmbeddedImage,

    #[error("Failed to process image: {0}")]
    ImageProcessing(String),

    #[error("Probe failed: {0}")]
    Probe(#[from] ProbeError),

    #[error("Storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Record store failed: {0}")]
    Store(#[from] DatabaseError),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove file '{path}': {source}")]
    RemoveFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to move file from '{from}' to '{to}': {source}")]
    MoveFile {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Path escapes the content root: {0}")]
    OutsideRoot(PathBuf),
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Worker channel closed unexpectedly")]
    ChannelClosed,

    #[error("Job failed: {0}")]
    JobFailed(String),

    #[error("Job queue lock poisoned")]
    LockPoisoned,

    #[error("Job bookkeeping failed: {0}")]
    Database(#[from] DatabaseError),
}

/// Rejections raised before an upload becomes a record.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Invalid SHA-1 digest '{0}': expected 40 hex characters")]
    InvalidHash(String),

    #[error("SHA-1 mismatch: declared {declared}, computed {computed}")]
    HashMismatch { declared: String, computed: String },

    #[error("Size mismatch: declared {declared} bytes, received {actual} bytes")]
    SizeMismatch { declared: u64, actual: u64 },

    #[error("Invalid last-modified timestamp: {0}")]
    InvalidTimestamp(i64),

    #[error("Failed to read upload '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to store upload: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to record upload: {0}")]
    Store(#[from] DatabaseError),

    #[error("Failed to schedule processing: {0}")]
    Schedule(#[from] WorkerError),
}

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to bridge log records into tracing: {0}")]
    LogBridge(#[from] log::SetLoggerError),

    #[error("A global tracing subscriber is already installed: {0}")]
    Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}

pub type Result<T> = std::result::Result<T, PhotopipeError>;
