use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' exited with status {status}")]
    ExitStatus { command: String, status: String },

    #[error("Failed to buffer output of '{command}': {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON from '{command}': {source}")]
    Json {
        command: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("'{command}' produced no output")]
    EmptyOutput { command: String },
}
