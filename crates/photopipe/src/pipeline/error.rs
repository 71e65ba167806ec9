use thiserror::Error;

use crate::error::ProcessError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Processor '{processor}' requires field '{field}' which is not in the working set")]
    MissingInput {
        processor: &'static str,
        field: String,
    },

    #[error("Processor '{processor}' failed: {source}")]
    Processor {
        processor: &'static str,
        #[source]
        source: ProcessError,
    },
}

impl PipelineError {
    /// Name of the processor the failure is attributed to.
    pub fn processor(&self) -> &'static str {
        match self {
            PipelineError::MissingInput { processor, .. } => processor,
            PipelineError::Processor { processor, .. } => processor,
        }
    }
}

/// Pipeline construction failures. These are configuration errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Cannot resolve processors: {}", missing.join(", "))]
    UnresolvableProcessor { missing: Vec<String> },

    #[error("Processor '{0}' is registered twice")]
    DuplicateProcessor(String),
}
