//! Declarative processor chains.
//!
//! A [`Pipeline`] is an ordered list of processors resolved from the
//! [`ProcessorRegistry`]. Each processor declares the fields it reads; the
//! engine hands it exactly those, merges whatever it returns back into the
//! working set and moves on.

pub mod context;
pub mod error;
pub mod processor;
pub mod registry;
pub mod resolver;
pub mod runner;

pub use context::{ProcessingContext, ProcessingSettings};
pub use error::{PipelineError, RegistryError};
pub use processor::{Handler, Input, Output, ProcessorDef};
pub use registry::ProcessorRegistry;
pub use resolver::{fetch_fields, FieldSpec};
pub use runner::{Pipeline, Step};
