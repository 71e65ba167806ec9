//! Resumable per-record processing.
//!
//! Every record carries a signed `processing_state_code`: positive is the
//! last completed stage, negative the stage that failed, zero not started.
//! The [`StateMachine`] runs one stage per job and schedules the next.

pub mod error;
pub mod machine;
pub mod replay;
pub mod states;

pub use error::StateError;
pub use machine::StateMachine;
pub use replay::{reprocess, ReplayRequest};
pub use states::{Stage, StageTable};
