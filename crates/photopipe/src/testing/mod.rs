//! Test support: an isolated processing context over an in-memory store,
//! a temp content root and scripted tools.
//!
//! Shared by the unit tests and the `tests/` integration suites.

pub mod fixtures;
mod mock_tools;

use std::sync::Arc;

use tempfile::TempDir;

use crate::db::{Database, MediaRepository};
use crate::pipeline::{ProcessingContext, ProcessingSettings};
use crate::storage::ContentStorage;

pub use mock_tools::MockTools;

/// Context with default settings and tools that answer nothing.
///
/// The returned `TempDir` owns the content root; keep it alive for as long
/// as the context is used.
pub fn test_context() -> (TempDir, ProcessingContext) {
    test_context_with_tools(MockTools::default())
}

pub fn test_context_with_tools(tools: MockTools) -> (TempDir, ProcessingContext) {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let db = Database::open_in_memory().expect("Failed to open in-memory database");
    let ctx = ProcessingContext::new(
        Arc::new(MediaRepository::new(db)),
        Arc::new(ContentStorage::new(dir.path())),
        Arc::new(tools),
        ProcessingSettings::default(),
    );
    (dir, ctx)
}
