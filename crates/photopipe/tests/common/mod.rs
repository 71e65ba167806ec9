//! Shared test utilities for photopipe integration tests.
//!
//! This module provides:
//! - `TestHarness` for isolated runs of the stage machine with temp storage
//! - Builders for camera uploads and their probe output

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::TestHarness;
