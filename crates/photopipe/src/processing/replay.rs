//! Operator-triggered reprocessing.

use std::collections::BTreeSet;

use tracing::{info, warn};

use crate::media::{field, Fields, RecordId, Value};
use crate::storage::{RecordFilter, RecordStore};
use crate::worker::{JobScheduler, StageJob};

use super::error::StateError;
use super::states::{StageTable, BASE_METADATA, INITIAL};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayRequest {
    pub ids: Vec<RecordId>,
    /// Select every record.
    pub all: bool,
    /// Select every record whose last stage failed.
    pub failed: bool,
    /// Stage to start from.
    pub state_code: i32,
}

impl Default for ReplayRequest {
    fn default() -> Self {
        Self {
            ids: Vec::new(),
            all: false,
            failed: false,
            state_code: INITIAL,
        }
    }
}

impl ReplayRequest {
    pub fn ids(ids: Vec<RecordId>) -> Self {
        Self {
            ids,
            ..Self::default()
        }
    }

    pub fn all() -> Self {
        Self {
            all: true,
            ..Self::default()
        }
    }

    pub fn failed() -> Self {
        Self {
            failed: true,
            ..Self::default()
        }
    }

    pub fn from_state(mut self, state_code: i32) -> Self {
        self.state_code = state_code;
        self
    }
}

/// Enqueues the job of `request.state_code` for every selected record and
/// returns how many were scheduled. Nothing runs inline.
///
/// Starting at or before base metadata also drops the cached probe output
/// so the tools run again.
pub fn reprocess(
    records: &dyn RecordStore,
    table: &StageTable,
    scheduler: &dyn JobScheduler,
    request: &ReplayRequest,
) -> Result<usize, StateError> {
    if request.ids.is_empty() && !request.all && !request.failed {
        return Err(StateError::EmptyReplay);
    }

    let (stage, _) = table
        .lookup(request.state_code)
        .ok_or(StateError::UnknownState(request.state_code))?;

    let mut selected: BTreeSet<RecordId> = request.ids.iter().copied().collect();
    if request.all {
        selected.extend(records.ids(RecordFilter::All)?);
    }
    if request.failed {
        selected.extend(records.ids(RecordFilter::Failed)?);
    }

    if selected.is_empty() {
        warn!("nothing to reprocess");
        return Ok(0);
    }

    info!(count = selected.len(), stage = stage.name, "reprocessing media");

    let reset_metadata = request.state_code <= BASE_METADATA;
    for id in &selected {
        if reset_metadata {
            let cleared = Fields::from([(
                field::METADATA.to_string(),
                Value::Json(serde_json::json!({})),
            )]);
            records.persist(*id, &cleared)?;
        }
        scheduler.enqueue(StageJob::new(stage.job, *id))?;
    }

    Ok(selected.len())
}
