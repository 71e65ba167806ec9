//! Test harness for isolated pipeline runs.
//!
//! `TestHarness` wires the standard stage table, an in-memory database and
//! a temp content root together, with scripted tools standing in for
//! exiftool, ffprobe and ffmpeg. Jobs run on the test thread through a
//! `ManualScheduler`.

#![allow(dead_code)]

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;
use uuid::Uuid;

use photopipe::testing::{test_context_with_tools, MockTools};
use photopipe::upload::file_digest;
use photopipe::worker::JobResult;
use photopipe::{
    Fields, Intake, ManualScheduler, MediaEventBroadcaster, ProcessingContext, ProcessorRegistry,
    RecordId, StageTable, StateMachine, UploadForm, UploadOutcome,
};

pub struct TestHarness {
    temp_dir: TempDir,
    pub ctx: ProcessingContext,
    pub scheduler: Arc<ManualScheduler>,
    pub machine: StateMachine,
    pub intake: Intake,
    pub events: MediaEventBroadcaster,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_tools(MockTools::default())
    }

    pub fn with_tools(tools: MockTools) -> Self {
        let (temp_dir, ctx) = test_context_with_tools(tools);
        let events = MediaEventBroadcaster::new(64);
        let ctx = ctx.with_events(events.clone());

        let scheduler = Arc::new(ManualScheduler::new());
        let registry = ProcessorRegistry::standard().expect("Standard registry is invalid");
        let machine = StateMachine::new(
            StageTable::standard(),
            &registry,
            ctx.clone(),
            scheduler.clone(),
        )
        .expect("Failed to build state machine");
        let intake = Intake::new(ctx.records.clone(), ctx.content.clone(), scheduler.clone());

        Self {
            temp_dir,
            ctx,
            scheduler,
            machine,
            intake,
            events,
        }
    }

    /// Writes `bytes` to a staging file outside the content tree.
    pub fn stage_file(&self, bytes: &[u8]) -> PathBuf {
        let dir = self.temp_dir.path().join("incoming");
        std::fs::create_dir_all(&dir).expect("Failed to create staging directory");
        let path = dir.join(Uuid::new_v4().to_string());
        std::fs::write(&path, bytes).expect("Failed to write staged upload");
        path
    }

    /// A form whose declared hash and size match `bytes`.
    pub fn form_for(&self, uploader_id: i64, bytes: &[u8], name: &str) -> UploadForm {
        let file = self.stage_file(bytes);
        let (sha1, size) = file_digest(&file).expect("Failed to hash staged upload");
        UploadForm {
            uploader_id,
            session_id: Uuid::new_v4(),
            sha1,
            size,
            last_modified_ms: None,
            name: name.to_string(),
            mimetype: None,
            file,
        }
    }

    pub fn upload(&self, uploader_id: i64, bytes: &[u8], name: &str) -> UploadOutcome {
        self.intake
            .accept(&self.form_for(uploader_id, bytes, name))
            .expect("Upload was rejected")
    }

    pub fn run_until_idle(&self) -> Vec<JobResult> {
        self.scheduler.run_until_idle(&self.machine)
    }

    pub fn fetch(&self, id: RecordId, names: &[&str]) -> Fields {
        let names: BTreeSet<String> = names.iter().map(|n| n.to_string()).collect();
        self.ctx
            .records
            .fetch(id, &names)
            .expect("Failed to fetch record")
    }

    pub fn state_code(&self, id: RecordId) -> i64 {
        self.fetch(id, &["processing_state_code"])["processing_state_code"]
            .as_i64()
            .expect("state code is not an integer")
    }
}
