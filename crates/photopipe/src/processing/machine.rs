use std::collections::HashMap;
use std::sync::Arc;

use tracing::{error, info, info_span, warn};

use crate::broadcast::MediaEvent;
use crate::media::{injected, Fields, RecordId, Value};
use crate::pipeline::{Pipeline, ProcessingContext, ProcessorRegistry};
use crate::worker::{JobScheduler, StageJob};

use super::error::StateError;
use super::replay::{self, ReplayRequest};
use super::states::StageTable;

/// Advances records through the stage table one stage per job.
pub struct StateMachine {
    table: StageTable,
    pipelines: HashMap<i32, Pipeline>,
    ctx: ProcessingContext,
    scheduler: Arc<dyn JobScheduler>,
}

impl StateMachine {
    /// Resolves every stage pipeline up front so that an unknown processor
    /// fails here instead of in the middle of a job.
    pub fn new(
        table: StageTable,
        registry: &ProcessorRegistry,
        ctx: ProcessingContext,
        scheduler: Arc<dyn JobScheduler>,
    ) -> Result<Self, StateError> {
        let mut pipelines = HashMap::new();
        for stage in table.stages() {
            if let Some(names) = stage.processors {
                pipelines.insert(stage.code, registry.build(names)?);
            }
        }

        Ok(Self {
            table,
            pipelines,
            ctx,
            scheduler,
        })
    }

    pub fn table(&self) -> &StageTable {
        &self.table
    }

    pub fn context(&self) -> &ProcessingContext {
        &self.ctx
    }

    /// Runs the stage with `state_code` for one record, then schedules the
    /// next stage.
    ///
    /// The state code is persisted before the follow-up is enqueued: `code`
    /// on success, `-code` on failure. A failed stage enqueues nothing.
    pub fn run(&self, state_code: i32, record_id: RecordId) -> Result<(), StateError> {
        let (stage, next) = self
            .table
            .lookup(state_code)
            .ok_or(StateError::UnknownState(state_code))?;

        let _span = info_span!("stage", code = stage.code, name = stage.name, record_id).entered();

        if let Some(pipeline) = self.pipelines.get(&stage.code) {
            let initial = Fields::from([(injected::RECORD_ID.to_string(), Value::Int(record_id))]);

            match pipeline.run(&self.ctx, initial) {
                Ok(_) => {
                    self.ctx.records.set_state_code(record_id, stage.code)?;
                    self.ctx
                        .notify(MediaEvent::stage_completed(record_id, stage.code));
                    info!("stage completed");
                }
                Err(e) => {
                    error!(error = %e, "stage failed");
                    if let Err(store_err) = self.ctx.records.set_state_code(record_id, -stage.code)
                    {
                        error!(error = %store_err, "failed to flag stage failure");
                    }
                    self.ctx.notify(MediaEvent::stage_failed(
                        record_id,
                        stage.code,
                        &e.to_string(),
                    ));
                    return Err(StateError::Stage {
                        code: stage.code,
                        source: e,
                    });
                }
            }
        }

        match next {
            Some(next) => {
                self.scheduler.enqueue(StageJob::new(next.job, record_id))?;
            }
            None => info!("record fully processed"),
        }

        Ok(())
    }

    /// Runs the stage a queued job names.
    pub fn run_job(&self, job: &StageJob) -> Result<(), StateError> {
        let stage = self
            .table
            .by_job(&job.name)
            .ok_or_else(|| StateError::UnknownJob(job.name.clone()))?;
        self.run(stage.code, job.record_id)
    }

    /// Schedules records to be processed again from `request.state_code`.
    pub fn reprocess(&self, request: &ReplayRequest) -> Result<usize, StateError> {
        if request.state_code < 0 {
            warn!(code = request.state_code, "replay from a failed state code");
        }
        replay::reprocess(
            self.ctx.records.as_ref(),
            &self.table,
            self.scheduler.as_ref(),
            request,
        )
    }
}
