use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, debug_span, error, info, info_span};

use crate::media::{injected, Fields, Value};

use super::context::ProcessingContext;
use super::error::PipelineError;
use super::processor::{Input, ProcessorDef};
use super::resolver::{fetch_fields, FieldSpec};

/// One resolved processor inside a pipeline.
#[derive(Debug, Clone)]
pub struct Step {
    def: ProcessorDef,
    spec: FieldSpec,
}

impl Step {
    pub fn new(def: ProcessorDef) -> Self {
        let spec = FieldSpec::for_processor(&def);
        Self { def, spec }
    }

    pub fn name(&self) -> &'static str {
        self.def.name
    }

    pub fn spec(&self) -> &FieldSpec {
        &self.spec
    }
}

/// Ordered chain of processors sharing one working set.
#[derive(Debug, Clone)]
pub struct Pipeline {
    steps: Vec<Step>,
    required: BTreeSet<String>,
}

impl Pipeline {
    pub fn new(defs: Vec<ProcessorDef>) -> Self {
        let steps: Vec<Step> = defs.into_iter().map(Step::new).collect();
        let required = fetch_fields(steps.iter().map(Step::spec));
        Self { steps, required }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Fields the loader must fetch for this pipeline.
    pub fn required_fields(&self) -> &BTreeSet<String> {
        &self.required
    }

    /// Runs every step in order and returns the last non-empty output.
    ///
    /// The first processor error aborts the run; the working set is
    /// discarded and nothing after the failing step executes.
    pub fn run(
        &self,
        ctx: &ProcessingContext,
        initial: Fields,
    ) -> Result<Option<Fields>, PipelineError> {
        let record_id = initial.get(injected::RECORD_ID).and_then(Value::as_i64);
        let _pipeline_span = info_span!("pipeline", record_id = ?record_id).entered();

        let mut data = initial;
        data.insert(
            injected::ARGS.to_string(),
            Value::List(self.required.iter().cloned().map(Value::Text).collect()),
        );
        info!(fields = ?data.keys().collect::<Vec<_>>(), "pipeline input");

        let mut last = None;
        for (index, step) in self.steps.iter().enumerate() {
            let _step = debug_span!("processor", name = step.name()).entered();

            let outcome = {
                let input = input_for(step, &data)?;
                (step.def.handler)(ctx, &input)
            };

            let produced = match outcome {
                Ok(output) => output.into_fields(),
                Err(e) => {
                    error!(processor = step.name(), error = %e, "processor failed");
                    return Err(PipelineError::Processor {
                        processor: step.name(),
                        source: e,
                    });
                }
            };

            if produced.is_empty() {
                debug!("nothing produced");
                continue;
            }

            if index > 0 {
                info!(
                    processor = step.name(),
                    changed = ?produced.keys().collect::<Vec<_>>(),
                    "processor output"
                );
            }

            for (key, value) in &produced {
                data.insert(key.clone(), value.clone());
            }
            last = Some(produced);
        }

        Ok(last)
    }
}

fn input_for<'a>(step: &Step, data: &'a Fields) -> Result<Input<'a>, PipelineError> {
    match &step.spec {
        FieldSpec::All => Ok(Input::from_fields(data)),
        FieldSpec::Named(names) => {
            let mut values = BTreeMap::new();
            for name in names {
                let (key, value) =
                    data.get_key_value(name.as_str())
                        .ok_or_else(|| PipelineError::MissingInput {
                            processor: step.name(),
                            field: name.clone(),
                        })?;
                values.insert(key.as_str(), value);
            }
            Ok(Input::new(values))
        }
    }
}
