//! Loading and saving the record a pipeline works on.

use std::collections::BTreeSet;

use tracing::debug;

use crate::error::ProcessError;
use crate::media::{injected, Fields, Value};
use crate::pipeline::{Input, Output, ProcessingContext, ProcessorDef};

pub const LOAD: ProcessorDef =
    ProcessorDef::new("record.load", &[injected::RECORD_ID, injected::ARGS], load);

pub const SAVE: ProcessorDef = ProcessorDef::catch_all("record.save", save);

/// Fetches every field named in `ARGS` and keeps a frozen copy of them
/// under `INITIAL_STATE`.
fn load(ctx: &ProcessingContext, input: &Input<'_>) -> Result<Output, ProcessError> {
    let record_id = input.record_id()?;
    let wanted: BTreeSet<String> = input
        .get(injected::ARGS)
        .as_list()
        .ok_or(ProcessError::InvalidInput {
            field: injected::ARGS,
            expected: "list of field names",
        })?
        .iter()
        .filter_map(Value::as_str)
        .filter(|name| !injected::contains(name))
        .map(str::to_string)
        .collect();

    let fields = ctx.records.fetch(record_id, &wanted)?;

    let mut output = fields.clone();
    output.insert(injected::INITIAL_STATE.to_string(), Value::Map(fields));
    Ok(Output::Map(output))
}

/// Persists the fields whose value differs from the loaded snapshot.
fn save(ctx: &ProcessingContext, input: &Input<'_>) -> Result<Output, ProcessError> {
    let record_id = input.record_id()?;
    let empty = Fields::new();
    let initial = input
        .get(injected::INITIAL_STATE)
        .as_map()
        .unwrap_or(&empty);

    let changed: Fields = input
        .iter()
        .filter(|(name, _)| !injected::contains(name))
        .filter(|(name, value)| initial.get(*name) != Some(*value))
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect();

    if changed.is_empty() {
        debug!(record_id, "nothing changed");
    } else {
        ctx.records.persist(record_id, &changed)?;
    }

    let mut output = changed;
    output.insert(injected::RECORD_ID.to_string(), Value::Int(record_id));
    Ok(Output::Map(output))
}
