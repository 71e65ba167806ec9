//! Burst grouping: images shot at the same instant share a `shot_id`.

use chrono::Timelike;
use tracing::{debug, warn};

use crate::error::ProcessError;
use crate::media::{field, injected, Value};
use crate::pipeline::{Input, Output, ProcessingContext, ProcessorDef};

use super::is_image;

pub const BY_SHOT_AT: ProcessorDef = ProcessorDef::new(
    "groups.by_shot_at",
    &[
        injected::RECORD_ID,
        field::MEDIA_TYPE,
        field::SHOT_AT,
        field::SHOT_ID,
    ],
    by_shot_at,
);

/// Sequence the shot ids are drawn from.
pub const SHOT_SEQUENCE: &str = "media_shot";

/// Peers are records whose `shot_at` is the exact same instant. Cameras
/// that only record whole seconds would make unrelated pictures peers, so
/// such timestamps are not grouped at all.
fn by_shot_at(ctx: &ProcessingContext, input: &Input<'_>) -> Result<Output, ProcessError> {
    if !is_image(input)? {
        return Ok(Output::Skip);
    }
    let Some(shot_at) = input.optional_timestamp(field::SHOT_AT)? else {
        return Ok(Output::Skip);
    };
    let record_id = input.record_id()?;

    if shot_at.nanosecond() / 1_000 == 0 {
        warn!(record_id, shot_at = %shot_at.to_rfc3339(), "shot time lacks sub-second precision, not grouping");
        return Ok(Output::pair(field::SHOT_ID, Value::Null));
    }

    let peers = ctx.records.find_by_shot_at(&shot_at)?;
    if peers.len() < 2 {
        return Ok(Output::pair(field::SHOT_ID, Value::Null));
    }

    let shot_id = match peers.iter().find_map(|peer| peer.shot_id) {
        Some(existing) => existing,
        None => ctx.records.next_sequence_value(SHOT_SEQUENCE)?,
    };
    let ids: Vec<_> = peers.iter().map(|peer| peer.id).collect();
    ctx.records.assign_shot(&ids, shot_id)?;
    debug!(record_id, shot_id, peers = ids.len(), "grouped shot");

    Ok(Output::pair(field::SHOT_ID, shot_id))
}
