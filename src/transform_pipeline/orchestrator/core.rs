// In: src/transform_pipeline/orchestrator/core.rs

use std::sync::Arc;
use std::time::Instant;

use crate::comm::Communicator;
use crate::config::EngineConfig;
use crate::error::FieldError;
use crate::transform_pipeline::executor;
use crate::transform_pipeline::gather;
use crate::transform_pipeline::models::{FilterOutcome, Transform};
use crate::transform_pipeline::planner;
use crate::types::{Field, Partition};

//==================================================================================
// 1. Public Orchestration API
//==================================================================================

/// Runs one transform across the whole process group.
///
/// Every rank calls this with its own full replica of `input`. It acts as a
/// high-level coordinator and delegates each stage to a focused component:
/// 1. `executor::prepare` derives the replica-wide constants (and fails on every
///    rank at once for a bad logarithm input),
/// 2. `planner` picks this rank's slice of the transform's index space,
/// 3. `executor::execute` writes that slice into a zero-filled output,
/// 4. `gather` moves every follower's slice onto the leader.
///
/// The leader gets `FilterOutcome::Complete`. Followers get their partial output
/// back, which must not be persisted.
pub fn apply_filter<C: Communicator + ?Sized>(
    comm: &C,
    input: &Field,
    transform: &Transform,
    config: &Arc<EngineConfig>,
) -> Result<FilterOutcome, FieldError> {
    let started = Instant::now();
    config.validate()?;

    let size = comm.size();
    let rank = comm.rank();
    let prepared = executor::prepare(transform, input)?;
    let partition = planner::plan_transform(transform, input, size, rank)?;
    log::debug!(
        "rank {}/{}: {} owns {} of a {}x{} field",
        rank,
        size,
        transform,
        partition,
        input.width(),
        input.height()
    );

    let mut output = Field::zeros(input.width(), input.height());
    executor::execute(&prepared, input, partition, &mut output)?;
    let outcome = gather::gather(comm, transform, input, partition, output, config.tag_base)?;
    if outcome.is_complete() {
        log::info!(
            "{} on {} ranks ({}x{}) took {:?}",
            transform,
            size,
            input.width(),
            input.height(),
            started.elapsed()
        );
    }
    Ok(outcome)
}

/// Runs `transforms` in order across the whole process group.
///
/// Between two steps the leader's complete result is replicated to every
/// follower, so each step starts from the same full input on every rank. The
/// final step returns what `apply_filter` returns. With no transforms at all the
/// leader's outcome is the input itself.
pub fn apply_filters<C: Communicator + ?Sized>(
    comm: &C,
    input: &Field,
    transforms: &[Transform],
    config: &Arc<EngineConfig>,
) -> Result<FilterOutcome, FieldError> {
    let Some((last, leading)) = transforms.split_last() else {
        config.validate()?;
        return Ok(if comm.is_leader() {
            FilterOutcome::Complete(input.clone())
        } else {
            FilterOutcome::Partial {
                field: input.clone(),
                partition: Partition::empty_at(0),
            }
        });
    };

    let mut current = input.clone();
    for (step, transform) in leading.iter().enumerate() {
        current = apply_filter(comm, &current, transform, config)?.into_field();
        gather::replicate(comm, &mut current, config.tag_base)?;
        log_metric!("event" = "replicated", "step" = &step, "transform" = transform);
    }
    apply_filter(comm, &current, last, config)
}
