//! This module is the public API of the distributed filter pipeline.
//!
//! A filter invocation runs on every rank of a process group, each holding a full
//! replica of the input. The stages below split the work, run it locally and
//! consolidate the pieces on the leader.

//==================================================================================
// 1. Module Declarations
//==================================================================================

/// The vocabulary: transforms, index spaces, exchanges, outcomes.
pub mod models;
pub mod traits;

/// Decides which slice of the index space each rank owns.
pub mod planner;

/// Runs a transform over one rank's slice.
pub mod executor;

/// Moves every follower's slice onto the leader.
pub mod gather;

/// Entry points tying the stages together.
pub mod orchestrator;


//==================================================================================
// 2. Public API Re-exports
//==================================================================================

pub use self::models::{FilterOutcome, Transform};
pub use self::orchestrator::{apply_filter, apply_filters};
pub use self::traits::TransformBehavior;
