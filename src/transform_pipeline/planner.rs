// In: src/transform_pipeline/planner.rs

//! The static work planner for fieldmesh.
//!
//! This module decides, with no communication at all, which contiguous slice of
//! a linear index space each rank owns. It is a pure function of the domain size
//! `N`, the group size `P` and a rank, so:
//! 1. every process computes its own slice independently, and
//! 2. the leader computes every follower's slice to know in advance where each
//!    incoming payload must land.
//!
//! Work is split as evenly as possible: with `base = N / P` and
//! `remainder = N % P`, ranks `0 .. remainder` take `base + 1` elements and the
//! rest take `base`. Slices are assigned in rank order with no gaps. When
//! `N < P` the trailing ranks receive empty slices, which is not an error.

use crate::error::FieldError;
use crate::transform_pipeline::traits::TransformBehavior;
use crate::types::{Field, Partition};

fn check_group(group_size: u32, rank: u32) -> Result<(), FieldError> {
    if group_size == 0 {
        return Err(FieldError::InvalidGroup(
            "group size must be at least 1".to_string(),
        ));
    }
    if rank >= group_size {
        return Err(FieldError::InvalidGroup(format!(
            "rank {} is outside a group of {}",
            rank, group_size
        )));
    }
    Ok(())
}

/// The slice of `[0, n)` owned by `rank` in a group of `group_size`.
pub fn plan(n: u32, group_size: u32, rank: u32) -> Result<Partition, FieldError> {
    check_group(group_size, rank)?;
    let base = n / group_size;
    let remainder = n % group_size;
    // Ranks before `rank` that took an extra element.
    let start = rank * base + rank.min(remainder);
    let len = base + u32::from(rank < remainder);
    Ok(Partition::new(start, len))
}

/// Every rank's slice, in rank order, built with a running cursor.
pub fn plan_all(n: u32, group_size: u32) -> Result<Vec<Partition>, FieldError> {
    check_group(group_size, 0)?;
    let base = n / group_size;
    let remainder = n % group_size;
    let mut cursor = 0u32;
    let partitions = (0..group_size)
        .map(|rank| {
            let len = base + u32::from(rank < remainder);
            let partition = Partition::new(cursor, len);
            cursor += len;
            partition
        })
        .collect();
    Ok(partitions)
}

/// The slice of `transform`'s index space over `field` owned by `rank`.
pub fn plan_transform<T: TransformBehavior + ?Sized>(
    transform: &T,
    field: &Field,
    group_size: u32,
    rank: u32,
) -> Result<Partition, FieldError> {
    plan(transform.domain_size(field), group_size, rank)
}
