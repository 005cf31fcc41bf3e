//! This module contains the pure, stateless kernels behind every supported
//! field transform.
//!
//! Kernels know nothing about process groups or partitions: they take a full input
//! replica, an output buffer of the same size and the half-open index range the
//! caller owns, and write only inside that range. The `transform_pipeline`
//! executor is the only caller that maps a `Transform` onto these functions.

pub mod flip;
pub mod pointwise;
