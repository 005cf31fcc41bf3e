//! This module defines the core, strongly-typed data representations used
//! throughout the fieldmesh engine.
//!
//! It includes the `Field` container, the dense 2-D grid every process holds a
//! full replica of, and the `Partition` value that describes which contiguous
//! slice of an index space a given rank owns.

pub mod field;
pub mod partition;

// Re-export the main types for easier access.
pub use field::Field;
pub use partition::Partition;
