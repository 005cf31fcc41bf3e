//! This file is the root of the `fieldmesh` Rust crate.
//!
//! fieldmesh applies pixel-wise and geometric transforms to a dense 2-D field
//! across a fixed group of processes. Every process holds a full replica of the
//! input, computes a statically planned slice of the output, and the leader
//! (rank 0) consolidates the slices over blocking point-to-point messages.
//!
//! Its responsibilities are strictly limited to:
//! 1.  Declaring all the top-level modules of the library so the Rust compiler
//!     knows they exist.
//! 2.  Re-exporting the small public surface most callers need.

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//==================================================================================
// 1. Module Declarations
//==================================================================================
#[macro_use]
pub mod observability; // Make macros available throughout the crate

pub mod comm;
pub mod config;
pub mod error;
pub mod io;
pub mod kernels;
pub mod transform_pipeline;
pub mod types;

mod utils;

//==================================================================================
// 2. Public API Re-exports
//==================================================================================
pub use comm::local::{LocalComm, LocalGroup};
pub use comm::{Communicator, SingleProcess, LEADER_RANK};
pub use config::{EngineConfig, OutputFormat};
pub use error::{CommError, FieldError};
pub use transform_pipeline::{apply_filter, apply_filters, FilterOutcome, Transform};
pub use types::{Field, Partition};
