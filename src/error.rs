// In: src/error.rs

//! This module defines the single, unified error type for the entire fieldmesh library.
//! It uses the `thiserror` crate to provide ergonomic, context-aware error handling.
//!
//! Every error here is fatal to the invocation that raised it. There is no retry
//! layer and no partial-result salvage. Because point-to-point messaging is
//! blocking, a process that fails after its peer has already committed to a
//! matching receive leaves that peer blocked; this is an inherent property of the
//! protocol and is not masked with timeouts.

use thiserror::Error;

/// Failure classes reported by the point-to-point send/receive primitives.
///
/// Produced exclusively by [`crate::comm::status::check`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommError {
    #[error("invalid communicator: the process group is unusable or a peer has gone away")]
    InvalidCommunicator,

    #[error("invalid datatype: the message element type does not match the receive")]
    InvalidDatatype,

    #[error("invalid count: element count is malformed or differs from the receive buffer")]
    InvalidCount,

    #[error("invalid tag: tags must be non-negative")]
    InvalidTag,

    #[error("invalid rank: ranks must lie in [0, size) and differ from the caller")]
    InvalidRank,

    /// A non-success code outside the fixed taxonomy.
    #[error("unrecognized communication status code {0}")]
    Unrecognized(i32),
}

#[derive(Error, Debug)]
pub enum FieldError {
    // =========================================================================
    // === High-Level, Semantic Errors
    // =========================================================================
    #[error("Communication failed: {0}")]
    Communication(#[from] CommError),

    #[error("Domain error: value {value} at index {index} is outside the transform's domain")]
    Domain { index: usize, value: f32 },

    #[error("Empty field: '{0}' requires at least one element")]
    EmptyField(String),

    #[error("Dimension mismatch: expected {expected} elements, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Pixel ({i}, {j}) is outside a {width}x{height} field")]
    PixelOutOfBounds {
        i: u32,
        j: u32,
        width: u32,
        height: u32,
    },

    #[error("Gather protocol violation: {0}")]
    Protocol(String),

    #[error("Invalid process group: {0}")]
    InvalidGroup(String),

    #[error("Field format error: {0}")]
    Format(String),

    #[error("Internal logic error (this is a bug): {0}")]
    InternalError(String),

    // =========================================================================
    // === External Error Wrappers
    // =========================================================================
    /// An error originating from the underlying I/O subsystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error from the Serde JSON library, typically while reading configuration.
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}

impl FieldError {
    /// Returns the communication failure class, if this error came from messaging.
    pub fn comm_error(&self) -> Option<CommError> {
        match self {
            FieldError::Communication(e) => Some(*e),
            _ => None,
        }
    }
}
