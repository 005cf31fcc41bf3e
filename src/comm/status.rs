//! Status codes returned by the raw send/receive primitives and their
//! classification into [`CommError`].
//!
//! The numeric values follow the common MPI assignments so that a transport
//! wrapping a native library can forward its return codes unchanged.

use crate::error::CommError;

pub const SUCCESS: i32 = 0;
pub const ERR_COUNT: i32 = 2;
pub const ERR_TYPE: i32 = 3;
pub const ERR_TAG: i32 = 4;
pub const ERR_COMM: i32 = 5;
pub const ERR_RANK: i32 = 6;

/// Classifies a primitive's return code. Success is a no-op; anything else fails
/// immediately. No retry is attempted.
pub fn check(code: i32) -> Result<(), CommError> {
    match code {
        SUCCESS => Ok(()),
        ERR_COMM => Err(CommError::InvalidCommunicator),
        ERR_TYPE => Err(CommError::InvalidDatatype),
        ERR_COUNT => Err(CommError::InvalidCount),
        ERR_TAG => Err(CommError::InvalidTag),
        ERR_RANK => Err(CommError::InvalidRank),
        other => Err(CommError::Unrecognized(other)),
    }
}

/// The status code a transport reports for a given failure class.
pub fn code_of(err: CommError) -> i32 {
    match err {
        CommError::InvalidCommunicator => ERR_COMM,
        CommError::InvalidDatatype => ERR_TYPE,
        CommError::InvalidCount => ERR_COUNT,
        CommError::InvalidTag => ERR_TAG,
        CommError::InvalidRank => ERR_RANK,
        CommError::Unrecognized(code) => code,
    }
}
