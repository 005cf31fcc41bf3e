// In: src/comm/mod.rs

//! Process-group messaging.
//!
//! The engine only needs two things from a process group: the facts (`size`,
//! own `rank`) and synchronous point-to-point messaging keyed by rank and tag.
//! Transports implement the two raw primitives and report plain status codes; the
//! typed helpers on [`Communicator`] run every code through the classifier in
//! [`status`] so that a failed send or receive aborts the invocation at once.
//!
//! Implementations: [`SingleProcess`] (group of one) and
//! [`local::LocalGroup`] (one thread per rank, rendezvous channels).

pub mod local;
pub mod status;

use serde::{Deserialize, Serialize};

use crate::error::FieldError;
use crate::utils::{as_bytes, as_bytes_mut};

/// Rank of the distinguished process that consolidates results.
pub const LEADER_RANK: u32 = 0;

/// Element type carried by a message. Receives must name the same type as the
/// matching send.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Datatype {
    Int64,
    Float32,
}

impl Datatype {
    /// Size of one element in bytes.
    pub fn size(&self) -> usize {
        match self {
            Datatype::Int64 => std::mem::size_of::<i64>(),
            Datatype::Float32 => std::mem::size_of::<f32>(),
        }
    }
}

/// Blocking point-to-point messaging within a fixed process group.
///
/// Sends and receives block until the counterpart issues the paired operation.
/// There is no timeout: a missing or mismatched counterpart blocks forever.
pub trait Communicator {
    /// This process's rank, in `[0, size)`.
    fn rank(&self) -> u32;

    /// Number of processes in the group.
    fn size(&self) -> u32;

    /// Sends `bytes` as elements of `datatype` to `dest` under `tag`.
    /// Returns a status code (see [`status`]).
    fn send_raw(&self, bytes: &[u8], datatype: Datatype, dest: i32, tag: i32) -> i32;

    /// Receives exactly `bytes.len()` bytes of `datatype` elements from `source`
    /// under `tag`, writing them directly into `bytes`. Returns a status code.
    fn recv_raw(&self, bytes: &mut [u8], datatype: Datatype, source: i32, tag: i32) -> i32;

    fn is_leader(&self) -> bool {
        self.rank() == LEADER_RANK
    }

    fn send_i64(&self, data: &[i64], dest: u32, tag: i32) -> Result<(), FieldError> {
        let code = self.send_raw(as_bytes(data), Datatype::Int64, rank_arg(dest), tag);
        status::check(code)?;
        Ok(())
    }

    fn recv_i64(&self, data: &mut [i64], source: u32, tag: i32) -> Result<(), FieldError> {
        let code = self.recv_raw(as_bytes_mut(data), Datatype::Int64, rank_arg(source), tag);
        status::check(code)?;
        Ok(())
    }

    fn send_f32(&self, data: &[f32], dest: u32, tag: i32) -> Result<(), FieldError> {
        let code = self.send_raw(as_bytes(data), Datatype::Float32, rank_arg(dest), tag);
        status::check(code)?;
        Ok(())
    }

    fn recv_f32(&self, data: &mut [f32], source: u32, tag: i32) -> Result<(), FieldError> {
        let code = self.recv_raw(as_bytes_mut(data), Datatype::Float32, rank_arg(source), tag);
        status::check(code)?;
        Ok(())
    }
}

/// Ranks beyond `i32::MAX` cannot exist in any group; map them to an invalid rank.
fn rank_arg(rank: u32) -> i32 {
    i32::try_from(rank).unwrap_or(-1)
}

/// A group of one. Every process fact is trivial and there is nobody to talk to,
/// so any send or receive reports an invalid rank.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleProcess;

impl Communicator for SingleProcess {
    fn rank(&self) -> u32 {
        LEADER_RANK
    }

    fn size(&self) -> u32 {
        1
    }

    fn send_raw(&self, _bytes: &[u8], _datatype: Datatype, _dest: i32, _tag: i32) -> i32 {
        status::ERR_RANK
    }

    fn recv_raw(&self, _bytes: &mut [u8], _datatype: Datatype, _source: i32, _tag: i32) -> i32 {
        status::ERR_RANK
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CommError;

    #[test]
    fn test_single_process_facts() {
        let comm = SingleProcess;
        assert_eq!(comm.rank(), 0);
        assert_eq!(comm.size(), 1);
        assert!(comm.is_leader());
    }

    #[test]
    fn test_single_process_messaging_is_invalid_rank() {
        let comm = SingleProcess;
        let err = comm.send_f32(&[1.0], 1, 0).unwrap_err();
        assert_eq!(err.comm_error(), Some(CommError::InvalidRank));
        let mut buf = [0i64; 1];
        let err = comm.recv_i64(&mut buf, 1, 0).unwrap_err();
        assert_eq!(err.comm_error(), Some(CommError::InvalidRank));
    }

    #[test]
    fn test_datatype_sizes() {
        assert_eq!(Datatype::Int64.size(), 8);
        assert_eq!(Datatype::Float32.size(), 4);
    }
}
