// In: src/comm/local.rs

//! An in-process process group.
//!
//! `LocalGroup` stands up `size` ranks as scoped OS threads that share nothing but
//! channels. Every ordered pair of ranks gets its own zero-capacity
//! (`sync_channel(0)`) channel, so a send blocks until the destination actually
//! takes the message, which gives the same blocking behaviour as a synchronous
//! point-to-point primitive.
//!
//! Matching is by source and tag. A receive pulls messages from the source's
//! channel in order; messages carrying a different tag are parked in a
//! per-source pending queue and matched by later receives, so messages between
//! one pair of ranks never overtake each other within a tag.
//!
//! When a rank finishes (or fails) its endpoints are dropped. A peer that is
//! blocked on it then gets `ERR_COMM` instead of waiting forever.

use hashbrown::HashMap;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::thread;

use crate::comm::status;
use crate::comm::{Communicator, Datatype};
use crate::error::FieldError;

struct Envelope {
    tag: i32,
    datatype: Datatype,
    bytes: Vec<u8>,
}

/// One rank's endpoint into a [`LocalGroup`].
pub struct LocalComm {
    rank: u32,
    size: u32,
    /// Indexed by destination rank; `None` at our own rank.
    outboxes: Vec<Option<SyncSender<Envelope>>>,
    /// Indexed by source rank; `None` at our own rank.
    inboxes: Vec<Option<Receiver<Envelope>>>,
    /// Messages received ahead of the receive that matches them, per source.
    pending: RefCell<HashMap<u32, VecDeque<Envelope>>>,
}

impl LocalComm {
    /// Validates a peer rank argument, returning it as an index.
    fn peer(&self, rank: i32) -> Result<usize, i32> {
        match u32::try_from(rank) {
            Ok(r) if r < self.size && r != self.rank => Ok(r as usize),
            _ => Err(status::ERR_RANK),
        }
    }

    fn take_pending(&self, source: u32, tag: i32) -> Option<Envelope> {
        let mut pending = self.pending.borrow_mut();
        let queue = pending.get_mut(&source)?;
        let pos = queue.iter().position(|env| env.tag == tag)?;
        queue.remove(pos)
    }

    fn deliver(envelope: Envelope, bytes: &mut [u8], datatype: Datatype) -> i32 {
        if envelope.datatype != datatype {
            return status::ERR_TYPE;
        }
        if envelope.bytes.len() != bytes.len() {
            return status::ERR_COUNT;
        }
        bytes.copy_from_slice(&envelope.bytes);
        status::SUCCESS
    }
}

impl Communicator for LocalComm {
    fn rank(&self) -> u32 {
        self.rank
    }

    fn size(&self) -> u32 {
        self.size
    }

    fn send_raw(&self, bytes: &[u8], datatype: Datatype, dest: i32, tag: i32) -> i32 {
        let dest = match self.peer(dest) {
            Ok(d) => d,
            Err(code) => return code,
        };
        if tag < 0 {
            return status::ERR_TAG;
        }
        if bytes.len() % datatype.size() != 0 {
            return status::ERR_COUNT;
        }
        let Some(outbox) = self.outboxes[dest].as_ref() else {
            return status::ERR_RANK;
        };
        log::trace!(
            "rank {} -> {} tag {} ({} bytes)",
            self.rank,
            dest,
            tag,
            bytes.len()
        );
        let envelope = Envelope {
            tag,
            datatype,
            bytes: bytes.to_vec(),
        };
        match outbox.send(envelope) {
            Ok(()) => status::SUCCESS,
            Err(_) => status::ERR_COMM,
        }
    }

    fn recv_raw(&self, bytes: &mut [u8], datatype: Datatype, source: i32, tag: i32) -> i32 {
        let source = match self.peer(source) {
            Ok(s) => s,
            Err(code) => return code,
        };
        if tag < 0 {
            return status::ERR_TAG;
        }
        if let Some(envelope) = self.take_pending(source as u32, tag) {
            return Self::deliver(envelope, bytes, datatype);
        }
        let Some(inbox) = self.inboxes[source].as_ref() else {
            return status::ERR_RANK;
        };
        loop {
            let envelope = match inbox.recv() {
                Ok(env) => env,
                Err(_) => return status::ERR_COMM,
            };
            if envelope.tag == tag {
                log::trace!("rank {} <- {} tag {}", self.rank, source, tag);
                return Self::deliver(envelope, bytes, datatype);
            }
            self.pending
                .borrow_mut()
                .entry(source as u32)
                .or_default()
                .push_back(envelope);
        }
    }
}

/// Launcher for an in-process group of ranks.
pub struct LocalGroup;

impl LocalGroup {
    /// Builds the `size` endpoints of a fully connected group.
    pub fn endpoints(size: u32) -> Result<Vec<LocalComm>, FieldError> {
        if size == 0 {
            return Err(FieldError::InvalidGroup(
                "a process group needs at least one rank".to_string(),
            ));
        }
        let n = size as usize;
        let mut outboxes: Vec<Vec<Option<SyncSender<Envelope>>>> =
            (0..n).map(|_| (0..n).map(|_| None).collect()).collect();
        let mut inboxes: Vec<Vec<Option<Receiver<Envelope>>>> =
            (0..n).map(|_| (0..n).map(|_| None).collect()).collect();

        for src in 0..n {
            for dst in 0..n {
                if src == dst {
                    continue;
                }
                let (tx, rx) = sync_channel(0);
                outboxes[src][dst] = Some(tx);
                inboxes[dst][src] = Some(rx);
            }
        }

        Ok(outboxes
            .into_iter()
            .zip(inboxes)
            .enumerate()
            .map(|(rank, (outboxes, inboxes))| LocalComm {
                rank: rank as u32,
                size,
                outboxes,
                inboxes,
                pending: RefCell::new(HashMap::new()),
            })
            .collect())
    }

    /// Runs `body` once per rank, each on its own thread, and returns the results
    /// in rank order once every rank has finished.
    pub fn run<F, R>(size: u32, body: F) -> Result<Vec<R>, FieldError>
    where
        F: Fn(LocalComm) -> R + Sync,
        R: Send,
    {
        let endpoints = Self::endpoints(size)?;
        let body = &body;
        thread::scope(|scope| {
            let handles: Vec<_> = endpoints
                .into_iter()
                .map(|comm| {
                    let rank = comm.rank;
                    thread::Builder::new()
                        .name(format!("fieldmesh-rank-{}", rank))
                        .spawn_scoped(scope, move || body(comm))
                })
                .collect::<Result<_, _>>()?;

            handles
                .into_iter()
                .enumerate()
                .map(|(rank, handle)| {
                    handle.join().map_err(|_| {
                        FieldError::InternalError(format!("rank {} panicked", rank))
                    })
                })
                .collect()
        })
    }
}
