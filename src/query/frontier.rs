//! Nearest-first queue of peers waiting to be queried on one path.

use std::{
    cmp::Reverse,
    collections::{BinaryHeap, HashSet},
};

use crate::{Id, Result};

/// Peers not yet queried, ordered by XOR distance to the target.
///
/// Equal distances (only possible for the same id) fall back to insertion
/// order, and an id is only ever queued once.
#[derive(Debug)]
pub struct Frontier {
    target: Id,
    heap: BinaryHeap<Reverse<(Id, u64, Id)>>,
    queued: HashSet<Id>,
    next_seq: u64,
}

impl Frontier {
    /// Create a frontier for a lookup target given as raw bytes.
    ///
    /// Fails if `target` is not a valid [Id].
    pub fn new<T: AsRef<[u8]>>(target: T) -> Result<Self> {
        Ok(Self::with_target(Id::from_bytes(target)?))
    }

    pub fn with_target(target: Id) -> Self {
        Self {
            target,
            heap: BinaryHeap::new(),
            queued: HashSet::new(),
            next_seq: 0,
        }
    }

    // === Getters ===

    pub fn target(&self) -> Id {
        self.target
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// The closest queued peer, without removing it.
    pub fn peek(&self) -> Option<Id> {
        self.heap.peek().map(|Reverse((_, _, peer))| *peer)
    }

    // === Public Methods ===

    /// Queue a peer, returns `false` if it was queued before.
    pub fn insert(&mut self, peer: Id) -> bool {
        if !self.queued.insert(peer) {
            return false;
        }

        let seq = self.next_seq;
        self.next_seq += 1;

        self.heap.push(Reverse((peer.xor(&self.target), seq, peer)));

        true
    }

    /// Remove and return the queued peer closest to the target.
    pub fn remove(&mut self) -> Option<Id> {
        self.heap.pop().map(|Reverse((_, _, peer))| peer)
    }
}
