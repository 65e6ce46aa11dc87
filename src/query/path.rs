//! One disjoint search path: its frontier, its query function and its result.

use std::{
    future::Future,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex, MutexGuard, PoisonError,
    },
};

use tracing::{debug, trace};

use super::{frontier::Frontier, run::Run};
use crate::{Id, PeerStore, QueryError, Response, Result};

/// Performs one hop of a query against a single peer.
///
/// Implemented for every `Fn(Id) -> impl Future<Output = Result<Response<T>, QueryError>>`,
/// so closures can be passed directly.
pub trait QueryFn<T> {
    type Future: Future<Output = Result<Response<T>, QueryError>>;

    fn query(&self, peer: Id) -> Self::Future;
}

impl<T, F, Fut> QueryFn<T> for F
where
    F: Fn(Id) -> Fut,
    Fut: Future<Output = Result<Response<T>, QueryError>>,
{
    type Future = Fut;

    fn query(&self, peer: Id) -> Fut {
        self(peer)
    }
}

pub(crate) struct Path<Q, T> {
    index: usize,
    query: Q,
    frontier: Mutex<Frontier>,
    result: Mutex<Option<T>>,
    done: AtomicBool,
}

impl<Q, T> Path<Q, T>
where
    Q: QueryFn<T>,
{
    pub fn new(index: usize, query: Q, frontier: Frontier) -> Self {
        Self {
            index,
            query,
            frontier: Mutex::new(frontier),
            result: Mutex::new(None),
            done: AtomicBool::new(false),
        }
    }

    // === Getters ===

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn target(&self) -> Id {
        self.frontier().target()
    }

    /// Returns `true` once this path succeeded or was stopped, after which no
    /// new peers are dispatched.
    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    // === Public Methods ===

    /// Closest peer waiting to be queried on this path.
    pub fn next_peer(&self) -> Option<Id> {
        self.frontier().remove()
    }

    /// Stop dispatching on this path without recording a result.
    pub fn stop(&self) {
        self.done.store(true, Ordering::Release);
    }

    /// Admit `peer` into this path unless it is the local node or any path
    /// of the run already admitted it.
    pub fn admit<S: PeerStore>(&self, peer: Id, run: &Run<'_, S>) -> bool {
        if !run.claim(peer) {
            return false;
        }

        self.frontier().insert(peer)
    }

    /// Query a single peer and fold its response into the run.
    ///
    /// Returns `true` if this response completed the path.
    pub async fn execute<S: PeerStore>(&self, peer: Id, run: &Run<'_, S>) -> Result<bool> {
        let response = self.query.query(peer).await;

        if self.is_done() {
            trace!(path = self.index, ?peer, "Discarding late response");
            return Ok(false);
        }

        match response {
            Err(error) => {
                debug!(path = self.index, ?peer, %error, "Query to peer failed");
                run.record_error(peer, error);

                Ok(false)
            }
            Ok(Response::Success(value)) => Ok(self.set_result(value)),
            Ok(Response::CloserPeers(nodes)) => {
                let mut first_error = None;

                for node in nodes {
                    if run.is_self(node.id()) {
                        continue;
                    }

                    match run.store().put(node) {
                        Ok(id) => {
                            self.admit(id, run);
                        }
                        Err(error) => {
                            first_error.get_or_insert(error);
                        }
                    }
                }

                match first_error {
                    Some(error) => Err(error),
                    None => Ok(false),
                }
            }
            Ok(Response::Empty) => Ok(false),
        }
    }

    /// Consume the path, returning its success payload if it has one.
    pub fn into_result(self) -> Option<T> {
        self.result
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // === Private Methods ===

    /// Store the path's result unless one was already set.
    fn set_result(&self, value: T) -> bool {
        let mut result = self.result.lock().unwrap_or_else(PoisonError::into_inner);

        if result.is_some() {
            return false;
        }

        *result = Some(value);
        self.stop();

        true
    }

    fn frontier(&self) -> MutexGuard<'_, Frontier> {
        self.frontier.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
