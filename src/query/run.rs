//! State shared by every path of one query run.

use std::{
    collections::{hash_map::Entry, HashMap, HashSet},
    sync::{Mutex, MutexGuard, PoisonError},
};

use tracing::trace;

use crate::{Id, PeerStore, QueryError};

/// The only state mutated across paths: which peers were admitted, in what
/// order, and the failures recorded so far.
pub(crate) struct Run<'a, S> {
    local_id: Id,
    store: &'a S,
    state: Mutex<RunState>,
}

#[derive(Debug, Default)]
struct RunState {
    /// Admitted peers and their global admission order.
    seen: HashMap<Id, usize>,
    errors: Vec<(Id, QueryError)>,
}

impl<'a, S: PeerStore> Run<'a, S> {
    pub fn new(local_id: Id, store: &'a S) -> Self {
        Self {
            local_id,
            store,
            state: Mutex::new(RunState::default()),
        }
    }

    // === Getters ===

    pub fn is_self(&self, peer: &Id) -> bool {
        *peer == self.local_id
    }

    pub fn store(&self) -> &S {
        self.store
    }

    // === Public Methods ===

    /// Claim `peer` for querying, returns `false` if it is the local node or
    /// was already claimed by any path.
    pub fn claim(&self, peer: Id) -> bool {
        if self.is_self(&peer) {
            return false;
        }

        let mut state = self.lock();
        let order = state.seen.len();

        match state.seen.entry(peer) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(order);
                trace!(?peer, order, "Admitted peer");
                true
            }
        }
    }

    pub fn record_error(&self, peer: Id, error: QueryError) {
        self.lock().errors.push((peer, error));
    }

    /// Consume the run, returning every admitted peer and the recorded errors
    /// sorted by the admission order of the peer that failed.
    pub fn finish(self) -> (HashSet<Id>, Vec<QueryError>) {
        let RunState { seen, mut errors } =
            self.state.into_inner().unwrap_or_else(PoisonError::into_inner);

        errors.sort_by_key(|(peer, _)| seen.get(peer).copied().unwrap_or(usize::MAX));

        (
            seen.into_keys().collect(),
            errors.into_iter().map(|(_, error)| error).collect(),
        )
    }

    // === Private Methods ===

    fn lock(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
