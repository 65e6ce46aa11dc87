//! Registry of peer addresses learned while querying.

use std::{
    net::SocketAddr,
    num::NonZeroUsize,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use lru::LruCache;
use tracing::trace;

use super::{Id, Node};
use crate::Result;

/// Default number of peers an [AddressBook] remembers.
pub const DEFAULT_ADDRESS_BOOK_SIZE: NonZeroUsize = match NonZeroUsize::new(1000) {
    Some(size) => size,
    None => panic!("address book size must be non zero"),
};

/// Normalizes peer records discovered in responses before they are admitted
/// into a query.
pub trait PeerStore {
    /// Store or merge `node`, and return the [Id] the query should use for it.
    fn put(&self, node: Node) -> Result<Id>;
}

#[derive(Debug, Clone)]
/// Bounded, least recently used map of peer [Id]s to their last known address.
///
/// Clones share the same underlying cache, so query functions can hold a clone
/// to resolve the address of the peer they are asked to contact.
pub struct AddressBook {
    inner: Arc<Mutex<LruCache<Id, SocketAddr>>>,
}

impl AddressBook {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    // === Getters ===

    /// Last known address of a peer, marking it as recently used.
    pub fn get(&self, id: &Id) -> Option<SocketAddr> {
        self.lock().get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // === Private Methods ===

    fn lock(&self) -> MutexGuard<'_, LruCache<Id, SocketAddr>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for AddressBook {
    fn default() -> Self {
        Self::new(DEFAULT_ADDRESS_BOOK_SIZE)
    }
}

impl PeerStore for AddressBook {
    fn put(&self, node: Node) -> Result<Id> {
        let id = *node.id();

        if let Some(previous) = self.lock().put(id, node.address()) {
            if previous != node.address() {
                trace!(?id, ?previous, address = ?node.address(), "Peer address updated");
            }
        }

        Ok(id)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn node(byte: u8, port: u16) -> Node {
        Node::new(Id::from([byte; 20]), SocketAddr::from(([127, 0, 0, 1], port)))
    }

    #[test]
    fn put_returns_id() {
        let book = AddressBook::default();
        let node = node(1, 6881);

        assert_eq!(book.put(node.clone()).unwrap(), *node.id());
        assert_eq!(book.get(node.id()), Some(node.address()));
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn newer_address_wins() {
        let book = AddressBook::default();

        book.put(node(1, 6881)).unwrap();
        book.put(node(1, 6882)).unwrap();

        assert_eq!(book.len(), 1);
        assert_eq!(
            book.get(&Id::from([1; 20])),
            Some(SocketAddr::from(([127, 0, 0, 1], 6882)))
        );
    }

    #[test]
    fn evicts_least_recently_used() {
        let book = AddressBook::new(NonZeroUsize::new(2).unwrap());

        book.put(node(1, 1)).unwrap();
        book.put(node(2, 2)).unwrap();
        // Touch 1 so 2 becomes the eviction candidate.
        book.get(&Id::from([1; 20]));
        book.put(node(3, 3)).unwrap();

        assert_eq!(book.len(), 2);
        assert!(book.get(&Id::from([1; 20])).is_some());
        assert!(book.get(&Id::from([2; 20])).is_none());
        assert!(book.get(&Id::from([3; 20])).is_some());
    }

    #[test]
    fn clones_share_entries() {
        let book = AddressBook::default();
        let clone = book.clone();

        clone.put(node(9, 9)).unwrap();

        assert!(!book.is_empty());
    }
}
