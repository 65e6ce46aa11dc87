//! Classified response of a single peer.
use super::Node;

/// What a peer answered for one hop of a query.
///
/// A failed request is not a variant here, query functions return
/// `Err(`[crate::QueryError]`)` for it instead.
#[derive(Debug, Clone, PartialEq)]
pub enum Response<T> {
    /// The path reached its goal, stop querying on it.
    Success(T),
    /// Peers the responder believes to be closer to the target.
    CloserPeers(Vec<Node>),
    /// Neither a result nor closer peers.
    Empty,
}
