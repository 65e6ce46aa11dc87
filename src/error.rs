//! Main Crate Error

use crate::common::Id;

#[derive(thiserror::Error, Debug)]
/// dht-query crate error enum.
pub enum Error {
    /// Id bytes (or a lookup target) were not exactly 20 bytes long.
    #[error("Invalid Id size, expected 20 bytes, got {0}")]
    InvalidIdSize(usize),

    /// Id string was not 40 hex characters.
    #[error("Invalid Id encoding: {0}")]
    InvalidIdEncoding(String),

    /// A [crate::PeerStore] refused to normalize a discovered peer record.
    #[error("Peer store error: {0}")]
    PeerStore(String),

    /// Every peer contacted during the run failed; carries the error of the
    /// earliest admitted peer.
    #[error("Every contacted peer failed, first error: {0}")]
    AllPeersFailed(#[source] QueryError),
}

#[derive(thiserror::Error, Debug)]
/// Failure of a single one-hop request to a peer.
///
/// These never abort a query on their own, they are collected and only
/// surfaced if no contacted peer succeeded.
pub enum QueryError {
    /// The peer did not respond in time.
    #[error("Request to {0} timed out")]
    Timeout(Id),

    /// The peer could not be reached at all.
    #[error("Peer {0} is unreachable")]
    Unreachable(Id),

    /// The peer answered with an error response.
    #[error("Remote error {code}: {description}")]
    Remote { code: i32, description: String },

    /// The peer answered with something that could not be classified.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    /// Transparent [std::io::Error]
    IO(#[from] std::io::Error),
}

/// Alias for results returned by this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
