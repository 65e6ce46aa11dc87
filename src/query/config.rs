use crate::Id;

/// Default number of concurrent requests per path, Kademlia's `alpha`.
pub const DEFAULT_CONCURRENCY: usize = 3;
/// Default number of disjoint paths. Disjoint lookups are opt-in.
pub const DEFAULT_DISJOINT_PATHS: usize = 1;

#[derive(Debug, Clone)]
/// Query Configurations
pub struct Config {
    /// This node's [Id], never admitted into a query nor queried.
    ///
    /// Defaults to a random Id
    pub id: Id,
    /// Maximum number of in-flight requests on each path.
    ///
    /// Defaults to [DEFAULT_CONCURRENCY]
    pub concurrency: usize,
    /// Number of disjoint paths the seed peers are split across, as
    /// described in S/Kademlia. Clamped to the number of seed peers.
    ///
    /// Defaults to [DEFAULT_DISJOINT_PATHS]
    pub disjoint_paths: usize,
}

impl Config {
    /// Upper bound of in-flight requests across a whole query run with the
    /// default [Self::disjoint_paths].
    ///
    /// Informational only, it is not enforced on its own: each path caps
    /// itself at [Self::concurrency], so a run never exceeds
    /// `concurrency * paths`. A [crate::Query::run_disjoint] call with a
    /// different path count scales accordingly.
    pub fn max_inflight(&self) -> usize {
        self.concurrency.max(1) * self.disjoint_paths.max(1)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            id: Id::random(),
            concurrency: DEFAULT_CONCURRENCY,
            disjoint_paths: DEFAULT_DISJOINT_PATHS,
        }
    }
}
