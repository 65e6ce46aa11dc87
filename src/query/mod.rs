//! Iterative lookups over one or more disjoint paths.
//!
//! A [Query] splits its seed peers round-robin across `disjoint_paths`
//! paths. Each path queries the peers closest to the target first, feeds
//! closer peers from responses back into its own frontier, and stops as soon
//! as one of its peers reports success. A peer is admitted into at most one
//! path per run, so paths never share intermediate hops.

mod config;
mod frontier;
mod path;
mod run;
mod scheduler;

use std::collections::HashSet;

use futures::future::try_join_all;
use tracing::debug;

use crate::{AddressBook, Error, Id, PeerStore, QueryError, Result};

pub use config::{Config, DEFAULT_CONCURRENCY, DEFAULT_DISJOINT_PATHS};
pub use frontier::Frontier;
pub use path::QueryFn;

use path::Path;
use run::Run;

#[derive(Debug, Clone)]
/// Runs iterative lookups with a [Config] and a [PeerStore].
pub struct Query<S = AddressBook> {
    config: Config,
    store: S,
}

impl Query<AddressBook> {
    /// Create a query engine with a fresh [AddressBook].
    pub fn new(config: Config) -> Self {
        Self {
            config,
            store: AddressBook::default(),
        }
    }

    pub fn builder() -> QueryBuilder {
        QueryBuilder::default()
    }
}

impl<S: PeerStore> Query<S> {
    /// Create a query engine normalizing discovered peers through `store`.
    pub fn with_store(config: Config, store: S) -> Self {
        Self { config, store }
    }

    // === Getters ===

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // === Public Methods ===

    /// Look up `target` starting from `seeds`, over [Config::disjoint_paths] paths.
    ///
    /// See [Self::run_disjoint].
    pub async fn run<T, F, Q>(
        &self,
        target: impl AsRef<[u8]>,
        seeds: &[Id],
        factory: F,
    ) -> Result<QueryOutcome<T>>
    where
        F: FnMut(usize) -> Q,
        Q: QueryFn<T>,
    {
        self.run_disjoint(target, seeds, self.config.disjoint_paths, factory)
            .await
    }

    /// Look up `target` starting from `seeds`, split round-robin across
    /// `paths` disjoint paths.
    ///
    /// `factory` is called once per path with the path index, and returns the
    /// function querying a single peer on that path.
    ///
    /// An empty `seeds` list resolves to an empty outcome. Fails if `target`
    /// is not a valid [Id], if the [PeerStore] rejects a discovered peer, or
    /// if every admitted peer failed, in which case the error of the earliest
    /// admitted peer is returned.
    pub async fn run_disjoint<T, F, Q>(
        &self,
        target: impl AsRef<[u8]>,
        seeds: &[Id],
        paths: usize,
        mut factory: F,
    ) -> Result<QueryOutcome<T>>
    where
        F: FnMut(usize) -> Q,
        Q: QueryFn<T>,
    {
        if seeds.is_empty() {
            debug!("No seed peers, nothing to query");
            return Ok(QueryOutcome::default());
        }

        let target = target.as_ref();
        let paths = paths.clamp(1, seeds.len());
        let concurrency = self.config.concurrency;

        let run = Run::new(self.config.id, &self.store);

        let paths = partition(seeds, paths)
            .into_iter()
            .enumerate()
            .map(|(index, bucket)| -> Result<Path<Q, T>> {
                let path = Path::new(index, factory(index), Frontier::new(target)?);

                for peer in bucket {
                    path.admit(peer, &run);
                }

                Ok(path)
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            local = ?self.config.id,
            target = ?paths.first().map(Path::target),
            paths = paths.len(),
            seeds = seeds.len(),
            concurrency,
            "Starting query"
        );

        // The first dispatch error drops every other path and its workers.
        try_join_all(
            paths
                .iter()
                .map(|path| scheduler::drain(path, &run, concurrency)),
        )
        .await?;

        let (peers, mut errors) = run.finish();

        debug!(
            local = ?self.config.id,
            peers = peers.len(),
            errors = errors.len(),
            "Query done"
        );

        if !errors.is_empty() && errors.len() == peers.len() {
            return Err(Error::AllPeersFailed(errors.remove(0)));
        }

        Ok(QueryOutcome {
            peers,
            results: paths.into_iter().filter_map(Path::into_result).collect(),
            errors,
        })
    }

    /// Blocking version of [Self::run].
    #[cfg(feature = "blocking")]
    pub fn run_blocking<T, F, Q>(
        &self,
        target: impl AsRef<[u8]>,
        seeds: &[Id],
        factory: F,
    ) -> Result<QueryOutcome<T>>
    where
        F: FnMut(usize) -> Q,
        Q: QueryFn<T>,
    {
        futures::executor::block_on(self.run(target, seeds, factory))
    }
}

#[derive(Debug, Default)]
/// Builder for a [Query].
pub struct QueryBuilder(Config);

impl QueryBuilder {
    /// Set this node's [Id], which is never queried.
    pub fn id(&mut self, id: Id) -> &mut Self {
        self.0.id = id;
        self
    }

    /// Set the maximum in-flight requests per path.
    pub fn concurrency(&mut self, concurrency: usize) -> &mut Self {
        self.0.concurrency = concurrency.max(1);
        self
    }

    /// Set the default number of disjoint paths.
    pub fn disjoint_paths(&mut self, paths: usize) -> &mut Self {
        self.0.disjoint_paths = paths.max(1);
        self
    }

    pub fn build(&self) -> Query {
        Query::new(self.0.clone())
    }

    pub fn build_with_store<S: PeerStore>(&self, store: S) -> Query<S> {
        Query::with_store(self.0.clone(), store)
    }
}

#[derive(Debug)]
/// Outcome of a [Query] run that did not fail.
pub struct QueryOutcome<T> {
    peers: HashSet<Id>,
    results: Vec<T>,
    errors: Vec<QueryError>,
}

impl<T> Default for QueryOutcome<T> {
    fn default() -> Self {
        Self {
            peers: HashSet::new(),
            results: Vec::new(),
            errors: Vec::new(),
        }
    }
}

impl<T> QueryOutcome<T> {
    /// Every peer admitted into any path during the run.
    pub fn peers(&self) -> &HashSet<Id> {
        &self.peers
    }

    /// Success payloads of the paths that succeeded, in path order.
    pub fn results(&self) -> &[T] {
        &self.results
    }

    /// Failures recorded during the run, ordered by when the failing peer was
    /// admitted.
    pub fn errors(&self) -> &[QueryError] {
        &self.errors
    }

    pub fn into_results(self) -> Vec<T> {
        self.results
    }
}

/// Split `seeds` round-robin into `paths` buckets, keeping their order.
fn partition(seeds: &[Id], paths: usize) -> Vec<Vec<Id>> {
    let mut buckets = vec![Vec::with_capacity(seeds.len() / paths + 1); paths];

    for (i, peer) in seeds.iter().enumerate() {
        buckets[i % paths].push(*peer);
    }

    buckets
}
