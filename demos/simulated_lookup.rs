//! Simulate value lookups in a network where a fraction of nodes try to
//! eclipse every lookup, and compare success rates for 1..N disjoint paths.
//!
//! Run: `cargo run --example simulated_lookup -- --nodes 2000 --malicious 0.2`

use std::{
    collections::{HashMap, HashSet},
    net::SocketAddr,
    sync::Arc,
    time::Instant,
};

use clap::Parser;
use dht_query::{Id, Node, Query, QueryError, Response};
use futures::executor::block_on;
use rand::{seq::SliceRandom, Rng};
use tracing::{debug, info, Level};

/// Number of closer peers returned per response, and of seed peers.
const K: usize = 20;
/// Number of closest nodes a value is stored at.
const REPLICAS: usize = 8;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Number of nodes in the simulated network
    #[arg(long, default_value_t = 1000)]
    nodes: usize,
    /// Fraction of nodes that eclipse lookups
    #[arg(long, default_value_t = 0.2)]
    malicious: f64,
    /// Fraction of requests that time out
    #[arg(long, default_value_t = 0.05)]
    failure: f64,
    /// Number of peers each node knows about
    #[arg(long, default_value_t = 150)]
    known: usize,
    /// Compare 1 up to this many disjoint paths
    #[arg(long, default_value_t = 4)]
    paths: usize,
    /// Requests in flight per path
    #[arg(long, default_value_t = 3)]
    concurrency: usize,
    /// Lookups per configuration
    #[arg(long, default_value_t = 100)]
    lookups: usize,
    /// Log every lookup
    #[arg(long)]
    verbose: bool,
}

struct SimNode {
    address: SocketAddr,
    malicious: bool,
    known: Vec<Id>,
}

struct Network {
    nodes: HashMap<Id, SimNode>,
    malicious: Vec<Id>,
    failure: f64,
}

impl Network {
    fn new(cli: &Cli) -> Self {
        let mut rng = rand::thread_rng();

        let ids: Vec<Id> = (0..cli.nodes).map(|_| Id::random()).collect();
        let malicious_count = (cli.nodes as f64 * cli.malicious).round() as usize;
        let malicious = ids[..malicious_count.min(ids.len())].to_vec();

        let nodes = ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let known = ids
                    .choose_multiple(&mut rng, cli.known.min(ids.len()))
                    .copied()
                    .filter(|known| known != id)
                    .collect();

                let node = SimNode {
                    address: SocketAddr::from(([10, (i >> 16) as u8, (i >> 8) as u8, i as u8], 6881)),
                    malicious: i < malicious_count,
                    known,
                };

                (*id, node)
            })
            .collect();

        Self {
            nodes,
            malicious,
            failure: cli.failure.clamp(0.0, 1.0),
        }
    }

    fn honest(&self) -> Vec<Id> {
        self.nodes
            .iter()
            .filter(|(_, node)| !node.malicious)
            .map(|(id, _)| *id)
            .collect()
    }

    fn record(&self, id: Id) -> Node {
        let address = self
            .nodes
            .get(&id)
            .map(|node| node.address)
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 0)));

        Node::new(id, address)
    }

    /// Answer a lookup for `target` from `peer`, as an honest or malicious node.
    fn answer(
        &self,
        peer: Id,
        target: Id,
        holders: &HashSet<Id>,
    ) -> Result<Response<Id>, QueryError> {
        let Some(node) = self.nodes.get(&peer) else {
            return Err(QueryError::Unreachable(peer));
        };

        if rand::thread_rng().gen_bool(self.failure) {
            return Err(QueryError::Timeout(peer));
        }

        if node.malicious {
            let closer = closest(self.malicious.iter().copied(), target, K);

            return Ok(Response::CloserPeers(
                closer.into_iter().map(|id| self.record(id)).collect(),
            ));
        }

        if holders.contains(&peer) {
            return Ok(Response::Success(peer));
        }

        let closer = closest(node.known.iter().copied(), target, K);

        Ok(Response::CloserPeers(
            closer.into_iter().map(|id| self.record(id)).collect(),
        ))
    }
}

fn closest(ids: impl Iterator<Item = Id>, target: Id, n: usize) -> Vec<Id> {
    let mut ids: Vec<Id> = ids.collect();
    ids.sort_by_key(|id| id.xor(&target));
    ids.truncate(n);
    ids
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    let start = Instant::now();
    let network = Arc::new(Network::new(&cli));
    let honest = network.honest();

    info!(
        nodes = cli.nodes,
        malicious = network.malicious.len(),
        elapsed = ?start.elapsed(),
        "Simulated network ready"
    );

    let mut rng = rand::thread_rng();

    let lookups: Vec<(Id, Id)> = (0..cli.lookups)
        .filter_map(|_| honest.choose(&mut rng).map(|requester| (*requester, Id::random())))
        .collect();

    println!("\npaths | success | avg contacted | avg time");
    println!("------|---------|---------------|---------");

    for paths in 1..=cli.paths.max(1) {
        let mut successes = 0;
        let mut contacted = 0;
        let start = Instant::now();

        for (requester, target) in &lookups {
            let holders: Arc<HashSet<Id>> = Arc::new(
                closest(network.nodes.keys().copied(), *target, REPLICAS)
                    .into_iter()
                    .collect(),
            );

            let seeds = network
                .nodes
                .get(requester)
                .map(|node| closest(node.known.iter().copied(), *target, K))
                .unwrap_or_default();

            let query = Query::builder()
                .id(*requester)
                .concurrency(cli.concurrency)
                .disjoint_paths(paths)
                .build();

            let target = *target;
            let result = block_on(query.run(target, &seeds, |_| {
                let network = network.clone();
                let holders = holders.clone();

                move |peer| {
                    let answer = network.answer(peer, target, &holders);
                    async move { answer }
                }
            }));

            match result {
                Ok(outcome) => {
                    contacted += outcome.peers().len();

                    if !outcome.results().is_empty() {
                        successes += 1;
                    }

                    debug!(?target, paths, found = ?outcome.results(), "Lookup done");
                }
                Err(error) => debug!(?target, paths, %error, "Lookup failed"),
            }
        }

        let runs = lookups.len().max(1);

        println!(
            "{:>5} | {:>6.1}% | {:>13} | {:?}",
            paths,
            successes as f64 * 100.0 / runs as f64,
            contacted / runs,
            start.elapsed() / runs as u32,
        );
    }
}
