//! Scripted in-memory network shared by the integration tests.

#![allow(dead_code)]

use std::{
    collections::HashMap,
    future::Future,
    net::SocketAddr,
    pin::Pin,
    sync::{Arc, Mutex},
    task::{Context, Poll},
};

use dashmap::DashMap;
use dht_query::{Id, Node, Query, QueryError, Response, ID_SIZE};

/// Id whose first byte is `first`, so its distance to [target] grows with it.
pub fn id(first: u8) -> Id {
    let mut bytes = [0; ID_SIZE];
    bytes[0] = first;
    Id::from(bytes)
}

pub fn target() -> Id {
    Id::from([0; ID_SIZE])
}

pub fn local() -> Id {
    Id::from([0xff; ID_SIZE])
}

pub fn node(id: Id) -> Node {
    Node::new(id, SocketAddr::from(([127, 0, 0, 1], 6881)))
}

pub fn query(paths: usize, concurrency: usize) -> Query {
    Query::builder()
        .id(local())
        .disjoint_paths(paths)
        .concurrency(concurrency)
        .build()
}

#[derive(Debug, Clone)]
pub enum Reply {
    Empty,
    Fail,
    Success(&'static str),
    Closer(Vec<Id>),
}

/// Returns `Pending` `n` times before completing, keeping a request in flight
/// across executor polls.
pub struct Yield(pub usize);

impl Future for Yield {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 == 0 {
            return Poll::Ready(());
        }

        self.0 -= 1;
        cx.waker().wake_by_ref();

        Poll::Pending
    }
}

#[derive(Default)]
struct Inner {
    replies: HashMap<Id, (Reply, usize)>,
    calls: DashMap<Id, usize>,
    log: Mutex<Vec<(usize, Id)>>,
    inflight: DashMap<usize, usize>,
    max_inflight: DashMap<usize, usize>,
}

/// Peers answer with their scripted [Reply], or [Reply::Empty] if none.
#[derive(Clone, Default)]
pub struct Network {
    inner: Arc<Inner>,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script `peer` to answer `reply` immediately.
    pub fn reply(self, peer: Id, reply: Reply) -> Self {
        self.reply_after(peer, reply, 0)
    }

    /// Script `peer` to answer `reply` after `yields` executor polls.
    pub fn reply_after(mut self, peer: Id, reply: Reply, yields: usize) -> Self {
        Arc::get_mut(&mut self.inner)
            .expect("script the network before running queries")
            .replies
            .insert(peer, (reply, yields));
        self
    }

    pub fn query(
        &self,
        path: usize,
        peer: Id,
    ) -> impl Future<Output = Result<Response<&'static str>, QueryError>> {
        let inner = self.inner.clone();

        async move {
            *inner.calls.entry(peer).or_insert(0) += 1;
            inner.log.lock().unwrap().push((path, peer));

            let (reply, yields) = inner
                .replies
                .get(&peer)
                .cloned()
                .unwrap_or((Reply::Empty, 0));

            let current = {
                let mut inflight = inner.inflight.entry(path).or_insert(0);
                *inflight += 1;
                *inflight
            };
            {
                let mut max = inner.max_inflight.entry(path).or_insert(0);
                *max = (*max).max(current);
            }

            Yield(yields).await;

            *inner.inflight.entry(path).or_insert(1) -= 1;

            match reply {
                Reply::Empty => Ok(Response::Empty),
                Reply::Fail => Err(QueryError::Timeout(peer)),
                Reply::Success(value) => Ok(Response::Success(value)),
                Reply::Closer(ids) => Ok(Response::CloserPeers(ids.into_iter().map(node).collect())),
            }
        }
    }

    // === Inspection ===

    /// Number of times `peer` was queried.
    pub fn calls(&self, peer: &Id) -> usize {
        self.inner.calls.get(peer).map(|c| *c).unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.inner.calls.iter().map(|c| *c.value()).sum()
    }

    /// `(path, peer)` for every query, in the order they were issued.
    pub fn log(&self) -> Vec<(usize, Id)> {
        self.inner.log.lock().unwrap().clone()
    }

    /// Highest number of simultaneous requests observed on `path`.
    pub fn max_inflight(&self, path: usize) -> usize {
        self.inner.max_inflight.get(&path).map(|m| *m).unwrap_or(0)
    }
}
