//! Bounded concurrency worker pool draining a path's frontier.

use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, trace};

use super::{
    path::{Path, QueryFn},
    run::Run,
};
use crate::{PeerStore, Result};

/// Query peers of `path` nearest-first, with at most `concurrency` requests in
/// flight, until its frontier is exhausted or the path succeeds.
///
/// Responses arriving after the path succeeded are awaited but discarded. A
/// dispatch error stops the path immediately and is returned.
pub(crate) async fn drain<S, Q, T>(
    path: &Path<Q, T>,
    run: &Run<'_, S>,
    concurrency: usize,
) -> Result<()>
where
    S: PeerStore,
    Q: QueryFn<T>,
{
    let concurrency = concurrency.max(1);
    let target = path.target();

    let mut workers = FuturesUnordered::new();
    let mut visited = 0_usize;

    loop {
        // Refill after every completion, which is also right after any
        // expansion since admissions happen at the end of a worker.
        while !path.is_done() && workers.len() < concurrency {
            let Some(peer) = path.next_peer() else {
                break;
            };

            visited += 1;
            trace!(
                path = path.index(),
                ?peer,
                distance = peer.distance(&target),
                inflight = workers.len() + 1,
                "Dispatching query"
            );

            workers.push(path.execute(peer, run));
        }

        match workers.next().await {
            Some(Ok(true)) => {
                debug!(path = path.index(), visited, "Path succeeded");
            }
            Some(Ok(false)) => {}
            Some(Err(error)) => {
                path.stop();
                debug!(path = path.index(), visited, %error, "Path aborted");

                return Err(error);
            }
            None => break,
        }
    }

    debug!(
        path = path.index(),
        visited,
        succeeded = path.is_done(),
        "Path done"
    );

    Ok(())
}
