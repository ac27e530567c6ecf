//! Publishing query states and fetching the data for them.
//!
//! A view owns a [`Publisher`] for its query state. Every distinct published value gets the
//! next sequence number at publish time. A [`Fetcher`] task subscribes to the publisher,
//! issues one request per value it observes and reports an [`Outcome`] tagged with that
//! sequence number. Views apply an outcome only while its sequence number is still the
//! latest one, so a slow response for an old query never replaces a newer one.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::client::FetchError;

/// Issues the request for one query value.
pub type FetchFn<Q, R> = Arc<dyn Fn(Q) -> BoxFuture<'static, Result<R, FetchError>> + Send + Sync>;

#[derive(Debug, Clone, Default)]
pub struct Sequencer {
    latest: Arc<AtomicU64>,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, seq: u64) -> bool {
        self.latest() == seq
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<Q> {
    pub seq: u64,
    pub query: Q,
}

#[derive(Debug)]
pub struct Outcome<Q, R> {
    pub seq: u64,
    pub query: Q,
    pub result: Result<R, FetchError>,
}

pub struct Publisher<Q> {
    tx: watch::Sender<Versioned<Q>>,
    sequencer: Sequencer,
}

impl<Q: Clone + PartialEq> Publisher<Q> {
    pub fn new(initial: Q) -> Self {
        let sequencer = Sequencer::new();
        let seq = sequencer.advance();
        let (tx, _) = watch::channel(Versioned {
            seq,
            query: initial,
        });
        Self { tx, sequencer }
    }

    /// Publish `query` if it differs from the current value. Returns whether it was published.
    pub fn publish(&self, query: &Q) -> bool {
        if self.tx.borrow().query == *query {
            return false;
        }
        let seq = self.sequencer.advance();
        self.tx.send_replace(Versioned {
            seq,
            query: query.clone(),
        });
        true
    }

    /// Replace the current value without notifying subscribers or advancing the sequence.
    pub fn adopt(&self, query: &Q) {
        self.tx.send_if_modified(|current| {
            current.query = query.clone();
            false
        });
    }

    pub fn current(&self) -> Versioned<Q> {
        self.tx.borrow().clone()
    }

    pub fn is_current(&self, seq: u64) -> bool {
        self.sequencer.is_current(seq)
    }

    pub fn subscribe(&self) -> watch::Receiver<Versioned<Q>> {
        self.tx.subscribe()
    }
}

/// Background task turning published query values into requests.
pub struct Fetcher<Q, R> {
    outcomes: mpsc::UnboundedReceiver<Outcome<Q, R>>,
    task: JoinHandle<()>,
}

impl<Q, R> Fetcher<Q, R>
where
    Q: Clone + Send + Sync + std::fmt::Debug + 'static,
    R: Send + 'static,
{
    /// Start fetching for the current value of `updates` and for every value published later.
    pub fn spawn(
        name: &'static str,
        mut updates: watch::Receiver<Versioned<Q>>,
        fetch: FetchFn<Q, R>,
        debounce: Duration,
    ) -> Self {
        let (tx, outcomes) = mpsc::unbounded_channel();
        let task = tokio::spawn(async move {
            let mut next = Some(updates.borrow_and_update().clone());
            'fetch: loop {
                if let Some(Versioned { seq, query }) = next.take() {
                    trace!("{name}: request #{seq} for {query:?}");
                    let request = fetch(query.clone());
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        let result = request.await;
                        if tx.send(Outcome { seq, query, result }).is_err() {
                            debug!("{name}: view is gone, dropping response #{seq}");
                        }
                    });
                }

                if updates.changed().await.is_err() {
                    debug!("{name}: publisher dropped, stopping");
                    break;
                }
                // Every further change restarts the quiet period.
                while !debounce.is_zero() {
                    tokio::select! {
                        _ = tokio::time::sleep(debounce) => break,
                        changed = updates.changed() => {
                            if changed.is_err() {
                                debug!("{name}: publisher dropped, stopping");
                                break 'fetch;
                            }
                        }
                    }
                }
                next = Some(updates.borrow_and_update().clone());
            }
        });
        Self { outcomes, task }
    }

    /// Next outcome if one has arrived already.
    pub fn try_next(&mut self) -> Option<Outcome<Q, R>> {
        self.outcomes.try_recv().ok()
    }

    /// Wait for the next outcome.
    pub async fn next(&mut self) -> Option<Outcome<Q, R>> {
        self.outcomes.recv().await
    }
}

impl<Q, R> Drop for Fetcher<Q, R> {
    fn drop(&mut self) {
        self.task.abort();
    }
}
