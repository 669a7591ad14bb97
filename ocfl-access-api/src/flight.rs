//! Keyed single-flight coalescing
//!
//! Concurrent callers for the same key share one execution: the first
//! arrival becomes the leader and runs the work, everyone else waits on a
//! watch channel and receives the leader's result verbatim. Without this,
//! a cold cache under load triggers one inventory read per caller against a
//! slow backend.
//!
//! The in-flight entry is held only for the duration of the leader's work;
//! results are never cached here.

use crate::error::AccessError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

/// Error form shared with waiters. NotFound must survive coalescing (a
/// follower of a "no such object" sync gets NotFound, not an internal
/// error); other failures are relayed as opaque messages.
#[derive(Debug, Clone)]
pub(crate) enum FlightError {
    NotFound(String),
    Failed(Arc<str>),
}

impl From<FlightError> for AccessError {
    fn from(err: FlightError) -> Self {
        match err {
            FlightError::NotFound(msg) => AccessError::NotFound(msg),
            FlightError::Failed(msg) => AccessError::Sync(msg.to_string()),
        }
    }
}

type FlightOutcome<T> = std::result::Result<T, FlightError>;
type FlightSender<T> = Arc<watch::Sender<Option<FlightOutcome<T>>>>;

/// A group of keyed in-flight computations
pub(crate) struct FlightGroup<T> {
    inflight: DashMap<String, FlightSender<T>>,
}

impl<T: Clone + Send + Sync + 'static> FlightGroup<T> {
    pub(crate) fn new() -> Self {
        Self {
            inflight: DashMap::new(),
        }
    }

    /// Run `work` under the given key, coalescing with any in-flight run.
    ///
    /// Exactly one caller per key executes the work; the rest wait for its
    /// published outcome. If a leader is dropped before publishing, a
    /// waiter takes over and re-runs.
    pub(crate) async fn run<M, Fut>(
        &self,
        key: &str,
        mut work: M,
    ) -> std::result::Result<T, AccessError>
    where
        M: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, AccessError>>,
    {
        loop {
            let leader_tx = match self.inflight.entry(key.to_string()) {
                Entry::Occupied(entry) => {
                    let mut rx = entry.get().subscribe();
                    drop(entry);
                    let outcome = match rx.wait_for(|outcome| outcome.is_some()).await {
                        Ok(outcome) => match outcome.clone() {
                            Some(result) => Some(result),
                            None => None,
                        },
                        // leader dropped before publishing; take over
                        Err(_) => None,
                    };
                    match outcome {
                        Some(result) => return result.map_err(AccessError::from),
                        None => continue,
                    }
                }
                Entry::Vacant(entry) => {
                    let (tx, _rx) = watch::channel(None);
                    let tx = Arc::new(tx);
                    entry.insert(Arc::clone(&tx));
                    tx
                }
            };
            let guard = FlightGuard {
                key,
                group: self,
                tx: leader_tx,
                finished: false,
            };
            let result = work().await;
            let outcome = match &result {
                Ok(value) => Ok(value.clone()),
                Err(AccessError::NotFound(msg)) => Err(FlightError::NotFound(msg.clone())),
                Err(other) => Err(FlightError::Failed(Arc::from(other.to_string()))),
            };
            guard.finish(outcome);
            return result;
        }
    }
}

/// Removes the in-flight entry when the leader is dropped mid-work, so
/// waiters observe channel closure and retry instead of hanging.
struct FlightGuard<'a, T> {
    key: &'a str,
    group: &'a FlightGroup<T>,
    tx: FlightSender<T>,
    finished: bool,
}

impl<T> FlightGuard<'_, T> {
    fn finish(mut self, outcome: FlightOutcome<T>) {
        // publish before removing so late subscribers still see the result
        let _ = self.tx.send(Some(outcome));
        self.group.inflight.remove(self.key);
        self.finished = true;
    }
}

impl<T> Drop for FlightGuard<'_, T> {
    fn drop(&mut self) {
        if !self.finished {
            self.group.inflight.remove(self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_callers_share_one_run() {
        let group = Arc::new(FlightGroup::<u64>::new());
        let runs = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..32 {
            let group = Arc::clone(&group);
            let runs = Arc::clone(&runs);
            handles.push(tokio::spawn(async move {
                group
                    .run("obj:a", || {
                        let runs = Arc::clone(&runs);
                        async move {
                            runs.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(std::time::Duration::from_millis(150)).await;
                            Ok(7u64)
                        }
                    })
                    .await
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), 7);
        }
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_not_found_shared_with_waiters() {
        let group = Arc::new(FlightGroup::<u64>::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let group = Arc::clone(&group);
            handles.push(tokio::spawn(async move {
                group
                    .run("obj:missing", || async {
                        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
                        Err(AccessError::not_found("object \"missing\""))
                    })
                    .await
            }));
        }
        for handle in handles {
            let err = handle.await.unwrap().unwrap_err();
            assert!(err.is_not_found(), "expected NotFound, got {err}");
        }
    }

    #[tokio::test]
    async fn test_keys_run_independently() {
        let group = FlightGroup::<u64>::new();
        let a = group.run("obj:a", || async { Ok(1u64) }).await.unwrap();
        let b = group.run("obj:b", || async { Ok(2u64) }).await.unwrap();
        assert_eq!((a, b), (1, 2));
    }
}
