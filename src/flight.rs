//! Duplicate call suppression
//!
//! A [`FlightGroup`] runs at most one producer per key at a time. Callers that
//! arrive while a producer for their key is running wait for it and receive a
//! clone of its outcome. Completed calls are forgotten immediately, so only
//! concurrent duplicates are suppressed.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::debug;

use crate::error::{CacheError, Result};

type Calls<T> = Arc<Mutex<HashMap<String, watch::Receiver<Option<T>>>>>;

// == Flight Group ==
pub struct FlightGroup<T> {
    calls: Calls<T>,
}

impl<T> FlightGroup<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Runs `producer` unless a call for `key` is already in flight, in which
    /// case the caller waits for that call's outcome instead.
    ///
    /// The producer runs on its own task: dropping the returned future does
    /// not cancel it, and other waiters still receive its result.
    pub async fn execute<F>(&self, key: &str, producer: F) -> Result<T>
    where
        F: Future<Output = T> + Send + 'static,
    {
        let mut rx = {
            let mut calls = self.calls.lock();
            match calls.get(key) {
                Some(rx) => {
                    debug!(key, "joining in-flight call");
                    rx.clone()
                }
                None => {
                    let (tx, rx) = watch::channel(None);
                    calls.insert(key.to_string(), rx.clone());
                    let guard = CallGuard {
                        calls: self.calls.clone(),
                        key: key.to_string(),
                    };
                    tokio::spawn(async move {
                        let _guard = guard;
                        let value = producer.await;
                        tx.send_replace(Some(value));
                    });
                    rx
                }
            }
        };

        let outcome = rx.wait_for(Option::is_some).await.map(|v| v.clone());
        match outcome {
            Ok(Some(value)) => Ok(value),
            _ => Err(CacheError::Internal(format!(
                "in-flight call for key {key} aborted"
            ))),
        }
    }

    /// Number of calls currently in flight.
    pub fn in_flight(&self) -> usize {
        self.calls.lock().len()
    }
}

impl<T> Default for FlightGroup<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Forgets the call once its producer has finished or panicked.
struct CallGuard<T> {
    calls: Calls<T>,
    key: String,
}

impl<T> Drop for CallGuard<T> {
    fn drop(&mut self) {
        self.calls.lock().remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::task::JoinSet;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_share_one_execution() {
        let group = Arc::new(FlightGroup::<String>::new());
        let runs = Arc::new(AtomicUsize::new(0));
        let mut set = JoinSet::new();

        for _ in 0..16 {
            let group = group.clone();
            let runs = runs.clone();
            set.spawn(async move {
                group
                    .execute("key", async move {
                        runs.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        "bar".to_string()
                    })
                    .await
            });
        }

        while let Some(result) = set.join_next().await {
            assert_eq!(result.unwrap().unwrap(), "bar");
        }
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        // The record is dropped right after the result is published.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(group.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_errors_are_shared_but_not_remembered() {
        let group = FlightGroup::<std::result::Result<u32, String>>::new();

        let first = group.execute("k", async { Err("boom".to_string()) }).await;
        assert_eq!(first.unwrap(), Err("boom".to_string()));

        let second = group.execute("k", async { Ok(7) }).await;
        assert_eq!(second.unwrap(), Ok(7));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_distinct_keys_do_not_block_each_other() {
        let group = Arc::new(FlightGroup::<&'static str>::new());

        let slow = {
            let group = group.clone();
            tokio::spawn(async move {
                group
                    .execute("slow", async {
                        tokio::time::sleep(Duration::from_millis(500)).await;
                        "slow"
                    })
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        let fast = tokio::time::timeout(
            Duration::from_millis(200),
            group.execute("fast", async { "fast" }),
        )
        .await;
        assert_eq!(fast.unwrap().unwrap(), "fast");
        assert_eq!(slow.await.unwrap().unwrap(), "slow");
    }

    #[tokio::test]
    async fn test_abandoned_leader_does_not_cancel_producer() {
        let group = Arc::new(FlightGroup::<u32>::new());
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();

        let leader = {
            let group = group.clone();
            tokio::spawn(async move {
                group
                    .execute("k", async move {
                        let _ = release_rx.await;
                        42
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        leader.abort();

        let follower = {
            let group = group.clone();
            tokio::spawn(async move { group.execute("k", async { 0 }).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        release_tx.send(()).unwrap();

        assert_eq!(follower.await.unwrap().unwrap(), 42);
    }

    #[tokio::test]
    async fn test_panicking_producer_releases_key() {
        let group = FlightGroup::<u32>::new();

        let result = group
            .execute("k", async { None::<u32>.expect("producer failed") })
            .await;
        assert!(matches!(result, Err(CacheError::Internal(_))));
        assert_eq!(group.in_flight(), 0);

        assert_eq!(group.execute("k", async { 1 }).await.unwrap(), 1);
    }
}
