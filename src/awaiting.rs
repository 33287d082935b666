//! Futures waiting for a specific future item, e.g. "the next message from this user in this
//! channel".

use crate::error::AwaitError;
use parking_lot::Mutex;
use std::{
    collections::HashMap,
    hash::Hash,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};
use tokio::sync::oneshot;

pub type Filter<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

struct Waiter<T> {
    id: u64,
    filter: Filter<T>,
    tx: oneshot::Sender<T>,
}

/// At most one waiter per key.  Registering a second waiter for a key supersedes the first.
pub struct Awaiter<K, T> {
    waiters: Mutex<HashMap<K, Waiter<T>>>,
    next_id: AtomicU64,
}

impl<K, T> Awaiter<K, T>
where
    K: Eq + Hash + Clone,
    T: Clone,
{
    pub fn new() -> Self {
        Self {
            waiters: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Wait for the first item offered under `key` that passes `filter`.
    pub async fn wait(&self, key: K, filter: Filter<T>, timeout: Duration) -> Result<T, AwaitError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();

        // Dropping the previous waiter's sender wakes it with `Superseded`.
        self.waiters
            .lock()
            .insert(key.clone(), Waiter { id, filter, tx });

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(item)) => Ok(item),
            Ok(Err(_)) => Err(AwaitError::Superseded),
            Err(_) => {
                let mut waiters = self.waiters.lock();
                if waiters.get(&key).is_some_and(|waiter| waiter.id == id) {
                    waiters.remove(&key);
                }
                Err(AwaitError::Timeout)
            }
        }
    }

    /// Hand `item` to whoever waits under `key`.  Returns whether a waiter took it.
    pub fn offer(&self, key: &K, item: &T) -> bool {
        let mut waiters = self.waiters.lock();
        let Some(waiter) = waiters.get(key) else {
            return false;
        };
        if !(waiter.filter)(item) {
            return false;
        }

        let Some(waiter) = waiters.remove(key) else {
            return false;
        };
        // The receiver may have timed out in the meantime.
        waiter.tx.send(item.clone()).is_ok()
    }

    pub fn is_waiting(&self, key: &K) -> bool {
        self.waiters.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.waiters.lock().len()
    }
}

impl<K, T> Default for Awaiter<K, T>
where
    K: Eq + Hash + Clone,
    T: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    type Key = (u64, u64);

    fn accept_all() -> Filter<String> {
        Box::new(|_| true)
    }

    #[tokio::test]
    async fn resolves_with_item_for_the_right_key() {
        let awaiter: Arc<Awaiter<Key, String>> = Arc::new(Awaiter::new());
        let waiting = {
            let awaiter = awaiter.clone();
            tokio::spawn(async move {
                awaiter
                    .wait((1, 2), accept_all(), Duration::from_secs(5))
                    .await
            })
        };

        while !awaiter.is_waiting(&(1, 2)) {
            tokio::task::yield_now().await;
        }
        assert!(!awaiter.offer(&(1, 3), &"wrong user".to_owned()));
        assert!(awaiter.offer(&(1, 2), &"hello".to_owned()));

        assert_eq!(waiting.await.unwrap(), Ok("hello".to_owned()));
        assert_eq!(awaiter.len(), 0);
    }

    #[tokio::test]
    async fn filter_rejections_keep_waiting() {
        let awaiter: Arc<Awaiter<Key, String>> = Arc::new(Awaiter::new());
        let waiting = {
            let awaiter = awaiter.clone();
            tokio::spawn(async move {
                awaiter
                    .wait(
                        (1, 2),
                        Box::new(|msg: &String| msg == "Foobar"),
                        Duration::from_secs(5),
                    )
                    .await
            })
        };

        while !awaiter.is_waiting(&(1, 2)) {
            tokio::task::yield_now().await;
        }
        assert!(!awaiter.offer(&(1, 2), &"foobar".to_owned()));
        assert!(awaiter.is_waiting(&(1, 2)));
        assert!(awaiter.offer(&(1, 2), &"Foobar".to_owned()));

        assert_eq!(waiting.await.unwrap(), Ok("Foobar".to_owned()));
    }

    #[tokio::test]
    async fn times_out_and_cleans_up() {
        let awaiter: Awaiter<Key, String> = Awaiter::new();

        let result = awaiter.wait((1, 2), accept_all(), Duration::ZERO).await;

        assert_eq!(result, Err(AwaitError::Timeout));
        assert!(!awaiter.is_waiting(&(1, 2)));
        assert!(!awaiter.offer(&(1, 2), &"late".to_owned()));
    }

    #[tokio::test]
    async fn newer_waiter_supersedes_older() {
        let awaiter: Arc<Awaiter<Key, String>> = Arc::new(Awaiter::new());
        let first = {
            let awaiter = awaiter.clone();
            tokio::spawn(async move {
                awaiter
                    .wait((1, 2), accept_all(), Duration::from_secs(5))
                    .await
            })
        };
        while !awaiter.is_waiting(&(1, 2)) {
            tokio::task::yield_now().await;
        }

        let second = {
            let awaiter = awaiter.clone();
            tokio::spawn(async move {
                awaiter
                    .wait((1, 2), accept_all(), Duration::from_secs(5))
                    .await
            })
        };

        assert_eq!(first.await.unwrap(), Err(AwaitError::Superseded));
        assert!(awaiter.offer(&(1, 2), &"hi".to_owned()));
        assert_eq!(second.await.unwrap(), Ok("hi".to_owned()));
    }
}
