//! Per-record mutation locks.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Serializes mutating intents that target the same record id.
///
/// Entries nobody holds or waits on are dropped on the next acquire.
#[derive(Debug, Default)]
pub(crate) struct IdLocks {
    inner: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl IdLocks {
    pub(crate) async fn acquire(&self, id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.retain(|_, lock| Arc::strong_count(lock) > 1);
            map.entry(id.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    async fn tracked(&self) -> usize {
        self.inner.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_id_waits() {
        let locks = Arc::new(IdLocks::default());
        let held = locks.acquire("CVE-1").await;

        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.acquire("CVE-1").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(held);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_different_ids_do_not_block() {
        let locks = IdLocks::default();
        let _a = locks.acquire("CVE-1").await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.acquire("CVE-2")).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_released_entries_are_pruned() {
        let locks = IdLocks::default();
        drop(locks.acquire("CVE-1").await);
        drop(locks.acquire("CVE-2").await);
        let _c = locks.acquire("CVE-3").await;
        assert_eq!(locks.tracked().await, 1);
    }
}
