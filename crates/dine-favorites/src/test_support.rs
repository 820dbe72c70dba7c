//! Backends shared by the unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use dine_store::{KeyValueStore, MemoryStore, StoreError};
use tokio::sync::Notify;

pub(crate) const KEY: &str = dine_core::config::DEFAULT_FAVORITES_KEY;

/// Wraps a [`MemoryStore`], counting reads and optionally failing or
/// holding reads until [`TestStore::open`].
#[derive(Debug, Default)]
pub(crate) struct TestStore {
    pub(crate) memory: MemoryStore,
    pub(crate) reads: AtomicUsize,
    pub(crate) fail_reads: AtomicBool,
    pub(crate) fail_writes: AtomicBool,
    gated: AtomicBool,
    opened: Notify,
}

impl TestStore {
    pub(crate) fn with_favorites(raw: &str) -> Self {
        Self {
            memory: MemoryStore::with_entries([(KEY, raw)]),
            ..Self::default()
        }
    }

    /// A store whose reads wait until [`TestStore::open`] is called.
    pub(crate) fn gated() -> Self {
        Self {
            gated: AtomicBool::new(true),
            ..Self::default()
        }
    }

    pub(crate) fn open(&self) {
        self.gated.store(false, Ordering::SeqCst);
        self.opened.notify_waiters();
    }

    pub(crate) fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    async fn wait_open(&self) {
        loop {
            let opened = self.opened.notified();
            if !self.gated.load(Ordering::SeqCst) {
                return;
            }
            opened.await;
        }
    }
}

impl KeyValueStore for TestStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.wait_open().await;
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("read refused".to_owned()));
        }
        self.memory.get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("write refused".to_owned()));
        }
        self.memory.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.memory.remove(key).await
    }
}
