//! The favorites cache.
//!
//! [`FavoritesStore`] keeps one in-memory copy of the persisted favorites
//! list. The backend is read once, lazily, and again only on
//! [`FavoritesStore::reload`]; every [`FavoritesStore::toggle`] rewrites the
//! whole persisted value and notifies listeners.
//!
//! # State machine
//!
//! ```text
//! Uninitialized ──ensure_loaded──► Loading ──ok──► Loaded
//!       ▲                             │              │
//!       └──────────── read error ─────┘              │
//!       └──────────────────── reload ────────────────┘
//! ```
//!
//! Concurrent callers that find the cache `Loading` await the same shared
//! load future, so the backend sees exactly one read per load.
//!
//! # Locking
//!
//! The state sits behind a `parking_lot` mutex that is never held across an
//! await. Mutations additionally take an async write lock, so toggles and
//! reloads apply, persist, and notify in call order.

use std::fmt;
use std::sync::{Arc, Weak};

use dine_core::{FavoritesConfig, Restaurant, WriteOrder};
use dine_store::{KeyValueStore, StoreError};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use rustc_hash::FxHashSet;

use crate::error::FavoritesError;
use crate::registry::{ListenerRegistry, Subscription};

/// Shared, read-only favorites list.
pub type FavoritesList = Arc<[Restaurant]>;

type LoadResult = Result<FavoritesList, Arc<StoreError>>;
type LoadFuture = Shared<BoxFuture<'static, LoadResult>>;

enum CacheState {
    Uninitialized,
    Loading(LoadFuture),
    Loaded(FavoritesList),
}

struct Inner<S> {
    backend: Arc<S>,
    config: FavoritesConfig,
    state: Mutex<CacheState>,
    write_lock: tokio::sync::Mutex<()>,
    listeners: ListenerRegistry,
}

/// The favorites cache service.
///
/// Cloning is cheap and yields another handle to the same cache.
///
/// # Examples
///
/// ```
/// use dine_core::Restaurant;
/// use dine_favorites::FavoritesStore;
/// use dine_store::MemoryStore;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), dine_favorites::FavoritesError> {
/// let store = FavoritesStore::new(MemoryStore::new());
///
/// assert!(store.toggle(Restaurant::new("r1", "Casa Lola")).await?);
/// assert!(store.is_favorite("r1").await?);
///
/// assert!(!store.toggle(Restaurant::new("r1", "Casa Lola")).await?);
/// assert!(store.get_favorites().await?.is_empty());
/// # Ok(())
/// # }
/// ```
pub struct FavoritesStore<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for FavoritesStore<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: KeyValueStore + 'static> FavoritesStore<S> {
    /// Creates an unloaded cache over `backend` with the default
    /// configuration.
    pub fn new(backend: S) -> Self {
        Self::with_config(backend, FavoritesConfig::default())
    }

    /// Creates an unloaded cache over `backend`.
    pub fn with_config(backend: S, config: FavoritesConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                backend: Arc::new(backend),
                config,
                state: Mutex::new(CacheState::Uninitialized),
                write_lock: tokio::sync::Mutex::new(()),
                listeners: ListenerRegistry::new(),
            }),
        }
    }

    /// Returns the backend.
    pub fn backend(&self) -> &S {
        &self.inner.backend
    }

    /// Returns the configuration.
    pub fn config(&self) -> &FavoritesConfig {
        &self.inner.config
    }

    /// Loads the list from the backend unless it is already loaded.
    ///
    /// Joins an in-flight load instead of starting a second one.
    ///
    /// # Errors
    ///
    /// Returns [`FavoritesError::Load`] if the backend read fails. The cache
    /// stays unloaded and the next call retries.
    pub async fn ensure_loaded(&self) -> Result<(), FavoritesError> {
        self.loaded_list().await.map(|_| ())
    }

    /// Returns the favorites list, loading it first if needed.
    pub async fn get_favorites(&self) -> Result<FavoritesList, FavoritesError> {
        self.loaded_list().await
    }

    /// Returns `true` if a restaurant with `id` is a favorite, loading the
    /// list first if needed.
    pub async fn is_favorite(&self, id: &str) -> Result<bool, FavoritesError> {
        let list = self.loaded_list().await?;
        Ok(list.iter().any(|r| r.id.as_str() == id))
    }

    /// Returns the list if it is loaded, without touching the backend.
    pub fn cached(&self) -> Option<FavoritesList> {
        match &*self.inner.state.lock() {
            CacheState::Loaded(list) => Some(Arc::clone(list)),
            CacheState::Uninitialized | CacheState::Loading(_) => None,
        }
    }

    /// Returns `true` once the list has been loaded.
    pub fn is_loaded(&self) -> bool {
        matches!(*self.inner.state.lock(), CacheState::Loaded(_))
    }

    /// Discards the cached list, reads the backend again, and notifies
    /// listeners.
    ///
    /// A load already in flight is joined rather than restarted.
    ///
    /// # Errors
    ///
    /// Returns [`FavoritesError::Load`] if the backend read fails. Listeners
    /// are not notified in that case.
    pub async fn reload(&self) -> Result<FavoritesList, FavoritesError> {
        let _write = self.inner.write_lock.lock().await;
        {
            let mut state = self.inner.state.lock();
            if matches!(*state, CacheState::Loaded(_)) {
                *state = CacheState::Uninitialized;
            }
        }
        tracing::debug!("Reloading favorites");

        let list = self.loaded_list().await?;
        self.inner.listeners.notify();
        Ok(list)
    }

    /// Adds `item` to the favorites, or removes the favorite with the same
    /// id if there is one.
    ///
    /// The new list replaces the cache, is written to the backend in full,
    /// and listeners are notified in the configured [`WriteOrder`].
    ///
    /// Returns `true` if `item` is a favorite afterwards.
    ///
    /// # Errors
    ///
    /// - [`FavoritesError::Load`] if the initial load fails. Nothing changes.
    /// - [`FavoritesError::Encode`] if the list cannot be encoded. Nothing
    ///   changes.
    /// - [`FavoritesError::Persist`] if the backend write fails. The cache
    ///   keeps the toggle, listeners are still notified, and the error
    ///   carries the membership the call would have returned.
    pub async fn toggle(&self, item: Restaurant) -> Result<bool, FavoritesError> {
        let _write = self.inner.write_lock.lock().await;
        let current = self.loaded_list().await?;

        let id = item.id.clone();
        let (next, added) = toggled(&current, item);
        let encoded = serde_json::to_string(&*next)?;
        *self.inner.state.lock() = CacheState::Loaded(next);
        tracing::debug!(%id, added, "Toggled favorite");

        let persisted = match self.inner.config.write_order {
            WriteOrder::AwaitWriteThenNotify => {
                let persisted = self.persist(encoded).await;
                self.inner.listeners.notify();
                persisted
            }
            WriteOrder::NotifyThenWrite => {
                self.inner.listeners.notify();
                self.persist(encoded).await
            }
        };
        persisted.map(|()| added).map_err(|source| {
            tracing::error!(error = %source, "Failed to persist favorites");
            FavoritesError::Persist { added, source }
        })
    }

    /// Registers a listener invoked after every toggle and reload.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.listeners.subscribe(listener)
    }

    /// Returns the number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }

    /// Returns a handle that does not keep the cache alive.
    pub fn downgrade(&self) -> WeakFavoritesStore<S> {
        WeakFavoritesStore {
            inner: Arc::downgrade(&self.inner),
        }
    }

    async fn loaded_list(&self) -> Result<FavoritesList, FavoritesError> {
        let load = {
            let mut state = self.inner.state.lock();
            match &*state {
                CacheState::Loaded(list) => return Ok(Arc::clone(list)),
                CacheState::Loading(load) => load.clone(),
                CacheState::Uninitialized => {
                    let load = Self::load(
                        Arc::clone(&self.inner.backend),
                        self.inner.config.storage_key.clone(),
                        Arc::downgrade(&self.inner),
                    )
                    .boxed()
                    .shared();
                    *state = CacheState::Loading(load.clone());
                    load
                }
            }
        };
        load.await.map_err(FavoritesError::Load)
    }

    /// Reads and decodes the backend value, then leaves `Loading`.
    ///
    /// The future lives in `Inner::state`, so it holds `Inner` only weakly.
    async fn load(backend: Arc<S>, key: String, inner: Weak<Inner<S>>) -> LoadResult {
        tracing::debug!(%key, "Loading favorites");
        let result = match backend.get(&key).await {
            Ok(raw) => {
                let list = decode_favorites(raw.as_deref());
                tracing::debug!(count = list.len(), "Favorites loaded");
                Ok(list)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read favorites");
                Err(Arc::new(e))
            }
        };

        if let Some(inner) = inner.upgrade() {
            *inner.state.lock() = match &result {
                Ok(list) => CacheState::Loaded(Arc::clone(list)),
                Err(_) => CacheState::Uninitialized,
            };
        }
        result
    }

    async fn persist(&self, encoded: String) -> Result<(), StoreError> {
        self.inner
            .backend
            .set(&self.inner.config.storage_key, encoded)
            .await
    }
}

impl<S> fmt::Debug for FavoritesStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.inner.state.lock() {
            CacheState::Uninitialized => "uninitialized",
            CacheState::Loading(_) => "loading",
            CacheState::Loaded(_) => "loaded",
        };
        f.debug_struct("FavoritesStore")
            .field("key", &self.inner.config.storage_key)
            .field("state", &state)
            .field("listeners", &self.inner.listeners)
            .finish_non_exhaustive()
    }
}

/// Non-owning handle to a [`FavoritesStore`].
pub struct WeakFavoritesStore<S> {
    inner: Weak<Inner<S>>,
}

impl<S> WeakFavoritesStore<S> {
    /// Returns the store if it is still alive.
    pub fn upgrade(&self) -> Option<FavoritesStore<S>> {
        self.inner.upgrade().map(|inner| FavoritesStore { inner })
    }
}

impl<S> Clone for WeakFavoritesStore<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<S> fmt::Debug for WeakFavoritesStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakFavoritesStore")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

/// Decodes a persisted favorites value.
///
/// A missing value, a value that is not a JSON array, or array entries that
/// are not restaurants never fail the load: the bad parts are logged and
/// dropped. Later duplicates of an id are dropped too.
pub fn decode_favorites(raw: Option<&str>) -> FavoritesList {
    let Some(raw) = raw else {
        return Arc::from(Vec::new());
    };

    let values: Vec<serde_json::Value> = match serde_json::from_str(raw) {
        Ok(values) => values,
        Err(e) => {
            tracing::warn!(error = %e, "Persisted favorites are malformed, starting empty");
            return Arc::from(Vec::new());
        }
    };

    let mut seen = FxHashSet::default();
    let mut list = Vec::with_capacity(values.len());
    for value in values {
        match serde_json::from_value::<Restaurant>(value) {
            Ok(restaurant) => {
                if seen.insert(restaurant.id.clone()) {
                    list.push(restaurant);
                } else {
                    tracing::warn!(id = %restaurant.id, "Dropping duplicate favorite");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Dropping malformed favorite"),
        }
    }
    Arc::from(list)
}

/// Returns `current` with `item` toggled, and whether it was added.
fn toggled(current: &[Restaurant], item: Restaurant) -> (FavoritesList, bool) {
    if current.iter().any(|r| r.id == item.id) {
        let next: Vec<Restaurant> = current
            .iter()
            .filter(|r| r.id != item.id)
            .cloned()
            .collect();
        (Arc::from(next), false)
    } else {
        let mut next = Vec::with_capacity(current.len() + 1);
        next.extend_from_slice(current);
        next.push(item);
        (Arc::from(next), true)
    }
}
