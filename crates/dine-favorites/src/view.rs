//! Consumer-facing reactive view of the favorites.
//!
//! A [`FavoritesView`] subscribes to a [`FavoritesStore`] and republishes
//! the list over a [`tokio::sync::watch`] channel whenever the store
//! notifies. Screens hold a view (or a receiver from [`FavoritesView::watch`])
//! and re-render on change; they never mutate the list directly.

use std::sync::Arc;

use dine_core::{Restaurant, RestaurantId};
use dine_store::KeyValueStore;
use rustc_hash::FxHashSet;
use tokio::sync::watch;

use crate::cache::{FavoritesList, FavoritesStore};
use crate::error::FavoritesError;
use crate::registry::Subscription;

/// One published state of the favorites.
#[derive(Debug, Clone, Default)]
pub struct FavoritesSnapshot {
    /// The favorites list.
    pub favorites: FavoritesList,
    /// `false` until the initial load has resolved.
    pub is_loaded: bool,
    ids: FxHashSet<RestaurantId>,
}

impl FavoritesSnapshot {
    fn loaded(favorites: FavoritesList) -> Self {
        let ids = favorites.iter().map(|r| r.id.clone()).collect();
        Self {
            favorites,
            is_loaded: true,
            ids,
        }
    }

    /// Returns `true` if a restaurant with `id` is in this snapshot.
    #[must_use]
    pub fn is_favorite(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Returns the ids in this snapshot.
    #[must_use]
    pub fn ids(&self) -> &FxHashSet<RestaurantId> {
        &self.ids
    }
}

/// A live view of a [`FavoritesStore`].
///
/// Dropping the view unsubscribes it from the store.
///
/// # Examples
///
/// ```
/// use dine_core::Restaurant;
/// use dine_favorites::{FavoritesStore, FavoritesView};
/// use dine_store::MemoryStore;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), dine_favorites::FavoritesError> {
/// let store = FavoritesStore::new(MemoryStore::new());
/// let view = FavoritesView::mount(&store).await?;
/// assert!(view.is_loaded());
///
/// store.toggle(Restaurant::new("r1", "Casa Lola")).await?;
/// assert!(view.is_favorite("r1"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct FavoritesView<S> {
    store: FavoritesStore<S>,
    receiver: watch::Receiver<FavoritesSnapshot>,
    _sender: Arc<watch::Sender<FavoritesSnapshot>>,
    _subscription: Subscription,
}

impl<S: KeyValueStore + 'static> FavoritesView<S> {
    /// Subscribes to `store` and publishes its initial list.
    ///
    /// # Errors
    ///
    /// Returns [`FavoritesError::Load`] if the initial load fails. The
    /// subscription is dropped in that case.
    pub async fn mount(store: &FavoritesStore<S>) -> Result<Self, FavoritesError> {
        let (sender, mut receiver) = watch::channel(FavoritesSnapshot::default());
        let sender = Arc::new(sender);

        let weak = store.downgrade();
        let publisher = Arc::clone(&sender);
        let subscription = store.subscribe(move || {
            if let Some(store) = weak.upgrade() {
                publish_cached(&publisher, &store, None);
            }
        });

        // A toggle that joined the same load may already have published a
        // newer list than this one.
        let list = store.get_favorites().await?;
        publish_cached(&sender, store, Some(list));
        receiver.borrow_and_update();
        tracing::debug!(listeners = store.listener_count(), "Favorites view mounted");

        Ok(Self {
            store: store.clone(),
            receiver,
            _sender: sender,
            _subscription: subscription,
        })
    }

    /// Returns the current list.
    pub fn favorites(&self) -> FavoritesList {
        Arc::clone(&self.receiver.borrow().favorites)
    }

    /// Returns `true` once the initial load has resolved.
    pub fn is_loaded(&self) -> bool {
        self.receiver.borrow().is_loaded
    }

    /// Returns `true` if a restaurant with `id` is a favorite.
    pub fn is_favorite(&self, id: &str) -> bool {
        self.receiver.borrow().is_favorite(id)
    }

    /// Returns the current snapshot.
    pub fn snapshot(&self) -> FavoritesSnapshot {
        self.receiver.borrow().clone()
    }

    /// Toggles `item` in the underlying store.
    ///
    /// The view updates through the store's notification.
    pub async fn toggle_favorite(&self, item: Restaurant) -> Result<bool, FavoritesError> {
        self.store.toggle(item).await
    }

    /// Reloads the underlying store.
    pub async fn reload(&self) -> Result<(), FavoritesError> {
        self.store.reload().await.map(|_| ())
    }

    /// Waits until a snapshot newer than the last one seen is published.
    pub async fn changed(&mut self) {
        // The sender lives in `self`, so the channel cannot close.
        let _ = self.receiver.changed().await;
    }

    /// Returns a receiver that follows this view's snapshots.
    pub fn watch(&self) -> watch::Receiver<FavoritesSnapshot> {
        self.receiver.clone()
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &FavoritesStore<S> {
        &self.store
    }
}

/// Publishes the store's current list, or `fallback` if nothing newer has
/// been published yet.
///
/// The cache is read while the channel is locked, so concurrent publishers
/// cannot replace a newer list with an older one.
fn publish_cached<S: KeyValueStore + 'static>(
    sender: &watch::Sender<FavoritesSnapshot>,
    store: &FavoritesStore<S>,
    fallback: Option<FavoritesList>,
) {
    sender.send_if_modified(|snapshot| {
        match store.cached() {
            Some(list) => *snapshot = FavoritesSnapshot::loaded(list),
            None => match fallback {
                Some(list) if !snapshot.is_loaded => *snapshot = FavoritesSnapshot::loaded(list),
                _ => return false,
            },
        }
        true
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestStore;
    use dine_store::MemoryStore;

    #[tokio::test]
    async fn test_mount_publishes_initial_list() {
        let store = FavoritesStore::new(MemoryStore::with_entries([(
            "@restaurant_favorites",
            r#"[{"_id": "r1", "name": "A"}]"#,
        )]));

        let view = FavoritesView::mount(&store).await.unwrap();

        assert!(view.is_loaded());
        assert!(view.is_favorite("r1"));
        assert!(!view.is_favorite("r2"));
        assert_eq!(view.favorites().len(), 1);
        assert_eq!(store.listener_count(), 1);
    }

    #[tokio::test]
    async fn test_view_follows_toggles_from_other_handles() {
        let store = FavoritesStore::new(MemoryStore::new());
        let mut view = FavoritesView::mount(&store).await.unwrap();
        let other = store.clone();

        other.toggle(Restaurant::new("r1", "A")).await.unwrap();
        view.changed().await;

        assert!(view.is_favorite("r1"));
        assert_eq!(view.snapshot().ids().len(), 1);
    }

    #[tokio::test]
    async fn test_toggle_favorite_through_view() {
        let store = FavoritesStore::new(MemoryStore::new());
        let view = FavoritesView::mount(&store).await.unwrap();
        let mut receiver = view.watch();

        assert!(view.toggle_favorite(Restaurant::new("r1", "A")).await.unwrap());
        receiver.changed().await.unwrap();
        assert!(receiver.borrow().is_favorite("r1"));

        assert!(!view.toggle_favorite(Restaurant::new("r1", "A")).await.unwrap());
        assert!(view.favorites().is_empty());
    }

    #[tokio::test]
    async fn test_two_views_stay_in_sync() {
        let store = FavoritesStore::new(MemoryStore::new());
        let first = FavoritesView::mount(&store).await.unwrap();
        let second = FavoritesView::mount(&store).await.unwrap();

        first
            .toggle_favorite(Restaurant::new("r1", "A"))
            .await
            .unwrap();

        assert!(first.is_favorite("r1"));
        assert!(second.is_favorite("r1"));
    }

    #[tokio::test]
    async fn test_reload_through_view() {
        let store = FavoritesStore::new(MemoryStore::new());
        let view = FavoritesView::mount(&store).await.unwrap();

        store
            .backend()
            .insert("@restaurant_favorites", r#"[{"_id": "r9"}]"#);
        assert!(!view.is_favorite("r9"));

        view.reload().await.unwrap();
        assert!(view.is_favorite("r9"));
    }

    #[tokio::test]
    async fn test_mount_during_toggle_shows_toggled_list() {
        let backend = Arc::new(TestStore::gated());
        let store = FavoritesStore::new(Arc::clone(&backend));

        let toggling = store.clone();
        let toggle =
            tokio::spawn(async move { toggling.toggle(Restaurant::new("r1", "A")).await });
        tokio::task::yield_now().await;

        let mounting = store.clone();
        let mount = tokio::spawn(async move { FavoritesView::mount(&mounting).await });
        tokio::task::yield_now().await;

        backend.open();
        assert!(toggle.await.unwrap().unwrap());
        let view = mount.await.unwrap().unwrap();

        assert_eq!(backend.reads(), 1);
        assert!(store.is_favorite("r1").await.unwrap());
        assert!(view.is_favorite("r1"));
    }

    #[tokio::test]
    async fn test_drop_unsubscribes() {
        let store = FavoritesStore::new(MemoryStore::new());
        let view = FavoritesView::mount(&store).await.unwrap();
        assert_eq!(store.listener_count(), 1);

        drop(view);
        assert_eq!(store.listener_count(), 0);
    }

    #[test]
    fn test_default_snapshot_is_unloaded() {
        let snapshot = FavoritesSnapshot::default();
        assert!(!snapshot.is_loaded);
        assert!(snapshot.favorites.is_empty());
        assert!(!snapshot.is_favorite("r1"));
    }
}
