//! Local favorites cache for the dine restaurant client.
//!
//! The favorites list lives in a persisted key-value store as one JSON array.
//! This crate keeps a single in-memory copy of it and keeps every consumer in
//! sync without a central state manager:
//!
//! - [`FavoritesStore`] - the cache: lazy load with coalescing, toggle,
//!   reload
//! - [`ListenerRegistry`] - zero-argument change listeners
//! - [`FavoritesView`] - a subscribed, watch-channel view for consumers
//!
//! # Example
//!
//! ```
//! use dine_core::Restaurant;
//! use dine_favorites::{FavoritesStore, FavoritesView};
//! use dine_store::MemoryStore;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), dine_favorites::FavoritesError> {
//! let store = FavoritesStore::new(MemoryStore::new());
//! let list_screen = FavoritesView::mount(&store).await?;
//! let detail_screen = FavoritesView::mount(&store).await?;
//!
//! detail_screen
//!     .toggle_favorite(Restaurant::new("r1", "Casa Lola"))
//!     .await?;
//!
//! assert!(list_screen.is_favorite("r1"));
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod cache;
pub mod error;
pub mod registry;
pub mod view;

#[cfg(test)]
mod test_support;

pub use cache::{FavoritesList, FavoritesStore, WeakFavoritesStore, decode_favorites};
pub use error::FavoritesError;
pub use registry::{ListenerRegistry, Subscription};
pub use view::{FavoritesSnapshot, FavoritesView};
