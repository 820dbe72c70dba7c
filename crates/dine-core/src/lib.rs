//! Core types, configuration, and errors for the dine restaurant client.
//!
//! This crate provides the foundational types used across the workspace:
//!
//! - [`Restaurant`] and [`Review`], normalized once from the loosely shaped
//!   remote API representation
//! - [`AuthUser`], the signed-in user kept by the session store
//! - [`Config`] and its sections, loadable from a JSON file
//! - [`ConfigError`] for configuration failures
//!
//! # Crate Dependencies
//!
//! ```text
//! dine-cli ──► dine-favorites ──► dine-store ──► dine-core
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, FavoritesConfig, StorageConfig, WriteOrder};
pub use error::ConfigError;
pub use types::{
    ANONYMOUS_AUTHOR, AuthUser, LatLng, Restaurant, RestaurantId, Review, ReviewId,
};
