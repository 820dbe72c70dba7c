//! Domain types for the dine client.
//!
//! The remote API returns loosely shaped objects: optional fields, `null`
//! where a value is expected, and the same concept under several names. Each
//! type here deserializes through a private "raw" mirror of the wire shape
//! and converts into a normalized value exactly once, so consumers never
//! look at alternative field names.
//!
//! # Module Organization
//!
//! - [`restaurant`] - Restaurants, ids, and coordinates
//! - [`review`] - Reviews (the API calls them comments)
//! - [`user`] - The signed-in user
//!
//! All public types are re-exported at this module level and at the crate
//! root:
//!
//! ```
//! use dine_core::{Restaurant, RestaurantId, Review};
//! ```

pub mod restaurant;
pub mod review;
pub mod user;

pub use restaurant::{LatLng, Restaurant, RestaurantId};
pub use review::{ANONYMOUS_AUTHOR, Review, ReviewId};
pub use user::AuthUser;
