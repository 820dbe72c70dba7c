//! Restaurant types.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::review::Review;

/// Opaque identifier of a restaurant.
///
/// Two restaurants are the same favorite exactly when their ids are equal;
/// no other field takes part in identity.
///
/// # Examples
///
/// ```
/// use dine_core::RestaurantId;
///
/// let id = RestaurantId::from("r1");
/// assert_eq!(id.as_str(), "r1");
/// assert_eq!(id.to_string(), "r1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RestaurantId(String);

impl RestaurantId {
    /// Creates an id from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RestaurantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RestaurantId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for RestaurantId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for RestaurantId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for RestaurantId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Geographic coordinates in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
}

/// GeoJSON point. Coordinates are ordered `[lng, lat]`.
#[derive(Deserialize)]
struct GeoPoint {
    coordinates: Option<Vec<f64>>,
}

impl GeoPoint {
    fn to_lat_lng(&self) -> Option<LatLng> {
        match self.coordinates.as_deref()? {
            [lng, lat, ..] => Some(LatLng {
                lat: *lat,
                lng: *lng,
            }),
            _ => None,
        }
    }
}

/// A restaurant as shown in listings and stored in favorites.
///
/// Deserialization accepts the loose API shape: `id` in place of `_id`,
/// `null` for any field other than the id, and a GeoJSON `location` when
/// `latlng` is absent. Serialization always writes the canonical shape, so a
/// persisted restaurant reads back identical.
///
/// # Examples
///
/// ```
/// use dine_core::Restaurant;
///
/// let restaurant: Restaurant = serde_json::from_str(
///     r#"{"id": "r1", "name": "Casa Lola", "image": null,
///         "location": {"type": "Point", "coordinates": [-3.70, 40.41]}}"#,
/// ).unwrap();
///
/// assert_eq!(restaurant.id.as_str(), "r1");
/// assert!(restaurant.image.is_empty());
/// assert_eq!(restaurant.latlng.map(|p| p.lat), Some(40.41));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawRestaurant", rename_all = "camelCase")]
pub struct Restaurant {
    /// Restaurant identifier.
    #[serde(rename = "_id")]
    pub id: RestaurantId,

    /// Display name. Empty when the API sent none.
    pub name: String,

    /// Free-text description. Empty when the API sent none.
    pub description: String,

    /// Image URL. Empty when the API sent none.
    pub image: String,

    /// Street address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    /// Coordinates, from `latlng` or converted from a GeoJSON `location`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latlng: Option<LatLng>,

    /// Average rating precomputed by the API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_rating: Option<f64>,

    /// Price band, e.g. `"€€"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,

    /// Reviews embedded in the listing.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reviews: Vec<Review>,

    /// Creation timestamp as sent by the API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    /// Last update timestamp as sent by the API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Restaurant {
    /// Creates a restaurant with the given id and name and nothing else.
    #[must_use]
    pub fn new(id: impl Into<RestaurantId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            image: String::new(),
            address: None,
            latlng: None,
            avg_rating: None,
            price: None,
            reviews: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Returns the rating to display.
    ///
    /// Uses `avgRating` when present, otherwise the mean of the embedded
    /// review ratings, otherwise `0.0`.
    #[must_use]
    pub fn rating(&self) -> f64 {
        if let Some(avg) = self.avg_rating {
            return avg;
        }
        if self.reviews.is_empty() {
            return 0.0;
        }
        let total: f64 = self.reviews.iter().map(|r| r.rating).sum();
        #[allow(clippy::cast_precision_loss)]
        let count = self.reviews.len() as f64;
        total / count
    }

    /// Returns the number of embedded reviews.
    #[inline]
    #[must_use]
    pub fn review_count(&self) -> usize {
        self.reviews.len()
    }
}

/// Wire shape of a restaurant as the API may send it.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRestaurant {
    #[serde(rename = "_id", alias = "id")]
    id: RestaurantId,
    name: Option<String>,
    description: Option<String>,
    image: Option<String>,
    address: Option<String>,
    latlng: Option<LatLng>,
    location: Option<GeoPoint>,
    avg_rating: Option<f64>,
    price: Option<String>,
    reviews: Option<Vec<Review>>,
    created_at: Option<String>,
    updated_at: Option<String>,
}

impl From<RawRestaurant> for Restaurant {
    fn from(raw: RawRestaurant) -> Self {
        let latlng = raw
            .latlng
            .or_else(|| raw.location.as_ref().and_then(GeoPoint::to_lat_lng));
        Self {
            id: raw.id,
            name: raw.name.unwrap_or_default(),
            description: raw.description.unwrap_or_default(),
            image: raw.image.unwrap_or_default(),
            address: raw.address,
            latlng,
            avg_rating: raw.avg_rating,
            price: raw.price,
            reviews: raw.reviews.unwrap_or_default(),
            created_at: raw.created_at,
            updated_at: raw.updated_at,
        }
    }
}
