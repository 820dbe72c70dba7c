//! Review types.
//!
//! The remote API calls reviews "comments" and is inconsistent about field
//! names: the author may arrive as `name` or `userName`, the text as
//! `comment` or `text`, and the timestamp as `date` or `createdAt`.
//! [`Review`] accepts all of them and always serializes the canonical form.

use serde::{Deserialize, Serialize};

/// Author label shown for reviews without a name.
pub const ANONYMOUS_AUTHOR: &str = "Anónimo";

/// Opaque identifier of a review.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewId(pub String);

impl ReviewId {
    /// Returns the id as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ReviewId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// A user review of a restaurant.
///
/// # Examples
///
/// ```
/// use dine_core::Review;
///
/// let review: Review = serde_json::from_str(
///     r#"{"_id": "c1", "userName": "Maria Lopez", "text": "Great tapas", "rating": 5}"#,
/// ).unwrap();
///
/// assert_eq!(review.display_author(), "Maria Lopez");
/// assert_eq!(review.text, "Great tapas");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawReview")]
pub struct Review {
    /// Review identifier.
    #[serde(rename = "_id")]
    pub id: ReviewId,

    /// Id of the user who wrote the review, when the API includes it.
    #[serde(rename = "userId", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Author display name.
    #[serde(rename = "name", skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Review text. Empty when the API sent none.
    #[serde(rename = "comment")]
    pub text: String,

    /// Star rating, 1 to 5.
    pub rating: f64,

    /// Timestamp string as sent by the API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl Review {
    /// Returns the author name, or [`ANONYMOUS_AUTHOR`] when missing.
    #[must_use]
    pub fn display_author(&self) -> &str {
        self.author.as_deref().unwrap_or(ANONYMOUS_AUTHOR)
    }
}

/// Wire shape of a review as the API may send it.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReview {
    #[serde(rename = "_id", alias = "id")]
    id: ReviewId,
    user_id: Option<String>,
    name: Option<String>,
    user_name: Option<String>,
    comment: Option<String>,
    text: Option<String>,
    rating: Option<f64>,
    date: Option<String>,
    created_at: Option<String>,
}

impl From<RawReview> for Review {
    fn from(raw: RawReview) -> Self {
        Self {
            id: raw.id,
            user_id: raw.user_id,
            author: non_blank(raw.name).or_else(|| non_blank(raw.user_name)),
            text: raw.comment.or(raw.text).unwrap_or_default(),
            rating: raw.rating.unwrap_or_default(),
            date: raw.date.or(raw.created_at),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
