//! Append-only activity facts: tips, reviews, and review media.
//!
//! Rows here are never mutated after creation, with one exception: the
//! owning-user foreign key is reassigned in bulk when a guest account is
//! merged into an authenticated one.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::restaurant::{RestaurantId, StaffId};
use super::user::UserId;

/// Stable tip identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TipId(Uuid);

impl TipId {
    /// Generate a new random [`TipId`].
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for TipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable review identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewId(Uuid);

impl ReviewId {
    /// Generate a new random [`ReviewId`].
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ReviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A recorded tip.
#[derive(Debug, Clone, PartialEq)]
pub struct Tip {
    /// Stable identifier.
    pub id: TipId,
    /// Restaurant the tip was left at.
    pub restaurant_id: RestaurantId,
    /// Staff member the tip was addressed to, if any.
    pub staff_id: Option<StaffId>,
    /// Owning user; `None` when the tipper stayed fully anonymous.
    pub user_id: Option<UserId>,
    /// Amount in cents; always positive.
    pub amount_cents: i32,
    /// Payment-method label chosen in the UI, e.g. `apple_pay`.
    pub method_ui: String,
    /// Processing status; currently always `recorded`.
    pub status: String,
    /// Submission time.
    pub created_at: DateTime<Utc>,
}

/// Input for recording a tip; the store assigns the timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTip {
    /// Restaurant the tip is for.
    pub restaurant_id: RestaurantId,
    /// Staff member the tip is addressed to, if any.
    pub staff_id: Option<StaffId>,
    /// Owning user, if the tipper is identified.
    pub user_id: Option<UserId>,
    /// Amount in cents; validated positive before insert.
    pub amount_cents: i32,
    /// Payment-method label chosen in the UI.
    pub method_ui: String,
}

/// A recorded review, optionally with one attached photo.
#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    /// Stable identifier.
    pub id: ReviewId,
    /// Restaurant the review is about.
    pub restaurant_id: RestaurantId,
    /// Staff member the review is about, if any.
    pub staff_id: Option<StaffId>,
    /// Owning user; `None` when the reviewer stayed fully anonymous.
    pub user_id: Option<UserId>,
    /// Rating, 1..=5.
    pub rating: u8,
    /// Free-text comment.
    pub comment: Option<String>,
    /// Whether the guest consented to public sharing.
    pub share_allowed: bool,
    /// Attached photo, if one was uploaded.
    pub media: Option<Media>,
    /// Submission time.
    pub created_at: DateTime<Utc>,
}

/// Input for recording a review.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    /// Restaurant the review is about.
    pub restaurant_id: RestaurantId,
    /// Staff member the review is about, if any.
    pub staff_id: Option<StaffId>,
    /// Owning user, if the reviewer is identified.
    pub user_id: Option<UserId>,
    /// Rating, validated into 1..=5 before insert.
    pub rating: u8,
    /// Free-text comment; blank comments are stored as `None`.
    pub comment: Option<String>,
    /// Whether the guest consented to public sharing.
    pub share_allowed: bool,
    /// Stored photo to attach, if one was uploaded.
    pub media: Option<NewMedia>,
}

/// A stored review photo.
#[derive(Debug, Clone, PartialEq)]
pub struct Media {
    /// Stable identifier.
    pub id: Uuid,
    /// Owning review.
    pub review_id: ReviewId,
    /// Stored image name, servable under `/uploads/{name}`.
    pub image_name: String,
    /// Pixel width when known.
    pub width: Option<i32>,
    /// Pixel height when known.
    pub height: Option<i32>,
}

/// Input for attaching a stored photo to a review.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMedia {
    /// Stored image name returned by the image store.
    pub image_name: String,
    /// Pixel width when known.
    pub width: Option<i32>,
    /// Pixel height when known.
    pub height: Option<i32>,
}

/// Status value assigned to freshly recorded tips.
pub const TIP_STATUS_RECORDED: &str = "recorded";
