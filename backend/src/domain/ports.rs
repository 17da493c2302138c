//! Domain ports defining the edges of the hexagon.
//!
//! Ports describe how the domain expects to interact with driven adapters
//! (the relational store and the image store). Each trait exposes strongly
//! typed errors so adapters map their failures into predictable variants
//! instead of returning `anyhow::Result`.

use async_trait::async_trait;
use thiserror::Error;

use super::activity::{NewReview, NewTip, Review, Tip};
use super::coupons::{Coupon, CouponId, CouponRedemption};
use super::reporting::Transfer;
use super::restaurant::{Membership, Restaurant, RestaurantId, StaffMember, StaffId};
use super::rewards::RewardTier;
use super::user::{DeviceFingerprint, EmailAddress, User, UserId};

/// Persistence errors raised by [`UserRepository`] adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserPersistenceError {
    /// Repository connection could not be established.
    #[error("user repository connection failed: {message}")]
    Connection {
        /// Adapter-level description.
        message: String,
    },
    /// Query or mutation failed during execution.
    #[error("user repository query failed: {message}")]
    Query {
        /// Adapter-level description.
        message: String,
    },
    /// The email column's uniqueness constraint rejected the write.
    #[error("email is already registered")]
    DuplicateEmail,
}

impl UserPersistenceError {
    /// Helper for connection oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Persistence port for user accounts and guests.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user row.
    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch a user by normalised email.
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch a guest by device fingerprint.
    async fn find_by_device_fingerprint(
        &self,
        fingerprint: &DeviceFingerprint,
    ) -> Result<Option<User>, UserPersistenceError>;

    /// Persist a recomputed XP/level pair.
    async fn store_progress(
        &self,
        id: &UserId,
        xp: u32,
        level: u32,
    ) -> Result<(), UserPersistenceError>;
}

/// Persistence errors raised by [`RewardTierRepository`] adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewardPersistenceError {
    /// Repository connection could not be established.
    #[error("reward repository connection failed: {message}")]
    Connection {
        /// Adapter-level description.
        message: String,
    },
    /// Query or mutation failed during execution.
    #[error("reward repository query failed: {message}")]
    Query {
        /// Adapter-level description.
        message: String,
    },
}

impl RewardPersistenceError {
    /// Helper for connection oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Persistence port for the global reward-tier ladder.
#[async_trait]
pub trait RewardTierRepository: Send + Sync {
    /// All tiers sorted ascending by threshold.
    async fn list_ascending(&self) -> Result<Vec<RewardTier>, RewardPersistenceError>;

    /// Insert a tier (seeding only).
    async fn insert(&self, tier: &RewardTier) -> Result<(), RewardPersistenceError>;
}

/// Atomic instruction handed to the activity adapter to execute a merge.
///
/// The service computes the merged XP and resulting level before the
/// transaction so the adapter stays free of reward logic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePlan {
    /// Guest row to fold and delete.
    pub guest_id: UserId,
    /// Authenticated account receiving the activity.
    pub target_id: UserId,
    /// Target XP after the merge.
    pub merged_xp: u32,
    /// Target level after the merge.
    pub merged_level: u32,
}

/// Counts reported back after a merge commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeOutcome {
    /// Tips whose owner changed.
    pub tips_moved: u64,
    /// Reviews whose owner changed.
    pub reviews_moved: u64,
}

/// Persistence errors raised by [`ActivityRepository`] adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActivityPersistenceError {
    /// Repository connection could not be established.
    #[error("activity repository connection failed: {message}")]
    Connection {
        /// Adapter-level description.
        message: String,
    },
    /// Query or mutation failed during execution.
    #[error("activity repository query failed: {message}")]
    Query {
        /// Adapter-level description.
        message: String,
    },
}

impl ActivityPersistenceError {
    /// Helper for connection oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Persistence port for tips, reviews, and the identity merge.
#[async_trait]
pub trait ActivityRepository: Send + Sync {
    /// Insert a tip and return the stored row.
    async fn insert_tip(&self, tip: &NewTip) -> Result<Tip, ActivityPersistenceError>;

    /// Insert a review (plus attached media) and return the stored row.
    async fn insert_review(&self, review: &NewReview) -> Result<Review, ActivityPersistenceError>;

    /// A user's most recent tips, newest first.
    async fn tips_for_user(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<Tip>, ActivityPersistenceError>;

    /// A user's most recent reviews, newest first.
    async fn reviews_for_user(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<Review>, ActivityPersistenceError>;

    /// Reassign the guest's activity, update the target's progress, and
    /// delete the guest, all in one transaction.
    ///
    /// A failed commit must leave the guest row and its activity untouched;
    /// callers retry the whole merge from scratch.
    async fn apply_merge(&self, plan: &MergePlan) -> Result<MergeOutcome, ActivityPersistenceError>;

    /// Recompute a staff member's denormalised `rating_avg` and `tips_count`.
    async fn refresh_staff_aggregates(
        &self,
        staff_id: &StaffId,
    ) -> Result<(), ActivityPersistenceError>;
}

/// Persistence errors raised by [`RestaurantRepository`] adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RestaurantPersistenceError {
    /// Repository connection could not be established.
    #[error("restaurant repository connection failed: {message}")]
    Connection {
        /// Adapter-level description.
        message: String,
    },
    /// Query or mutation failed during execution.
    #[error("restaurant repository query failed: {message}")]
    Query {
        /// Adapter-level description.
        message: String,
    },
}

impl RestaurantPersistenceError {
    /// Helper for connection oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Persistence port for restaurants, staff rosters, and memberships.
#[async_trait]
pub trait RestaurantRepository: Send + Sync {
    /// Insert a restaurant (seeding only).
    async fn insert(&self, restaurant: &Restaurant) -> Result<(), RestaurantPersistenceError>;

    /// Fetch a restaurant by its public slug.
    async fn find_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<Restaurant>, RestaurantPersistenceError>;

    /// Fetch a restaurant by identifier.
    async fn find_by_id(
        &self,
        id: &RestaurantId,
    ) -> Result<Option<Restaurant>, RestaurantPersistenceError>;

    /// Fetch several restaurants at once, ordered by name.
    async fn find_by_ids(
        &self,
        ids: &[RestaurantId],
    ) -> Result<Vec<Restaurant>, RestaurantPersistenceError>;

    /// Active staff for the public tip page, ordered by name.
    async fn active_staff(
        &self,
        restaurant_id: &RestaurantId,
    ) -> Result<Vec<StaffMember>, RestaurantPersistenceError>;

    /// All staff (including inactive) for management views, ordered by name.
    async fn all_staff(
        &self,
        restaurant_id: &RestaurantId,
    ) -> Result<Vec<StaffMember>, RestaurantPersistenceError>;

    /// A single staff member scoped to a restaurant.
    async fn staff_member(
        &self,
        restaurant_id: &RestaurantId,
        staff_id: &StaffId,
    ) -> Result<Option<StaffMember>, RestaurantPersistenceError>;

    /// Insert a staff member.
    async fn insert_staff(&self, member: &StaffMember) -> Result<(), RestaurantPersistenceError>;

    /// Update a staff member's editable fields (name, role, bio, avatar,
    /// active flag).
    async fn update_staff(&self, member: &StaffMember) -> Result<(), RestaurantPersistenceError>;

    /// Insert a membership (seeding and registration flows).
    async fn insert_membership(
        &self,
        membership: &Membership,
    ) -> Result<(), RestaurantPersistenceError>;

    /// The restaurant a user administers, if any (admin or manager role;
    /// one membership wins deterministically when several match).
    async fn admin_restaurant_for(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Restaurant>, RestaurantPersistenceError>;

    /// Set or clear a restaurant's stored logo image.
    async fn set_logo(
        &self,
        restaurant_id: &RestaurantId,
        logo_image: Option<&str>,
    ) -> Result<(), RestaurantPersistenceError>;
}

/// Persistence errors raised by [`CouponRepository`] adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouponPersistenceError {
    /// Repository connection could not be established.
    #[error("coupon repository connection failed: {message}")]
    Connection {
        /// Adapter-level description.
        message: String,
    },
    /// Query or mutation failed during execution.
    #[error("coupon repository query failed: {message}")]
    Query {
        /// Adapter-level description.
        message: String,
    },
    /// The redemption code collided with an existing one at insert time.
    #[error("redemption code already exists")]
    DuplicateCode,
}

impl CouponPersistenceError {
    /// Helper for connection oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Persistence port for coupons and their redemptions.
#[async_trait]
pub trait CouponRepository: Send + Sync {
    /// Fetch a coupon by identifier.
    async fn find_by_id(&self, id: &CouponId) -> Result<Option<Coupon>, CouponPersistenceError>;

    /// A restaurant's coupons, newest first.
    async fn list_for_restaurant(
        &self,
        restaurant_id: &RestaurantId,
    ) -> Result<Vec<Coupon>, CouponPersistenceError>;

    /// Active coupons a member's XP has unlocked, cheapest requirement first.
    async fn unlocked_for_restaurant(
        &self,
        restaurant_id: &RestaurantId,
        xp: u32,
    ) -> Result<Vec<Coupon>, CouponPersistenceError>;

    /// Insert a coupon.
    async fn insert(&self, coupon: &Coupon) -> Result<(), CouponPersistenceError>;

    /// Update a coupon's editable fields (title, description, required XP,
    /// active flag).
    async fn update(&self, coupon: &Coupon) -> Result<(), CouponPersistenceError>;

    /// Delete a coupon.
    async fn delete(&self, id: &CouponId) -> Result<(), CouponPersistenceError>;

    /// Whether a redemption already exists for the (coupon, user) pair.
    async fn redemption_exists(
        &self,
        coupon_id: &CouponId,
        user_id: &UserId,
    ) -> Result<bool, CouponPersistenceError>;

    /// Whether any redemption already uses this code.
    async fn code_exists(&self, code: &str) -> Result<bool, CouponPersistenceError>;

    /// Insert a redemption; [`CouponPersistenceError::DuplicateCode`] when
    /// the unique code index rejects it.
    async fn insert_redemption(
        &self,
        redemption: &CouponRedemption,
    ) -> Result<(), CouponPersistenceError>;
}

/// Persistence errors raised by [`ReportingRepository`] adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportingPersistenceError {
    /// Repository connection could not be established.
    #[error("reporting repository connection failed: {message}")]
    Connection {
        /// Adapter-level description.
        message: String,
    },
    /// Query or mutation failed during execution.
    #[error("reporting repository query failed: {message}")]
    Query {
        /// Adapter-level description.
        message: String,
    },
}

impl ReportingPersistenceError {
    /// Helper for connection oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Sum and count of review ratings, for mean computation in the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RatingStats {
    /// Number of reviews.
    pub count: u64,
    /// Sum of all ratings.
    pub rating_total: i64,
}

/// Read-only aggregate port feeding the dashboards, plus transfer recording.
#[async_trait]
pub trait ReportingRepository: Send + Sync {
    /// Tip total in cents since `since`, optionally scoped to one staff
    /// member.
    async fn tip_total_since(
        &self,
        restaurant_id: &RestaurantId,
        staff_id: Option<&StaffId>,
        since: chrono::DateTime<chrono::Utc>,
    ) -> Result<i64, ReportingPersistenceError>;

    /// Timestamped tip amounts within `[from, to)` for daily bucketing.
    async fn tip_rows_between(
        &self,
        restaurant_id: &RestaurantId,
        from: chrono::DateTime<chrono::Utc>,
        to: chrono::DateTime<chrono::Utc>,
    ) -> Result<Vec<(chrono::DateTime<chrono::Utc>, i64)>, ReportingPersistenceError>;

    /// Review count and rating sum, optionally scoped to one staff member.
    async fn rating_stats(
        &self,
        restaurant_id: &RestaurantId,
        staff_id: Option<&StaffId>,
    ) -> Result<RatingStats, ReportingPersistenceError>;

    /// Tip totals grouped by staff member (unaddressed tips excluded).
    async fn tip_totals_by_staff(
        &self,
        restaurant_id: &RestaurantId,
    ) -> Result<Vec<(StaffId, i64)>, ReportingPersistenceError>;

    /// Transfer totals grouped by staff member.
    async fn transfer_totals_by_staff(
        &self,
        restaurant_id: &RestaurantId,
    ) -> Result<Vec<(StaffId, i64)>, ReportingPersistenceError>;

    /// Most recent tips, newest first, optionally scoped to one staff member.
    async fn recent_tips(
        &self,
        restaurant_id: &RestaurantId,
        staff_id: Option<&StaffId>,
        limit: u32,
    ) -> Result<Vec<Tip>, ReportingPersistenceError>;

    /// Most recent reviews, newest first, optionally scoped to one staff
    /// member.
    async fn recent_reviews(
        &self,
        restaurant_id: &RestaurantId,
        staff_id: Option<&StaffId>,
        limit: u32,
    ) -> Result<Vec<Review>, ReportingPersistenceError>;

    /// Record a payout transfer.
    async fn insert_transfer(&self, transfer: &Transfer)
        -> Result<(), ReportingPersistenceError>;

    /// Most recent transfers, newest first.
    async fn recent_transfers(
        &self,
        restaurant_id: &RestaurantId,
        limit: u32,
    ) -> Result<Vec<Transfer>, ReportingPersistenceError>;
}

/// Errors raised by [`ImageStore`] adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageStoreError {
    /// The backing store rejected the operation.
    #[error("image store unavailable: {message}")]
    Unavailable {
        /// Adapter-level description.
        message: String,
    },
}

impl ImageStoreError {
    /// Helper for store-level failures.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

/// Image formats accepted by the upload flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// JPEG bytes.
    Jpeg,
    /// PNG bytes.
    Png,
}

impl ImageFormat {
    /// File extension used for stored names.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }

    /// MIME type served for this format.
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    /// Derive the format from a stored name's extension.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.rsplit('.').next() {
            Some("jpg" | "jpeg") => Some(Self::Jpeg),
            Some("png") => Some(Self::Png),
            _ => None,
        }
    }
}

/// Object-store port: store bytes under a generated name, fetch them back.
///
/// No processing happens here; bytes go in and come out unchanged.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store the bytes and return the generated retrievable name.
    async fn store(&self, bytes: &[u8], format: ImageFormat) -> Result<String, ImageStoreError>;

    /// Load stored bytes by name; `None` when the name is unknown.
    async fn load(&self, name: &str) -> Result<Option<Vec<u8>>, ImageStoreError>;
}
