//! XP-gated coupons and their redemptions.

use std::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::restaurant::RestaurantId;
use super::user::UserId;

/// Stable coupon identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CouponId(Uuid);

impl CouponId {
    /// Generate a new random [`CouponId`].
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

impl fmt::Display for CouponId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A perk a restaurant offers once a member's XP reaches `required_xp`.
#[derive(Debug, Clone, PartialEq)]
pub struct Coupon {
    /// Stable identifier.
    pub id: CouponId,
    /// Offering restaurant.
    pub restaurant_id: RestaurantId,
    /// Short title, e.g. `Free Coffee`.
    pub title: String,
    /// Optional longer description.
    pub description: Option<String>,
    /// XP a member needs before claiming.
    pub required_xp: u32,
    /// Whether the coupon is currently claimable.
    pub active: bool,
    /// Optional expiry; informational only.
    pub expires_at: Option<DateTime<Utc>>,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
}

impl Coupon {
    /// Build a new active coupon with a fresh identifier.
    pub fn new(restaurant_id: RestaurantId, title: impl Into<String>, required_xp: u32) -> Self {
        Self {
            id: CouponId::random(),
            restaurant_id,
            title: title.into(),
            description: None,
            required_xp,
            active: true,
            expires_at: None,
            created_at: Utc::now(),
        }
    }
}

/// Lifecycle of a claimed coupon code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedemptionStatus {
    /// Claimed by the member; not yet shown to staff.
    Claimed,
    /// Redeemed at the till.
    Used,
    /// Lapsed without use.
    Expired,
}

impl RedemptionStatus {
    /// Stable storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Claimed => "claimed",
            Self::Used => "used",
            Self::Expired => "expired",
        }
    }

    /// Parse the storage representation; unknown values map to [`Self::Claimed`].
    pub fn parse(raw: &str) -> Self {
        match raw {
            "used" => Self::Used,
            "expired" => Self::Expired,
            _ => Self::Claimed,
        }
    }
}

/// A member's claim on a coupon, identified at the till by `code`.
///
/// At most one redemption exists per (coupon, user) pair; the invariant is
/// enforced by an existence check before insert rather than a storage
/// constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct CouponRedemption {
    /// Stable identifier.
    pub id: Uuid,
    /// Claimed coupon.
    pub coupon_id: CouponId,
    /// Claiming member.
    pub user_id: UserId,
    /// Unique human-enterable redemption code.
    pub code: String,
    /// Current lifecycle state.
    pub status: RedemptionStatus,
    /// Claim time.
    pub created_at: DateTime<Utc>,
}

impl CouponRedemption {
    /// Build a freshly claimed redemption.
    pub fn new_claim(coupon_id: CouponId, user_id: UserId, code: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            coupon_id,
            user_id,
            code,
            status: RedemptionStatus::Claimed,
            created_at: Utc::now(),
        }
    }
}

/// Length of generated redemption codes.
pub const REDEMPTION_CODE_LEN: usize = 8;

/// Bounded attempts at generating a code that is not already in use.
///
/// After the final attempt the last code is accepted unchecked; the unique
/// index on the code column then decides. Collisions at 36^8 codes are
/// vanishingly rare but not impossible.
pub const REDEMPTION_CODE_ATTEMPTS: usize = 5;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generate a random uppercase-alphanumeric redemption code.
pub fn generate_redemption_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..REDEMPTION_CODE_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..CODE_ALPHABET.len());
            char::from(*CODE_ALPHABET.get(idx).unwrap_or(&b'A'))
        })
        .collect()
}
