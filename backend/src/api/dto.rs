//! JSON representations of domain entities.
//!
//! Serialisation contracts live here so handlers stay thin and the domain
//! types never pick up transport concerns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::activity::{Review, Tip};
use crate::domain::coupons::{Coupon, CouponRedemption};
use crate::domain::profile_service::RestaurantCoupons;
use crate::domain::reporting::{
    DailyComparison, Overview, PayoutsView, StaffAmount, StaffDetail, Transfer,
};
use crate::domain::restaurant::{Restaurant, StaffMember};
use crate::domain::rewards::{RewardTier, TierProgress};
use crate::domain::user::User;

/// Public restaurant representation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantDto {
    /// Stable identifier.
    pub id: Uuid,
    /// Public slug.
    pub slug: String,
    /// Display name.
    pub name: String,
    /// Servable logo URL, when a logo is stored.
    pub logo_url: Option<String>,
}

impl From<&Restaurant> for RestaurantDto {
    fn from(value: &Restaurant) -> Self {
        Self {
            id: *value.id.as_uuid(),
            slug: value.slug.clone(),
            name: value.name.clone(),
            logo_url: value.logo_image.as_deref().map(upload_url),
        }
    }
}

/// Public staff representation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StaffDto {
    /// Stable identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Role label.
    pub role: Option<String>,
    /// Servable avatar URL.
    pub avatar_url: Option<String>,
    /// Short biography.
    pub bio: Option<String>,
    /// Mean review rating.
    pub rating_avg: f64,
    /// Tip count.
    pub tips_count: u32,
    /// Whether the member is active.
    pub active: bool,
}

impl From<&StaffMember> for StaffDto {
    fn from(value: &StaffMember) -> Self {
        Self {
            id: *value.id.as_uuid(),
            name: value.name.clone(),
            role: value.role.clone(),
            avatar_url: value.avatar_image.as_deref().map(upload_url),
            bio: value.bio.clone(),
            rating_avg: value.rating_avg,
            tips_count: value.tips_count,
            active: value.active,
        }
    }
}

/// Stored tip representation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TipDto {
    /// Stable identifier.
    pub id: Uuid,
    /// Restaurant the tip was left at.
    pub restaurant_id: Uuid,
    /// Addressed staff member.
    pub staff_id: Option<Uuid>,
    /// Amount in cents.
    pub amount_cents: i32,
    /// Payment-method label.
    pub method_ui: String,
    /// Processing status.
    pub status: String,
    /// Submission time.
    pub created_at: DateTime<Utc>,
}

impl From<&Tip> for TipDto {
    fn from(value: &Tip) -> Self {
        Self {
            id: *value.id.as_uuid(),
            restaurant_id: *value.restaurant_id.as_uuid(),
            staff_id: value.staff_id.map(|s| *s.as_uuid()),
            amount_cents: value.amount_cents,
            method_ui: value.method_ui.clone(),
            status: value.status.clone(),
            created_at: value.created_at,
        }
    }
}

/// Stored review representation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDto {
    /// Stable identifier.
    pub id: Uuid,
    /// Restaurant the review is about.
    pub restaurant_id: Uuid,
    /// Reviewed staff member.
    pub staff_id: Option<Uuid>,
    /// Rating, 1..=5.
    pub rating: u8,
    /// Free-text comment.
    pub comment: Option<String>,
    /// Public-sharing consent.
    pub share_allowed: bool,
    /// Servable photo URL, when one was uploaded.
    pub photo_url: Option<String>,
    /// Submission time.
    pub created_at: DateTime<Utc>,
}

impl From<&Review> for ReviewDto {
    fn from(value: &Review) -> Self {
        Self {
            id: *value.id.as_uuid(),
            restaurant_id: *value.restaurant_id.as_uuid(),
            staff_id: value.staff_id.map(|s| *s.as_uuid()),
            rating: value.rating,
            comment: value.comment.clone(),
            share_allowed: value.share_allowed,
            photo_url: value.media.as_ref().map(|m| upload_url(&m.image_name)),
            created_at: value.created_at,
        }
    }
}

/// Reward tier representation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TierDto {
    /// Display name.
    pub name: String,
    /// XP threshold.
    pub threshold_xp: u32,
}

impl From<&RewardTier> for TierDto {
    fn from(value: &RewardTier) -> Self {
        Self {
            name: value.name.clone(),
            threshold_xp: value.threshold_xp,
        }
    }
}

/// Tier progress representation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressDto {
    /// All tiers, ascending.
    pub tiers: Vec<TierDto>,
    /// Reached tier, if any.
    pub current: Option<TierDto>,
    /// Next tier, if any.
    pub next: Option<TierDto>,
    /// Percentage toward the next tier; 100 when maxed out.
    pub progress_pct: u8,
}

impl From<&TierProgress> for ProgressDto {
    fn from(value: &TierProgress) -> Self {
        Self {
            tiers: value.tiers.iter().map(TierDto::from).collect(),
            current: value.current.as_ref().map(TierDto::from),
            next: value.next.as_ref().map(TierDto::from),
            progress_pct: value.progress_pct,
        }
    }
}

/// Account representation returned to the session owner.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    /// Stable identifier.
    pub id: Uuid,
    /// Login email; absent for guests.
    pub email: Option<String>,
    /// Display name.
    pub display_name: String,
    /// Whether this is an anonymous guest.
    pub guest: bool,
    /// Accrued XP.
    pub xp: u32,
    /// Derived level.
    pub level: u32,
}

impl From<&User> for UserDto {
    fn from(value: &User) -> Self {
        Self {
            id: *value.id.as_uuid(),
            email: value.email.as_ref().map(|e| e.as_str().to_owned()),
            display_name: value.display_name.clone(),
            guest: value.is_guest(),
            xp: value.xp,
            level: value.level,
        }
    }
}

/// Coupon representation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CouponDto {
    /// Stable identifier.
    pub id: Uuid,
    /// Offering restaurant.
    pub restaurant_id: Uuid,
    /// Short title.
    pub title: String,
    /// Longer description.
    pub description: Option<String>,
    /// XP required to claim.
    pub required_xp: u32,
    /// Claimability flag.
    pub active: bool,
}

impl From<&Coupon> for CouponDto {
    fn from(value: &Coupon) -> Self {
        Self {
            id: *value.id.as_uuid(),
            restaurant_id: *value.restaurant_id.as_uuid(),
            title: value.title.clone(),
            description: value.description.clone(),
            required_xp: value.required_xp,
            active: value.active,
        }
    }
}

/// Redemption representation returned after a claim.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionDto {
    /// Stable identifier.
    pub id: Uuid,
    /// Claimed coupon.
    pub coupon_id: Uuid,
    /// Code to show at the till.
    pub code: String,
    /// Lifecycle status.
    pub status: String,
    /// Claim time.
    pub created_at: DateTime<Utc>,
}

impl From<&CouponRedemption> for RedemptionDto {
    fn from(value: &CouponRedemption) -> Self {
        Self {
            id: value.id,
            coupon_id: *value.coupon_id.as_uuid(),
            code: value.code.clone(),
            status: value.status.as_str().to_owned(),
            created_at: value.created_at,
        }
    }
}

/// Transfer representation for the payouts page.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferDto {
    /// Stable identifier.
    pub id: Uuid,
    /// Receiving staff member.
    pub staff_id: Option<Uuid>,
    /// Amount in cents.
    pub amount_cents: i32,
    /// Processing status.
    pub status: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl From<&Transfer> for TransferDto {
    fn from(value: &Transfer) -> Self {
        Self {
            id: value.id,
            staff_id: value.staff_id.map(|s| *s.as_uuid()),
            amount_cents: value.amount_cents,
            status: value.status.clone(),
            created_at: value.created_at,
        }
    }
}

/// A staff member paired with a cent amount.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StaffAmountDto {
    /// The staff member.
    pub staff: StaffDto,
    /// Amount in cents.
    pub amount_cents: i64,
}

impl From<&StaffAmount> for StaffAmountDto {
    fn from(value: &StaffAmount) -> Self {
        Self {
            staff: StaffDto::from(&value.staff),
            amount_cents: value.amount_cents,
        }
    }
}

/// Overview page payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OverviewDto {
    /// Tip total since midnight, cents.
    pub tips_today_cents: i64,
    /// Tip total since Monday, cents.
    pub tips_week_cents: i64,
    /// Tip total since the first of the month, cents.
    pub tips_month_cents: i64,
    /// Mean review rating.
    pub rating_avg: f64,
    /// Review count.
    pub reviews_count: u64,
    /// Top staff by tips.
    pub top_tipped: Vec<StaffAmountDto>,
    /// Top staff by rating.
    pub top_rated: Vec<StaffDto>,
    /// Pending payout per active staff member.
    pub staff_pending: Vec<StaffAmountDto>,
    /// Daily tip totals, current vs previous month.
    pub daily: DailyComparison,
    /// Most recent reviews.
    pub recent_reviews: Vec<ReviewDto>,
}

impl From<&Overview> for OverviewDto {
    fn from(value: &Overview) -> Self {
        Self {
            tips_today_cents: value.tips_today_cents,
            tips_week_cents: value.tips_week_cents,
            tips_month_cents: value.tips_month_cents,
            rating_avg: value.rating_avg,
            reviews_count: value.reviews_count,
            top_tipped: value.top_tipped.iter().map(StaffAmountDto::from).collect(),
            top_rated: value.top_rated.iter().map(StaffDto::from).collect(),
            staff_pending: value
                .staff_pending
                .iter()
                .map(StaffAmountDto::from)
                .collect(),
            daily: value.daily.clone(),
            recent_reviews: value.recent_reviews.iter().map(ReviewDto::from).collect(),
        }
    }
}

/// Staff drill-down payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StaffDetailDto {
    /// The staff member.
    pub staff: StaffDto,
    /// Tip total since midnight, cents.
    pub tips_today_cents: i64,
    /// Tip total since Monday, cents.
    pub tips_week_cents: i64,
    /// Mean review rating.
    pub rating_avg: f64,
    /// Recent tips.
    pub last_tips: Vec<TipDto>,
    /// Recent reviews.
    pub last_reviews: Vec<ReviewDto>,
}

impl From<&StaffDetail> for StaffDetailDto {
    fn from(value: &StaffDetail) -> Self {
        Self {
            staff: StaffDto::from(&value.staff),
            tips_today_cents: value.tips_today_cents,
            tips_week_cents: value.tips_week_cents,
            rating_avg: value.rating_avg,
            last_tips: value.last_tips.iter().map(TipDto::from).collect(),
            last_reviews: value.last_reviews.iter().map(ReviewDto::from).collect(),
        }
    }
}

/// Payouts page payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayoutsDto {
    /// Pending amount per active staff member.
    pub rows: Vec<StaffAmountDto>,
    /// Recent transfers.
    pub transfers: Vec<TransferDto>,
}

impl From<&PayoutsView> for PayoutsDto {
    fn from(value: &PayoutsView) -> Self {
        Self {
            rows: value.rows.iter().map(StaffAmountDto::from).collect(),
            transfers: value.transfers.iter().map(TransferDto::from).collect(),
        }
    }
}

/// Unlocked coupons for one restaurant.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantCouponsDto {
    /// The restaurant.
    pub restaurant: RestaurantDto,
    /// Unlocked coupons.
    pub coupons: Vec<CouponDto>,
}

impl From<&RestaurantCoupons> for RestaurantCouponsDto {
    fn from(value: &RestaurantCoupons) -> Self {
        Self {
            restaurant: RestaurantDto::from(&value.restaurant),
            coupons: value.coupons.iter().map(CouponDto::from).collect(),
        }
    }
}

/// Servable URL for a stored image name.
pub fn upload_url(name: &str) -> String {
    format!("/uploads/{name}")
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::restaurant::RestaurantId;
    use rstest::rstest;

    #[rstest]
    fn restaurant_dto_renders_logo_url() {
        let mut restaurant = Restaurant::new("cafe-luna", "Cafe Luna");
        restaurant.logo_image = Some("abc.png".to_owned());
        let dto = RestaurantDto::from(&restaurant);
        assert_eq!(dto.logo_url.as_deref(), Some("/uploads/abc.png"));
    }

    #[rstest]
    fn staff_dto_serialises_camel_case() {
        let member = StaffMember::new(RestaurantId::random(), "Mia");
        let value = serde_json::to_value(StaffDto::from(&member)).expect("serialize");
        assert!(value.get("ratingAvg").is_some());
        assert!(value.get("tipsCount").is_some());
    }
}
