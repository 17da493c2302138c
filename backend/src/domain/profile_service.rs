//! Member profile: recent activity, tier progress, unlocked coupons.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::domain::activity::{Review, Tip};
use crate::domain::coupons::Coupon;
use crate::domain::ports::{ActivityRepository, CouponRepository, RestaurantRepository};
use crate::domain::progress_service::ProgressService;
use crate::domain::restaurant::{Restaurant, RestaurantId};
use crate::domain::rewards::TierProgress;
use crate::domain::tipping_service::{map_activity_error, map_restaurant_error};
use crate::domain::user::User;
use crate::domain::Error;

/// Activity rows shown on the profile page.
const PROFILE_ROWS: u32 = 20;

/// Coupons one restaurant has unlocked for the member.
#[derive(Debug, Clone, PartialEq)]
pub struct RestaurantCoupons {
    /// The restaurant.
    pub restaurant: Restaurant,
    /// Unlocked active coupons, cheapest requirement first.
    pub coupons: Vec<Coupon>,
}

/// The profile page payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileView {
    /// The member's recent tips, newest first.
    pub tips: Vec<Tip>,
    /// The member's recent reviews, newest first.
    pub reviews: Vec<Review>,
    /// Restaurants the member has tipped or reviewed, ordered by name.
    pub restaurants: Vec<Restaurant>,
    /// The member's tier standing.
    pub progress: TierProgress,
    /// Unlocked coupons per visited restaurant (restaurants with none are
    /// omitted).
    pub unlocked: Vec<RestaurantCoupons>,
}

/// Builds profile payloads for authenticated users and guests alike.
#[derive(Clone)]
pub struct ProfileService {
    activity: Arc<dyn ActivityRepository>,
    restaurants: Arc<dyn RestaurantRepository>,
    coupons: Arc<dyn CouponRepository>,
    progress: ProgressService,
}

fn map_coupon_error(error: crate::domain::ports::CouponPersistenceError) -> Error {
    use crate::domain::ports::CouponPersistenceError;
    match error {
        CouponPersistenceError::Connection { message } => Error::service_unavailable(message),
        CouponPersistenceError::Query { message } => Error::internal(message),
        CouponPersistenceError::DuplicateCode => {
            Error::internal("redemption code collided at insert time")
        }
    }
}

impl ProfileService {
    /// Create the service over its ports.
    pub fn new(
        activity: Arc<dyn ActivityRepository>,
        restaurants: Arc<dyn RestaurantRepository>,
        coupons: Arc<dyn CouponRepository>,
        progress: ProgressService,
    ) -> Self {
        Self {
            activity,
            restaurants,
            coupons,
            progress,
        }
    }

    /// Assemble the profile payload for a user.
    pub async fn profile(&self, user: &User) -> Result<ProfileView, Error> {
        let tips = self
            .activity
            .tips_for_user(&user.id, PROFILE_ROWS)
            .await
            .map_err(map_activity_error)?;
        let reviews = self
            .activity
            .reviews_for_user(&user.id, PROFILE_ROWS)
            .await
            .map_err(map_activity_error)?;

        let touched: BTreeSet<RestaurantId> = tips
            .iter()
            .map(|t| t.restaurant_id)
            .chain(reviews.iter().map(|r| r.restaurant_id))
            .collect();
        let touched: Vec<RestaurantId> = touched.into_iter().collect();
        let restaurants = if touched.is_empty() {
            Vec::new()
        } else {
            self.restaurants
                .find_by_ids(&touched)
                .await
                .map_err(map_restaurant_error)?
        };

        let progress = self.progress.progress(user.xp).await?;

        let mut unlocked = Vec::new();
        for restaurant in &restaurants {
            let coupons = self
                .coupons
                .unlocked_for_restaurant(&restaurant.id, user.xp)
                .await
                .map_err(map_coupon_error)?;
            if !coupons.is_empty() {
                unlocked.push(RestaurantCoupons {
                    restaurant: restaurant.clone(),
                    coupons,
                });
            }
        }

        Ok(ProfileView {
            tips,
            reviews,
            restaurants,
            progress,
            unlocked,
        })
    }
}
