//! Coupon claims and the admin coupon catalogue.

use std::sync::Arc;

use serde_json::json;
use tracing::warn;

use crate::domain::coupons::{
    generate_redemption_code, Coupon, CouponId, CouponRedemption, REDEMPTION_CODE_ATTEMPTS,
};
use crate::domain::ports::{CouponPersistenceError, CouponRepository};
use crate::domain::restaurant::RestaurantId;
use crate::domain::user::User;
use crate::domain::Error;

/// Claims coupons and manages a restaurant's catalogue.
#[derive(Clone)]
pub struct CouponsService {
    coupons: Arc<dyn CouponRepository>,
}

fn map_coupon_error(error: CouponPersistenceError) -> Error {
    match error {
        CouponPersistenceError::Connection { message } => Error::service_unavailable(message),
        CouponPersistenceError::Query { message } => Error::internal(message),
        CouponPersistenceError::DuplicateCode => {
            Error::internal("redemption code collided at insert time")
        }
    }
}

impl CouponsService {
    /// Create the service over the coupon repository.
    pub fn new(coupons: Arc<dyn CouponRepository>) -> Self {
        Self { coupons }
    }

    /// Claim `coupon_id` for `user`.
    ///
    /// Fails when the coupon is inactive, the user's XP is below the
    /// requirement, or a redemption for this (coupon, user) pair already
    /// exists. The generated code is checked against existing codes a
    /// bounded number of times; after the last attempt it is inserted
    /// unchecked and the unique index has the final say.
    pub async fn claim(&self, coupon_id: &CouponId, user: &User) -> Result<CouponRedemption, Error> {
        let coupon = self
            .coupons
            .find_by_id(coupon_id)
            .await
            .map_err(map_coupon_error)?
            .ok_or_else(|| Error::not_found("coupon not found"))?;

        if !coupon.active {
            return Err(Error::conflict("coupon is not active"));
        }
        if user.xp < coupon.required_xp {
            return Err(Error::forbidden("not enough XP to claim this coupon")
                .with_details(json!({
                    "requiredXp": coupon.required_xp,
                    "xp": user.xp,
                })));
        }
        if self
            .coupons
            .redemption_exists(coupon_id, &user.id)
            .await
            .map_err(map_coupon_error)?
        {
            return Err(Error::conflict("coupon already claimed"));
        }

        let code = self.unused_code().await?;
        let redemption = CouponRedemption::new_claim(coupon.id, user.id, code);
        self.coupons
            .insert_redemption(&redemption)
            .await
            .map_err(map_coupon_error)?;
        Ok(redemption)
    }

    /// Generate a redemption code, retrying on collision a bounded number of
    /// times and accepting the final candidate unchecked.
    async fn unused_code(&self) -> Result<String, Error> {
        let mut code = generate_redemption_code(&mut rand::thread_rng());
        for attempt in 1..REDEMPTION_CODE_ATTEMPTS {
            let taken = self
                .coupons
                .code_exists(&code)
                .await
                .map_err(map_coupon_error)?;
            if !taken {
                return Ok(code);
            }
            warn!(attempt, "redemption code collision, regenerating");
            code = generate_redemption_code(&mut rand::thread_rng());
        }
        // Out of attempts: accept the collision risk and let the unique
        // index arbitrate.
        Ok(code)
    }

    /// Active coupons a member's XP unlocks at one restaurant.
    pub async fn unlocked(
        &self,
        restaurant_id: &RestaurantId,
        xp: u32,
    ) -> Result<Vec<Coupon>, Error> {
        self.coupons
            .unlocked_for_restaurant(restaurant_id, xp)
            .await
            .map_err(map_coupon_error)
    }

    /// A restaurant's full catalogue, newest first.
    pub async fn list(&self, restaurant_id: &RestaurantId) -> Result<Vec<Coupon>, Error> {
        self.coupons
            .list_for_restaurant(restaurant_id)
            .await
            .map_err(map_coupon_error)
    }

    /// Create a coupon in a restaurant's catalogue.
    pub async fn create(
        &self,
        restaurant_id: &RestaurantId,
        title: &str,
        description: Option<&str>,
        required_xp: u32,
        active: bool,
    ) -> Result<Coupon, Error> {
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::invalid_request("title required"));
        }
        let mut coupon = Coupon::new(*restaurant_id, title, required_xp);
        coupon.description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_owned);
        coupon.active = active;
        self.coupons
            .insert(&coupon)
            .await
            .map_err(map_coupon_error)?;
        Ok(coupon)
    }

    /// Update a coupon, scoped to the admin's restaurant.
    pub async fn update(
        &self,
        restaurant_id: &RestaurantId,
        coupon_id: &CouponId,
        title: Option<&str>,
        description: Option<&str>,
        required_xp: Option<u32>,
        active: bool,
    ) -> Result<Coupon, Error> {
        let mut coupon = self.owned_coupon(restaurant_id, coupon_id).await?;
        if let Some(t) = title.map(str::trim).filter(|t| !t.is_empty()) {
            coupon.title = t.to_owned();
        }
        coupon.description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_owned);
        if let Some(xp) = required_xp {
            coupon.required_xp = xp;
        }
        coupon.active = active;
        self.coupons
            .update(&coupon)
            .await
            .map_err(map_coupon_error)?;
        Ok(coupon)
    }

    /// Delete a coupon, scoped to the admin's restaurant.
    pub async fn delete(
        &self,
        restaurant_id: &RestaurantId,
        coupon_id: &CouponId,
    ) -> Result<(), Error> {
        let coupon = self.owned_coupon(restaurant_id, coupon_id).await?;
        self.coupons
            .delete(&coupon.id)
            .await
            .map_err(map_coupon_error)
    }

    async fn owned_coupon(
        &self,
        restaurant_id: &RestaurantId,
        coupon_id: &CouponId,
    ) -> Result<Coupon, Error> {
        self.coupons
            .find_by_id(coupon_id)
            .await
            .map_err(map_coupon_error)?
            .filter(|c| c.restaurant_id == *restaurant_id)
            .ok_or_else(|| Error::not_found("coupon not found"))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use rstest::rstest;

    use super::*;
    use crate::domain::coupons::RedemptionStatus;
    use crate::domain::test_support::InMemoryStore;
    use crate::domain::ErrorCode;

    fn service(store: &InMemoryStore) -> CouponsService {
        CouponsService::new(store.coupons())
    }

    #[tokio::test]
    async fn claim_inserts_a_claimed_redemption() {
        let store = InMemoryStore::with_demo_restaurant();
        let coupon = store.add_coupon("Free Coffee", 100, true);
        let user = store.add_guest_with_xp("device-1", 150);

        let redemption = service(&store)
            .claim(&coupon.id, &user)
            .await
            .expect("claim succeeds");

        assert_eq!(redemption.status, RedemptionStatus::Claimed);
        assert_eq!(redemption.coupon_id, coupon.id);
        assert_eq!(redemption.code.len(), 8);
        assert_eq!(store.redemption_count(), 1);
    }

    #[tokio::test]
    async fn second_claim_for_the_same_pair_fails() {
        let store = InMemoryStore::with_demo_restaurant();
        let coupon = store.add_coupon("Free Coffee", 0, true);
        let user = store.add_guest_with_xp("device-1", 50);
        let svc = service(&store);

        svc.claim(&coupon.id, &user).await.expect("first claim");
        let err = svc
            .claim(&coupon.id, &user)
            .await
            .expect_err("second claim fails");

        assert_eq!(err.code(), ErrorCode::Conflict);
        assert_eq!(err.message(), "coupon already claimed");
        assert_eq!(store.redemption_count(), 1);
    }

    #[tokio::test]
    async fn insufficient_xp_is_forbidden() {
        let store = InMemoryStore::with_demo_restaurant();
        let coupon = store.add_coupon("Gold Perk", 250, true);
        let user = store.add_guest_with_xp("device-1", 100);

        let err = service(&store)
            .claim(&coupon.id, &user)
            .await
            .expect_err("claim fails");
        assert_eq!(err.code(), ErrorCode::Forbidden);
        assert_eq!(store.redemption_count(), 0);
    }

    #[tokio::test]
    async fn inactive_coupons_cannot_be_claimed() {
        let store = InMemoryStore::with_demo_restaurant();
        let coupon = store.add_coupon("Retired", 0, false);
        let user = store.add_guest_with_xp("device-1", 500);

        let err = service(&store)
            .claim(&coupon.id, &user)
            .await
            .expect_err("claim fails");
        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn different_users_may_claim_the_same_coupon() {
        let store = InMemoryStore::with_demo_restaurant();
        let coupon = store.add_coupon("Free Coffee", 0, true);
        let first = store.add_guest_with_xp("device-1", 10);
        let second = store.add_guest_with_xp("device-2", 10);
        let svc = service(&store);

        let a = svc.claim(&coupon.id, &first).await.expect("first claim");
        let b = svc.claim(&coupon.id, &second).await.expect("second claim");
        assert_ne!(a.code, b.code);
        assert_eq!(store.redemption_count(), 2);
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_coupons_are_not_found() {
        let store = InMemoryStore::with_demo_restaurant();
        let user = store.add_guest_with_xp("device-1", 10);

        let err = service(&store)
            .claim(&CouponId::random(), &user)
            .await
            .expect_err("claim fails");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn unlocked_respects_threshold_and_activity() {
        let store = InMemoryStore::with_demo_restaurant();
        store.add_coupon("Cheap", 50, true);
        store.add_coupon("Expensive", 500, true);
        store.add_coupon("Disabled", 10, false);
        let restaurant = store.restaurant();

        let unlocked = service(&store)
            .unlocked(&restaurant.id, 100)
            .await
            .expect("query succeeds");
        let titles: Vec<&str> = unlocked.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Cheap"]);
    }

    #[tokio::test]
    async fn create_requires_a_title() {
        let store = InMemoryStore::with_demo_restaurant();
        let restaurant = store.restaurant();

        let err = service(&store)
            .create(&restaurant.id, "   ", None, 0, true)
            .await
            .expect_err("blank title rejected");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[tokio::test]
    async fn update_is_scoped_to_the_restaurant() {
        let store = InMemoryStore::with_demo_restaurant();
        let coupon = store.add_coupon("Free Coffee", 100, true);

        let err = service(&store)
            .update(
                &RestaurantId::random(),
                &coupon.id,
                Some("Stolen"),
                None,
                None,
                true,
            )
            .await
            .expect_err("foreign restaurant rejected");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }
}
