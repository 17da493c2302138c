//! Shared in-memory port implementations for service tests.
//!
//! One [`InMemoryStore`] backs every port so cross-port effects (merge
//! atomicity, aggregate refresh) are observable the way they would be
//! against the real database.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::activity::{Media, NewReview, NewTip, Review, Tip, TipId, ReviewId};
use crate::domain::coupons::{Coupon, CouponId, CouponRedemption};
use crate::domain::ports::{
    ActivityPersistenceError, ActivityRepository, CouponPersistenceError, CouponRepository,
    ImageFormat, ImageStore, ImageStoreError, MergeOutcome, MergePlan, RatingStats,
    ReportingPersistenceError, ReportingRepository, RestaurantPersistenceError,
    RestaurantRepository, RewardPersistenceError, RewardTierRepository, UserPersistenceError,
    UserRepository,
};
use crate::domain::progress_service::ProgressService;
use crate::domain::reporting::Transfer;
use crate::domain::restaurant::{Membership, Restaurant, RestaurantId, StaffId, StaffMember};
use crate::domain::rewards::RewardTier;
use crate::domain::user::{DeviceFingerprint, EmailAddress, User, UserId};

#[derive(Default)]
struct Inner {
    users: Mutex<HashMap<UserId, User>>,
    tiers: Mutex<Vec<RewardTier>>,
    restaurants: Mutex<Vec<Restaurant>>,
    staff: Mutex<Vec<StaffMember>>,
    memberships: Mutex<Vec<Membership>>,
    tips: Mutex<Vec<Tip>>,
    reviews: Mutex<Vec<Review>>,
    coupons: Mutex<Vec<Coupon>>,
    redemptions: Mutex<Vec<CouponRedemption>>,
    transfers: Mutex<Vec<Transfer>>,
    fail_next_merge: AtomicBool,
}

/// An in-memory database shared by all port stubs.
pub(crate) struct InMemoryStore {
    inner: Arc<Inner>,
    demo_restaurant: Restaurant,
}

impl InMemoryStore {
    /// A store seeded with one restaurant and nothing else.
    pub fn with_demo_restaurant() -> Self {
        let demo_restaurant = Restaurant::new("cafe-luna", "Cafe Luna");
        let inner = Arc::new(Inner::default());
        inner
            .restaurants
            .lock()
            .expect("restaurants lock")
            .push(demo_restaurant.clone());
        Self {
            inner,
            demo_restaurant,
        }
    }

    pub fn restaurant(&self) -> Restaurant {
        self.demo_restaurant.clone()
    }

    pub fn users(&self) -> Arc<InMemoryUsers> {
        Arc::new(InMemoryUsers(self.inner.clone()))
    }

    pub fn activity(&self) -> Arc<InMemoryActivity> {
        Arc::new(InMemoryActivity(self.inner.clone()))
    }

    pub fn restaurants(&self) -> Arc<InMemoryRestaurants> {
        Arc::new(InMemoryRestaurants(self.inner.clone()))
    }

    pub fn coupons(&self) -> Arc<InMemoryCoupons> {
        Arc::new(InMemoryCoupons(self.inner.clone()))
    }

    pub fn reporting(&self) -> Arc<InMemoryReporting> {
        Arc::new(InMemoryReporting(self.inner.clone()))
    }

    pub fn tiers(&self) -> Arc<InMemoryTiers> {
        Arc::new(InMemoryTiers(self.inner.clone()))
    }

    pub fn progress_service(&self) -> ProgressService {
        ProgressService::new(self.users(), self.tiers())
    }

    pub fn add_tiers(&self, tiers: &[(&str, u32)]) {
        let mut stored = self.inner.tiers.lock().expect("tiers lock");
        for (name, threshold) in tiers {
            stored.push(RewardTier::new(*name, *threshold));
        }
    }

    pub fn add_guest(&self, device_id: &str) -> User {
        self.add_guest_with_xp(device_id, 0)
    }

    pub fn add_guest_with_xp(&self, device_id: &str, xp: u32) -> User {
        let mut user = User::new_guest(DeviceFingerprint::from_device_id(device_id));
        user.xp = xp;
        self.inner
            .users
            .lock()
            .expect("users lock")
            .insert(user.id, user.clone());
        user
    }

    pub fn add_registered(&self, email: &str, xp: u32) -> User {
        let email = EmailAddress::new(email).expect("valid email");
        let mut user =
            User::new_registered(email, "digest".to_owned(), "Member").expect("valid user");
        user.xp = xp;
        self.inner
            .users
            .lock()
            .expect("users lock")
            .insert(user.id, user.clone());
        user
    }

    pub fn add_staff(&self, name: &str) -> StaffMember {
        let member = StaffMember::new(self.demo_restaurant.id, name);
        self.inner
            .staff
            .lock()
            .expect("staff lock")
            .push(member.clone());
        member
    }

    pub fn add_coupon(&self, title: &str, required_xp: u32, active: bool) -> Coupon {
        let mut coupon = Coupon::new(self.demo_restaurant.id, title, required_xp);
        coupon.active = active;
        self.inner
            .coupons
            .lock()
            .expect("coupons lock")
            .push(coupon.clone());
        coupon
    }

    pub fn add_tip_for(&self, user_id: &UserId, amount_cents: i32) {
        self.push_tip(Some(*user_id), None, amount_cents);
    }

    pub fn add_tip_to_staff(&self, staff_id: &StaffId, amount_cents: i32) {
        self.push_tip(None, Some(*staff_id), amount_cents);
    }

    fn push_tip(&self, user_id: Option<UserId>, staff_id: Option<StaffId>, amount_cents: i32) {
        self.inner.tips.lock().expect("tips lock").push(Tip {
            id: TipId::random(),
            restaurant_id: self.demo_restaurant.id,
            staff_id,
            user_id,
            amount_cents,
            method_ui: "mock".to_owned(),
            status: crate::domain::activity::TIP_STATUS_RECORDED.to_owned(),
            created_at: Utc::now(),
        });
    }

    pub fn add_review_for(&self, user_id: &UserId, rating: u8) {
        self.push_review(Some(*user_id), None, rating);
    }

    pub fn add_review_of_staff(&self, staff_id: &StaffId, rating: u8) {
        self.push_review(None, Some(*staff_id), rating);
    }

    fn push_review(&self, user_id: Option<UserId>, staff_id: Option<StaffId>, rating: u8) {
        self.inner.reviews.lock().expect("reviews lock").push(Review {
            id: ReviewId::random(),
            restaurant_id: self.demo_restaurant.id,
            staff_id,
            user_id,
            rating,
            comment: None,
            share_allowed: false,
            media: None,
            created_at: Utc::now(),
        });
    }

    pub fn add_transfer_to_staff(&self, staff_id: &StaffId, amount_cents: i32) {
        self.inner
            .transfers
            .lock()
            .expect("transfers lock")
            .push(Transfer::new_sent(
                self.demo_restaurant.id,
                *staff_id,
                amount_cents,
            ));
    }

    pub fn fail_next_merge(&self) {
        self.inner.fail_next_merge.store(true, Ordering::SeqCst);
    }

    pub fn user(&self, id: &UserId) -> User {
        self.try_user(id).expect("user exists")
    }

    pub fn try_user(&self, id: &UserId) -> Option<User> {
        self.inner.users.lock().expect("users lock").get(id).cloned()
    }

    pub fn user_xp(&self, id: &UserId) -> u32 {
        self.user(id).xp
    }

    pub fn staff_member(&self, id: &StaffId) -> StaffMember {
        self.inner
            .staff
            .lock()
            .expect("staff lock")
            .iter()
            .find(|m| m.id == *id)
            .cloned()
            .expect("staff exists")
    }

    pub fn review_count(&self) -> usize {
        self.inner.reviews.lock().expect("reviews lock").len()
    }

    pub fn redemption_count(&self) -> usize {
        self.inner.redemptions.lock().expect("redemptions lock").len()
    }

    pub fn tips_owned_by(&self, id: &UserId) -> usize {
        self.inner
            .tips
            .lock()
            .expect("tips lock")
            .iter()
            .filter(|t| t.user_id == Some(*id))
            .count()
    }

    pub fn reviews_owned_by(&self, id: &UserId) -> usize {
        self.inner
            .reviews
            .lock()
            .expect("reviews lock")
            .iter()
            .filter(|r| r.user_id == Some(*id))
            .count()
    }
}

/// User port over the shared store.
pub(crate) struct InMemoryUsers(Arc<Inner>);

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut users = self.0.users.lock().expect("users lock");
        if user.email.is_some() && users.values().any(|u| u.email == user.email) {
            return Err(UserPersistenceError::DuplicateEmail);
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        Ok(self.0.users.lock().expect("users lock").get(id).cloned())
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserPersistenceError> {
        Ok(self
            .0
            .users
            .lock()
            .expect("users lock")
            .values()
            .find(|u| u.email.as_ref() == Some(email))
            .cloned())
    }

    async fn find_by_device_fingerprint(
        &self,
        fingerprint: &DeviceFingerprint,
    ) -> Result<Option<User>, UserPersistenceError> {
        Ok(self
            .0
            .users
            .lock()
            .expect("users lock")
            .values()
            .find(|u| u.device_fingerprint.as_ref() == Some(fingerprint))
            .cloned())
    }

    async fn store_progress(
        &self,
        id: &UserId,
        xp: u32,
        level: u32,
    ) -> Result<(), UserPersistenceError> {
        let mut users = self.0.users.lock().expect("users lock");
        if let Some(user) = users.get_mut(id) {
            user.xp = xp;
            user.level = level;
        }
        Ok(())
    }
}

/// Reward-tier port over the shared store.
pub(crate) struct InMemoryTiers(Arc<Inner>);

#[async_trait]
impl RewardTierRepository for InMemoryTiers {
    async fn list_ascending(&self) -> Result<Vec<RewardTier>, RewardPersistenceError> {
        let mut tiers = self.0.tiers.lock().expect("tiers lock").clone();
        tiers.sort_by_key(|t| t.threshold_xp);
        Ok(tiers)
    }

    async fn insert(&self, tier: &RewardTier) -> Result<(), RewardPersistenceError> {
        self.0.tiers.lock().expect("tiers lock").push(tier.clone());
        Ok(())
    }
}

/// Activity port over the shared store.
pub(crate) struct InMemoryActivity(Arc<Inner>);

#[async_trait]
impl ActivityRepository for InMemoryActivity {
    async fn insert_tip(&self, tip: &NewTip) -> Result<Tip, ActivityPersistenceError> {
        let stored = Tip {
            id: TipId::random(),
            restaurant_id: tip.restaurant_id,
            staff_id: tip.staff_id,
            user_id: tip.user_id,
            amount_cents: tip.amount_cents,
            method_ui: tip.method_ui.clone(),
            status: crate::domain::activity::TIP_STATUS_RECORDED.to_owned(),
            created_at: Utc::now(),
        };
        self.0.tips.lock().expect("tips lock").push(stored.clone());
        Ok(stored)
    }

    async fn insert_review(&self, review: &NewReview) -> Result<Review, ActivityPersistenceError> {
        let id = ReviewId::random();
        let stored = Review {
            id,
            restaurant_id: review.restaurant_id,
            staff_id: review.staff_id,
            user_id: review.user_id,
            rating: review.rating,
            comment: review.comment.clone(),
            share_allowed: review.share_allowed,
            media: review.media.as_ref().map(|m| Media {
                id: uuid::Uuid::new_v4(),
                review_id: id,
                image_name: m.image_name.clone(),
                width: m.width,
                height: m.height,
            }),
            created_at: Utc::now(),
        };
        self.0
            .reviews
            .lock()
            .expect("reviews lock")
            .push(stored.clone());
        Ok(stored)
    }

    async fn tips_for_user(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<Tip>, ActivityPersistenceError> {
        let mut tips: Vec<Tip> = self
            .0
            .tips
            .lock()
            .expect("tips lock")
            .iter()
            .filter(|t| t.user_id == Some(*user_id))
            .cloned()
            .collect();
        tips.sort_by_key(|t| std::cmp::Reverse(t.created_at));
        tips.truncate(limit as usize);
        Ok(tips)
    }

    async fn reviews_for_user(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<Review>, ActivityPersistenceError> {
        let mut reviews: Vec<Review> = self
            .0
            .reviews
            .lock()
            .expect("reviews lock")
            .iter()
            .filter(|r| r.user_id == Some(*user_id))
            .cloned()
            .collect();
        reviews.sort_by_key(|r| std::cmp::Reverse(r.created_at));
        reviews.truncate(limit as usize);
        Ok(reviews)
    }

    async fn apply_merge(&self, plan: &MergePlan) -> Result<MergeOutcome, ActivityPersistenceError> {
        if self.0.fail_next_merge.swap(false, Ordering::SeqCst) {
            return Err(ActivityPersistenceError::query("simulated commit failure"));
        }

        let mut outcome = MergeOutcome::default();
        {
            let mut tips = self.0.tips.lock().expect("tips lock");
            for tip in tips.iter_mut().filter(|t| t.user_id == Some(plan.guest_id)) {
                tip.user_id = Some(plan.target_id);
                outcome.tips_moved += 1;
            }
        }
        {
            let mut reviews = self.0.reviews.lock().expect("reviews lock");
            for review in reviews
                .iter_mut()
                .filter(|r| r.user_id == Some(plan.guest_id))
            {
                review.user_id = Some(plan.target_id);
                outcome.reviews_moved += 1;
            }
        }
        let mut users = self.0.users.lock().expect("users lock");
        if let Some(target) = users.get_mut(&plan.target_id) {
            target.xp = plan.merged_xp;
            target.level = plan.merged_level;
        }
        users.remove(&plan.guest_id);
        Ok(outcome)
    }

    async fn refresh_staff_aggregates(
        &self,
        staff_id: &StaffId,
    ) -> Result<(), ActivityPersistenceError> {
        let ratings: Vec<i64> = self
            .0
            .reviews
            .lock()
            .expect("reviews lock")
            .iter()
            .filter(|r| r.staff_id == Some(*staff_id))
            .map(|r| i64::from(r.rating))
            .collect();
        let tips_count = self
            .0
            .tips
            .lock()
            .expect("tips lock")
            .iter()
            .filter(|t| t.staff_id == Some(*staff_id))
            .count();

        let mut staff = self.0.staff.lock().expect("staff lock");
        if let Some(member) = staff.iter_mut().find(|m| m.id == *staff_id) {
            member.rating_avg = if ratings.is_empty() {
                0.0
            } else {
                #[expect(
                    clippy::cast_precision_loss,
                    reason = "test fixture ratings stay tiny"
                )]
                let mean = ratings.iter().sum::<i64>() as f64 / ratings.len() as f64;
                mean
            };
            member.tips_count = u32::try_from(tips_count).unwrap_or(u32::MAX);
        }
        Ok(())
    }
}

/// Restaurant port over the shared store.
pub(crate) struct InMemoryRestaurants(Arc<Inner>);

#[async_trait]
impl RestaurantRepository for InMemoryRestaurants {
    async fn insert(&self, restaurant: &Restaurant) -> Result<(), RestaurantPersistenceError> {
        self.0
            .restaurants
            .lock()
            .expect("restaurants lock")
            .push(restaurant.clone());
        Ok(())
    }

    async fn find_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<Restaurant>, RestaurantPersistenceError> {
        Ok(self
            .0
            .restaurants
            .lock()
            .expect("restaurants lock")
            .iter()
            .find(|r| r.slug == slug)
            .cloned())
    }

    async fn find_by_id(
        &self,
        id: &RestaurantId,
    ) -> Result<Option<Restaurant>, RestaurantPersistenceError> {
        Ok(self
            .0
            .restaurants
            .lock()
            .expect("restaurants lock")
            .iter()
            .find(|r| r.id == *id)
            .cloned())
    }

    async fn find_by_ids(
        &self,
        ids: &[RestaurantId],
    ) -> Result<Vec<Restaurant>, RestaurantPersistenceError> {
        let mut found: Vec<Restaurant> = self
            .0
            .restaurants
            .lock()
            .expect("restaurants lock")
            .iter()
            .filter(|r| ids.contains(&r.id))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(found)
    }

    async fn active_staff(
        &self,
        restaurant_id: &RestaurantId,
    ) -> Result<Vec<StaffMember>, RestaurantPersistenceError> {
        let mut staff: Vec<StaffMember> = self
            .0
            .staff
            .lock()
            .expect("staff lock")
            .iter()
            .filter(|m| m.restaurant_id == *restaurant_id && m.active)
            .cloned()
            .collect();
        staff.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(staff)
    }

    async fn all_staff(
        &self,
        restaurant_id: &RestaurantId,
    ) -> Result<Vec<StaffMember>, RestaurantPersistenceError> {
        let mut staff: Vec<StaffMember> = self
            .0
            .staff
            .lock()
            .expect("staff lock")
            .iter()
            .filter(|m| m.restaurant_id == *restaurant_id)
            .cloned()
            .collect();
        staff.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(staff)
    }

    async fn staff_member(
        &self,
        restaurant_id: &RestaurantId,
        staff_id: &StaffId,
    ) -> Result<Option<StaffMember>, RestaurantPersistenceError> {
        Ok(self
            .0
            .staff
            .lock()
            .expect("staff lock")
            .iter()
            .find(|m| m.id == *staff_id && m.restaurant_id == *restaurant_id)
            .cloned())
    }

    async fn insert_staff(&self, member: &StaffMember) -> Result<(), RestaurantPersistenceError> {
        self.0
            .staff
            .lock()
            .expect("staff lock")
            .push(member.clone());
        Ok(())
    }

    async fn update_staff(&self, member: &StaffMember) -> Result<(), RestaurantPersistenceError> {
        let mut staff = self.0.staff.lock().expect("staff lock");
        if let Some(existing) = staff.iter_mut().find(|m| m.id == member.id) {
            *existing = member.clone();
        }
        Ok(())
    }

    async fn insert_membership(
        &self,
        membership: &Membership,
    ) -> Result<(), RestaurantPersistenceError> {
        self.0
            .memberships
            .lock()
            .expect("memberships lock")
            .push(membership.clone());
        Ok(())
    }

    async fn admin_restaurant_for(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Restaurant>, RestaurantPersistenceError> {
        let memberships = self.0.memberships.lock().expect("memberships lock");
        let membership = memberships
            .iter()
            .find(|m| m.user_id == *user_id && m.role.grants_dashboard());
        let Some(membership) = membership else {
            return Ok(None);
        };
        Ok(self
            .0
            .restaurants
            .lock()
            .expect("restaurants lock")
            .iter()
            .find(|r| r.id == membership.restaurant_id)
            .cloned())
    }

    async fn set_logo(
        &self,
        restaurant_id: &RestaurantId,
        logo_image: Option<&str>,
    ) -> Result<(), RestaurantPersistenceError> {
        let mut restaurants = self.0.restaurants.lock().expect("restaurants lock");
        if let Some(restaurant) = restaurants.iter_mut().find(|r| r.id == *restaurant_id) {
            restaurant.logo_image = logo_image.map(str::to_owned);
        }
        Ok(())
    }
}

/// Coupon port over the shared store.
pub(crate) struct InMemoryCoupons(Arc<Inner>);

#[async_trait]
impl CouponRepository for InMemoryCoupons {
    async fn find_by_id(&self, id: &CouponId) -> Result<Option<Coupon>, CouponPersistenceError> {
        Ok(self
            .0
            .coupons
            .lock()
            .expect("coupons lock")
            .iter()
            .find(|c| c.id == *id)
            .cloned())
    }

    async fn list_for_restaurant(
        &self,
        restaurant_id: &RestaurantId,
    ) -> Result<Vec<Coupon>, CouponPersistenceError> {
        let mut coupons: Vec<Coupon> = self
            .0
            .coupons
            .lock()
            .expect("coupons lock")
            .iter()
            .filter(|c| c.restaurant_id == *restaurant_id)
            .cloned()
            .collect();
        coupons.sort_by_key(|c| std::cmp::Reverse(c.created_at));
        Ok(coupons)
    }

    async fn unlocked_for_restaurant(
        &self,
        restaurant_id: &RestaurantId,
        xp: u32,
    ) -> Result<Vec<Coupon>, CouponPersistenceError> {
        let mut coupons: Vec<Coupon> = self
            .0
            .coupons
            .lock()
            .expect("coupons lock")
            .iter()
            .filter(|c| c.restaurant_id == *restaurant_id && c.active && c.required_xp <= xp)
            .cloned()
            .collect();
        coupons.sort_by_key(|c| c.required_xp);
        Ok(coupons)
    }

    async fn insert(&self, coupon: &Coupon) -> Result<(), CouponPersistenceError> {
        self.0
            .coupons
            .lock()
            .expect("coupons lock")
            .push(coupon.clone());
        Ok(())
    }

    async fn update(&self, coupon: &Coupon) -> Result<(), CouponPersistenceError> {
        let mut coupons = self.0.coupons.lock().expect("coupons lock");
        if let Some(existing) = coupons.iter_mut().find(|c| c.id == coupon.id) {
            *existing = coupon.clone();
        }
        Ok(())
    }

    async fn delete(&self, id: &CouponId) -> Result<(), CouponPersistenceError> {
        self.0
            .coupons
            .lock()
            .expect("coupons lock")
            .retain(|c| c.id != *id);
        Ok(())
    }

    async fn redemption_exists(
        &self,
        coupon_id: &CouponId,
        user_id: &UserId,
    ) -> Result<bool, CouponPersistenceError> {
        Ok(self
            .0
            .redemptions
            .lock()
            .expect("redemptions lock")
            .iter()
            .any(|r| r.coupon_id == *coupon_id && r.user_id == *user_id))
    }

    async fn code_exists(&self, code: &str) -> Result<bool, CouponPersistenceError> {
        Ok(self
            .0
            .redemptions
            .lock()
            .expect("redemptions lock")
            .iter()
            .any(|r| r.code == code))
    }

    async fn insert_redemption(
        &self,
        redemption: &CouponRedemption,
    ) -> Result<(), CouponPersistenceError> {
        let mut redemptions = self.0.redemptions.lock().expect("redemptions lock");
        if redemptions.iter().any(|r| r.code == redemption.code) {
            return Err(CouponPersistenceError::DuplicateCode);
        }
        redemptions.push(redemption.clone());
        Ok(())
    }
}

/// Reporting port over the shared store.
pub(crate) struct InMemoryReporting(Arc<Inner>);

#[async_trait]
impl ReportingRepository for InMemoryReporting {
    async fn tip_total_since(
        &self,
        restaurant_id: &RestaurantId,
        staff_id: Option<&StaffId>,
        since: chrono::DateTime<Utc>,
    ) -> Result<i64, ReportingPersistenceError> {
        Ok(self
            .0
            .tips
            .lock()
            .expect("tips lock")
            .iter()
            .filter(|t| {
                t.restaurant_id == *restaurant_id
                    && t.created_at >= since
                    && staff_id.map_or(true, |s| t.staff_id == Some(*s))
            })
            .map(|t| i64::from(t.amount_cents))
            .sum())
    }

    async fn tip_rows_between(
        &self,
        restaurant_id: &RestaurantId,
        from: chrono::DateTime<Utc>,
        to: chrono::DateTime<Utc>,
    ) -> Result<Vec<(chrono::DateTime<Utc>, i64)>, ReportingPersistenceError> {
        Ok(self
            .0
            .tips
            .lock()
            .expect("tips lock")
            .iter()
            .filter(|t| {
                t.restaurant_id == *restaurant_id && t.created_at >= from && t.created_at < to
            })
            .map(|t| (t.created_at, i64::from(t.amount_cents)))
            .collect())
    }

    async fn rating_stats(
        &self,
        restaurant_id: &RestaurantId,
        staff_id: Option<&StaffId>,
    ) -> Result<RatingStats, ReportingPersistenceError> {
        let reviews = self.0.reviews.lock().expect("reviews lock");
        let matching = reviews.iter().filter(|r| {
            r.restaurant_id == *restaurant_id && staff_id.map_or(true, |s| r.staff_id == Some(*s))
        });
        let mut stats = RatingStats::default();
        for review in matching {
            stats.count += 1;
            stats.rating_total += i64::from(review.rating);
        }
        Ok(stats)
    }

    async fn tip_totals_by_staff(
        &self,
        restaurant_id: &RestaurantId,
    ) -> Result<Vec<(StaffId, i64)>, ReportingPersistenceError> {
        let mut totals: HashMap<StaffId, i64> = HashMap::new();
        for tip in self.0.tips.lock().expect("tips lock").iter() {
            if tip.restaurant_id == *restaurant_id {
                if let Some(staff_id) = tip.staff_id {
                    *totals.entry(staff_id).or_default() += i64::from(tip.amount_cents);
                }
            }
        }
        Ok(totals.into_iter().collect())
    }

    async fn transfer_totals_by_staff(
        &self,
        restaurant_id: &RestaurantId,
    ) -> Result<Vec<(StaffId, i64)>, ReportingPersistenceError> {
        let mut totals: HashMap<StaffId, i64> = HashMap::new();
        for transfer in self.0.transfers.lock().expect("transfers lock").iter() {
            if transfer.restaurant_id == *restaurant_id {
                if let Some(staff_id) = transfer.staff_id {
                    *totals.entry(staff_id).or_default() += i64::from(transfer.amount_cents);
                }
            }
        }
        Ok(totals.into_iter().collect())
    }

    async fn recent_tips(
        &self,
        restaurant_id: &RestaurantId,
        staff_id: Option<&StaffId>,
        limit: u32,
    ) -> Result<Vec<Tip>, ReportingPersistenceError> {
        let mut tips: Vec<Tip> = self
            .0
            .tips
            .lock()
            .expect("tips lock")
            .iter()
            .filter(|t| {
                t.restaurant_id == *restaurant_id && staff_id.map_or(true, |s| t.staff_id == Some(*s))
            })
            .cloned()
            .collect();
        tips.sort_by_key(|t| std::cmp::Reverse(t.created_at));
        tips.truncate(limit as usize);
        Ok(tips)
    }

    async fn recent_reviews(
        &self,
        restaurant_id: &RestaurantId,
        staff_id: Option<&StaffId>,
        limit: u32,
    ) -> Result<Vec<Review>, ReportingPersistenceError> {
        let mut reviews: Vec<Review> = self
            .0
            .reviews
            .lock()
            .expect("reviews lock")
            .iter()
            .filter(|r| {
                r.restaurant_id == *restaurant_id && staff_id.map_or(true, |s| r.staff_id == Some(*s))
            })
            .cloned()
            .collect();
        reviews.sort_by_key(|r| std::cmp::Reverse(r.created_at));
        reviews.truncate(limit as usize);
        Ok(reviews)
    }

    async fn insert_transfer(
        &self,
        transfer: &Transfer,
    ) -> Result<(), ReportingPersistenceError> {
        self.0
            .transfers
            .lock()
            .expect("transfers lock")
            .push(transfer.clone());
        Ok(())
    }

    async fn recent_transfers(
        &self,
        restaurant_id: &RestaurantId,
        limit: u32,
    ) -> Result<Vec<Transfer>, ReportingPersistenceError> {
        let mut transfers: Vec<Transfer> = self
            .0
            .transfers
            .lock()
            .expect("transfers lock")
            .iter()
            .filter(|t| t.restaurant_id == *restaurant_id)
            .cloned()
            .collect();
        transfers.sort_by_key(|t| std::cmp::Reverse(t.created_at));
        transfers.truncate(limit as usize);
        Ok(transfers)
    }
}

/// Image store stub keeping bytes in memory.
#[derive(Default)]
pub(crate) struct StubImages {
    stored: Mutex<HashMap<String, Vec<u8>>>,
}

#[async_trait]
impl ImageStore for StubImages {
    async fn store(&self, bytes: &[u8], format: ImageFormat) -> Result<String, ImageStoreError> {
        let name = format!("{}.{}", uuid::Uuid::new_v4().simple(), format.extension());
        self.stored
            .lock()
            .expect("stored lock")
            .insert(name.clone(), bytes.to_vec());
        Ok(name)
    }

    async fn load(&self, name: &str) -> Result<Option<Vec<u8>>, ImageStoreError> {
        Ok(self.stored.lock().expect("stored lock").get(name).cloned())
    }
}
