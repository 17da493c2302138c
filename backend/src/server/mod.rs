//! Application state assembly and route registration.

mod config;

pub use config::{AppConfig, ConfigError};

use std::sync::Arc;

use actix_web::web;

use crate::api;
use crate::domain::accounts_service::AccountsService;
use crate::domain::coupons_service::CouponsService;
use crate::domain::merge_service::MergeService;
use crate::domain::ports::{ImageStore, RestaurantRepository};
use crate::domain::profile_service::ProfileService;
use crate::domain::progress_service::ProgressService;
use crate::domain::reporting_service::ReportingService;
use crate::domain::reviews_service::ReviewsService;
use crate::domain::tipping_service::TippingService;
use crate::outbound::persistence::{
    DbPool, DieselActivityRepository, DieselCouponRepository, DieselReportingRepository,
    DieselRestaurantRepository, DieselRewardTierRepository, DieselUserRepository,
};

/// Everything the handlers need, shared across workers.
#[derive(Clone)]
pub struct AppState {
    /// Registration, login, guest resolution.
    pub accounts: AccountsService,
    /// Tip recording.
    pub tipping: TippingService,
    /// Review recording.
    pub reviews: ReviewsService,
    /// Guest-to-account merge.
    pub merge: MergeService,
    /// Coupon claims and catalogue management.
    pub coupons: CouponsService,
    /// Profile assembly.
    pub profile: ProfileService,
    /// Dashboard reporting and payouts.
    pub reporting: ReportingService,
    /// XP awards and tier progress.
    pub progress: ProgressService,
    /// Restaurant and roster lookups used directly by handlers.
    pub restaurants: Arc<dyn RestaurantRepository>,
    /// Stored-image access for the uploads route.
    pub images: Arc<dyn ImageStore>,
    /// Upload size cap in bytes.
    pub max_image_bytes: usize,
}

impl AppState {
    /// Wire the Diesel adapters and services over a pool and image store.
    pub fn build(pool: DbPool, images: Arc<dyn ImageStore>, max_image_bytes: usize) -> Self {
        let users = Arc::new(DieselUserRepository::new(pool.clone()));
        let tiers = Arc::new(DieselRewardTierRepository::new(pool.clone()));
        let activity = Arc::new(DieselActivityRepository::new(pool.clone()));
        let restaurants: Arc<dyn RestaurantRepository> =
            Arc::new(DieselRestaurantRepository::new(pool.clone()));
        let coupons = Arc::new(DieselCouponRepository::new(pool.clone()));
        let reporting = Arc::new(DieselReportingRepository::new(pool));

        let progress = ProgressService::new(users.clone(), tiers.clone());

        Self {
            accounts: AccountsService::new(users.clone()),
            tipping: TippingService::new(
                activity.clone(),
                restaurants.clone(),
                progress.clone(),
            ),
            reviews: ReviewsService::new(
                activity.clone(),
                restaurants.clone(),
                images.clone(),
                progress.clone(),
                max_image_bytes,
            ),
            merge: MergeService::new(users, activity.clone(), progress.clone()),
            coupons: CouponsService::new(coupons.clone()),
            profile: ProfileService::new(activity, restaurants.clone(), coupons, progress.clone()),
            reporting: ReportingService::new(reporting, restaurants.clone()),
            progress,
            restaurants,
            images,
            max_image_bytes,
        }
    }
}

/// Register every `/api/v1` handler on a scope.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(api::auth::register)
        .service(api::auth::login)
        .service(api::auth::logout)
        .service(api::public::restaurant_page)
        .service(api::public::submit_tip)
        .service(api::public::submit_review)
        .service(api::public::my_progress)
        .service(api::profile::my_profile)
        .service(api::profile::merge_guest)
        .service(api::coupons::claim_coupon)
        .service(api::dashboard::overview)
        .service(api::dashboard::staff_roster)
        .service(api::dashboard::staff_detail)
        .service(api::dashboard::create_staff)
        .service(api::dashboard::update_staff)
        .service(api::dashboard::deactivate_staff)
        .service(api::dashboard::payouts)
        .service(api::dashboard::send_payout)
        .service(api::dashboard::list_coupons)
        .service(api::dashboard::create_coupon)
        .service(api::dashboard::update_coupon)
        .service(api::dashboard::delete_coupon)
        .service(api::dashboard::set_logo)
        .service(api::dashboard::remove_logo);
}
