//! OpenAPI document assembled from the handler annotations.

use utoipa::OpenApi;

use crate::api;
use crate::domain;

/// Public OpenAPI surface used by Swagger UI and tooling.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tipping & loyalty backend",
        description = "Digital tipping, reviews, and loyalty rewards for restaurants."
    ),
    paths(
        api::auth::register,
        api::auth::login,
        api::auth::logout,
        api::public::restaurant_page,
        api::public::submit_tip,
        api::public::submit_review,
        api::public::my_progress,
        api::profile::my_profile,
        api::profile::merge_guest,
        api::coupons::claim_coupon,
        api::dashboard::overview,
        api::dashboard::staff_roster,
        api::dashboard::staff_detail,
        api::dashboard::create_staff,
        api::dashboard::update_staff,
        api::dashboard::deactivate_staff,
        api::dashboard::payouts,
        api::dashboard::send_payout,
        api::dashboard::list_coupons,
        api::dashboard::create_coupon,
        api::dashboard::update_coupon,
        api::dashboard::delete_coupon,
        api::dashboard::set_logo,
        api::dashboard::remove_logo,
        api::uploads::serve_upload,
        api::health::ready,
        api::health::live,
    ),
    components(schemas(
        domain::error::Error,
        domain::error::ErrorCode,
        domain::reporting::DailyComparison,
        api::dto::RestaurantDto,
        api::dto::StaffDto,
        api::dto::TipDto,
        api::dto::ReviewDto,
        api::dto::TierDto,
        api::dto::ProgressDto,
        api::dto::UserDto,
        api::dto::CouponDto,
        api::dto::RedemptionDto,
        api::dto::TransferDto,
        api::dto::StaffAmountDto,
        api::dto::OverviewDto,
        api::dto::StaffDetailDto,
        api::dto::PayoutsDto,
        api::dto::RestaurantCouponsDto,
        api::auth::RegisterRequest,
        api::auth::LoginRequest,
        api::public::RestaurantPage,
        api::public::TipRequest,
        api::public::TipResponse,
        api::public::PhotoRequest,
        api::public::ReviewRequest,
        api::public::ReviewResponse,
        api::profile::ProfileResponse,
        api::profile::MergeResponse,
        api::dashboard::ImagePayload,
        api::dashboard::CreateStaffRequest,
        api::dashboard::UpdateStaffRequest,
        api::dashboard::SendPayoutRequest,
        api::dashboard::CreateCouponRequest,
        api::dashboard::UpdateCouponRequest,
    ))
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;

    #[test]
    fn document_builds_and_lists_core_paths() {
        let doc = ApiDoc::openapi();
        let json = serde_json::to_value(&doc).expect("document serialises");
        let paths = json["paths"].as_object().expect("paths object");
        assert!(paths.contains_key("/api/v1/r/{slug}/tips"));
        assert!(paths.contains_key("/api/v1/me/merge-guest"));
        assert!(paths.contains_key("/api/v1/coupons/{id}/claim"));
        assert!(paths.contains_key("/health/ready"));
    }
}
