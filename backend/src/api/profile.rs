//! Member profile and the guest-merge endpoint.

use actix_session::Session;
use actix_web::{get, post, web, HttpRequest};
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::dto::{
    ProgressDto, RestaurantCouponsDto, RestaurantDto, ReviewDto, TipDto, UserDto,
};
use crate::api::identity::{current_actor, device_id, require_session_user};
use crate::domain::merge_service::MergeResult;
use crate::domain::{ApiResult, Error};
use crate::server::AppState;

/// Profile payload: identity, activity, progress, unlocked coupons.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    /// The profile owner.
    pub user: UserDto,
    /// Recent tips, newest first.
    pub tips: Vec<TipDto>,
    /// Recent reviews, newest first.
    pub reviews: Vec<ReviewDto>,
    /// Restaurants the owner has touched.
    pub restaurants: Vec<RestaurantDto>,
    /// Tier standing.
    pub progress: ProgressDto,
    /// Unlocked coupons per restaurant.
    pub unlocked: Vec<RestaurantCouponsDto>,
}

/// The current visitor's profile. Guests are created on first visit so the
/// page always has an identity to show.
#[utoipa::path(
    get,
    path = "/api/v1/me/profile",
    responses(
        (status = 200, description = "Profile", body = ProfileResponse),
        (status = 401, description = "Stale session")
    ),
    tags = ["profile"]
)]
#[get("/me/profile")]
pub async fn my_profile(
    state: web::Data<AppState>,
    session: Session,
    req: HttpRequest,
) -> ApiResult<web::Json<ProfileResponse>> {
    let actor = current_actor(&session, &req)?;
    let user = state
        .accounts
        .resolve_actor(&actor)
        .await?
        .ok_or_else(|| Error::unauthorized("no identity to show a profile for"))?;

    let view = state.profile.profile(&user).await?;

    Ok(web::Json(ProfileResponse {
        user: UserDto::from(&user),
        tips: view.tips.iter().map(TipDto::from).collect(),
        reviews: view.reviews.iter().map(ReviewDto::from).collect(),
        restaurants: view.restaurants.iter().map(RestaurantDto::from).collect(),
        progress: ProgressDto::from(&view.progress),
        unlocked: view.unlocked.iter().map(RestaurantCouponsDto::from).collect(),
    }))
}

/// Merge outcome payload.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MergeResponse {
    /// Whether anything was merged.
    pub merged: bool,
    /// Tips reassigned to the account.
    pub tips_moved: u64,
    /// Reviews reassigned to the account.
    pub reviews_moved: u64,
    /// XP after the merge.
    pub xp: Option<u32>,
}

/// Fold the device-cookie guest into the authenticated account.
#[utoipa::path(
    post,
    path = "/api/v1/me/merge-guest",
    responses(
        (status = 200, description = "Merge outcome", body = MergeResponse),
        (status = 401, description = "Authentication required")
    ),
    tags = ["profile"]
)]
#[post("/me/merge-guest")]
pub async fn merge_guest(
    state: web::Data<AppState>,
    session: Session,
    req: HttpRequest,
) -> ApiResult<web::Json<MergeResponse>> {
    let user_id = require_session_user(&session)?;

    let Some(device) = device_id(&req) else {
        return Ok(web::Json(MergeResponse {
            merged: false,
            tips_moved: 0,
            reviews_moved: 0,
            xp: None,
        }));
    };

    let Some(guest) = state.accounts.find_guest(&device).await? else {
        return Ok(web::Json(MergeResponse {
            merged: false,
            tips_moved: 0,
            reviews_moved: 0,
            xp: None,
        }));
    };

    match state.merge.merge(&guest.id, &user_id).await? {
        MergeResult::Noop => Ok(web::Json(MergeResponse {
            merged: false,
            tips_moved: 0,
            reviews_moved: 0,
            xp: None,
        })),
        MergeResult::Merged { outcome, xp, .. } => Ok(web::Json(MergeResponse {
            merged: true,
            tips_moved: outcome.tips_moved,
            reviews_moved: outcome.reviews_moved,
            xp: Some(xp),
        })),
    }
}
