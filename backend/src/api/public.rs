//! Public guest flow: restaurant page, tip submission, review submission.
//!
//! These handlers resolve the restaurant by slug, translate session/device
//! state into an explicit actor, and set the long-lived device cookie on
//! the first write from an anonymous visitor.

use actix_session::Session;
use actix_web::{get, post, web, HttpRequest, HttpResponse};
use base64::Engine;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::dto::{ProgressDto, RestaurantDto, ReviewDto, StaffDto, TipDto};
use crate::api::identity::{current_actor, ensure_device_id, session_user_id};
use crate::domain::ports::ImageFormat;
use crate::domain::restaurant::{Restaurant, StaffId};
use crate::domain::reviews_service::PhotoUpload;
use crate::domain::user::{Actor, User};
use crate::domain::{ApiResult, Error};
use crate::server::AppState;

pub(crate) async fn restaurant_by_slug(
    state: &AppState,
    slug: &str,
) -> Result<Restaurant, Error> {
    state
        .restaurants
        .find_by_slug(slug)
        .await
        .map_err(|err| Error::internal(err.to_string()))?
        .ok_or_else(|| Error::not_found("restaurant not found"))
}

/// Resolve the acting user for a write flow, minting a device id (and the
/// cookie to set) when the visitor is fully anonymous.
async fn resolve_writer(
    state: &AppState,
    session: &Session,
    req: &HttpRequest,
) -> Result<(Option<User>, Option<actix_web::cookie::Cookie<'static>>), Error> {
    if let Some(user_id) = session_user_id(session)? {
        let user = state.accounts.require_user(&user_id).await?;
        return Ok((Some(user), None));
    }
    let (device, cookie) = ensure_device_id(req);
    let user = state.accounts.resolve_actor(&Actor::Device(device)).await?;
    Ok((user, cookie))
}

/// Public restaurant page payload.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantPage {
    /// The restaurant.
    pub restaurant: RestaurantDto,
    /// Active staff, ordered by name.
    pub staff: Vec<StaffDto>,
}

/// The public tip page data for a restaurant.
#[utoipa::path(
    get,
    path = "/api/v1/r/{slug}",
    params(("slug" = String, Path, description = "Restaurant slug")),
    responses(
        (status = 200, description = "Restaurant page data", body = RestaurantPage),
        (status = 404, description = "Unknown slug")
    ),
    tags = ["public"]
)]
#[get("/r/{slug}")]
pub async fn restaurant_page(
    state: web::Data<AppState>,
    slug: web::Path<String>,
) -> ApiResult<web::Json<RestaurantPage>> {
    let restaurant = restaurant_by_slug(&state, &slug).await?;
    let staff = state
        .restaurants
        .active_staff(&restaurant.id)
        .await
        .map_err(|err| Error::internal(err.to_string()))?;

    Ok(web::Json(RestaurantPage {
        restaurant: RestaurantDto::from(&restaurant),
        staff: staff.iter().map(StaffDto::from).collect(),
    }))
}

/// Tip submission payload.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TipRequest {
    /// Staff member the tip is addressed to.
    pub staff_id: Option<Uuid>,
    /// Amount in cents; must be positive.
    pub amount_cents: i32,
    /// Payment-method label chosen in the UI.
    pub method_ui: String,
}

/// Tip submission response.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TipResponse {
    /// The recorded tip.
    pub tip: TipDto,
    /// XP awarded to the tipper.
    pub xp_awarded: u32,
    /// Tier standing after the award, for identified tippers.
    pub progress: Option<ProgressDto>,
}

/// Record a tip.
#[utoipa::path(
    post,
    path = "/api/v1/r/{slug}/tips",
    params(("slug" = String, Path, description = "Restaurant slug")),
    request_body = TipRequest,
    responses(
        (status = 200, description = "Tip recorded", body = TipResponse),
        (status = 400, description = "Validation failure"),
        (status = 404, description = "Unknown slug")
    ),
    tags = ["public"]
)]
#[post("/r/{slug}/tips")]
pub async fn submit_tip(
    state: web::Data<AppState>,
    session: Session,
    req: HttpRequest,
    slug: web::Path<String>,
    body: web::Json<TipRequest>,
) -> ApiResult<HttpResponse> {
    let restaurant = restaurant_by_slug(&state, &slug).await?;
    let (user, device_cookie) = resolve_writer(&state, &session, &req).await?;

    let receipt = state
        .tipping
        .record_tip(
            &restaurant,
            body.staff_id.map(StaffId::from_uuid),
            user.as_ref(),
            body.amount_cents,
            &body.method_ui,
        )
        .await?;

    let progress = match receipt.xp_total {
        Some(xp) => Some(ProgressDto::from(&state.progress.progress(xp).await?)),
        None => None,
    };

    let payload = TipResponse {
        tip: TipDto::from(&receipt.tip),
        xp_awarded: receipt.xp_awarded,
        progress,
    };

    let mut response = HttpResponse::Ok();
    if let Some(cookie) = device_cookie {
        response.cookie(cookie);
    }
    Ok(response.json(payload))
}

/// Uploaded photo payload: base64 bytes plus declared format.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PhotoRequest {
    /// Base64-encoded image bytes.
    pub data_base64: String,
    /// `jpeg` or `png`.
    pub format: String,
}

/// Review submission payload.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    /// Staff member the review is about.
    pub staff_id: Option<Uuid>,
    /// Rating, 1..=5.
    pub rating: u8,
    /// Free-text comment.
    pub comment: Option<String>,
    /// Consent to public sharing.
    #[serde(default)]
    pub share_allowed: bool,
    /// Optional photo.
    pub photo: Option<PhotoRequest>,
}

/// Review submission response.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    /// The recorded review.
    pub review: ReviewDto,
    /// XP awarded to the reviewer.
    pub xp_awarded: u32,
}

fn decode_photo(photo: PhotoRequest) -> Result<PhotoUpload, Error> {
    let format = match photo.format.as_str() {
        "jpeg" | "jpg" => ImageFormat::Jpeg,
        "png" => ImageFormat::Png,
        other => {
            return Err(Error::invalid_request(format!(
                "unsupported image format: {other}"
            )))
        }
    };
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(photo.data_base64.as_bytes())
        .map_err(|_| Error::invalid_request("photo is not valid base64"))?;
    Ok(PhotoUpload { bytes, format })
}

/// Record a review, optionally with a photo.
#[utoipa::path(
    post,
    path = "/api/v1/r/{slug}/reviews",
    params(("slug" = String, Path, description = "Restaurant slug")),
    request_body = ReviewRequest,
    responses(
        (status = 200, description = "Review recorded", body = ReviewResponse),
        (status = 400, description = "Validation failure"),
        (status = 404, description = "Unknown slug")
    ),
    tags = ["public"]
)]
#[post("/r/{slug}/reviews")]
pub async fn submit_review(
    state: web::Data<AppState>,
    session: Session,
    req: HttpRequest,
    slug: web::Path<String>,
    body: web::Json<ReviewRequest>,
) -> ApiResult<HttpResponse> {
    let restaurant = restaurant_by_slug(&state, &slug).await?;
    let (user, device_cookie) = resolve_writer(&state, &session, &req).await?;

    let ReviewRequest {
        staff_id,
        rating,
        comment,
        share_allowed,
        photo,
    } = body.into_inner();
    let photo = photo.map(decode_photo).transpose()?;

    let receipt = state
        .reviews
        .submit_review(
            &restaurant,
            staff_id.map(StaffId::from_uuid),
            user.as_ref(),
            rating,
            comment.as_deref(),
            share_allowed,
            photo,
        )
        .await?;

    let payload = ReviewResponse {
        review: ReviewDto::from(&receipt.review),
        xp_awarded: receipt.xp_awarded,
    };

    let mut response = HttpResponse::Ok();
    if let Some(cookie) = device_cookie {
        response.cookie(cookie);
    }
    Ok(response.json(payload))
}

/// The current visitor's tier standing, for the thanks page.
#[utoipa::path(
    get,
    path = "/api/v1/me/progress",
    responses((status = 200, description = "Tier standing", body = ProgressDto)),
    tags = ["profile"]
)]
#[get("/me/progress")]
pub async fn my_progress(
    state: web::Data<AppState>,
    session: Session,
    req: HttpRequest,
) -> ApiResult<web::Json<ProgressDto>> {
    let actor = current_actor(&session, &req)?;
    let xp = match state.accounts.resolve_actor(&actor).await? {
        Some(user) => user.xp,
        None => 0,
    };
    let progress = state.progress.progress(xp).await?;
    Ok(web::Json(ProgressDto::from(&progress)))
}
