//! Admin dashboard: overview, staff management, payouts, coupons, logo.
//!
//! Every handler resolves the caller's admin restaurant first; membership
//! with an admin or manager role is the sole gate.

use actix_session::Session;
use actix_web::{delete, get, post, put, web, HttpResponse};
use base64::Engine;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::dto::{
    CouponDto, OverviewDto, PayoutsDto, StaffDetailDto, StaffDto, TransferDto,
};
use crate::api::identity::require_session_user;
use crate::domain::coupons::CouponId;
use crate::domain::ports::ImageFormat;
use crate::domain::restaurant::{Restaurant, StaffId, StaffMember};
use crate::domain::{ApiResult, Error};
use crate::server::AppState;

async fn require_admin_restaurant(
    state: &AppState,
    session: &Session,
) -> Result<Restaurant, Error> {
    let user_id = require_session_user(session)?;
    state
        .restaurants
        .admin_restaurant_for(&user_id)
        .await
        .map_err(|err| Error::internal(err.to_string()))?
        .ok_or_else(|| Error::forbidden("no dashboard access"))
}

/// The overview page.
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/overview",
    responses(
        (status = 200, description = "Overview", body = OverviewDto),
        (status = 403, description = "No dashboard access")
    ),
    tags = ["dashboard"]
)]
#[get("/dashboard/overview")]
pub async fn overview(
    state: web::Data<AppState>,
    session: Session,
) -> ApiResult<web::Json<OverviewDto>> {
    let restaurant = require_admin_restaurant(&state, &session).await?;
    let overview = state.reporting.overview(&restaurant).await?;
    Ok(web::Json(OverviewDto::from(&overview)))
}

/// The full staff roster, including deactivated members.
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/staff",
    responses(
        (status = 200, description = "Roster", body = [StaffDto]),
        (status = 403, description = "No dashboard access")
    ),
    tags = ["dashboard"]
)]
#[get("/dashboard/staff")]
pub async fn staff_roster(
    state: web::Data<AppState>,
    session: Session,
) -> ApiResult<web::Json<Vec<StaffDto>>> {
    let restaurant = require_admin_restaurant(&state, &session).await?;
    let staff = state
        .restaurants
        .all_staff(&restaurant.id)
        .await
        .map_err(|err| Error::internal(err.to_string()))?;
    Ok(web::Json(staff.iter().map(StaffDto::from).collect()))
}

/// One staff member's drill-down stats.
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/staff/{id}",
    params(("id" = Uuid, Path, description = "Staff id")),
    responses(
        (status = 200, description = "Staff detail", body = StaffDetailDto),
        (status = 404, description = "Unknown staff member")
    ),
    tags = ["dashboard"]
)]
#[get("/dashboard/staff/{id}")]
pub async fn staff_detail(
    state: web::Data<AppState>,
    session: Session,
    id: web::Path<Uuid>,
) -> ApiResult<web::Json<StaffDetailDto>> {
    let restaurant = require_admin_restaurant(&state, &session).await?;
    let detail = state
        .reporting
        .staff_detail(&restaurant, &StaffId::from_uuid(*id))
        .await?;
    Ok(web::Json(StaffDetailDto::from(&detail)))
}

/// Base64 image payload for avatars and logos.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImagePayload {
    /// Base64-encoded image bytes.
    pub data_base64: String,
    /// `jpeg` or `png`.
    pub format: String,
}

async fn store_image(state: &AppState, payload: ImagePayload) -> Result<String, Error> {
    let format = match payload.format.as_str() {
        "jpeg" | "jpg" => ImageFormat::Jpeg,
        "png" => ImageFormat::Png,
        other => {
            return Err(Error::invalid_request(format!(
                "unsupported image format: {other}"
            )))
        }
    };
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.data_base64.as_bytes())
        .map_err(|_| Error::invalid_request("image is not valid base64"))?;
    if bytes.len() > state.max_image_bytes {
        return Err(Error::invalid_request("image exceeds the size limit"));
    }
    state
        .images
        .store(&bytes, format)
        .await
        .map_err(|err| Error::service_unavailable(err.to_string()))
}

/// Staff creation payload.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateStaffRequest {
    /// Display name.
    pub name: String,
    /// Role label.
    pub role: Option<String>,
    /// Short biography.
    pub bio: Option<String>,
    /// Optional avatar image.
    pub avatar: Option<ImagePayload>,
}

/// Add a staff member to the roster.
#[utoipa::path(
    post,
    path = "/api/v1/dashboard/staff",
    request_body = CreateStaffRequest,
    responses(
        (status = 200, description = "Created", body = StaffDto),
        (status = 400, description = "Validation failure")
    ),
    tags = ["dashboard"]
)]
#[post("/dashboard/staff")]
pub async fn create_staff(
    state: web::Data<AppState>,
    session: Session,
    body: web::Json<CreateStaffRequest>,
) -> ApiResult<web::Json<StaffDto>> {
    let restaurant = require_admin_restaurant(&state, &session).await?;
    let CreateStaffRequest {
        name,
        role,
        bio,
        avatar,
    } = body.into_inner();

    let name = name.trim().to_owned();
    if name.is_empty() {
        return Err(Error::invalid_request("name required"));
    }

    let mut member = StaffMember::new(restaurant.id, name);
    member.role = role.map(|r| r.trim().to_owned()).filter(|r| !r.is_empty());
    member.bio = bio.map(|b| b.trim().to_owned()).filter(|b| !b.is_empty());
    if let Some(payload) = avatar {
        member.avatar_image = Some(store_image(&state, payload).await?);
    }

    state
        .restaurants
        .insert_staff(&member)
        .await
        .map_err(|err| Error::internal(err.to_string()))?;
    Ok(web::Json(StaffDto::from(&member)))
}

/// Staff update payload; omitted fields keep their stored values.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStaffRequest {
    /// New display name.
    pub name: Option<String>,
    /// New role label.
    pub role: Option<String>,
    /// New biography.
    pub bio: Option<String>,
    /// Active flag.
    pub active: Option<bool>,
    /// Replacement avatar image.
    pub avatar: Option<ImagePayload>,
}

/// Update a staff member.
#[utoipa::path(
    put,
    path = "/api/v1/dashboard/staff/{id}",
    params(("id" = Uuid, Path, description = "Staff id")),
    request_body = UpdateStaffRequest,
    responses(
        (status = 200, description = "Updated", body = StaffDto),
        (status = 404, description = "Unknown staff member")
    ),
    tags = ["dashboard"]
)]
#[put("/dashboard/staff/{id}")]
pub async fn update_staff(
    state: web::Data<AppState>,
    session: Session,
    id: web::Path<Uuid>,
    body: web::Json<UpdateStaffRequest>,
) -> ApiResult<web::Json<StaffDto>> {
    let restaurant = require_admin_restaurant(&state, &session).await?;
    let mut member = state
        .restaurants
        .staff_member(&restaurant.id, &StaffId::from_uuid(*id))
        .await
        .map_err(|err| Error::internal(err.to_string()))?
        .ok_or_else(|| Error::not_found("staff member not found"))?;

    let UpdateStaffRequest {
        name,
        role,
        bio,
        active,
        avatar,
    } = body.into_inner();

    if let Some(new_name) = name.map(|n| n.trim().to_owned()).filter(|n| !n.is_empty()) {
        member.name = new_name;
    }
    member.role = role.map(|r| r.trim().to_owned()).filter(|r| !r.is_empty());
    member.bio = bio.map(|b| b.trim().to_owned()).filter(|b| !b.is_empty());
    if let Some(flag) = active {
        member.active = flag;
    }
    if let Some(payload) = avatar {
        member.avatar_image = Some(store_image(&state, payload).await?);
    }

    state
        .restaurants
        .update_staff(&member)
        .await
        .map_err(|err| Error::internal(err.to_string()))?;
    Ok(web::Json(StaffDto::from(&member)))
}

/// Deactivate a staff member (soft delete).
#[utoipa::path(
    delete,
    path = "/api/v1/dashboard/staff/{id}",
    params(("id" = Uuid, Path, description = "Staff id")),
    responses(
        (status = 204, description = "Deactivated"),
        (status = 404, description = "Unknown staff member")
    ),
    tags = ["dashboard"]
)]
#[delete("/dashboard/staff/{id}")]
pub async fn deactivate_staff(
    state: web::Data<AppState>,
    session: Session,
    id: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let restaurant = require_admin_restaurant(&state, &session).await?;
    let mut member = state
        .restaurants
        .staff_member(&restaurant.id, &StaffId::from_uuid(*id))
        .await
        .map_err(|err| Error::internal(err.to_string()))?
        .ok_or_else(|| Error::not_found("staff member not found"))?;

    member.active = false;
    state
        .restaurants
        .update_staff(&member)
        .await
        .map_err(|err| Error::internal(err.to_string()))?;
    Ok(HttpResponse::NoContent().finish())
}

/// The payouts page.
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/payouts",
    responses(
        (status = 200, description = "Payouts", body = PayoutsDto),
        (status = 403, description = "No dashboard access")
    ),
    tags = ["dashboard"]
)]
#[get("/dashboard/payouts")]
pub async fn payouts(
    state: web::Data<AppState>,
    session: Session,
) -> ApiResult<web::Json<PayoutsDto>> {
    let restaurant = require_admin_restaurant(&state, &session).await?;
    let view = state.reporting.payouts(&restaurant).await?;
    Ok(web::Json(PayoutsDto::from(&view)))
}

/// Payout request payload.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendPayoutRequest {
    /// Staff member to pay out.
    pub staff_id: Uuid,
}

/// Record a transfer of the full pending amount.
#[utoipa::path(
    post,
    path = "/api/v1/dashboard/payouts",
    request_body = SendPayoutRequest,
    responses(
        (status = 200, description = "Transfer recorded", body = TransferDto),
        (status = 404, description = "Unknown staff member"),
        (status = 409, description = "Nothing pending")
    ),
    tags = ["dashboard"]
)]
#[post("/dashboard/payouts")]
pub async fn send_payout(
    state: web::Data<AppState>,
    session: Session,
    body: web::Json<SendPayoutRequest>,
) -> ApiResult<web::Json<TransferDto>> {
    let restaurant = require_admin_restaurant(&state, &session).await?;
    let transfer = state
        .reporting
        .send_payout(&restaurant, &StaffId::from_uuid(body.staff_id))
        .await?;
    Ok(web::Json(TransferDto::from(&transfer)))
}

/// The coupon catalogue, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/coupons",
    responses(
        (status = 200, description = "Coupons", body = [CouponDto]),
        (status = 403, description = "No dashboard access")
    ),
    tags = ["dashboard"]
)]
#[get("/dashboard/coupons")]
pub async fn list_coupons(
    state: web::Data<AppState>,
    session: Session,
) -> ApiResult<web::Json<Vec<CouponDto>>> {
    let restaurant = require_admin_restaurant(&state, &session).await?;
    let coupons = state.coupons.list(&restaurant.id).await?;
    Ok(web::Json(coupons.iter().map(CouponDto::from).collect()))
}

/// Coupon creation payload.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCouponRequest {
    /// Short title.
    pub title: String,
    /// Longer description.
    pub description: Option<String>,
    /// XP required to claim.
    #[serde(default)]
    pub required_xp: u32,
    /// Claimability flag.
    #[serde(default)]
    pub active: bool,
}

/// Create a coupon.
#[utoipa::path(
    post,
    path = "/api/v1/dashboard/coupons",
    request_body = CreateCouponRequest,
    responses(
        (status = 200, description = "Created", body = CouponDto),
        (status = 400, description = "Validation failure")
    ),
    tags = ["dashboard"]
)]
#[post("/dashboard/coupons")]
pub async fn create_coupon(
    state: web::Data<AppState>,
    session: Session,
    body: web::Json<CreateCouponRequest>,
) -> ApiResult<web::Json<CouponDto>> {
    let restaurant = require_admin_restaurant(&state, &session).await?;
    let coupon = state
        .coupons
        .create(
            &restaurant.id,
            &body.title,
            body.description.as_deref(),
            body.required_xp,
            body.active,
        )
        .await?;
    Ok(web::Json(CouponDto::from(&coupon)))
}

/// Coupon update payload.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCouponRequest {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New XP requirement.
    pub required_xp: Option<u32>,
    /// Claimability flag.
    #[serde(default)]
    pub active: bool,
}

/// Update a coupon.
#[utoipa::path(
    put,
    path = "/api/v1/dashboard/coupons/{id}",
    params(("id" = Uuid, Path, description = "Coupon id")),
    request_body = UpdateCouponRequest,
    responses(
        (status = 200, description = "Updated", body = CouponDto),
        (status = 404, description = "Unknown coupon")
    ),
    tags = ["dashboard"]
)]
#[put("/dashboard/coupons/{id}")]
pub async fn update_coupon(
    state: web::Data<AppState>,
    session: Session,
    id: web::Path<Uuid>,
    body: web::Json<UpdateCouponRequest>,
) -> ApiResult<web::Json<CouponDto>> {
    let restaurant = require_admin_restaurant(&state, &session).await?;
    let coupon = state
        .coupons
        .update(
            &restaurant.id,
            &CouponId::from_uuid(*id),
            body.title.as_deref(),
            body.description.as_deref(),
            body.required_xp,
            body.active,
        )
        .await?;
    Ok(web::Json(CouponDto::from(&coupon)))
}

/// Delete a coupon.
#[utoipa::path(
    delete,
    path = "/api/v1/dashboard/coupons/{id}",
    params(("id" = Uuid, Path, description = "Coupon id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Unknown coupon")
    ),
    tags = ["dashboard"]
)]
#[delete("/dashboard/coupons/{id}")]
pub async fn delete_coupon(
    state: web::Data<AppState>,
    session: Session,
    id: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let restaurant = require_admin_restaurant(&state, &session).await?;
    state
        .coupons
        .delete(&restaurant.id, &CouponId::from_uuid(*id))
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Set the restaurant logo.
#[utoipa::path(
    post,
    path = "/api/v1/dashboard/logo",
    request_body = ImagePayload,
    responses(
        (status = 204, description = "Logo stored"),
        (status = 400, description = "Validation failure")
    ),
    tags = ["dashboard"]
)]
#[post("/dashboard/logo")]
pub async fn set_logo(
    state: web::Data<AppState>,
    session: Session,
    body: web::Json<ImagePayload>,
) -> ApiResult<HttpResponse> {
    let restaurant = require_admin_restaurant(&state, &session).await?;
    let name = store_image(&state, body.into_inner()).await?;
    state
        .restaurants
        .set_logo(&restaurant.id, Some(&name))
        .await
        .map_err(|err| Error::internal(err.to_string()))?;
    Ok(HttpResponse::NoContent().finish())
}

/// Remove the restaurant logo.
#[utoipa::path(
    delete,
    path = "/api/v1/dashboard/logo",
    responses((status = 204, description = "Logo removed")),
    tags = ["dashboard"]
)]
#[delete("/dashboard/logo")]
pub async fn remove_logo(
    state: web::Data<AppState>,
    session: Session,
) -> ApiResult<HttpResponse> {
    let restaurant = require_admin_restaurant(&state, &session).await?;
    state
        .restaurants
        .set_logo(&restaurant.id, None)
        .await
        .map_err(|err| Error::internal(err.to_string()))?;
    Ok(HttpResponse::NoContent().finish())
}
