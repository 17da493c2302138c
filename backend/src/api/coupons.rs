//! Coupon claim endpoint for authenticated members and guests.

use actix_session::Session;
use actix_web::{post, web, HttpRequest};
use uuid::Uuid;

use crate::api::dto::RedemptionDto;
use crate::api::identity::current_actor;
use crate::domain::coupons::CouponId;
use crate::domain::{ApiResult, Error};
use crate::server::AppState;

/// Claim a coupon for the current identity.
#[utoipa::path(
    post,
    path = "/api/v1/coupons/{id}/claim",
    params(("id" = Uuid, Path, description = "Coupon id")),
    responses(
        (status = 200, description = "Claimed", body = RedemptionDto),
        (status = 401, description = "No identity"),
        (status = 403, description = "Not enough XP"),
        (status = 404, description = "Unknown coupon"),
        (status = 409, description = "Inactive or already claimed")
    ),
    tags = ["coupons"]
)]
#[post("/coupons/{id}/claim")]
pub async fn claim_coupon(
    state: web::Data<AppState>,
    session: Session,
    req: HttpRequest,
    id: web::Path<Uuid>,
) -> ApiResult<web::Json<RedemptionDto>> {
    let actor = current_actor(&session, &req)?;
    let user = state
        .accounts
        .resolve_actor(&actor)
        .await?
        .ok_or_else(|| Error::unauthorized("no identity to claim for"))?;

    let redemption = state
        .coupons
        .claim(&CouponId::from_uuid(*id), &user)
        .await?;
    Ok(web::Json(RedemptionDto::from(&redemption)))
}
