//! Authentication handlers: register, login, logout.

use actix_session::Session;
use actix_web::{post, web, HttpResponse};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::api::dto::UserDto;
use crate::api::identity::{log_in, log_out};
use crate::domain::ApiResult;
use crate::server::AppState;

/// Registration payload.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Login email.
    pub email: String,
    /// Plain-text password; hashed before storage.
    pub password: String,
    /// Display name.
    pub display_name: String,
}

/// Login payload.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Login email.
    pub email: String,
    /// Plain-text password.
    pub password: String,
}

/// Create an account and start a session for it.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created", body = UserDto),
        (status = 400, description = "Validation failure"),
        (status = 409, description = "Email already registered")
    ),
    tags = ["auth"]
)]
#[post("/auth/register")]
pub async fn register(
    state: web::Data<AppState>,
    session: Session,
    body: web::Json<RegisterRequest>,
) -> ApiResult<web::Json<UserDto>> {
    let user = state
        .accounts
        .register(&body.email, &body.password, &body.display_name)
        .await?;
    log_in(&session, &user.id)?;
    Ok(web::Json(UserDto::from(&user)))
}

/// Authenticate and start a session.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = UserDto),
        (status = 401, description = "Invalid credentials")
    ),
    tags = ["auth"]
)]
#[post("/auth/login")]
pub async fn login(
    state: web::Data<AppState>,
    session: Session,
    body: web::Json<LoginRequest>,
) -> ApiResult<web::Json<UserDto>> {
    let user = state.accounts.authenticate(&body.email, &body.password).await?;
    log_in(&session, &user.id)?;
    Ok(web::Json(UserDto::from(&user)))
}

/// End the current session.
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses((status = 204, description = "Session ended")),
    tags = ["auth"]
)]
#[post("/auth/logout")]
pub async fn logout(session: Session) -> HttpResponse {
    log_out(&session);
    HttpResponse::NoContent().finish()
}
