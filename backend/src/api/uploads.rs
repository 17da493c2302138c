//! Serving stored images back out.

use actix_web::{get, http::header, web, HttpResponse};

use crate::domain::ports::ImageFormat;
use crate::domain::{ApiResult, Error};
use crate::server::AppState;

/// Serve a stored image by name.
#[utoipa::path(
    get,
    path = "/uploads/{name}",
    params(("name" = String, Path, description = "Stored image name")),
    responses(
        (status = 200, description = "Image bytes"),
        (status = 404, description = "Unknown image")
    ),
    tags = ["uploads"]
)]
#[get("/uploads/{name}")]
pub async fn serve_upload(
    state: web::Data<AppState>,
    name: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let bytes = state
        .images
        .load(&name)
        .await
        .map_err(|err| Error::service_unavailable(err.to_string()))?
        .ok_or_else(|| Error::not_found("image not found"))?;

    let content_type = ImageFormat::from_name(&name)
        .map_or("application/octet-stream", ImageFormat::content_type);

    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, content_type))
        .insert_header((header::CACHE_CONTROL, "public, max-age=31536000, immutable"))
        .body(bytes))
}
