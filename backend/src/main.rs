//! Backend entry-point: schema bootstrap, state assembly, HTTP server.

use std::sync::Arc;

use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::cookie::SameSite;
use actix_web::{web, App, HttpServer};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use backend::api::health::{live, ready, HealthState};
#[cfg(debug_assertions)]
use backend::doc::ApiDoc;
use backend::outbound::persistence::{run_schema_bootstrap, DbPool, PoolConfig};
use backend::outbound::storage::FsImageStore;
use backend::server::{configure_api, AppConfig, AppState};
use backend::Trace;

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let config = AppConfig::from_env().map_err(std::io::Error::other)?;
    let key = config.load_session_key().map_err(std::io::Error::other)?;

    // Serialise schema bootstrap across concurrently starting instances.
    let database_url = config.database_url.clone();
    tokio::task::spawn_blocking(move || run_schema_bootstrap(&database_url))
        .await
        .map_err(std::io::Error::other)?
        .map_err(std::io::Error::other)?;

    let pool = DbPool::new(PoolConfig::new(&config.database_url))
        .await
        .map_err(std::io::Error::other)?;
    let images = Arc::new(
        FsImageStore::new(config.uploads_dir.clone()).map_err(std::io::Error::other)?,
    );
    let state = AppState::build(pool, images, config.max_image_bytes);

    let health_state = web::Data::new(HealthState::new());
    let server_health_state = health_state.clone();
    let cookie_secure = config.cookie_secure;

    info!(addr = %config.bind_addr, "starting server");
    let server = HttpServer::new(move || {
        let session = SessionMiddleware::builder(CookieSessionStore::default(), key.clone())
            .cookie_name("session".into())
            .cookie_path("/".into())
            .cookie_secure(cookie_secure)
            .cookie_http_only(true)
            .cookie_same_site(SameSite::Lax)
            .build();

        let app = App::new()
            .app_data(server_health_state.clone())
            .app_data(web::Data::new(state.clone()))
            .wrap(Trace)
            .service(
                web::scope("/api/v1")
                    .wrap(session)
                    .configure(configure_api),
            )
            .service(backend::api::uploads::serve_upload)
            .service(ready)
            .service(live);

        #[cfg(debug_assertions)]
        let app =
            app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

        #[cfg(feature = "metrics")]
        let app = app.wrap(make_metrics());

        app
    })
    .bind(config.bind_addr)?;

    health_state.mark_ready();
    server.run().await
}

#[cfg(feature = "metrics")]
fn make_metrics() -> actix_web_prom::PrometheusMetrics {
    use actix_web_prom::PrometheusMetricsBuilder;

    PrometheusMetricsBuilder::new("tipping")
        .endpoint("/metrics")
        .build()
        .expect("configure Prometheus metrics")
}
