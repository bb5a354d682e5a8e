/// API route modules
pub mod artists;
pub mod auth;
pub mod health;
pub mod likes;
pub mod params;
pub mod uploads;

use crate::{
    config::CorsSettings, middleware, services::photo_storage::MAX_UPLOAD_BYTES, state::AppState,
};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::{DefaultMakeSpan, TraceLayer},
};

/// Multipart framing on top of the file itself
const UPLOAD_OVERHEAD_BYTES: usize = 64 * 1024;

/// Build the full HTTP surface for `app_state`
pub fn router(app_state: AppState) -> Router {
    let artist_routes = Router::new()
        .route(
            "/tattoo-artist",
            get(artists::search_artists)
                .post(artists::upsert_artist)
                .delete(artists::delete_artist),
        )
        .route("/tattoo-artist/points", get(artists::artist_points))
        .route("/tattoo-artist/top", get(artists::top_artists))
        .route("/tattoo-artist/by-ids", post(artists::artists_by_ids))
        .route("/tattoo-artist/:id", get(artists::get_artist))
        .route(
            "/tattoo-artist/:id/like",
            get(likes::like_status)
                .post(likes::like_artist)
                .delete(likes::unlike_artist),
        );

    let upload_routes = Router::new()
        .route("/uploads", post(uploads::upload_photo))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + UPLOAD_OVERHEAD_BYTES));

    let mut app = Router::new()
        .route("/health", get(health::health))
        .route("/auth/me", get(auth::me))
        .route("/auth/logout", post(auth::logout))
        .merge(artist_routes)
        .merge(upload_routes);

    // Local photos are served back under their public prefix
    let public_base = app_state.config.storage.public_base_url.trim_end_matches('/');
    if public_base.starts_with('/') && public_base.len() > 1 {
        app = app.nest_service(
            public_base,
            ServeDir::new(&app_state.config.storage.photo_storage_path),
        );
    }

    let cors = cors_layer(&app_state.config.cors);

    app.layer(axum_middleware::from_fn_with_state(
        app_state.clone(),
        middleware::identity_middleware,
    ))
    .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
    .layer(cors)
    .with_state(app_state)
}

/// Credentialed CORS for the configured origins plus production ones
pub fn cors_layer(settings: &CorsSettings) -> CorsLayer {
    let origins: Vec<HeaderValue> = settings
        .origins()
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}
