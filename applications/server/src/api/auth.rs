/// Authentication API routes
use crate::{middleware::AuthenticatedUser, services::Claims, state::AppState};
use axum::{extract::State, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde_json::{json, Value};

/// GET /auth/me
pub async fn me(auth: AuthenticatedUser) -> Json<Claims> {
    Json(auth.0)
}

/// POST /auth/logout
pub async fn logout(
    State(app_state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<Value>) {
    let cookie = Cookie::build((app_state.config.auth.cookie_name.clone(), ""))
        .path("/")
        .build();
    (jar.remove(cookie), Json(json!({ "success": true })))
}
