/// Like API routes
use crate::{error::Result, middleware::AuthenticatedUser, state::AppState};
use axum::{
    extract::{Path, State},
    Json,
};
use tattmap_core::{LikeStatus, LikeSummary, UserId};
use tattmap_storage::likes;

/// POST /tattoo-artist/:id/like
pub async fn like_artist(
    Path(id): Path<String>,
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<LikeSummary>> {
    let artist_id = UserId::parse(&id)?;
    let pool = app_state.db.pool();

    likes::like(pool, &auth.user_id(), &artist_id).await?;
    let likes = likes::count(pool, &artist_id).await?;

    Ok(Json(LikeSummary { artist_id, likes }))
}

/// DELETE /tattoo-artist/:id/like
pub async fn unlike_artist(
    Path(id): Path<String>,
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<LikeSummary>> {
    let artist_id = UserId::parse(&id)?;
    let pool = app_state.db.pool();

    likes::unlike(pool, &auth.user_id(), &artist_id).await?;
    let likes = likes::count(pool, &artist_id).await?;

    Ok(Json(LikeSummary { artist_id, likes }))
}

/// GET /tattoo-artist/:id/like
pub async fn like_status(
    Path(id): Path<String>,
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<LikeStatus>> {
    let artist_id = UserId::parse(&id)?;
    let liked = likes::is_liked(app_state.db.pool(), &auth.user_id(), &artist_id).await?;
    Ok(Json(LikeStatus { artist_id, liked }))
}
