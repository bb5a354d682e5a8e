/// Artist API routes
use crate::{
    api::params::{PointsQuery, SearchQuery, TopQuery},
    error::{Result, ServerError},
    middleware::AuthenticatedUser,
    services::profiles,
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tattmap_core::{
    likes::attach_like_counts, ArtistPoint, ArtistWithLikes, SearchPage, UpsertArtist, UserId,
};
use tattmap_storage::{artists, likes, SqliteLikeCounter};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ByIdsRequest {
    pub user_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// GET /tattoo-artist
pub async fn search_artists(
    State(app_state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchPage<ArtistWithLikes>>> {
    let params = query.into_params(app_state.config.search.default_limit)?;
    let page = app_state.search.search(&params).await?;
    Ok(Json(page))
}

/// GET /tattoo-artist/points
pub async fn artist_points(
    State(app_state): State<AppState>,
    Query(query): Query<PointsQuery>,
) -> Result<Json<Vec<ArtistPoint>>> {
    let (bbox, location) = query.into_parts()?;
    let points = app_state.search.points(bbox, &location).await?;
    Ok(Json(points))
}

/// GET /tattoo-artist/:id
pub async fn get_artist(
    Path(id): Path<String>,
    State(app_state): State<AppState>,
) -> Result<Json<ArtistWithLikes>> {
    let user_id = UserId::parse(&id)?;
    let pool = app_state.db.pool();

    let artist = artists::get_by_user_id(pool, &user_id)
        .await?
        .ok_or_else(|| ServerError::NotFound("Artist not found".to_string()))?;
    let likes = likes::count(pool, &user_id).await?;

    Ok(Json(ArtistWithLikes { artist, likes }))
}

/// POST /tattoo-artist/by-ids
pub async fn artists_by_ids(
    State(app_state): State<AppState>,
    Json(req): Json<ByIdsRequest>,
) -> Result<Json<Vec<ArtistWithLikes>>> {
    let max = app_state.config.search.max_batch_ids;
    if req.user_ids.len() > max {
        return Err(ServerError::BadRequest(format!(
            "at most {max} user ids per request"
        )));
    }

    let user_ids = req
        .user_ids
        .iter()
        .map(|raw| UserId::parse(raw))
        .collect::<tattmap_core::Result<Vec<_>>>()?;

    let pool = app_state.db.pool();
    let found = artists::get_by_user_ids(pool, &user_ids).await?;
    let counter = SqliteLikeCounter::new(pool.clone());
    let items = attach_like_counts(&counter, found).await?;

    Ok(Json(items))
}

/// GET /tattoo-artist/top
pub async fn top_artists(
    State(app_state): State<AppState>,
    Query(query): Query<TopQuery>,
) -> Result<Json<Vec<ArtistWithLikes>>> {
    let requested = query.limit(app_state.config.search.top_default_limit)?;
    let limit = app_state.search.clamp_limit(requested);
    let top = artists::top_by_likes(app_state.db.pool(), limit).await?;
    Ok(Json(top))
}

/// POST /tattoo-artist
/// Create or update the caller's own profile
pub async fn upsert_artist(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Json(payload): Json<UpsertArtist>,
) -> Result<Json<ArtistWithLikes>> {
    let user_id = auth.user_id();
    let pool = app_state.db.pool();

    let artist = artists::upsert(pool, &user_id, payload).await?;
    let likes = likes::count(pool, &user_id).await?;

    tracing::info!(user_id = %user_id, "Artist profile saved");

    Ok(Json(ArtistWithLikes { artist, likes }))
}

/// DELETE /tattoo-artist
pub async fn delete_artist(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<SuccessResponse>> {
    let user_id = auth.user_id();
    profiles::delete_profile(&app_state.db, app_state.photo_storage.as_ref(), &user_id).await?;

    Ok(Json(SuccessResponse { success: true }))
}
