//! Like queries
//!
//! A like links a user to an artist; the artist side is the owning user id.
//! Every mutation is idempotent.

use crate::row::now_millis;
use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::HashMap;
use tattmap_core::{
    error::{Result, TattmapError},
    traits::LikeCounter,
    types::UserId,
};

/// Like an artist. Liking twice is a no-op.
pub async fn like(pool: &SqlitePool, user_id: &UserId, artist_id: &UserId) -> Result<()> {
    ensure_parties_exist(pool, user_id, artist_id).await?;

    sqlx::query(
        "INSERT INTO likes (user_id, artist_id, created_at) VALUES (?, ?, ?)
         ON CONFLICT(user_id, artist_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(artist_id)
    .bind(now_millis())
    .execute(pool)
    .await?;

    Ok(())
}

/// Remove a like. Removing a like that does not exist is a no-op, even when
/// the artist or user is gone.
pub async fn unlike(pool: &SqlitePool, user_id: &UserId, artist_id: &UserId) -> Result<()> {
    sqlx::query("DELETE FROM likes WHERE user_id = ? AND artist_id = ?")
        .bind(user_id)
        .bind(artist_id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn is_liked(pool: &SqlitePool, user_id: &UserId, artist_id: &UserId) -> Result<bool> {
    let found: Option<i64> =
        sqlx::query_scalar("SELECT 1 FROM likes WHERE user_id = ? AND artist_id = ?")
            .bind(user_id)
            .bind(artist_id)
            .fetch_optional(pool)
            .await?;

    Ok(found.is_some())
}

/// Number of likes for one artist
pub async fn count(pool: &SqlitePool, artist_id: &UserId) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE artist_id = ?")
        .bind(artist_id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// Like counts for many artists in one grouped query.
///
/// Artists nobody liked are absent from the map.
pub async fn count_for_artists(
    pool: &SqlitePool,
    artist_ids: &[UserId],
) -> Result<HashMap<UserId, i64>> {
    if artist_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT artist_id, COUNT(*) FROM likes WHERE artist_id IN (");
    let mut separated = builder.separated(", ");
    for id in artist_ids {
        separated.push_bind(id.as_str().to_string());
    }
    separated.push_unseparated(") GROUP BY artist_id");

    let rows: Vec<(String, i64)> = builder.build_query_as().fetch_all(pool).await?;

    Ok(rows
        .into_iter()
        .map(|(artist_id, count)| (UserId::new(artist_id), count))
        .collect())
}

/// Artist user ids a user has liked, most recent first
pub async fn liked_by(pool: &SqlitePool, user_id: &UserId) -> Result<Vec<UserId>> {
    let ids: Vec<String> = sqlx::query_scalar(
        "SELECT artist_id FROM likes WHERE user_id = ? ORDER BY created_at DESC, artist_id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(ids.into_iter().map(UserId::new).collect())
}

async fn ensure_parties_exist(pool: &SqlitePool, user_id: &UserId, artist_id: &UserId) -> Result<()> {
    let (user_exists, artist_exists): (bool, bool) = sqlx::query_as(
        "SELECT
             EXISTS(SELECT 1 FROM users WHERE id = ?),
             EXISTS(SELECT 1 FROM artists WHERE user_id = ?)",
    )
    .bind(user_id)
    .bind(artist_id)
    .fetch_one(pool)
    .await?;

    if !user_exists {
        return Err(TattmapError::not_found("User", user_id.as_str()));
    }
    if !artist_exists {
        return Err(TattmapError::not_found("Artist", artist_id.as_str()));
    }
    Ok(())
}

/// [`LikeCounter`] backed by the likes table
#[derive(Clone)]
pub struct SqliteLikeCounter {
    pool: SqlitePool,
}

impl SqliteLikeCounter {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LikeCounter for SqliteLikeCounter {
    async fn count_likes(&self, artist_ids: &[UserId]) -> Result<HashMap<UserId, i64>> {
        count_for_artists(&self.pool, artist_ids).await
    }
}
