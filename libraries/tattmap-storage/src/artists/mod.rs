//! Artist profile queries

use crate::row::{into_artists, now_millis, ArtistRow, ARTIST_COLUMNS};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use std::collections::{HashMap, HashSet};
use tattmap_core::{
    error::{Result, TattmapError},
    geo::to_micro_degrees,
    types::{Artist, ArtistWithLikes, UpsertArtist, UserId},
};

#[derive(sqlx::FromRow)]
struct ArtistLikesRow {
    #[sqlx(flatten)]
    artist: ArtistRow,
    likes: i64,
}

pub async fn get_by_user_id(pool: &SqlitePool, user_id: &UserId) -> Result<Option<Artist>> {
    let row: Option<ArtistRow> = sqlx::query_as(&format!(
        "SELECT {ARTIST_COLUMNS} FROM artists a WHERE a.user_id = ?"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    row.map(ArtistRow::into_artist).transpose()
}

/// Batch lookup preserving request order.
///
/// Duplicate ids collapse to their first occurrence; unknown ids are dropped.
pub async fn get_by_user_ids(pool: &SqlitePool, user_ids: &[UserId]) -> Result<Vec<Artist>> {
    let mut seen = HashSet::new();
    let unique: Vec<&UserId> = user_ids.iter().filter(|id| seen.insert(*id)).collect();
    if unique.is_empty() {
        return Ok(Vec::new());
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        "SELECT {ARTIST_COLUMNS} FROM artists a WHERE a.user_id IN ("
    ));
    let mut separated = builder.separated(", ");
    for id in &unique {
        separated.push_bind(id.as_str().to_string());
    }
    separated.push_unseparated(")");

    let rows: Vec<ArtistRow> = builder.build_query_as().fetch_all(pool).await?;
    let mut by_id: HashMap<UserId, Artist> = into_artists(rows)?
        .into_iter()
        .map(|artist| (artist.user_id.clone(), artist))
        .collect();

    Ok(unique.into_iter().filter_map(|id| by_id.remove(id)).collect())
}

/// Most liked artists, ties by recency then id
pub async fn top_by_likes(pool: &SqlitePool, limit: i64) -> Result<Vec<ArtistWithLikes>> {
    let rows: Vec<ArtistLikesRow> = sqlx::query_as(&format!(
        "SELECT {ARTIST_COLUMNS}, COUNT(l.user_id) AS likes
         FROM artists a
         LEFT JOIN likes l ON l.artist_id = a.user_id
         GROUP BY a.id
         ORDER BY likes DESC, a.created_at DESC, a.id DESC
         LIMIT ?"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| {
            Ok(ArtistWithLikes {
                artist: row.artist.into_artist()?,
                likes: row.likes,
            })
        })
        .collect()
}

/// Create or replace the caller's profile.
///
/// Runs in one transaction together with the spatial index update. On
/// update, `photos` and the work-type flags keep their stored values when
/// omitted and the avatar is never touched; on create the avatar is copied
/// from the user.
pub async fn upsert(pool: &SqlitePool, user_id: &UserId, payload: UpsertArtist) -> Result<Artist> {
    payload.validate()?;
    let payload = payload.normalized();

    let mut tx = pool.begin().await?;

    let user_avatar: Option<Option<String>> =
        sqlx::query_scalar("SELECT avatar FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;
    let Some(user_avatar) = user_avatar else {
        return Err(TattmapError::not_found("User", user_id.as_str()));
    };

    let existing = fetch_by_user_id(&mut tx, user_id).await?;
    let now = now_millis();

    let photos = match (&payload.photos, &existing) {
        (Some(photos), _) => photos.clone(),
        (None, Some(artist)) => artist.photos.clone(),
        (None, None) => Vec::new(),
    };
    let flag = |given: Option<bool>, stored: fn(&Artist) -> bool| {
        given.unwrap_or_else(|| existing.as_ref().is_some_and(stored))
    };
    let beginner = flag(payload.beginner, |a| a.beginner);
    let color = flag(payload.color, |a| a.color);
    let black_and_gray = flag(payload.black_and_gray, |a| a.black_and_gray);
    let coverups = flag(payload.coverups, |a| a.coverups);

    let styles = serde_json::to_string(&payload.styles)?;
    let photos = serde_json::to_string(&photos)?;
    let geo_raw = payload
        .geo_raw
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO artists (
             user_id, nickname, description, avatar,
             city, country, country_code, region_name, region_code, region_code_full,
             address, postcode, street_name, address_number,
             lat_e6, lon_e6, routable_lat_e6, routable_lon_e6,
             styles, beginner, color, black_and_gray, coverups, photos,
             instagram, email, website, tiktok, facebook, telegram, whatsapp, wechat, snapchat,
             geo_raw, created_at, updated_at
         ) VALUES (
             ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
             ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?
         )
         ON CONFLICT(user_id) DO UPDATE SET
             nickname = excluded.nickname,
             description = excluded.description,
             city = excluded.city,
             country = excluded.country,
             country_code = excluded.country_code,
             region_name = excluded.region_name,
             region_code = excluded.region_code,
             region_code_full = excluded.region_code_full,
             address = excluded.address,
             postcode = excluded.postcode,
             street_name = excluded.street_name,
             address_number = excluded.address_number,
             lat_e6 = excluded.lat_e6,
             lon_e6 = excluded.lon_e6,
             routable_lat_e6 = excluded.routable_lat_e6,
             routable_lon_e6 = excluded.routable_lon_e6,
             styles = excluded.styles,
             beginner = excluded.beginner,
             color = excluded.color,
             black_and_gray = excluded.black_and_gray,
             coverups = excluded.coverups,
             photos = excluded.photos,
             instagram = excluded.instagram,
             email = excluded.email,
             website = excluded.website,
             tiktok = excluded.tiktok,
             facebook = excluded.facebook,
             telegram = excluded.telegram,
             whatsapp = excluded.whatsapp,
             wechat = excluded.wechat,
             snapchat = excluded.snapchat,
             geo_raw = excluded.geo_raw,
             updated_at = excluded.updated_at
         RETURNING id",
    )
    .bind(user_id)
    .bind(&payload.nickname)
    .bind(&payload.description)
    .bind(user_avatar.unwrap_or_default())
    .bind(&payload.city)
    .bind(&payload.country)
    .bind(&payload.country_code)
    .bind(&payload.region_name)
    .bind(&payload.region_code)
    .bind(&payload.region_code_full)
    .bind(&payload.address)
    .bind(&payload.postcode)
    .bind(&payload.street_name)
    .bind(&payload.address_number)
    .bind(payload.lat.map(to_micro_degrees))
    .bind(payload.lon.map(to_micro_degrees))
    .bind(payload.routable_lat.map(to_micro_degrees))
    .bind(payload.routable_lon.map(to_micro_degrees))
    .bind(styles)
    .bind(beginner)
    .bind(color)
    .bind(black_and_gray)
    .bind(coverups)
    .bind(photos)
    .bind(&payload.instagram)
    .bind(&payload.email)
    .bind(&payload.website)
    .bind(&payload.tiktok)
    .bind(&payload.facebook)
    .bind(&payload.telegram)
    .bind(&payload.whatsapp)
    .bind(&payload.wechat)
    .bind(&payload.snapchat)
    .bind(geo_raw)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    sync_location(&mut tx, id, payload.lat.zip(payload.lon)).await?;

    let artist = fetch_by_user_id(&mut tx, user_id)
        .await?
        .ok_or_else(|| TattmapError::storage("artist vanished during upsert"))?;

    tx.commit().await?;

    tracing::debug!(
        user_id = %user_id,
        created = existing.is_none(),
        "Artist profile saved"
    );

    Ok(artist)
}

/// Delete the caller's profile together with its likes and index entry.
///
/// Returns the deleted profile so callers can clean up its photos, or `None`
/// when there was nothing to delete.
pub async fn delete_for_user(pool: &SqlitePool, user_id: &UserId) -> Result<Option<Artist>> {
    let mut tx = pool.begin().await?;

    let Some(artist) = fetch_by_user_id(&mut tx, user_id).await? else {
        return Ok(None);
    };

    sqlx::query("DELETE FROM likes WHERE artist_id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM artist_locations WHERE id = ?")
        .bind(artist.id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM artists WHERE id = ?")
        .bind(artist.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(Some(artist))
}

pub async fn count(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM artists")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

async fn fetch_by_user_id(conn: &mut SqliteConnection, user_id: &UserId) -> Result<Option<Artist>> {
    let row: Option<ArtistRow> = sqlx::query_as(&format!(
        "SELECT {ARTIST_COLUMNS} FROM artists a WHERE a.user_id = ?"
    ))
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(ArtistRow::into_artist).transpose()
}

/// Replace the R*Tree entry for an artist; no point means no entry
async fn sync_location(
    conn: &mut SqliteConnection,
    artist_id: i64,
    point: Option<(f64, f64)>,
) -> Result<()> {
    sqlx::query("DELETE FROM artist_locations WHERE id = ?")
        .bind(artist_id)
        .execute(&mut *conn)
        .await?;

    if let Some((lat, lon)) = point {
        sqlx::query(
            "INSERT INTO artist_locations (id, min_lat, max_lat, min_lon, max_lon)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(artist_id)
        .bind(lat)
        .bind(lat)
        .bind(lon)
        .bind(lon)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}
