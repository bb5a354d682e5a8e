//! User queries

use crate::row::{now_millis, UserRow};
use sqlx::SqlitePool;
use tattmap_core::{
    error::Result,
    types::{GoogleProfile, Role, User, UserId},
};

const USER_COLUMNS: &str = "id, google_id, email, name, avatar, role, created_at";

/// Find or create the user behind a Google identity.
///
/// Existing users get their email, name and avatar refreshed; role and id
/// never change here.
pub async fn upsert_google_user(
    pool: &SqlitePool,
    profile: &GoogleProfile,
    role: Role,
) -> Result<User> {
    let id = UserId::generate();

    let row: UserRow = sqlx::query_as(&format!(
        "INSERT INTO users (id, google_id, email, name, avatar, role, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(google_id) DO UPDATE SET
             email = excluded.email,
             name = excluded.name,
             avatar = excluded.avatar
         RETURNING {USER_COLUMNS}"
    ))
    .bind(&id)
    .bind(&profile.google_id)
    .bind(&profile.email)
    .bind(&profile.name)
    .bind(&profile.avatar)
    .bind(role.as_str())
    .bind(now_millis())
    .fetch_one(pool)
    .await?;

    row.into_user()
}

pub async fn get_by_id(pool: &SqlitePool, id: &UserId) -> Result<Option<User>> {
    let row: Option<UserRow> =
        sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await?;

    row.map(UserRow::into_user).transpose()
}

/// Get all users, oldest first
pub async fn get_all(pool: &SqlitePool) -> Result<Vec<User>> {
    let rows: Vec<UserRow> = sqlx::query_as(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY created_at, id"
    ))
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(UserRow::into_user).collect()
}

pub async fn exists(pool: &SqlitePool, id: &UserId) -> Result<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(found.is_some())
}

/// Change a user's role, returning `false` when the user does not exist
pub async fn set_role(pool: &SqlitePool, id: &UserId, role: Role) -> Result<bool> {
    let result = sqlx::query("UPDATE users SET role = ? WHERE id = ?")
        .bind(role.as_str())
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
