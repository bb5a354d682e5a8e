//! Test helpers and fixtures for storage integration tests
//!
//! These helpers create test databases using REAL SQLite files (NOT in-memory)
//! so migrations, constraints and the R*Tree index behave as in production.

#![allow(dead_code)]

use sqlx::SqlitePool;
use tattmap_core::types::*;
use tempfile::TempDir;

/// Test database wrapper that cleans up on drop
pub struct TestDb {
    pub pool: SqlitePool,
    _temp_dir: TempDir,
}

impl TestDb {
    /// Create a new test database with migrations applied
    pub async fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");
        let db_url = format!("sqlite://{}", db_path.display());

        let pool = tattmap_storage::create_pool(&db_url)
            .await
            .expect("Failed to create pool");

        tattmap_storage::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        Self {
            pool,
            _temp_dir: temp_dir,
        }
    }

    /// Get the pool reference
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Test fixture: Create a user from a Google identity
pub async fn create_test_user(pool: &SqlitePool, google_id: &str) -> User {
    tattmap_storage::users::upsert_google_user(
        pool,
        &GoogleProfile {
            google_id: google_id.to_string(),
            email: format!("{google_id}@example.com"),
            name: Some(google_id.to_string()),
            avatar: Some(format!("https://img.example.com/{google_id}.png")),
        },
        Role::User,
    )
    .await
    .expect("Failed to create test user")
}

/// Test fixture: Minimal valid profile payload
pub fn profile(nickname: &str, lat: f64, lon: f64) -> UpsertArtist {
    UpsertArtist {
        city: "Amsterdam".to_string(),
        country: "Netherlands".to_string(),
        country_code: Some("nl".to_string()),
        address: "Damrak 1".to_string(),
        nickname: nickname.to_string(),
        description: String::new(),
        styles: vec!["Realism".to_string()],
        instagram: format!("@{nickname}"),
        lat: Some(lat),
        lon: Some(lon),
        ..UpsertArtist::default()
    }
}

/// Test fixture: Create a user and give them an artist profile
pub async fn create_test_artist(pool: &SqlitePool, nickname: &str, lat: f64, lon: f64) -> Artist {
    let user = create_test_user(pool, nickname).await;
    tattmap_storage::artists::upsert(pool, &user.id, profile(nickname, lat, lon))
        .await
        .expect("Failed to create test artist")
}
