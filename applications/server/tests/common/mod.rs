//! Common test utilities and fixtures
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tattmap_core::types::{Artist, GoogleProfile, Role, UpsertArtist, User};
use tattmap_server::{
    api,
    config::ServerConfig,
    services::{AuthService, LocalPhotoStorage},
    state::AppState,
};
use tattmap_storage::Database;
use tempfile::TempDir;
use tower::util::ServiceExt;

pub const TEST_SECRET: &str = "test-secret-key-0123456789";

/// Router over a fresh database file and photo directory
pub struct TestApp {
    pub router: Router,
    pub db: Arc<Database>,
    pub auth: Arc<AuthService>,
    pub config: Arc<ServerConfig>,
    pub dir: TempDir,
}

impl TestApp {
    /// Send a request and decode the JSON body (`Null` when empty)
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub fn token(&self, user: &User) -> String {
        self.auth.create_token(user).unwrap()
    }
}

pub async fn create_test_app() -> TestApp {
    create_test_app_with(|_| {}).await
}

/// Build a test app after adjusting the default configuration
pub async fn create_test_app_with(adjust: impl FnOnce(&mut ServerConfig)) -> TestApp {
    let dir = TempDir::new().unwrap();

    let mut config = ServerConfig::default();
    config.auth.jwt_secret = TEST_SECRET.to_string();
    config.storage.database_url = format!("sqlite://{}", dir.path().join("test.db").display());
    config.storage.photo_storage_path = dir.path().join("photos");
    adjust(&mut config);
    config.validate().unwrap();

    let db = Arc::new(Database::connect(&config.storage.database_url).await.unwrap());

    let photo_storage = LocalPhotoStorage::new(
        config.storage.photo_storage_path.clone(),
        config.storage.public_base_url.clone(),
    );
    photo_storage.initialize().await.unwrap();

    let auth = Arc::new(AuthService::new(
        &config.auth.jwt_secret,
        config.auth.jwt_expiration_days,
    ));

    let config = Arc::new(config);
    let app_state = AppState::new(
        Arc::clone(&db),
        Arc::clone(&auth),
        Arc::new(photo_storage),
        Arc::clone(&config),
    );

    TestApp {
        router: api::router(app_state),
        db,
        auth,
        config,
        dir,
    }
}

pub async fn create_user(db: &Database, google_id: &str) -> User {
    let profile = GoogleProfile {
        google_id: google_id.to_string(),
        email: format!("{google_id}@example.com"),
        name: Some(google_id.to_string()),
        avatar: Some(format!("https://example.com/{google_id}.png")),
    };
    tattmap_storage::users::upsert_google_user(db.pool(), &profile, Role::User)
        .await
        .unwrap()
}

pub fn profile(nickname: &str, lat: f64, lon: f64) -> UpsertArtist {
    UpsertArtist {
        city: "Amsterdam".to_string(),
        country: "Netherlands".to_string(),
        country_code: Some("nl".to_string()),
        address: "Dam 1".to_string(),
        nickname: nickname.to_string(),
        description: format!("{nickname} tattoos"),
        styles: vec!["Realism".to_string()],
        instagram: format!("@{nickname}"),
        lat: Some(lat),
        lon: Some(lon),
        ..UpsertArtist::default()
    }
}

/// User plus artist profile at the given point
pub async fn create_artist(db: &Database, nickname: &str, lat: f64, lon: f64) -> (User, Artist) {
    let user = create_user(db, nickname).await;
    let artist = tattmap_storage::artists::upsert(db.pool(), &user.id, profile(nickname, lat, lon))
        .await
        .unwrap();
    (user, artist)
}
