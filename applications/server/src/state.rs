/// Shared application state
use crate::{
    config::ServerConfig,
    services::{AuthService, PhotoStorage},
};
use std::sync::Arc;
use tattmap_core::ArtistSearch;
use tattmap_storage::Database;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub search: ArtistSearch,
    pub auth_service: Arc<AuthService>,
    pub photo_storage: Arc<dyn PhotoStorage>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(
        db: Arc<Database>,
        auth_service: Arc<AuthService>,
        photo_storage: Arc<dyn PhotoStorage>,
        config: Arc<ServerConfig>,
    ) -> Self {
        let search = db.artist_search(config.search.spatial_index, config.search.max_limit);
        Self {
            db,
            search,
            auth_service,
            photo_storage,
            config,
        }
    }
}
