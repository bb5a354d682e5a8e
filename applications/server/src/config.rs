/// Server configuration
use crate::error::{Result, ServerError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Origins that are always allowed in addition to the configured ones
pub const PRODUCTION_ORIGINS: [&str; 2] = ["https://tattmap.com", "https://www.tattmap.com"];

const MIN_JWT_SECRET_LEN: usize = 16;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_server")]
    pub server: ServerSettings,

    #[serde(default = "default_storage")]
    pub storage: StorageSettings,

    #[serde(default = "default_auth")]
    pub auth: AuthSettings,

    #[serde(default)]
    pub search: SearchSettings,

    #[serde(default)]
    pub cors: CorsSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    #[serde(default = "default_database_url")]
    pub database_url: String,

    #[serde(default = "default_photo_storage_path")]
    pub photo_storage_path: PathBuf,

    /// Prefix for public photo URLs; photos are served from here
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthSettings {
    #[serde(default)]
    pub jwt_secret: String,

    #[serde(default = "default_jwt_expiration_days")]
    pub jwt_expiration_days: u64,

    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchSettings {
    #[serde(default = "default_limit")]
    pub default_limit: i64,

    #[serde(default = "default_max_limit")]
    pub max_limit: i64,

    #[serde(default = "default_top_limit")]
    pub top_default_limit: i64,

    #[serde(default = "default_max_batch_ids")]
    pub max_batch_ids: usize,

    /// Use the R*Tree backend instead of the plain predicate scan
    #[serde(default = "default_spatial_index")]
    pub spatial_index: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorsSettings {
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl CorsSettings {
    /// Configured origins plus the production ones, without duplicates
    pub fn origins(&self) -> Vec<String> {
        let mut origins = self.allowed_origins.clone();
        for origin in PRODUCTION_ORIGINS {
            if !origins.iter().any(|o| o == origin) {
                origins.push(origin.to_string());
            }
        }
        origins
    }
}

impl ServerConfig {
    /// Load configuration from `config.toml` (if present) and environment
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration from the given file (or `config.toml`) and
    /// environment variables such as `TATTMAP__AUTH__JWT_SECRET`
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        let config_path = path.map_or_else(|| PathBuf::from("config.toml"), Path::to_path_buf);
        if config_path.exists() {
            settings = settings.add_source(config::File::from(config_path));
        } else if path.is_some() {
            return Err(ServerError::Config(format!(
                "config file not found: {}",
                config_path.display()
            )));
        }

        settings = settings.add_source(
            config::Environment::with_prefix("TATTMAP")
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("cors.allowed_origins")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| ServerError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.chars().count() < MIN_JWT_SECRET_LEN {
            return Err(ServerError::Config(format!(
                "JWT secret must be at least {MIN_JWT_SECRET_LEN} characters \
                 (set TATTMAP__AUTH__JWT_SECRET)"
            )));
        }

        if self.auth.cookie_name.trim().is_empty() {
            return Err(ServerError::Config("cookie name must not be empty".to_string()));
        }

        if self.search.max_limit < 1 {
            return Err(ServerError::Config("search.max_limit must be at least 1".to_string()));
        }

        if self.search.max_batch_ids == 0 {
            return Err(ServerError::Config(
                "search.max_batch_ids must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

// Default values
fn default_server() -> ServerSettings {
    ServerSettings {
        host: default_host(),
        port: default_port(),
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_storage() -> StorageSettings {
    StorageSettings {
        database_url: default_database_url(),
        photo_storage_path: default_photo_storage_path(),
        public_base_url: default_public_base_url(),
    }
}

fn default_database_url() -> String {
    "sqlite://./data/tattmap.db".to_string()
}

fn default_photo_storage_path() -> PathBuf {
    PathBuf::from("./data/photos")
}

fn default_public_base_url() -> String {
    "/photos".to_string()
}

fn default_auth() -> AuthSettings {
    AuthSettings {
        jwt_secret: String::new(),
        jwt_expiration_days: default_jwt_expiration_days(),
        cookie_name: default_cookie_name(),
    }
}

fn default_jwt_expiration_days() -> u64 {
    7
}

fn default_cookie_name() -> String {
    "accessToken".to_string()
}

fn default_limit() -> i64 {
    tattmap_core::search::DEFAULT_LIMIT
}

fn default_max_limit() -> i64 {
    tattmap_core::search::MAX_LIMIT
}

fn default_top_limit() -> i64 {
    100
}

fn default_max_batch_ids() -> usize {
    1000
}

fn default_spatial_index() -> bool {
    true
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://localhost:3001".to_string(),
    ]
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            top_default_limit: default_top_limit(),
            max_batch_ids: default_max_batch_ids(),
            spatial_index: default_spatial_index(),
        }
    }
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            storage: default_storage(),
            auth: default_auth(),
            search: SearchSettings::default(),
            cors: CorsSettings::default(),
        }
    }
}
