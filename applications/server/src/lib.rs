//! Tattmap Server Library
//!
//! REST backend for the tattoo artist directory: geo search, artist
//! profiles, likes and photo uploads.
//!
//! This library exposes the core components for testing purposes.

pub mod api;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use services::{AuthService, LocalPhotoStorage, PhotoStorage};
pub use state::AppState;
