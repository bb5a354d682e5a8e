/// Server services
pub mod auth;
pub mod photo_storage;
pub mod profiles;

pub use auth::{AuthService, Claims};
pub use photo_storage::{LocalPhotoStorage, PhotoStorage, StoredPhoto};
