//! Domain types for Tattmap

pub mod artist;
pub mod ids;
pub mod like;
pub mod user;

pub use artist::{Artist, ArtistPoint, ArtistWithLikes, UpsertArtist};
pub use ids::UserId;
pub use like::{LikeStatus, LikeSummary};
pub use user::{GoogleProfile, Role, User};
