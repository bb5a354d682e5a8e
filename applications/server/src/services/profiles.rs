/// Profile lifecycle spanning the database and photo storage
use crate::{error::Result, services::PhotoStorage};
use tattmap_core::UserId;
use tattmap_storage::Database;

/// Delete the caller's profile, then their photos.
///
/// The database part is transactional. Photo removal is best effort: a
/// failure is logged and does not fail the request. Deleting a missing
/// profile succeeds.
pub async fn delete_profile(
    db: &Database,
    photos: &dyn PhotoStorage,
    user_id: &UserId,
) -> Result<bool> {
    let deleted = tattmap_storage::artists::delete_for_user(db.pool(), user_id).await?;

    if let Err(e) = photos.delete_all_for_user(user_id).await {
        tracing::warn!(user_id = %user_id, error = %e, "Failed to delete artist photos");
    }

    if let Some(artist) = &deleted {
        tracing::info!(
            user_id = %user_id,
            photos = artist.photos.len(),
            "Artist profile deleted"
        );
    }

    Ok(deleted.is_some())
}
