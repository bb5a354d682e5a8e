/// Photo upload route
use crate::{
    error::{Result, ServerError},
    middleware::AuthenticatedUser,
    services::photo_storage::{validate_upload, StoredPhoto},
    state::AppState,
};
use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};

/// POST /uploads
/// Store one image from the multipart field `file`
pub async fn upload_photo(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    mut multipart: Multipart,
) -> Result<Json<StoredPhoto>> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("photo").to_string();
        let content_type = match field.content_type() {
            Some(ct) if ct != "application/octet-stream" => ct.to_string(),
            _ => mime_guess::from_path(&file_name)
                .first_or_octet_stream()
                .essence_str()
                .to_string(),
        };

        let data = field.bytes().await.map_err(multipart_error)?;
        validate_upload(&content_type, data.len())?;

        let stored = app_state
            .photo_storage
            .store(&auth.user_id(), &file_name, data)
            .await?;

        tracing::info!(user_id = %auth.user_id(), key = %stored.key, "Photo uploaded");
        return Ok(Json(stored));
    }

    Err(ServerError::BadRequest("Missing multipart field 'file'".to_string()))
}

fn multipart_error(err: MultipartError) -> ServerError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ServerError::PayloadTooLarge(err.body_text())
    } else {
        ServerError::BadRequest(format!("Failed to parse multipart: {}", err.body_text()))
    }
}
