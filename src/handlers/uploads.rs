use axum::{Json, extract::State};

use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, AppResult},
    models::{PresignedUrlRequest, PresignedUrlResponse},
    storage::{image_key, is_image_type},
};

/// get_presigned_url
///
/// [Authenticated Route] Issues a 10-minute upload URL for a post image. The client
/// uploads straight to storage, then sends the returned `resource_key` as the post's
/// `image`. Only `image/*` content types are accepted.
#[utoipa::path(
    post,
    path = "/upload/presigned",
    request_body = PresignedUrlRequest,
    responses(
        (status = 200, description = "URL", body = PresignedUrlResponse),
        (status = 422, description = "Not an image type")
    )
)]
pub async fn get_presigned_url(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<PresignedUrlRequest>,
) -> AppResult<Json<PresignedUrlResponse>> {
    if !is_image_type(&payload.file_type) {
        return Err(AppError::invalid("file_type must be an image/* MIME type"));
    }

    let resource_key = image_key(user.id, &payload.filename);
    let upload_url = state
        .storage
        .get_presigned_upload_url(&resource_key, &payload.file_type)
        .await
        .map_err(|e| AppError::Internal(format!("storage: {e}")))?;

    Ok(Json(PresignedUrlResponse {
        upload_url,
        resource_key,
    }))
}
