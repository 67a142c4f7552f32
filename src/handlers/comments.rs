use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;

use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, AppResult},
    models::{Comment, CommentForm},
    permissions::authorize,
    validation::validate_comment,
    visibility::visible_to,
};

/// Loads the comment only if it belongs to `post_id`.
async fn comment_on_post(
    state: &AppState,
    post_id: i64,
    comment_id: i64,
) -> AppResult<Option<Comment>> {
    let comment = state.repo.get_comment(comment_id).await?;
    Ok(comment.filter(|c| c.post_id == post_id))
}

/// add_comment
///
/// [Authenticated Route] Comments on a post the caller can currently see.
#[utoipa::path(
    post,
    path = "/posts/{post_id}/comments",
    params(("post_id" = i64, Path, description = "Post ID")),
    request_body = CommentForm,
    responses(
        (status = 201, description = "Comment Added", body = Comment),
        (status = 404, description = "Post missing or not visible")
    )
)]
pub async fn add_comment(
    user: AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Json(form): Json<CommentForm>,
) -> AppResult<(StatusCode, Json<Comment>)> {
    state
        .repo
        .get_post(post_id)
        .await?
        .filter(|post| visible_to(post, Some(user.id), Utc::now()))
        .ok_or(AppError::NotFound("post"))?;

    validate_comment(&form)?;
    let comment = state.repo.add_comment(post_id, user.id, form.text).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// update_comment
///
/// [Authenticated Route] Only the comment's author (or staff) may edit it.
#[utoipa::path(
    put,
    path = "/posts/{post_id}/comments/{comment_id}",
    params(
        ("post_id" = i64, Path, description = "Post ID"),
        ("comment_id" = i64, Path, description = "Comment ID")
    ),
    request_body = CommentForm,
    responses(
        (status = 200, description = "Updated", body = Comment),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_comment(
    user: AuthUser,
    State(state): State<AppState>,
    Path((post_id, comment_id)): Path<(i64, i64)>,
    Json(form): Json<CommentForm>,
) -> AppResult<Json<Comment>> {
    let existing = comment_on_post(&state, post_id, comment_id).await?;
    authorize(&user, existing).map_err(|e| AppError::forbid_on_denial(e, "comment"))?;

    validate_comment(&form)?;
    let comment = state
        .repo
        .update_comment(comment_id, form.text)
        .await?
        .ok_or(AppError::NotFound("comment"))?;
    Ok(Json(comment))
}

/// delete_comment
#[utoipa::path(
    delete,
    path = "/posts/{post_id}/comments/{comment_id}",
    params(
        ("post_id" = i64, Path, description = "Post ID"),
        ("comment_id" = i64, Path, description = "Comment ID")
    ),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_comment(
    user: AuthUser,
    State(state): State<AppState>,
    Path((post_id, comment_id)): Path<(i64, i64)>,
) -> AppResult<StatusCode> {
    let existing = comment_on_post(&state, post_id, comment_id).await?;
    authorize(&user, existing).map_err(|e| AppError::forbid_on_denial(e, "comment"))?;

    if state.repo.delete_comment(comment_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("comment"))
    }
}
