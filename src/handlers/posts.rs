use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;

use super::{PageQuery, paginator};
use crate::{
    AppState,
    auth::{AuthUser, Viewer},
    error::{AppError, AppResult},
    models::{NewPost, Post, PostCard, PostDetail, PostForm},
    pagination::Page,
    permissions::authorize,
    repository::paged_posts,
    validation::validate_post,
    visibility::{PostFilter, visible_to},
};

fn detail_url(post_id: i64) -> String {
    format!("/posts/{post_id}")
}

/// list_posts
///
/// [Public Route] The main feed: every publicly visible post, newest first. A signed-in
/// viewer also sees their own unpublished and scheduled posts.
#[utoipa::path(
    get,
    path = "/posts",
    params(PageQuery),
    responses((status = 200, description = "One page of the feed", body = Page<PostCard>))
)]
pub async fn list_posts(
    viewer: Viewer,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<PostCard>>> {
    let page = paged_posts(
        state.repo.as_ref(),
        &PostFilter::feed(viewer.id()),
        Utc::now(),
        paginator(&state),
        query.number(),
    )
    .await?;
    Ok(Json(page))
}

/// get_post
///
/// [Public Route] A single post with its comments, oldest comment first.
/// Hidden posts answer 404 to everyone but their author.
#[utoipa::path(
    get,
    path = "/posts/{post_id}",
    params(("post_id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Found", body = PostDetail),
        (status = 404, description = "Missing or not visible")
    )
)]
pub async fn get_post(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> AppResult<Json<PostDetail>> {
    let post = state
        .repo
        .get_post(post_id)
        .await?
        .filter(|post| visible_to(post, viewer.id(), Utc::now()))
        .ok_or(AppError::NotFound("post"))?;

    let comments = state.repo.list_comments(post.id).await?;
    Ok(Json(PostDetail { post, comments }))
}

/// create_post
///
/// [Authenticated Route] The author is always the caller.
#[utoipa::path(
    post,
    path = "/posts",
    request_body = PostForm,
    responses(
        (status = 201, description = "Created", body = Post),
        (status = 422, description = "Invalid form")
    )
)]
pub async fn create_post(
    user: AuthUser,
    State(state): State<AppState>,
    Json(form): Json<PostForm>,
) -> AppResult<(StatusCode, Json<Post>)> {
    validate_post(&form)?;
    let post = state
        .repo
        .create_post(user.id, NewPost::from_form(form, Utc::now()))
        .await?;

    tracing::info!(post = post.id, author = %user.id, "post created");
    Ok((StatusCode::CREATED, Json(post)))
}

/// update_post
///
/// [Authenticated Route] Replaces the post's fields. Anyone but the author (or staff)
/// is sent back to the post with `303 See Other`.
#[utoipa::path(
    put,
    path = "/posts/{post_id}",
    params(("post_id" = i64, Path, description = "Post ID")),
    request_body = PostForm,
    responses(
        (status = 200, description = "Updated", body = Post),
        (status = 303, description = "Not the author; redirected to the post"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_post(
    user: AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Json(form): Json<PostForm>,
) -> AppResult<Json<Post>> {
    let existing = state.repo.get_post(post_id).await?;
    authorize(&user, existing)
        .map_err(|e| AppError::redirect_on_denial(e, "post", detail_url(post_id)))?;

    validate_post(&form)?;
    let post = state
        .repo
        .update_post(post_id, NewPost::from_form(form, Utc::now()))
        .await?
        .ok_or(AppError::NotFound("post"))?;
    Ok(Json(post))
}

/// delete_post
///
/// [Authenticated Route] Deletes the post together with its comments.
#[utoipa::path(
    delete,
    path = "/posts/{post_id}",
    params(("post_id" = i64, Path, description = "Post ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 303, description = "Not the author; redirected to the post"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_post(
    user: AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> AppResult<StatusCode> {
    let existing = state.repo.get_post(post_id).await?;
    authorize(&user, existing)
        .map_err(|e| AppError::redirect_on_denial(e, "post", detail_url(post_id)))?;

    if state.repo.delete_post(post_id).await? {
        tracing::info!(post = post_id, by = %user.id, "post deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("post"))
    }
}
