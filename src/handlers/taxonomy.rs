//! Categories and locations: public browsing plus the staff moderation endpoints
//! mounted under `/admin`.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;

use super::{PageQuery, paginator, require_staff};
use crate::{
    AppState,
    auth::{AuthUser, Viewer},
    error::{AppError, AppResult},
    models::{Category, CategoryForm, CategoryPosts, Location, LocationForm},
    repository::paged_posts,
    validation::{validate_category, validate_location},
    visibility::PostFilter,
};

/// list_categories
///
/// [Public Route] Published categories, alphabetically.
#[utoipa::path(
    get,
    path = "/categories",
    responses((status = 200, description = "Published categories", body = [Category]))
)]
pub async fn list_categories(State(state): State<AppState>) -> AppResult<Json<Vec<Category>>> {
    Ok(Json(state.repo.list_categories(true).await?))
}

/// category_posts
///
/// [Public Route] The visible posts of one category. Unknown and unpublished
/// categories both answer 404.
#[utoipa::path(
    get,
    path = "/category/{slug}",
    params(("slug" = String, Path, description = "Category slug"), PageQuery),
    responses(
        (status = 200, description = "Category with one page of posts", body = CategoryPosts),
        (status = 404, description = "Missing or unpublished category")
    )
)]
pub async fn category_posts(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<CategoryPosts>> {
    let category = state
        .repo
        .get_category_by_slug(&slug)
        .await?
        .filter(|c| c.is_published)
        .ok_or(AppError::NotFound("category"))?;

    let page = paged_posts(
        state.repo.as_ref(),
        &PostFilter::category(viewer.id(), category.id),
        Utc::now(),
        paginator(&state),
        query.number(),
    )
    .await?;

    Ok(Json(CategoryPosts { category, page }))
}

/// create_category
///
/// [Admin Route] Slugs are unique; a duplicate answers 409.
#[utoipa::path(
    post,
    path = "/admin/categories",
    request_body = CategoryForm,
    responses(
        (status = 201, description = "Created", body = Category),
        (status = 403, description = "Not staff"),
        (status = 409, description = "Slug taken")
    )
)]
pub async fn create_category(
    user: AuthUser,
    State(state): State<AppState>,
    Json(form): Json<CategoryForm>,
) -> AppResult<(StatusCode, Json<Category>)> {
    require_staff(&user)?;
    validate_category(&form)?;
    let category = state.repo.create_category(form).await?;
    tracing::info!(category = %category.slug, by = %user.id, "category created");
    Ok((StatusCode::CREATED, Json(category)))
}

/// set_category_status
///
/// [Admin Route] Publishes or hides a category, and with it every post filed there.
#[utoipa::path(
    put,
    path = "/admin/categories/{id}/status",
    params(("id" = i64, Path, description = "Category ID")),
    request_body = bool,
    responses(
        (status = 200, description = "Updated", body = Category),
        (status = 403, description = "Not staff"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn set_category_status(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(is_published): Json<bool>,
) -> AppResult<Json<Category>> {
    require_staff(&user)?;
    let category = state
        .repo
        .set_category_published(id, is_published)
        .await?
        .ok_or(AppError::NotFound("category"))?;
    Ok(Json(category))
}

/// delete_category
///
/// [Admin Route] Posts in the category survive without one.
#[utoipa::path(
    delete,
    path = "/admin/categories/{id}",
    params(("id" = i64, Path, description = "Category ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not staff"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_category(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    require_staff(&user)?;
    if state.repo.delete_category(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("category"))
    }
}

/// create_location
#[utoipa::path(
    post,
    path = "/admin/locations",
    request_body = LocationForm,
    responses(
        (status = 201, description = "Created", body = Location),
        (status = 403, description = "Not staff")
    )
)]
pub async fn create_location(
    user: AuthUser,
    State(state): State<AppState>,
    Json(form): Json<LocationForm>,
) -> AppResult<(StatusCode, Json<Location>)> {
    require_staff(&user)?;
    validate_location(&form)?;
    let location = state.repo.create_location(form).await?;
    Ok((StatusCode::CREATED, Json(location)))
}

/// set_location_status
///
/// [Admin Route] An unpublished location keeps its posts visible but drops its name
/// from them.
#[utoipa::path(
    put,
    path = "/admin/locations/{id}/status",
    params(("id" = i64, Path, description = "Location ID")),
    request_body = bool,
    responses(
        (status = 200, description = "Updated", body = Location),
        (status = 403, description = "Not staff"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn set_location_status(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(is_published): Json<bool>,
) -> AppResult<Json<Location>> {
    require_staff(&user)?;
    let location = state
        .repo
        .set_location_published(id, is_published)
        .await?
        .ok_or(AppError::NotFound("location"))?;
    Ok(Json(location))
}

/// delete_location
#[utoipa::path(
    delete,
    path = "/admin/locations/{id}",
    params(("id" = i64, Path, description = "Location ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not staff"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_location(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    require_staff(&user)?;
    if state.repo.delete_location(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("location"))
    }
}
