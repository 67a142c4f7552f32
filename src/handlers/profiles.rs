use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Utc;

use super::{PageQuery, paginator};
use crate::{
    AppState,
    auth::{AuthUser, Viewer},
    error::{AppError, AppResult},
    models::{ProfileForm, ProfilePage, PublicProfile, User},
    permissions::{authorize, can_mutate},
    repository::paged_posts,
    validation::validate_profile,
    visibility::PostFilter,
};

/// get_profile
///
/// [Public Route] A user and their posts. The owner sees every post they wrote;
/// everyone else only the publicly visible ones. Email and staff flag are shown to
/// the owner and to staff only.
#[utoipa::path(
    get,
    path = "/profile/{username}",
    params(("username" = String, Path, description = "Username"), PageQuery),
    responses(
        (status = 200, description = "Profile", body = ProfilePage),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn get_profile(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<ProfilePage>> {
    let profile = state
        .repo
        .get_user_by_username(&username)
        .await?
        .ok_or(AppError::NotFound("user"))?;

    let page = paged_posts(
        state.repo.as_ref(),
        &PostFilter::author(viewer.id(), profile.id),
        Utc::now(),
        paginator(&state),
        query.number(),
    )
    .await?;

    let show_private = viewer.0.as_ref().is_some_and(|v| can_mutate(v, profile.id));
    Ok(Json(ProfilePage {
        profile: PublicProfile::new(profile, show_private),
        page,
    }))
}

/// update_profile
///
/// [Authenticated Route] Edits names, email and username. Only the account itself
/// (or staff) may do so; others get 403.
#[utoipa::path(
    put,
    path = "/profile/{username}",
    params(("username" = String, Path, description = "Username")),
    request_body = ProfileForm,
    responses(
        (status = 200, description = "Updated", body = User),
        (status = 403, description = "Not your profile"),
        (status = 404, description = "Unknown user"),
        (status = 409, description = "Username taken")
    )
)]
pub async fn update_profile(
    user: AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(form): Json<ProfileForm>,
) -> AppResult<Json<User>> {
    let target = state.repo.get_user_by_username(&username).await?;
    let target = authorize(&user, target).map_err(|e| AppError::forbid_on_denial(e, "user"))?;

    validate_profile(&form)?;
    let updated = state
        .repo
        .update_profile(target.id, form)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    Ok(Json(updated))
}

/// get_me
///
/// [Authenticated Route] The caller's own account.
#[utoipa::path(
    get,
    path = "/me",
    responses((status = 200, description = "Profile", body = User))
)]
pub async fn get_me(user: AuthUser, State(state): State<AppState>) -> AppResult<Json<User>> {
    let me = state
        .repo
        .get_user(user.id)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    Ok(Json(me))
}
