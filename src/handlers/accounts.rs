use axum::{Json, extract::State, http::StatusCode};
use tokio::task::spawn_blocking;

use crate::{
    AppState,
    auth::issue_token,
    error::{AppError, AppResult},
    models::{LoginRequest, NewUser, RegisterUserRequest, TokenResponse, User},
    password::{hash_password, verify_password},
    validation::validate_registration,
};

/// register_user
///
/// [Public Route] Creates a regular (non-staff) account. Staff rights are granted
/// directly in the database.
#[utoipa::path(
    post,
    path = "/auth/registration",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "Registered", body = User),
        (status = 409, description = "Username taken"),
        (status = 422, description = "Invalid form")
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUserRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    validate_registration(&payload)?;

    // Hashing is CPU-bound; run it on the blocking pool.
    let password = payload.password.clone();
    let password_hash = spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(format!("hashing task failed: {e}")))??;
    let user = state
        .repo
        .create_user(NewUser {
            username: payload.username,
            first_name: payload.first_name,
            last_name: payload.last_name,
            email: payload.email,
            password_hash,
            is_staff: false,
        })
        .await?;

    tracing::info!(user = %user.id, username = %user.username, "user registered");
    Ok((StatusCode::CREATED, Json(user)))
}

/// login
///
/// [Public Route] Exchanges username and password for a bearer token. Unknown users
/// and wrong passwords are indistinguishable to the caller.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Bad credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let user = state
        .repo
        .get_user_by_username(&payload.username)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let stored = user.password_hash.clone();
    let matched = spawn_blocking(move || verify_password(&payload.password, &stored))
        .await
        .map_err(|e| AppError::Internal(format!("hashing task failed: {e}")))??;

    if !matched {
        tracing::debug!(username = %user.username, "login refused");
        return Err(AppError::Unauthorized);
    }

    Ok(Json(issue_token(&state.config, &user)?))
}
