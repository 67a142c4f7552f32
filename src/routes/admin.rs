use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, post, put},
};

/// Admin Router Module
///
/// Category and location moderation, nested under `/admin`. Each handler resolves
/// `AuthUser` (401 when anonymous) and then requires `is_staff` (403 otherwise).
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", post(handlers::taxonomy::create_category))
        // PUT /admin/categories/{id}/status with a JSON boolean body.
        // Hiding a category hides every post filed under it.
        .route(
            "/categories/{id}/status",
            put(handlers::taxonomy::set_category_status),
        )
        .route("/categories/{id}", delete(handlers::taxonomy::delete_category))
        .route("/locations", post(handlers::taxonomy::create_location))
        .route(
            "/locations/{id}/status",
            put(handlers::taxonomy::set_location_status),
        )
        .route("/locations/{id}", delete(handlers::taxonomy::delete_location))
}
