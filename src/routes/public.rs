use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints open to anonymous clients. Reads still resolve an optional `Viewer`
/// so authors see their own hidden posts; every listing goes through the
/// visibility filter.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // --- Accounts ---
        .route("/auth/registration", post(handlers::accounts::register_user))
        .route("/auth/login", post(handlers::accounts::login))
        // --- Posts ---
        // GET / and GET /posts?page=N
        // The paginated feed, newest first.
        .route("/", get(handlers::posts::list_posts))
        .route("/posts", get(handlers::posts::list_posts))
        // GET /posts/{post_id}
        // Detail with comments; 404 unless the viewer may see the post.
        .route("/posts/{post_id}", get(handlers::posts::get_post))
        // --- Categories & profiles ---
        .route("/categories", get(handlers::taxonomy::list_categories))
        .route("/category/{slug}", get(handlers::taxonomy::category_posts))
        .route("/profile/{username}", get(handlers::profiles::get_profile))
        // --- Static pages ---
        .route("/pages/about", get(handlers::pages::about))
        .route("/pages/rules", get(handlers::pages::rules))
}
