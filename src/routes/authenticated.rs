use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Authenticated Router Module
///
/// Routes for any signed-in user. The `auth_middleware` layer in `create_router`
/// rejects anonymous requests with 401 before they get here. Ownership is checked
/// per resource by the permission gate inside each handler.
///
/// Paths shared with the public router (`/posts`, `/posts/{post_id}`,
/// `/profile/{username}`) only add the write methods here; axum merges them.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // POST /upload/presigned
        // Short-lived upload URL for a post image.
        .route("/upload/presigned", post(handlers::uploads::get_presigned_url))
        .route("/me", get(handlers::profiles::get_me))
        // --- Posts ---
        .route("/posts", post(handlers::posts::create_post))
        // Non-authors are redirected to the post (303).
        .route(
            "/posts/{post_id}",
            put(handlers::posts::update_post).delete(handlers::posts::delete_post),
        )
        // --- Comments ---
        .route("/posts/{post_id}/comments", post(handlers::comments::add_comment))
        // Non-authors get 403.
        .route(
            "/posts/{post_id}/comments/{comment_id}",
            put(handlers::comments::update_comment).delete(handlers::comments::delete_comment),
        )
        // --- Profile ---
        .route("/profile/{username}", put(handlers::profiles::update_profile))
}
