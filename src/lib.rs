use axum::{
    Json, Router,
    extract::{FromRef, Request},
    http::{HeaderName, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod pagination;
pub mod password;
pub mod permissions;
pub mod repository;
pub mod storage;
pub mod validation;
pub mod visibility;

pub mod routes;
use auth::AuthUser;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use repository::{MemoryRepository, PostgresRepository, RepositoryState};
pub use storage::{MockStorageService, S3StorageClient, StorageState};

/// ApiDoc
///
/// OpenAPI document assembled from the `#[utoipa::path]` handlers and the
/// `ToSchema` models. Served at `/api-docs/openapi.json`, browsable at `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::posts::list_posts, handlers::posts::get_post, handlers::posts::create_post,
        handlers::posts::update_post, handlers::posts::delete_post,
        handlers::comments::add_comment, handlers::comments::update_comment,
        handlers::comments::delete_comment,
        handlers::profiles::get_profile, handlers::profiles::update_profile,
        handlers::profiles::get_me,
        handlers::taxonomy::list_categories, handlers::taxonomy::category_posts,
        handlers::taxonomy::create_category, handlers::taxonomy::set_category_status,
        handlers::taxonomy::delete_category, handlers::taxonomy::create_location,
        handlers::taxonomy::set_location_status, handlers::taxonomy::delete_location,
        handlers::accounts::register_user, handlers::accounts::login,
        handlers::pages::about, handlers::pages::rules,
        handlers::uploads::get_presigned_url,
    ),
    components(
        schemas(
            models::User, models::Category, models::Location, models::Post, models::PostCard,
            models::Comment, models::PostForm, models::CommentForm, models::ProfileForm,
            models::RegisterUserRequest, models::LoginRequest, models::TokenResponse,
            models::CategoryForm, models::LocationForm, models::PresignedUrlRequest,
            models::PresignedUrlResponse, models::PostDetail, models::CategoryPosts,
            models::PublicProfile, models::ProfilePage, models::StaticPage, error::ErrorBody,
        )
    ),
    tags(
        (name = "blogicum", description = "Blogicum blogging API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The shared, cheaply clonable container of every service a handler may need.
#[derive(Clone)]
pub struct AppState {
    pub repo: RepositoryState,
    pub storage: StorageState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// Let extractors such as `AuthUser` pull single components out of the state.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Guards `authenticated_routes`. Extracting `AuthUser` is the whole check: a
/// missing or invalid credential is rejected with 401 before the handler runs.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// Unknown routes answer with the same problem body as every other error.
async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(error::ErrorBody {
            error_type: "about:blank".to_string(),
            title: "Not Found".to_string(),
            status: StatusCode::NOT_FOUND.as_u16(),
            detail: Some("no such route".to_string()),
        }),
    )
}

/// create_router
///
/// Assembles the routers, middleware and shared state into the application.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        // Staff checks happen inside the admin handlers.
        .nest("/admin", admin::admin_routes())
        .fallback(not_found)
        .with_state(state);

    // Outermost layers: request id, tracing, id propagation, then CORS.
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Opens the per-request span, tagged with the `x-request-id` set by
/// `SetRequestIdLayer` so every log line of a request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
