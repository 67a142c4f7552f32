mod common;

use async_trait::async_trait;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use blogicum::{
    AppConfig, AppError, AppState, MockStorageService,
    auth::{AuthUser, Viewer},
    handlers::{self, PageQuery},
    models::{
        Category, CategoryForm, Comment, CommentForm, Location, LocationForm, NewPost, NewUser,
        Post, PostCard, PostForm, PresignedUrlRequest, ProfileForm, User,
    },
    repository::{RepoError, RepoResult, Repository},
    visibility::PostFilter,
};
use chrono::{DateTime, Utc};
use common::{PostSeed, TestApp};
use std::sync::Arc;
use uuid::Uuid;

// --- A repository whose backing store is down ---

struct BrokenRepository;

fn down<T>() -> RepoResult<T> {
    Err(RepoError::Database(sqlx::Error::PoolTimedOut))
}

#[async_trait]
impl Repository for BrokenRepository {
    async fn get_user(&self, _id: Uuid) -> RepoResult<Option<User>> {
        down()
    }
    async fn get_user_by_username(&self, _username: &str) -> RepoResult<Option<User>> {
        down()
    }
    async fn create_user(&self, _user: NewUser) -> RepoResult<User> {
        down()
    }
    async fn update_profile(&self, _id: Uuid, _form: ProfileForm) -> RepoResult<Option<User>> {
        down()
    }
    async fn list_categories(&self, _published_only: bool) -> RepoResult<Vec<Category>> {
        down()
    }
    async fn get_category(&self, _id: i64) -> RepoResult<Option<Category>> {
        down()
    }
    async fn get_category_by_slug(&self, _slug: &str) -> RepoResult<Option<Category>> {
        down()
    }
    async fn create_category(&self, _form: CategoryForm) -> RepoResult<Category> {
        down()
    }
    async fn set_category_published(&self, _id: i64, _p: bool) -> RepoResult<Option<Category>> {
        down()
    }
    async fn delete_category(&self, _id: i64) -> RepoResult<bool> {
        down()
    }
    async fn get_location(&self, _id: i64) -> RepoResult<Option<Location>> {
        down()
    }
    async fn create_location(&self, _form: LocationForm) -> RepoResult<Location> {
        down()
    }
    async fn set_location_published(&self, _id: i64, _p: bool) -> RepoResult<Option<Location>> {
        down()
    }
    async fn delete_location(&self, _id: i64) -> RepoResult<bool> {
        down()
    }
    async fn count_posts(&self, _f: &PostFilter, _now: DateTime<Utc>) -> RepoResult<u64> {
        down()
    }
    async fn list_posts(
        &self,
        _f: &PostFilter,
        _now: DateTime<Utc>,
        _offset: i64,
        _limit: i64,
    ) -> RepoResult<Vec<PostCard>> {
        down()
    }
    async fn get_post(&self, _id: i64) -> RepoResult<Option<PostCard>> {
        down()
    }
    async fn create_post(&self, _author: Uuid, _post: NewPost) -> RepoResult<Post> {
        down()
    }
    async fn update_post(&self, _id: i64, _post: NewPost) -> RepoResult<Option<Post>> {
        down()
    }
    async fn delete_post(&self, _id: i64) -> RepoResult<bool> {
        down()
    }
    async fn list_comments(&self, _post_id: i64) -> RepoResult<Vec<Comment>> {
        down()
    }
    async fn get_comment(&self, _id: i64) -> RepoResult<Option<Comment>> {
        down()
    }
    async fn add_comment(&self, _post: i64, _author: Uuid, _text: String) -> RepoResult<Comment> {
        down()
    }
    async fn update_comment(&self, _id: i64, _text: String) -> RepoResult<Option<Comment>> {
        down()
    }
    async fn delete_comment(&self, _id: i64) -> RepoResult<bool> {
        down()
    }
}

fn broken_state() -> AppState {
    AppState {
        repo: Arc::new(BrokenRepository),
        storage: Arc::new(MockStorageService::new()),
        config: AppConfig::default(),
    }
}

fn auth(user: &User) -> AuthUser {
    AuthUser::from(user.clone())
}

fn student() -> AuthUser {
    AuthUser {
        id: Uuid::from_u128(1),
        username: "student".to_string(),
        is_staff: false,
    }
}

// --- Tests ---

#[tokio::test]
async fn test_list_posts_store_failure_is_500_without_detail() {
    let result = handlers::posts::list_posts(
        Viewer(None),
        State(broken_state()),
        Query(PageQuery::default()),
    )
    .await;

    let err = result.unwrap_err();
    assert!(matches!(err, AppError::Internal(_)));
    let response = err.into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = common::read_json(response).await;
    assert!(body.get("detail").is_none());
}

#[tokio::test]
async fn test_get_post_not_found() {
    let app = TestApp::new();
    let result = handlers::posts::get_post(Viewer(None), State(app.state.clone()), Path(1)).await;
    assert!(matches!(result, Err(AppError::NotFound("post"))));
}

#[tokio::test]
async fn test_scheduled_post_visible_to_author_only() {
    let app = TestApp::new();
    let author = app.user("leo").await;
    let post = app.post(&author, PostSeed::scheduled("soon")).await;

    let hidden = handlers::posts::get_post(Viewer(None), State(app.state.clone()), Path(post.id)).await;
    assert!(hidden.is_err());

    let Json(detail) = handlers::posts::get_post(
        Viewer(Some(auth(&author))),
        State(app.state.clone()),
        Path(post.id),
    )
    .await
    .unwrap();
    assert_eq!(detail.post.title, "soon");
}

#[tokio::test]
async fn test_create_post_uses_caller_as_author() {
    let app = TestApp::new();
    let author = app.user("leo").await;
    let form = PostForm {
        title: "Hello".to_string(),
        text: "World".to_string(),
        image: Some(String::new()),
        ..PostForm::default()
    };

    let (status, Json(post)) =
        handlers::posts::create_post(auth(&author), State(app.state.clone()), Json(form))
            .await
            .unwrap();
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(post.author_id, author.id);
    assert_eq!(post.image, None);
}

#[tokio::test]
async fn test_update_post_denial_redirects() {
    let app = TestApp::new();
    let author = app.user("leo").await;
    let post = app.post(&author, PostSeed::public("mine")).await;
    let form = PostForm {
        title: "x".to_string(),
        text: "y".to_string(),
        ..PostForm::default()
    };

    let result =
        handlers::posts::update_post(student(), State(app.state.clone()), Path(post.id), Json(form))
            .await;
    match result {
        Err(AppError::Redirect(location)) => assert_eq!(location, format!("/posts/{}", post.id)),
        other => panic!("expected redirect, got {other:?}"),
    }
}

#[tokio::test]
async fn test_delete_comment_denial_is_forbidden() {
    let app = TestApp::new();
    let author = app.user("leo").await;
    let post = app.post(&author, PostSeed::public("mine")).await;
    let comment = app.add_comment_as(&author, post.id, "hi").await;

    let result = handlers::comments::delete_comment(
        student(),
        State(app.state.clone()),
        Path((post.id, comment.id)),
    )
    .await;
    assert!(matches!(result, Err(AppError::Forbidden)));
}

#[tokio::test]
async fn test_empty_comment_rejected() {
    let app = TestApp::new();
    let author = app.user("leo").await;
    let post = app.post(&author, PostSeed::public("mine")).await;

    let result = handlers::comments::add_comment(
        auth(&author),
        State(app.state.clone()),
        Path(post.id),
        Json(CommentForm { text: "   ".to_string() }),
    )
    .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_admin_handlers_refuse_regular_users() {
    let app = TestApp::new();
    let result = handlers::taxonomy::create_location(
        student(),
        State(app.state.clone()),
        Json(LocationForm {
            name: "Rome".to_string(),
            is_published: None,
        }),
    )
    .await;
    assert!(matches!(result, Err(AppError::Forbidden)));

    let result = handlers::taxonomy::delete_category(student(), State(app.state.clone()), Path(1)).await;
    assert!(matches!(result, Err(AppError::Forbidden)));
}

#[tokio::test]
async fn test_get_presigned_url_success() {
    let app = TestApp::new();
    let caller = student();
    let payload = PresignedUrlRequest {
        filename: "Sunset.PNG".to_string(),
        file_type: "image/png".to_string(),
    };

    let Json(response) =
        handlers::uploads::get_presigned_url(caller.clone(), State(app.state.clone()), Json(payload))
            .await
            .unwrap();

    assert!(response.resource_key.starts_with(&format!("posts/{}/", caller.id)));
    assert!(response.resource_key.ends_with(".png"));
    assert!(response.upload_url.contains("signature=fake"));
    assert!(response.upload_url.contains(&response.resource_key));
}

#[tokio::test]
async fn test_get_presigned_url_rejects_non_images() {
    let app = TestApp::new();
    let payload = PresignedUrlRequest {
        filename: "movie.mp4".to_string(),
        file_type: "video/mp4".to_string(),
    };

    let result =
        handlers::uploads::get_presigned_url(student(), State(app.state.clone()), Json(payload)).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_get_presigned_url_storage_failure() {
    let app = TestApp::with_storage(MockStorageService::new_failing());
    let payload = PresignedUrlRequest {
        filename: "a.jpg".to_string(),
        file_type: "image/jpeg".to_string(),
    };

    let result =
        handlers::uploads::get_presigned_url(student(), State(app.state.clone()), Json(payload)).await;
    let response = result.unwrap_err().into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_login_unknown_user_is_unauthorized() {
    let app = TestApp::new();
    let result = handlers::accounts::login(
        State(app.state.clone()),
        Json(blogicum::models::LoginRequest {
            username: "ghost".to_string(),
            password: "whatever1".to_string(),
        }),
    )
    .await;
    assert!(matches!(result, Err(AppError::Unauthorized)));
}
