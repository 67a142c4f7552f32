#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode},
};
use blogicum::{
    AppConfig, AppState, MemoryRepository, MockStorageService, create_router,
    models::{Category, CategoryForm, Comment, Location, LocationForm, NewPost, NewUser, Post, User},
    repository::{Repository, RepositoryState},
    storage::StorageState,
};
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tower::util::ServiceExt;

/// A freshly seeded in-memory application.
pub struct TestApp {
    pub state: AppState,
    pub repo: Arc<MemoryRepository>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_storage(MockStorageService::new())
    }

    pub fn with_storage(storage: MockStorageService) -> Self {
        Self::with_config(AppConfig::default(), storage)
    }

    pub fn with_config(config: AppConfig, storage: MockStorageService) -> Self {
        let repo = Arc::new(MemoryRepository::new());
        let state = AppState {
            repo: repo.clone() as RepositoryState,
            storage: Arc::new(storage) as StorageState,
            config,
        };
        Self { state, repo }
    }

    pub fn router(&self) -> Router {
        create_router(self.state.clone())
    }

    pub async fn user(&self, username: &str) -> User {
        self.create_user(username, false).await
    }

    pub async fn staff(&self, username: &str) -> User {
        self.create_user(username, true).await
    }

    async fn create_user(&self, username: &str, is_staff: bool) -> User {
        self.repo
            .create_user(NewUser {
                username: username.to_string(),
                first_name: String::new(),
                last_name: String::new(),
                email: format!("{username}@example.com"),
                password_hash: blogicum::password::hash_password("password123").unwrap(),
                is_staff,
            })
            .await
            .unwrap()
    }

    pub async fn category(&self, slug: &str, is_published: bool) -> Category {
        self.repo
            .create_category(CategoryForm {
                title: slug.to_uppercase(),
                description: String::new(),
                slug: slug.to_string(),
                is_published: Some(is_published),
            })
            .await
            .unwrap()
    }

    pub async fn location(&self, name: &str, is_published: bool) -> Location {
        self.repo
            .create_location(LocationForm {
                name: name.to_string(),
                is_published: Some(is_published),
            })
            .await
            .unwrap()
    }

    pub async fn post(&self, author: &User, seed: PostSeed) -> Post {
        self.repo
            .create_post(
                author.id,
                NewPost {
                    title: seed.title.to_string(),
                    text: "Lorem ipsum".to_string(),
                    image: None,
                    is_published: seed.is_published,
                    pub_date: seed.pub_date,
                    category_id: seed.category_id,
                    location_id: seed.location_id,
                },
            )
            .await
            .unwrap()
    }

    pub async fn add_comment_as(&self, author: &User, post_id: i64, text: &str) -> Comment {
        self.repo
            .add_comment(post_id, author.id, text.to_string())
            .await
            .unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router().oneshot(request).await.unwrap()
    }
}

/// Shape of a seeded post. Defaults to a public post dated an hour ago.
pub struct PostSeed {
    pub title: &'static str,
    pub is_published: bool,
    pub pub_date: DateTime<Utc>,
    pub category_id: Option<i64>,
    pub location_id: Option<i64>,
}

impl PostSeed {
    pub fn public(title: &'static str) -> Self {
        Self {
            title,
            is_published: true,
            pub_date: Utc::now() - Duration::hours(1),
            category_id: None,
            location_id: None,
        }
    }

    pub fn unpublished(title: &'static str) -> Self {
        Self {
            is_published: false,
            ..Self::public(title)
        }
    }

    pub fn scheduled(title: &'static str) -> Self {
        Self {
            pub_date: Utc::now() + Duration::days(1),
            ..Self::public(title)
        }
    }

    pub fn dated(title: &'static str, hours_ago: i64) -> Self {
        Self {
            pub_date: Utc::now() - Duration::hours(hours_ago),
            ..Self::public(title)
        }
    }

    pub fn in_category(mut self, category: &Category) -> Self {
        self.category_id = Some(category.id);
        self
    }

    pub fn at(mut self, location: &Location) -> Self {
        self.location_id = Some(location.id);
        self
    }
}

pub fn get(uri: &str, as_user: Option<&User>) -> Request<Body> {
    request("GET", uri, as_user, None)
}

pub fn delete(uri: &str, as_user: Option<&User>) -> Request<Body> {
    request("DELETE", uri, as_user, None)
}

pub fn json(method: &str, uri: &str, as_user: Option<&User>, body: serde_json::Value) -> Request<Body> {
    request(method, uri, as_user, Some(body))
}

/// Authenticates through the local `x-user-id` bypass.
fn request(
    method: &str,
    uri: &str,
    as_user: Option<&User>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = as_user {
        builder = builder.header("x-user-id", user.id.to_string());
    }
    match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn read_json<T: DeserializeOwned>(response: Response<Body>) -> T {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn expect_json<T: DeserializeOwned>(response: Response<Body>, status: StatusCode) -> T {
    assert_eq!(response.status(), status);
    read_json(response).await
}
