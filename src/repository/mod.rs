use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    models::{
        Category, CategoryForm, Comment, Location, LocationForm, NewPost, NewUser, Post, PostCard,
        ProfileForm, User,
    },
    pagination::{Page, Paginator},
    visibility::PostFilter,
};

mod memory;
mod postgres;

pub use memory::MemoryRepository;
pub use postgres::PostgresRepository;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A unique constraint (username, category slug) was violated.
    #[error("{0}")]
    Conflict(String),

    /// A foreign key points at a row that does not exist.
    #[error("{0}")]
    InvalidReference(String),
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository Trait
///
/// The persistence contract. Handlers only see `Arc<dyn Repository>`, so the Postgres
/// store and the in-memory store are interchangeable.
///
/// Lookups return `Ok(None)` for missing rows; mutations by id return `Ok(None)` or
/// `Ok(false)` when the row does not exist. Authorization is not checked here.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> RepoResult<Option<User>>;
    async fn create_user(&self, user: NewUser) -> RepoResult<User>;
    async fn update_profile(&self, id: Uuid, form: ProfileForm) -> RepoResult<Option<User>>;

    // --- Categories & Locations ---
    async fn list_categories(&self, published_only: bool) -> RepoResult<Vec<Category>>;
    async fn get_category(&self, id: i64) -> RepoResult<Option<Category>>;
    async fn get_category_by_slug(&self, slug: &str) -> RepoResult<Option<Category>>;
    async fn create_category(&self, form: CategoryForm) -> RepoResult<Category>;
    async fn set_category_published(&self, id: i64, is_published: bool) -> RepoResult<Option<Category>>;
    /// Posts in the category keep existing with no category.
    async fn delete_category(&self, id: i64) -> RepoResult<bool>;
    async fn get_location(&self, id: i64) -> RepoResult<Option<Location>>;
    async fn create_location(&self, form: LocationForm) -> RepoResult<Location>;
    async fn set_location_published(&self, id: i64, is_published: bool) -> RepoResult<Option<Location>>;
    /// Posts at the location keep existing with no location.
    async fn delete_location(&self, id: i64) -> RepoResult<bool>;

    // --- Posts ---
    /// Number of posts `filter` selects at `now`.
    async fn count_posts(&self, filter: &PostFilter, now: DateTime<Utc>) -> RepoResult<u64>;
    /// Newest first, `limit` rows starting at `offset`.
    async fn list_posts(
        &self,
        filter: &PostFilter,
        now: DateTime<Utc>,
        offset: i64,
        limit: i64,
    ) -> RepoResult<Vec<PostCard>>;
    /// No visibility check: callers decide what the viewer may see.
    async fn get_post(&self, id: i64) -> RepoResult<Option<PostCard>>;
    async fn create_post(&self, author_id: Uuid, post: NewPost) -> RepoResult<Post>;
    async fn update_post(&self, id: i64, post: NewPost) -> RepoResult<Option<Post>>;
    /// Removes the post's comments with it.
    async fn delete_post(&self, id: i64) -> RepoResult<bool>;

    // --- Comments ---
    /// Oldest first.
    async fn list_comments(&self, post_id: i64) -> RepoResult<Vec<Comment>>;
    async fn get_comment(&self, id: i64) -> RepoResult<Option<Comment>>;
    async fn add_comment(&self, post_id: i64, author_id: Uuid, text: String) -> RepoResult<Comment>;
    async fn update_comment(&self, id: i64, text: String) -> RepoResult<Option<Comment>>;
    async fn delete_comment(&self, id: i64) -> RepoResult<bool>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// Counts, clamps the requested page, then loads only that page.
pub async fn paged_posts(
    repo: &dyn Repository,
    filter: &PostFilter,
    now: DateTime<Utc>,
    paginator: Paginator,
    requested: i64,
) -> RepoResult<Page<PostCard>> {
    let total = repo.count_posts(filter, now).await?;
    let window = paginator.window(total, requested);
    let items = repo
        .list_posts(filter, now, window.offset(), window.limit())
        .await?;
    Ok(window.into_page(items))
}
