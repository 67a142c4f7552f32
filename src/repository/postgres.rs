use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{RepoError, RepoResult, Repository};
use crate::{
    models::{
        Category, CategoryForm, Comment, Location, LocationForm, NewPost, NewUser, Post, PostCard,
        ProfileForm, User,
    },
    visibility::{ORDER_NEWEST_FIRST, PostFilter},
};

const USER_COLUMNS: &str =
    "id, username, first_name, last_name, email, password_hash, is_staff, created_at";
const CATEGORY_COLUMNS: &str = "id, title, description, slug, is_published, created_at";
const LOCATION_COLUMNS: &str = "id, name, is_published, created_at";
const POST_COLUMNS: &str =
    "id, title, text, image, is_published, pub_date, author_id, category_id, location_id, created_at";

// Aliases `p` and `c` are what `PostFilter::push_where` expects.
const POST_CARD_SELECT: &str = r#"
    SELECT
        p.id, p.title, p.text, p.image, p.is_published, p.pub_date, p.author_id,
        u.username AS author_username,
        p.category_id,
        c.title AS category_title,
        c.slug AS category_slug,
        c.is_published AS category_is_published,
        p.location_id,
        CASE WHEN l.is_published THEN l.name END AS location_name,
        (SELECT COUNT(*) FROM comments cm WHERE cm.post_id = p.id) AS comment_count,
        p.created_at
    FROM posts p
    JOIN users u ON u.id = p.author_id
    LEFT JOIN categories c ON c.id = p.category_id
    LEFT JOIN locations l ON l.id = p.location_id
"#;

const COMMENT_SELECT: &str = r#"
    SELECT c.id, c.post_id, c.author_id, c.text, c.created_at, u.username AS author_username
    FROM comments c
    JOIN users u ON u.id = c.author_id
"#;

/// Turns constraint violations into domain errors; everything else stays a database error.
fn classify(what: &str, e: sqlx::Error) -> RepoError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return RepoError::Conflict(format!("{what} already exists"));
        }
        if db.is_foreign_key_violation() {
            return RepoError::InvalidReference(format!("{what} refers to a missing record"));
        }
    }
    tracing::error!("{} query failed: {:?}", what, e);
    RepoError::Database(e)
}

/// PostgresRepository
///
/// The `Repository` backed by PostgreSQL. Schema lives in `migrations/`.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| classify("user", e))
    }

    async fn get_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify("user", e))
    }

    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"INSERT INTO users (id, username, first_name, last_name, email, password_hash, is_staff, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
               RETURNING {USER_COLUMNS}"#
        ))
        .bind(Uuid::new_v4())
        .bind(user.username)
        .bind(user.first_name)
        .bind(user.last_name)
        .bind(user.email)
        .bind(user.password_hash)
        .bind(user.is_staff)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify("username", e))
    }

    async fn update_profile(&self, id: Uuid, form: ProfileForm) -> RepoResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            r#"UPDATE users
               SET username = $2, first_name = $3, last_name = $4, email = $5
               WHERE id = $1
               RETURNING {USER_COLUMNS}"#
        ))
        .bind(id)
        .bind(form.username)
        .bind(form.first_name)
        .bind(form.last_name)
        .bind(form.email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify("username", e))
    }

    async fn list_categories(&self, published_only: bool) -> RepoResult<Vec<Category>> {
        sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE is_published OR NOT $1 ORDER BY title ASC, id ASC"
        ))
        .bind(published_only)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| classify("category", e))
    }

    async fn get_category(&self, id: i64) -> RepoResult<Option<Category>> {
        sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify("category", e))
    }

    async fn get_category_by_slug(&self, slug: &str) -> RepoResult<Option<Category>> {
        sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify("category", e))
    }

    async fn create_category(&self, form: CategoryForm) -> RepoResult<Category> {
        sqlx::query_as::<_, Category>(&format!(
            r#"INSERT INTO categories (title, description, slug, is_published, created_at)
               VALUES ($1, $2, $3, $4, NOW())
               RETURNING {CATEGORY_COLUMNS}"#
        ))
        .bind(form.title)
        .bind(form.description)
        .bind(form.slug)
        .bind(form.is_published.unwrap_or(true))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify("category slug", e))
    }

    async fn set_category_published(&self, id: i64, is_published: bool) -> RepoResult<Option<Category>> {
        sqlx::query_as::<_, Category>(&format!(
            "UPDATE categories SET is_published = $2 WHERE id = $1 RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(id)
        .bind(is_published)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify("category", e))
    }

    async fn delete_category(&self, id: i64) -> RepoResult<bool> {
        // posts.category_id is ON DELETE SET NULL.
        sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map(|res| res.rows_affected() > 0)
            .map_err(|e| classify("category", e))
    }

    async fn get_location(&self, id: i64) -> RepoResult<Option<Location>> {
        sqlx::query_as::<_, Location>(&format!(
            "SELECT {LOCATION_COLUMNS} FROM locations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify("location", e))
    }

    async fn create_location(&self, form: LocationForm) -> RepoResult<Location> {
        sqlx::query_as::<_, Location>(&format!(
            r#"INSERT INTO locations (name, is_published, created_at)
               VALUES ($1, $2, NOW())
               RETURNING {LOCATION_COLUMNS}"#
        ))
        .bind(form.name)
        .bind(form.is_published.unwrap_or(true))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify("location", e))
    }

    async fn set_location_published(&self, id: i64, is_published: bool) -> RepoResult<Option<Location>> {
        sqlx::query_as::<_, Location>(&format!(
            "UPDATE locations SET is_published = $2 WHERE id = $1 RETURNING {LOCATION_COLUMNS}"
        ))
        .bind(id)
        .bind(is_published)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify("location", e))
    }

    async fn delete_location(&self, id: i64) -> RepoResult<bool> {
        sqlx::query("DELETE FROM locations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map(|res| res.rows_affected() > 0)
            .map_err(|e| classify("location", e))
    }

    async fn count_posts(&self, filter: &PostFilter, now: DateTime<Utc>) -> RepoResult<u64> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT COUNT(*) FROM posts p LEFT JOIN categories c ON c.id = p.category_id",
        );
        filter.push_where(&mut builder, now);

        let total: i64 = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| classify("post count", e))?;
        Ok(u64::try_from(total).unwrap_or(0))
    }

    async fn list_posts(
        &self,
        filter: &PostFilter,
        now: DateTime<Utc>,
        offset: i64,
        limit: i64,
    ) -> RepoResult<Vec<PostCard>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(POST_CARD_SELECT);
        filter.push_where(&mut builder, now);
        builder.push(ORDER_NEWEST_FIRST);
        builder.push(" LIMIT ").push_bind(limit);
        builder.push(" OFFSET ").push_bind(offset);

        builder
            .build_query_as::<PostCard>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| classify("post listing", e))
    }

    async fn get_post(&self, id: i64) -> RepoResult<Option<PostCard>> {
        sqlx::query_as::<_, PostCard>(&format!("{POST_CARD_SELECT} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| classify("post", e))
    }

    async fn create_post(&self, author_id: Uuid, post: NewPost) -> RepoResult<Post> {
        sqlx::query_as::<_, Post>(&format!(
            r#"INSERT INTO posts (title, text, image, is_published, pub_date, author_id, category_id, location_id, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
               RETURNING {POST_COLUMNS}"#
        ))
        .bind(post.title)
        .bind(post.text)
        .bind(post.image)
        .bind(post.is_published)
        .bind(post.pub_date)
        .bind(author_id)
        .bind(post.category_id)
        .bind(post.location_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify("post", e))
    }

    async fn update_post(&self, id: i64, post: NewPost) -> RepoResult<Option<Post>> {
        sqlx::query_as::<_, Post>(&format!(
            r#"UPDATE posts
               SET title = $2, text = $3, image = $4, is_published = $5,
                   pub_date = $6, category_id = $7, location_id = $8
               WHERE id = $1
               RETURNING {POST_COLUMNS}"#
        ))
        .bind(id)
        .bind(post.title)
        .bind(post.text)
        .bind(post.image)
        .bind(post.is_published)
        .bind(post.pub_date)
        .bind(post.category_id)
        .bind(post.location_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify("post", e))
    }

    async fn delete_post(&self, id: i64) -> RepoResult<bool> {
        // comments.post_id is ON DELETE CASCADE.
        sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map(|res| res.rows_affected() > 0)
            .map_err(|e| classify("post", e))
    }

    async fn list_comments(&self, post_id: i64) -> RepoResult<Vec<Comment>> {
        sqlx::query_as::<_, Comment>(&format!(
            "{COMMENT_SELECT} WHERE c.post_id = $1 ORDER BY c.created_at ASC, c.id ASC"
        ))
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| classify("comment", e))
    }

    async fn get_comment(&self, id: i64) -> RepoResult<Option<Comment>> {
        sqlx::query_as::<_, Comment>(&format!("{COMMENT_SELECT} WHERE c.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| classify("comment", e))
    }

    async fn add_comment(&self, post_id: i64, author_id: Uuid, text: String) -> RepoResult<Comment> {
        // Insert and join the author's username in one round trip.
        sqlx::query_as::<_, Comment>(
            r#"
            WITH inserted AS (
                INSERT INTO comments (post_id, author_id, text, created_at)
                VALUES ($1, $2, $3, NOW())
                RETURNING id, post_id, author_id, text, created_at
            )
            SELECT i.id, i.post_id, i.author_id, i.text, i.created_at, u.username AS author_username
            FROM inserted i JOIN users u ON u.id = i.author_id
            "#,
        )
        .bind(post_id)
        .bind(author_id)
        .bind(text)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify("comment", e))
    }

    async fn update_comment(&self, id: i64, text: String) -> RepoResult<Option<Comment>> {
        sqlx::query_as::<_, Comment>(
            r#"
            WITH updated AS (
                UPDATE comments SET text = $2 WHERE id = $1
                RETURNING id, post_id, author_id, text, created_at
            )
            SELECT d.id, d.post_id, d.author_id, d.text, d.created_at, u.username AS author_username
            FROM updated d JOIN users u ON u.id = d.author_id
            "#,
        )
        .bind(id)
        .bind(text)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify("comment", e))
    }

    async fn delete_comment(&self, id: i64) -> RepoResult<bool> {
        sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map(|res| res.rows_affected() > 0)
            .map_err(|e| classify("comment", e))
    }
}
