use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::pagination::Page;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// A registered account from the `users` table. The password hash is loaded for
/// login checks but never leaves the process.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    // Staff accounts may edit or delete any post, comment or profile.
    pub is_staff: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Category
///
/// A thematic section addressed by its unique `slug`. Unpublishing a category hides
/// every post filed under it.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Category {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub slug: String,
    pub is_published: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Location
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub is_published: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Post
///
/// Raw row of the `posts` table. A `pub_date` in the future schedules the post:
/// it stays hidden from everyone but its author until that moment.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub text: String,
    // Storage key of the attached image, if any.
    pub image: Option<String>,
    pub is_published: bool,
    #[ts(type = "string")]
    pub pub_date: DateTime<Utc>,
    pub author_id: Uuid,
    pub category_id: Option<i64>,
    pub location_id: Option<i64>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// PostCard
///
/// A post joined with everything a listing or detail view shows: the author's
/// username, the category (needed by the visibility rules), the location name and
/// the number of comments.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct PostCard {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub image: Option<String>,
    pub is_published: bool,
    #[ts(type = "string")]
    pub pub_date: DateTime<Utc>,
    pub author_id: Uuid,
    pub author_username: String,
    pub category_id: Option<i64>,
    pub category_title: Option<String>,
    pub category_slug: Option<String>,
    pub category_is_published: Option<bool>,
    pub location_id: Option<i64>,
    // Only filled in while the location itself is published.
    pub location_name: Option<String>,
    pub comment_count: i64,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Comment
///
/// A row of the `comments` table, augmented with the author's username (a join).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: Uuid,
    pub text: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[sqlx(default)]
    pub author_username: Option<String>,
}

// --- Request Payloads (Input Schemas) ---

/// PostForm
///
/// Body of `POST /posts` and `PUT /posts/{post_id}`. Editing replaces every field,
/// like submitting the full form again. Omitted `pub_date` means "now", omitted
/// `is_published` means published.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PostForm {
    pub title: String,
    pub text: String,
    pub image: Option<String>,
    pub location_id: Option<i64>,
    pub category_id: Option<i64>,
    #[ts(type = "string | null")]
    pub pub_date: Option<DateTime<Utc>>,
    pub is_published: Option<bool>,
}

/// NewPost
///
/// A validated post ready for insertion, with defaults already resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPost {
    pub title: String,
    pub text: String,
    pub image: Option<String>,
    pub is_published: bool,
    pub pub_date: DateTime<Utc>,
    pub category_id: Option<i64>,
    pub location_id: Option<i64>,
}

impl NewPost {
    pub fn from_form(form: PostForm, now: DateTime<Utc>) -> Self {
        Self {
            title: form.title.trim().to_string(),
            text: form.text,
            image: form.image.filter(|key| !key.trim().is_empty()),
            is_published: form.is_published.unwrap_or(true),
            pub_date: form.pub_date.unwrap_or(now),
            category_id: form.category_id,
            location_id: form.location_id,
        }
    }
}

/// CommentForm
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CommentForm {
    pub text: String,
}

/// ProfileForm
///
/// Body of `PUT /profile/{username}`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ProfileForm {
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
}

/// RegisterUserRequest
///
/// Body of `POST /auth/registration`. The password is hashed before it reaches the store.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisterUserRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// NewUser
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub is_staff: bool,
}

/// LoginRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// TokenResponse
///
/// Bearer token handed out by `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// CategoryForm
///
/// Staff-only payload for `POST /admin/categories`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CategoryForm {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub slug: String,
    pub is_published: Option<bool>,
}

/// LocationForm
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LocationForm {
    pub name: String,
    pub is_published: Option<bool>,
}

/// PresignedUrlRequest
///
/// Input payload for requesting a short-lived upload URL for a post image.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUrlRequest {
    /// The original filename, used to derive the file extension.
    #[schema(example = "sunset.jpg")]
    pub filename: String,
    /// Must be an `image/*` MIME type.
    #[schema(example = "image/jpeg")]
    pub file_type: String,
}

/// PresignedUrlResponse
///
/// The `resource_key` goes into `PostForm::image` once the client has uploaded the file.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUrlResponse {
    pub upload_url: String,
    pub resource_key: String,
}

// --- Page Schemas (Output) ---

/// PostDetail
///
/// Output of `GET /posts/{post_id}`: the post and its comments, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct PostDetail {
    pub post: PostCard,
    pub comments: Vec<Comment>,
}

/// CategoryPosts
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CategoryPosts {
    pub category: Category,
    pub page: Page<PostCard>,
}

/// PublicProfile
///
/// A user as shown on their profile page. `email` and `is_staff` are only filled in
/// when the account itself or a staff member is looking.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct PublicProfile {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_staff: Option<bool>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl PublicProfile {
    pub fn new(user: User, show_private: bool) -> Self {
        Self {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            email: show_private.then_some(user.email),
            is_staff: show_private.then_some(user.is_staff),
            created_at: user.created_at,
        }
    }
}

/// ProfilePage
///
/// Output of `GET /profile/{username}`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ProfilePage {
    pub profile: PublicProfile,
    pub page: Page<PostCard>,
}

/// StaticPage
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct StaticPage {
    pub title: String,
    pub body: String,
}
