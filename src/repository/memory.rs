use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{RepoError, RepoResult, Repository};
use crate::{
    models::{
        Category, CategoryForm, Comment, Location, LocationForm, NewPost, NewUser, Post, PostCard,
        ProfileForm, User,
    },
    visibility::PostFilter,
};

#[derive(Default)]
struct Tables {
    users: BTreeMap<Uuid, User>,
    categories: BTreeMap<i64, Category>,
    locations: BTreeMap<i64, Location>,
    posts: BTreeMap<i64, Post>,
    comments: BTreeMap<i64, Comment>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn username_taken(&self, username: &str, except: Option<Uuid>) -> bool {
        self.users
            .values()
            .any(|u| u.username == username && Some(u.id) != except)
    }

    fn check_references(&self, post: &NewPost) -> RepoResult<()> {
        if post.category_id.is_some_and(|id| !self.categories.contains_key(&id)) {
            return Err(RepoError::InvalidReference(
                "post refers to a missing record".to_string(),
            ));
        }
        if post.location_id.is_some_and(|id| !self.locations.contains_key(&id)) {
            return Err(RepoError::InvalidReference(
                "post refers to a missing record".to_string(),
            ));
        }
        Ok(())
    }

    fn card(&self, post: &Post) -> PostCard {
        let category = post.category_id.and_then(|id| self.categories.get(&id));
        let location = post.location_id.and_then(|id| self.locations.get(&id));
        PostCard {
            id: post.id,
            title: post.title.clone(),
            text: post.text.clone(),
            image: post.image.clone(),
            is_published: post.is_published,
            pub_date: post.pub_date,
            author_id: post.author_id,
            author_username: self
                .users
                .get(&post.author_id)
                .map(|u| u.username.clone())
                .unwrap_or_default(),
            category_id: post.category_id,
            category_title: category.map(|c| c.title.clone()),
            category_slug: category.map(|c| c.slug.clone()),
            category_is_published: category.map(|c| c.is_published),
            location_id: post.location_id,
            location_name: location.filter(|l| l.is_published).map(|l| l.name.clone()),
            comment_count: self
                .comments
                .values()
                .filter(|c| c.post_id == post.id)
                .count() as i64,
            created_at: post.created_at,
        }
    }

    fn with_username(&self, mut comment: Comment) -> Comment {
        comment.author_username = self.users.get(&comment.author_id).map(|u| u.username.clone());
        comment
    }

    fn selected(&self, filter: &PostFilter, now: DateTime<Utc>) -> Vec<PostCard> {
        filter.apply(self.posts.values().map(|p| self.card(p)), now)
    }
}

/// MemoryRepository
///
/// A process-local `Repository` with the same observable behaviour as the Postgres
/// store, including cascades and unique constraints. Used by tests and local demos.
#[derive(Default)]
pub struct MemoryRepository {
    tables: RwLock<Tables>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let mut tables = self.tables.write().await;
        if tables.username_taken(&user.username, None) {
            return Err(RepoError::Conflict("username already exists".to_string()));
        }
        let created = User {
            id: Uuid::new_v4(),
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            password_hash: user.password_hash,
            is_staff: user.is_staff,
            created_at: Utc::now(),
        };
        tables.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_profile(&self, id: Uuid, form: ProfileForm) -> RepoResult<Option<User>> {
        let mut tables = self.tables.write().await;
        if tables.username_taken(&form.username, Some(id)) {
            return Err(RepoError::Conflict("username already exists".to_string()));
        }
        Ok(tables.users.get_mut(&id).map(|user| {
            user.username = form.username;
            user.first_name = form.first_name;
            user.last_name = form.last_name;
            user.email = form.email;
            user.clone()
        }))
    }

    async fn list_categories(&self, published_only: bool) -> RepoResult<Vec<Category>> {
        let tables = self.tables.read().await;
        let mut categories: Vec<Category> = tables
            .categories
            .values()
            .filter(|c| c.is_published || !published_only)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(categories)
    }

    async fn get_category(&self, id: i64) -> RepoResult<Option<Category>> {
        Ok(self.tables.read().await.categories.get(&id).cloned())
    }

    async fn get_category_by_slug(&self, slug: &str) -> RepoResult<Option<Category>> {
        let tables = self.tables.read().await;
        Ok(tables.categories.values().find(|c| c.slug == slug).cloned())
    }

    async fn create_category(&self, form: CategoryForm) -> RepoResult<Category> {
        let mut tables = self.tables.write().await;
        if tables.categories.values().any(|c| c.slug == form.slug) {
            return Err(RepoError::Conflict("category slug already exists".to_string()));
        }
        let category = Category {
            id: tables.next_id(),
            title: form.title,
            description: form.description,
            slug: form.slug,
            is_published: form.is_published.unwrap_or(true),
            created_at: Utc::now(),
        };
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn set_category_published(&self, id: i64, is_published: bool) -> RepoResult<Option<Category>> {
        let mut tables = self.tables.write().await;
        Ok(tables.categories.get_mut(&id).map(|c| {
            c.is_published = is_published;
            c.clone()
        }))
    }

    async fn delete_category(&self, id: i64) -> RepoResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.categories.remove(&id).is_none() {
            return Ok(false);
        }
        for post in tables.posts.values_mut() {
            if post.category_id == Some(id) {
                post.category_id = None;
            }
        }
        Ok(true)
    }

    async fn get_location(&self, id: i64) -> RepoResult<Option<Location>> {
        Ok(self.tables.read().await.locations.get(&id).cloned())
    }

    async fn create_location(&self, form: LocationForm) -> RepoResult<Location> {
        let mut tables = self.tables.write().await;
        let location = Location {
            id: tables.next_id(),
            name: form.name,
            is_published: form.is_published.unwrap_or(true),
            created_at: Utc::now(),
        };
        tables.locations.insert(location.id, location.clone());
        Ok(location)
    }

    async fn set_location_published(&self, id: i64, is_published: bool) -> RepoResult<Option<Location>> {
        let mut tables = self.tables.write().await;
        Ok(tables.locations.get_mut(&id).map(|l| {
            l.is_published = is_published;
            l.clone()
        }))
    }

    async fn delete_location(&self, id: i64) -> RepoResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.locations.remove(&id).is_none() {
            return Ok(false);
        }
        for post in tables.posts.values_mut() {
            if post.location_id == Some(id) {
                post.location_id = None;
            }
        }
        Ok(true)
    }

    async fn count_posts(&self, filter: &PostFilter, now: DateTime<Utc>) -> RepoResult<u64> {
        let tables = self.tables.read().await;
        Ok(tables.selected(filter, now).len() as u64)
    }

    async fn list_posts(
        &self,
        filter: &PostFilter,
        now: DateTime<Utc>,
        offset: i64,
        limit: i64,
    ) -> RepoResult<Vec<PostCard>> {
        let tables = self.tables.read().await;
        Ok(tables
            .selected(filter, now)
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn get_post(&self, id: i64) -> RepoResult<Option<PostCard>> {
        let tables = self.tables.read().await;
        Ok(tables.posts.get(&id).map(|p| tables.card(p)))
    }

    async fn create_post(&self, author_id: Uuid, post: NewPost) -> RepoResult<Post> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&author_id) {
            return Err(RepoError::InvalidReference(
                "post refers to a missing record".to_string(),
            ));
        }
        tables.check_references(&post)?;
        let created = Post {
            id: tables.next_id(),
            title: post.title,
            text: post.text,
            image: post.image,
            is_published: post.is_published,
            pub_date: post.pub_date,
            author_id,
            category_id: post.category_id,
            location_id: post.location_id,
            created_at: Utc::now(),
        };
        tables.posts.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_post(&self, id: i64, post: NewPost) -> RepoResult<Option<Post>> {
        let mut tables = self.tables.write().await;
        tables.check_references(&post)?;
        Ok(tables.posts.get_mut(&id).map(|existing| {
            existing.title = post.title;
            existing.text = post.text;
            existing.image = post.image;
            existing.is_published = post.is_published;
            existing.pub_date = post.pub_date;
            existing.category_id = post.category_id;
            existing.location_id = post.location_id;
            existing.clone()
        }))
    }

    async fn delete_post(&self, id: i64) -> RepoResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.posts.remove(&id).is_none() {
            return Ok(false);
        }
        tables.comments.retain(|_, c| c.post_id != id);
        Ok(true)
    }

    async fn list_comments(&self, post_id: i64) -> RepoResult<Vec<Comment>> {
        let tables = self.tables.read().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .map(|c| tables.with_username(c))
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(comments)
    }

    async fn get_comment(&self, id: i64) -> RepoResult<Option<Comment>> {
        let tables = self.tables.read().await;
        Ok(tables.comments.get(&id).cloned().map(|c| tables.with_username(c)))
    }

    async fn add_comment(&self, post_id: i64, author_id: Uuid, text: String) -> RepoResult<Comment> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&post_id) || !tables.users.contains_key(&author_id) {
            return Err(RepoError::InvalidReference(
                "comment refers to a missing record".to_string(),
            ));
        }
        let comment = Comment {
            id: tables.next_id(),
            post_id,
            author_id,
            text,
            created_at: Utc::now(),
            author_username: None,
        };
        tables.comments.insert(comment.id, comment.clone());
        Ok(tables.with_username(comment))
    }

    async fn update_comment(&self, id: i64, text: String) -> RepoResult<Option<Comment>> {
        let mut tables = self.tables.write().await;
        let updated = tables.comments.get_mut(&id).map(|c| {
            c.text = text;
            c.clone()
        });
        Ok(updated.map(|c| tables.with_username(c)))
    }

    async fn delete_comment(&self, id: i64) -> RepoResult<bool> {
        Ok(self.tables.write().await.comments.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            password_hash: "hash".to_string(),
            is_staff: false,
        }
    }

    fn new_post(title: &str, pub_date: DateTime<Utc>, category_id: Option<i64>) -> NewPost {
        NewPost {
            title: title.to_string(),
            text: "body".to_string(),
            image: None,
            is_published: true,
            pub_date,
            category_id,
            location_id: None,
        }
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let repo = MemoryRepository::new();
        repo.create_user(new_user("leo")).await.unwrap();
        let err = repo.create_user(new_user("leo")).await.unwrap_err();
        assert!(matches!(err, RepoError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_card_hides_unpublished_location_name() {
        let repo = MemoryRepository::new();
        let author = repo.create_user(new_user("leo")).await.unwrap();
        let location = repo
            .create_location(LocationForm {
                name: "Island".to_string(),
                is_published: Some(false),
            })
            .await
            .unwrap();
        let mut post = new_post("Trip", Utc::now(), None);
        post.location_id = Some(location.id);
        let created = repo.create_post(author.id, post).await.unwrap();

        let card = repo.get_post(created.id).await.unwrap().unwrap();
        assert_eq!(card.location_id, Some(location.id));
        assert_eq!(card.location_name, None);
        assert_eq!(card.author_username, "leo");
    }

    #[tokio::test]
    async fn test_delete_post_removes_comments() {
        let repo = MemoryRepository::new();
        let author = repo.create_user(new_user("leo")).await.unwrap();
        let post = repo
            .create_post(author.id, new_post("Hi", Utc::now(), None))
            .await
            .unwrap();
        let comment = repo
            .add_comment(post.id, author.id, "first".to_string())
            .await
            .unwrap();

        assert!(repo.delete_post(post.id).await.unwrap());
        assert!(repo.get_comment(comment.id).await.unwrap().is_none());
        assert!(!repo.delete_post(post.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_category_detaches_posts() {
        let repo = MemoryRepository::new();
        let author = repo.create_user(new_user("leo")).await.unwrap();
        let category = repo
            .create_category(CategoryForm {
                title: "Travel".to_string(),
                slug: "travel".to_string(),
                ..CategoryForm::default()
            })
            .await
            .unwrap();
        let post = repo
            .create_post(author.id, new_post("Hi", Utc::now(), Some(category.id)))
            .await
            .unwrap();

        assert!(repo.delete_category(category.id).await.unwrap());
        let card = repo.get_post(post.id).await.unwrap().unwrap();
        assert_eq!(card.category_id, None);
    }

    #[tokio::test]
    async fn test_list_posts_pages_newest_first() {
        let repo = MemoryRepository::new();
        let author = repo.create_user(new_user("leo")).await.unwrap();
        let now = Utc::now();
        for hours in 1..=3 {
            repo.create_post(author.id, new_post(&format!("p{hours}"), now - Duration::hours(hours), None))
                .await
                .unwrap();
        }
        let filter = PostFilter::feed(None);
        assert_eq!(repo.count_posts(&filter, now).await.unwrap(), 3);
        let page = repo.list_posts(&filter, now, 1, 2).await.unwrap();
        let titles: Vec<&str> = page.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["p2", "p3"]);
    }

    #[tokio::test]
    async fn test_comments_follow_creation_time_not_id() {
        let repo = MemoryRepository::new();
        let author = repo.create_user(new_user("leo")).await.unwrap();
        let post = repo
            .create_post(author.id, new_post("Hi", Utc::now(), None))
            .await
            .unwrap();
        let later = repo.add_comment(post.id, author.id, "later".to_string()).await.unwrap();
        let earlier = repo.add_comment(post.id, author.id, "earlier".to_string()).await.unwrap();
        assert!(later.id < earlier.id);

        // Backdate the second comment so creation order and id order disagree.
        if let Some(comment) = repo.tables.write().await.comments.get_mut(&earlier.id) {
            comment.created_at = later.created_at - Duration::minutes(5);
        }

        let texts: Vec<String> = repo
            .list_comments(post.id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.text)
            .collect();
        assert_eq!(texts, vec!["earlier", "later"]);
    }

    #[tokio::test]
    async fn test_missing_category_reference_rejected() {
        let repo = MemoryRepository::new();
        let author = repo.create_user(new_user("leo")).await.unwrap();
        let err = repo
            .create_post(author.id, new_post("Hi", Utc::now(), Some(999)))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::InvalidReference(_)));
    }
}
