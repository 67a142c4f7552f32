//! Which posts a viewer may see.
//!
//! A post is public when it is published, its `pub_date` has passed, and it either has
//! no category or its category is published. Authors always see their own posts.
//! The same rule exists twice: as a predicate over loaded rows ([`PostFilter::matches`])
//! and as an SQL clause ([`PostFilter::push_where`]). Keep them in step.

use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::PostCard;

/// The fields the visibility rule reads.
pub trait Publication {
    fn author_id(&self) -> Uuid;
    fn is_published(&self) -> bool;
    fn pub_date(&self) -> DateTime<Utc>;
    /// `None` when the post has no category.
    fn category_published(&self) -> Option<bool>;
}

impl Publication for PostCard {
    fn author_id(&self) -> Uuid {
        self.author_id
    }

    fn is_published(&self) -> bool {
        self.is_published
    }

    fn pub_date(&self) -> DateTime<Utc> {
        self.pub_date
    }

    fn category_published(&self) -> Option<bool> {
        self.category_is_published
    }
}

pub fn is_public<P: Publication + ?Sized>(post: &P, now: DateTime<Utc>) -> bool {
    post.is_published() && post.pub_date() <= now && post.category_published().unwrap_or(true)
}

pub fn visible_to<P: Publication + ?Sized>(post: &P, viewer: Option<Uuid>, now: DateTime<Utc>) -> bool {
    viewer == Some(post.author_id()) || is_public(post, now)
}

/// PostFilter
///
/// Selects the posts of a listing: the feed (no restriction), a category page or an
/// author's profile, as seen by `viewer`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostFilter {
    pub viewer: Option<Uuid>,
    pub category_id: Option<i64>,
    pub author_id: Option<Uuid>,
}

impl PostFilter {
    pub fn feed(viewer: Option<Uuid>) -> Self {
        Self {
            viewer,
            ..Self::default()
        }
    }

    pub fn category(viewer: Option<Uuid>, category_id: i64) -> Self {
        Self {
            viewer,
            category_id: Some(category_id),
            author_id: None,
        }
    }

    pub fn author(viewer: Option<Uuid>, author_id: Uuid) -> Self {
        Self {
            viewer,
            category_id: None,
            author_id: Some(author_id),
        }
    }

    pub fn matches(&self, post: &PostCard, now: DateTime<Utc>) -> bool {
        if self.category_id.is_some() && post.category_id != self.category_id {
            return false;
        }
        if self.author_id.is_some_and(|author| author != post.author_id) {
            return false;
        }
        visible_to(post, self.viewer, now)
    }

    /// Filters and orders loaded posts the way the SQL listing does.
    pub fn apply<I>(&self, posts: I, now: DateTime<Utc>) -> Vec<PostCard>
    where
        I: IntoIterator<Item = PostCard>,
    {
        let mut selected: Vec<PostCard> = posts
            .into_iter()
            .filter(|post| self.matches(post, now))
            .collect();
        sort_newest_first(&mut selected);
        selected
    }

    /// Appends the WHERE clause for this filter. Expects `posts` aliased as `p` and
    /// `categories` left-joined as `c`.
    pub fn push_where(&self, builder: &mut QueryBuilder<'_, Postgres>, now: DateTime<Utc>) {
        builder
            .push(" WHERE ((p.is_published AND p.pub_date <= ")
            .push_bind(now)
            .push(" AND (p.category_id IS NULL OR c.is_published))");
        if let Some(viewer) = self.viewer {
            builder.push(" OR p.author_id = ").push_bind(viewer);
        }
        builder.push(")");

        if let Some(category_id) = self.category_id {
            builder.push(" AND p.category_id = ").push_bind(category_id);
        }
        if let Some(author_id) = self.author_id {
            builder.push(" AND p.author_id = ").push_bind(author_id);
        }
    }
}

/// Publication date descending; the id breaks ties so pages are stable.
pub fn sort_newest_first(posts: &mut [PostCard]) {
    posts.sort_by(|a, b| b.pub_date.cmp(&a.pub_date).then(b.id.cmp(&a.id)));
}

pub const ORDER_NEWEST_FIRST: &str = " ORDER BY p.pub_date DESC, p.id DESC";
