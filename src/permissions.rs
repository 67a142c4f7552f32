//! The authorship check guarding every mutation.
//!
//! A resource may be changed by its author or by a staff account. A missing resource
//! is reported before authorship is looked at.

use thiserror::Error;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    models::{Comment, Post, PostCard, User},
};

/// Anything with an owning user.
pub trait Authored {
    fn author_id(&self) -> Uuid;
}

impl Authored for Post {
    fn author_id(&self) -> Uuid {
        self.author_id
    }
}

impl Authored for PostCard {
    fn author_id(&self) -> Uuid {
        self.author_id
    }
}

impl Authored for Comment {
    fn author_id(&self) -> Uuid {
        self.author_id
    }
}

// A profile is owned by the account itself.
impl Authored for User {
    fn author_id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GateError {
    #[error("resource not found")]
    NotFound,
    #[error("only the author may change this resource")]
    NotAuthor,
}

pub fn can_mutate(actor: &AuthUser, author_id: Uuid) -> bool {
    actor.is_staff || actor.id == author_id
}

/// Hands the resource back when `actor` may change it.
pub fn authorize<R: Authored>(actor: &AuthUser, resource: Option<R>) -> Result<R, GateError> {
    let resource = resource.ok_or(GateError::NotFound)?;
    if can_mutate(actor, resource.author_id()) {
        Ok(resource)
    } else {
        tracing::debug!(actor = %actor.id, author = %resource.author_id(), "mutation denied");
        Err(GateError::NotAuthor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AUTHOR: Uuid = Uuid::from_u128(10);
    const OTHER: Uuid = Uuid::from_u128(20);

    fn actor(id: Uuid, is_staff: bool) -> AuthUser {
        AuthUser {
            id,
            username: "someone".to_string(),
            is_staff,
        }
    }

    fn post() -> Post {
        Post {
            id: 1,
            author_id: AUTHOR,
            ..Post::default()
        }
    }

    #[test]
    fn author_is_allowed() {
        assert_eq!(authorize(&actor(AUTHOR, false), Some(post())).map(|p| p.id), Ok(1));
    }

    #[test]
    fn stranger_is_denied() {
        let result = authorize(&actor(OTHER, false), Some(post()));
        assert_eq!(result.err(), Some(GateError::NotAuthor));
    }

    #[test]
    fn staff_overrides_authorship() {
        assert!(authorize(&actor(OTHER, true), Some(post())).is_ok());
    }

    #[test]
    fn missing_resource_is_not_found_even_for_staff() {
        let result = authorize::<Post>(&actor(OTHER, true), None);
        assert_eq!(result.err(), Some(GateError::NotFound));
    }

    #[test]
    fn profile_belongs_to_its_user() {
        let user = User {
            id: OTHER,
            ..User::default()
        };
        assert!(authorize(&actor(OTHER, false), Some(user.clone())).is_ok());
        assert_eq!(
            authorize(&actor(AUTHOR, false), Some(user)).err(),
            Some(GateError::NotAuthor)
        );
    }
}
