//! HTTP handlers, grouped by resource.
//!
//! Handlers stay thin: extract, validate, run the permission gate or visibility
//! filter, call the repository, shape the JSON.

use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, AppResult},
    pagination::{Paginator, parse_page_number},
};

pub mod accounts;
pub mod comments;
pub mod pages;
pub mod posts;
pub mod profiles;
pub mod taxonomy;
pub mod uploads;

/// PageQuery
///
/// The `?page=N` parameter of every paginated listing. Kept as a string so that
/// garbage such as `?page=abc` falls back to the first page instead of a 400.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct PageQuery {
    /// 1-based page number. Out-of-range values are clamped.
    pub page: Option<String>,
}

impl PageQuery {
    pub fn number(&self) -> i64 {
        parse_page_number(self.page.as_deref())
    }
}

pub(crate) fn paginator(state: &AppState) -> Paginator {
    Paginator::new(state.config.posts_per_page)
}

/// Staff-only endpoints answer 403 to everyone else.
pub(crate) fn require_staff(user: &AuthUser) -> AppResult<()> {
    if user.is_staff {
        Ok(())
    } else {
        tracing::debug!(user = %user.id, "staff endpoint refused");
        Err(AppError::Forbidden)
    }
}
