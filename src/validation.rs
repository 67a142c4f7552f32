//! Form checks run by handlers before anything reaches the store.
//!
//! Every check collects all problems and reports them together as
//! [`AppError::Validation`].

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    error::{AppError, AppResult},
    models::{CategoryForm, CommentForm, LocationForm, PostForm, ProfileForm, RegisterUserRequest},
};

pub const MAX_FIELD_LENGTH: usize = 256;
pub const USERNAME_MAX: usize = 150;
pub const SLUG_MAX: usize = 50;
pub const PASSWORD_MIN: usize = 8;
const PASSWORD_MAX: usize = 128;

static SLUG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("compile slug regex"));
static USERNAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.@+-]+$").expect("compile username regex"));
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9-]+(?:\.[a-zA-Z0-9-]+)*$")
        .expect("compile email regex")
});

#[derive(Default)]
struct Problems(Vec<String>);

impl Problems {
    fn check(&mut self, ok: bool, message: &str) {
        if !ok {
            self.0.push(message.to_string());
        }
    }

    fn required(&mut self, value: &str, field: &str) {
        self.check(!value.trim().is_empty(), &format!("{field} is required"));
    }

    fn max_len(&mut self, value: &str, max: usize, field: &str) {
        self.check(
            value.chars().count() <= max,
            &format!("{field} must be at most {max} characters"),
        );
    }

    fn finish(self) -> AppResult<()> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self.0))
        }
    }
}

pub fn is_valid_slug(slug: &str) -> bool {
    SLUG_REGEX.is_match(slug)
}

pub fn is_valid_username(name: &str) -> bool {
    USERNAME_REGEX.is_match(name) && name.chars().count() <= USERNAME_MAX
}

/// Empty is allowed: the email field is optional.
pub fn is_valid_email(email: &str) -> bool {
    email.is_empty() || (EMAIL_REGEX.is_match(email) && email.len() <= 254)
}

pub fn validate_post(form: &PostForm) -> AppResult<()> {
    let mut problems = Problems::default();
    problems.required(&form.title, "title");
    problems.max_len(&form.title, MAX_FIELD_LENGTH, "title");
    problems.required(&form.text, "text");
    problems.finish()
}

pub fn validate_comment(form: &CommentForm) -> AppResult<()> {
    let mut problems = Problems::default();
    problems.required(&form.text, "text");
    problems.finish()
}

pub fn validate_profile(form: &ProfileForm) -> AppResult<()> {
    let mut problems = Problems::default();
    problems.check(
        is_valid_username(&form.username),
        "username may contain only letters, digits and @/./+/-/_",
    );
    problems.max_len(&form.first_name, USERNAME_MAX, "first_name");
    problems.max_len(&form.last_name, USERNAME_MAX, "last_name");
    problems.check(is_valid_email(&form.email), "email is not valid");
    problems.finish()
}

pub fn validate_registration(req: &RegisterUserRequest) -> AppResult<()> {
    let mut problems = Problems::default();
    problems.check(
        is_valid_username(&req.username),
        "username may contain only letters, digits and @/./+/-/_",
    );
    problems.check(
        (PASSWORD_MIN..=PASSWORD_MAX).contains(&req.password.chars().count()),
        "password must be between 8 and 128 characters",
    );
    problems.max_len(&req.first_name, USERNAME_MAX, "first_name");
    problems.max_len(&req.last_name, USERNAME_MAX, "last_name");
    problems.check(is_valid_email(&req.email), "email is not valid");
    problems.finish()
}

pub fn validate_category(form: &CategoryForm) -> AppResult<()> {
    let mut problems = Problems::default();
    problems.required(&form.title, "title");
    problems.max_len(&form.title, MAX_FIELD_LENGTH, "title");
    problems.check(
        is_valid_slug(&form.slug),
        "slug may contain only latin letters, digits, hyphen and underscore",
    );
    problems.max_len(&form.slug, SLUG_MAX, "slug");
    problems.finish()
}

pub fn validate_location(form: &LocationForm) -> AppResult<()> {
    let mut problems = Problems::default();
    problems.required(&form.name, "name");
    problems.max_len(&form.name, MAX_FIELD_LENGTH, "name");
    problems.finish()
}
