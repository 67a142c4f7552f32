/// Router Module Index
///
/// Routes are split by who may call them. Access control is attached per module
/// in `create_router`, so a handler cannot end up public by accident.

/// Open to anonymous clients (reads, registration, login).
pub mod public;

/// Behind the `AuthUser` middleware.
pub mod authenticated;

/// Staff-only moderation, nested under `/admin`.
pub mod admin;
