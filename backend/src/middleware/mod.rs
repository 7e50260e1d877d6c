//! Request middleware

pub mod auth;

pub use auth::{auth_middleware, require_certificate_admin, AuthUser, CurrentUser, Role};
