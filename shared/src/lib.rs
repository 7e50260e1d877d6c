//! Shared types, models and the template engine for the certificate platform
//!
//! This crate has no I/O. It is used by the backend server and, through the
//! `wasm` crate, by the browser-side template editor.

pub mod models;
pub mod template;
pub mod types;
pub mod validation;

pub use models::*;
pub use template::{TemplateEngine, TemplateError, TemplateValidation};
pub use types::*;
pub use validation::*;
