//! HTTP handlers

pub mod certificate;
pub mod health;
pub mod template;
pub mod verification;

pub use certificate::*;
pub use health::*;
pub use template::*;
pub use verification::*;
