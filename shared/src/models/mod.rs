//! Domain models for the certificate platform

mod catalog;
mod certificate;
mod certificate_template;

pub use catalog::*;
pub use certificate::*;
pub use certificate_template::*;
