//! Business logic services for the certificate platform

pub mod certificate;
pub mod template;

pub use certificate::CertificateService;
pub use template::TemplateService;
