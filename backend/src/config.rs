//! Configuration management for the certificate platform
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with CERT_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use shared::Language;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Storage backend selection
    pub storage: StorageConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT authentication configuration
    pub jwt: JwtConfig,

    /// Certificate issuance settings
    pub certificates: CertificateConfig,

    /// PDF renderer settings
    pub pdf: PdfConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret key for verifying JWT tokens
    pub secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CertificateConfig {
    /// Prefix of every certificate number
    pub number_prefix: String,

    /// Issuing organization shown on certificates
    pub organization_name: String,

    /// Public verification page; the certificate number is appended
    pub verification_base_url: String,

    /// Locale for dates and numbers in templates
    pub locale: Language,

    /// Reject revoking an already revoked certificate
    pub strict_revocation: bool,

    /// Store the rendered HTML in metadata at issuance
    pub cache_rendered_html: bool,

    /// Rows fetched per store query while exporting CSV
    pub export_batch_size: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PdfConfig {
    /// Number of browser processes kept in the pool
    pub pool_size: usize,

    /// Upper bound for loading and capturing one document
    pub load_timeout_secs: u64,

    pub viewport_width: u32,
    pub viewport_height: u32,
    pub device_scale_factor: f64,

    /// Explicit Chromium binary; auto-detected when unset
    pub chrome_executable: Option<String>,

    /// Run Chromium without its sandbox (needed in most containers)
    pub no_sandbox: bool,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("CERT_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("storage.backend", "postgres")?
            .set_default("database.url", "postgres://localhost/certificates")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("jwt.secret", "development-secret-key")?
            .set_default("certificates.number_prefix", "BIT")?
            .set_default("certificates.organization_name", "Learning Academy")?
            .set_default(
                "certificates.verification_base_url",
                "http://localhost:3000/verify",
            )?
            .set_default("certificates.locale", "english")?
            .set_default("certificates.strict_revocation", false)?
            .set_default("certificates.cache_rendered_html", false)?
            .set_default("certificates.export_batch_size", 500)?
            .set_default("pdf.pool_size", 2)?
            .set_default("pdf.load_timeout_secs", 30)?
            .set_default("pdf.viewport_width", 1920)?
            .set_default("pdf.viewport_height", 1080)?
            .set_default("pdf.device_scale_factor", 2.0)?
            .set_default("pdf.no_sandbox", true)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (CERT_ prefix)
            .add_source(
                Environment::with_prefix("CERT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        shared::validate_number_prefix(&config.certificates.number_prefix)
            .map_err(|e| ConfigError::Message(e.to_string()))?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            server: ServerConfig::default(),
            storage: StorageConfig {
                backend: StorageBackend::Memory,
            },
            database: DatabaseConfig {
                url: "postgres://localhost/certificates".to_string(),
                max_connections: 10,
                min_connections: 2,
            },
            jwt: JwtConfig {
                secret: "development-secret-key".to_string(),
            },
            certificates: CertificateConfig::default(),
            pdf: PdfConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}

impl Default for CertificateConfig {
    fn default() -> Self {
        Self {
            number_prefix: "BIT".to_string(),
            organization_name: "Learning Academy".to_string(),
            verification_base_url: "http://localhost:3000/verify".to_string(),
            locale: Language::English,
            strict_revocation: false,
            cache_rendered_html: false,
            export_batch_size: 500,
        }
    }
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            pool_size: 2,
            load_timeout_secs: 30,
            viewport_width: 1920,
            viewport_height: 1080,
            device_scale_factor: 2.0,
            chrome_executable: None,
            no_sandbox: true,
        }
    }
}
