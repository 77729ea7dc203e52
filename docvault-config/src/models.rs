use std::path::PathBuf;

use url::Url;

use crate::{ConfigLoadError, Secret};

/// Fully resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub object_store: ObjectStoreConfig,
    pub metadata: ConfigMetadata,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL. `None` selects the in-memory credential
    /// store, which does not survive a restart.
    pub url: Option<String>,
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
}

#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    /// HS256 signing secret. Logins fail with an internal error while unset.
    pub jwt_secret: Option<Secret>,
    pub password_pepper: Option<Secret>,
    /// Report unknown emails and wrong passwords with the same outcome.
    pub uniform_login_failures: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectBackend {
    /// S3-compatible service such as MinIO.
    S3,
    /// Process-local store, lost on exit.
    Memory,
}

impl ObjectBackend {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "s3" | "minio" => Some(Self::S3),
            "memory" | "in-memory" => Some(Self::Memory),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ObjectStoreConfig {
    pub backend: ObjectBackend,
    /// Hostname of the S3 endpoint, without scheme or port.
    pub endpoint: String,
    pub port: u16,
    pub use_ssl: bool,
    pub access_key: Option<Secret>,
    pub secret_key: Option<Secret>,
    pub bucket: Option<String>,
    pub region: String,
}

impl ObjectStoreConfig {
    pub const DEFAULT_ENDPOINT: &'static str = "minio";
    pub const DEFAULT_PORT: u16 = 9000;
    pub const DEFAULT_REGION: &'static str = "us-east-1";

    /// Base URL of the S3 endpoint derived from host, port and SSL flag.
    pub fn endpoint_url(&self) -> Result<Url, ConfigLoadError> {
        let scheme = if self.use_ssl { "https" } else { "http" };
        Url::parse(&format!("{scheme}://{}:{}", self.endpoint, self.port))
            .map_err(|source| ConfigLoadError::InvalidEndpoint { source })
    }
}

impl Default for ObjectStoreConfig {
    fn default() -> Self {
        Self {
            backend: ObjectBackend::S3,
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
            port: Self::DEFAULT_PORT,
            use_ssl: false,
            access_key: None,
            secret_key: None,
            bucket: None,
            region: Self::DEFAULT_REGION.to_string(),
        }
    }
}

/// Where the effective configuration came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub config_file: Option<PathBuf>,
    pub env_file_loaded: bool,
}

/// Non-fatal findings produced while composing the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push(&mut self, message: impl Into<String>, hint: Option<&str>) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: hint.map(str::to_string),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_url_follows_ssl_flag() {
        let mut cfg = ObjectStoreConfig::default();
        assert_eq!(cfg.endpoint_url().unwrap().as_str(), "http://minio:9000/");

        cfg.use_ssl = true;
        cfg.endpoint = "objects.example.com".into();
        cfg.port = 443;
        // 443 is the https default and gets normalized away.
        assert_eq!(
            cfg.endpoint_url().unwrap().as_str(),
            "https://objects.example.com/"
        );
    }

    #[test]
    fn endpoint_with_spaces_is_rejected() {
        let cfg = ObjectStoreConfig {
            endpoint: "bad host".into(),
            ..ObjectStoreConfig::default()
        };
        assert!(matches!(
            cfg.endpoint_url(),
            Err(ConfigLoadError::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn backend_names_are_case_insensitive() {
        assert_eq!(ObjectBackend::parse("MinIO"), Some(ObjectBackend::S3));
        assert_eq!(ObjectBackend::parse("memory"), Some(ObjectBackend::Memory));
        assert_eq!(ObjectBackend::parse("disk"), None);
    }
}
