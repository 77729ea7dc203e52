use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::{ConfigLoadError, Secret};

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub database: FileDatabaseConfig,
    #[serde(default)]
    pub auth: FileAuthConfig,
    #[serde(default)]
    pub object_store: FileObjectStoreConfig,
}

impl FileConfig {
    pub fn read(path: &Path) -> Result<Self, ConfigLoadError> {
        let raw = std::fs::read_to_string(path).map_err(|source| {
            ConfigLoadError::ConfigFileIo {
                path: path.to_path_buf(),
                source,
            }
        })?;
        toml::from_str(&raw).map_err(|source| ConfigLoadError::ConfigFileParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileDatabaseConfig {
    pub url: Option<String>,
    pub max_connections: Option<u32>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileAuthConfig {
    pub jwt_secret: Option<Secret>,
    pub password_pepper: Option<Secret>,
    pub uniform_login_failures: Option<bool>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileObjectStoreConfig {
    pub backend: Option<String>,
    pub endpoint: Option<String>,
    pub port: Option<u16>,
    pub use_ssl: Option<bool>,
    pub access_key: Option<Secret>,
    pub secret_key: Option<Secret>,
    pub bucket: Option<String>,
    pub region: Option<String>,
}

/// Raw values read from the process environment.
///
/// Values are kept as strings; parsing happens in [`crate::compose`] so
/// errors can name the offending variable. Blank values count as unset.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub database_url: Option<String>,
    pub database_max_connections: Option<String>,
    pub jwt_secret: Option<Secret>,
    pub password_pepper: Option<Secret>,
    pub uniform_login_failures: Option<String>,
    pub object_store_backend: Option<String>,
    pub minio_endpoint: Option<String>,
    pub minio_port: Option<String>,
    pub minio_use_ssl: Option<String>,
    pub minio_access_key: Option<Secret>,
    pub minio_secret_key: Option<Secret>,
    pub minio_bucket: Option<String>,
    pub minio_region: Option<String>,
}

impl EnvConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| {
            lookup(key).filter(|value| !value.trim().is_empty())
        };
        let secret = |key: &str| var(key).map(Secret::new);

        Self {
            config_path: var("DOCVAULT_CONFIG").map(PathBuf::from),
            database_url: var("DATABASE_URL"),
            database_max_connections: var("DATABASE_MAX_CONNECTIONS"),
            jwt_secret: secret("JWT_SECRET"),
            password_pepper: secret("PASSWORD_PEPPER"),
            uniform_login_failures: var("AUTH_UNIFORM_LOGIN_FAILURES"),
            object_store_backend: var("OBJECT_STORE_BACKEND"),
            minio_endpoint: var("MINIO_ENDPOINT"),
            minio_port: var("MINIO_PORT"),
            minio_use_ssl: var("MINIO_USE_SSL"),
            minio_access_key: secret("MINIO_ACCESS_KEY"),
            minio_secret_key: secret("MINIO_SECRET_KEY"),
            minio_bucket: var("MINIO_BUCKET"),
            minio_region: var("MINIO_REGION"),
        }
    }
}
