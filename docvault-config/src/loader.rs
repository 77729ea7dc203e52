use std::path::PathBuf;

use tracing::debug;

use crate::{
    AuthConfig, Config, ConfigLoadError, ConfigMetadata, ConfigWarnings,
    DatabaseConfig, EnvConfig, FileConfig, ObjectBackend, ObjectStoreConfig,
};

/// Effective configuration plus the warnings gathered while building it.
#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}

#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
    read_env_file: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            config_path: None,
            read_env_file: true,
        }
    }

    /// Use an explicit TOML file instead of `DOCVAULT_CONFIG`.
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn without_env_file(mut self) -> Self {
        self.read_env_file = false;
        self
    }

    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = if self.read_env_file {
            match dotenvy::dotenv() {
                Ok(path) => {
                    debug!(path = %path.display(), "loaded .env file");
                    true
                }
                Err(err) if err.not_found() => false,
                Err(err) => return Err(err.into()),
            }
        } else {
            false
        };

        let env = EnvConfig::from_env();
        let config_file = self.config_path.clone().or(env.config_path.clone());
        let file = match config_file.as_deref() {
            Some(path) => FileConfig::read(path)?,
            None => FileConfig::default(),
        };

        let mut load = compose(file, env)?;
        load.config.metadata = ConfigMetadata {
            config_file,
            env_file_loaded,
        };
        Ok(load)
    }
}

/// Merge file values with environment overrides and validate the result.
pub fn compose(file: FileConfig, env: EnvConfig) -> Result<ConfigLoad, ConfigLoadError> {
    let mut warnings = ConfigWarnings::default();
    let object_store = compose_object_store(&file, &env, &mut warnings)?;

    let max_connections = match env.database_max_connections.as_deref() {
        Some(raw) => parse_value("DATABASE_MAX_CONNECTIONS", raw)?,
        None => file
            .database
            .max_connections
            .unwrap_or(DatabaseConfig::DEFAULT_MAX_CONNECTIONS),
    };
    if max_connections == 0 {
        return Err(ConfigLoadError::InvalidValue {
            key: "DATABASE_MAX_CONNECTIONS",
            value: "0".into(),
        });
    }
    let database = DatabaseConfig {
        url: env
            .database_url
            .or(file.database.url)
            .filter(|url| !url.trim().is_empty()),
        max_connections,
    };
    if database.url.is_none() {
        warnings.push(
            "DATABASE_URL is not set; identities are kept in memory",
            Some("set DATABASE_URL to a PostgreSQL connection string"),
        );
    }

    let uniform_login_failures = match env.uniform_login_failures.as_deref() {
        Some(raw) => parse_bool("AUTH_UNIFORM_LOGIN_FAILURES", raw)?,
        None => file.auth.uniform_login_failures.unwrap_or(false),
    };
    let auth = AuthConfig {
        jwt_secret: env
            .jwt_secret
            .or(file.auth.jwt_secret)
            .filter(|secret| !secret.is_empty()),
        password_pepper: env
            .password_pepper
            .or(file.auth.password_pepper)
            .filter(|secret| !secret.is_empty()),
        uniform_login_failures,
    };
    if auth.jwt_secret.is_none() {
        warnings.push(
            "JWT_SECRET is not set; logins will fail with an internal error",
            Some("generate one with `openssl rand -hex 32`"),
        );
    }

    Ok(ConfigLoad {
        config: Config {
            database,
            auth,
            object_store,
            metadata: ConfigMetadata::default(),
        },
        warnings,
    })
}

fn compose_object_store(
    file: &FileConfig,
    env: &EnvConfig,
    warnings: &mut ConfigWarnings,
) -> Result<ObjectStoreConfig, ConfigLoadError> {
    let defaults = ObjectStoreConfig::default();
    let section = &file.object_store;

    let backend = match env
        .object_store_backend
        .as_deref()
        .or(section.backend.as_deref())
    {
        Some(raw) => ObjectBackend::parse(raw).ok_or_else(|| {
            ConfigLoadError::InvalidValue {
                key: "OBJECT_STORE_BACKEND",
                value: raw.to_string(),
            }
        })?,
        None => defaults.backend,
    };

    let port = match env.minio_port.as_deref() {
        Some(raw) => parse_value("MINIO_PORT", raw)?,
        None => section.port.unwrap_or(defaults.port),
    };
    let use_ssl = match env.minio_use_ssl.as_deref() {
        Some(raw) => parse_bool("MINIO_USE_SSL", raw)?,
        None => section.use_ssl.unwrap_or(defaults.use_ssl),
    };

    let config = ObjectStoreConfig {
        backend,
        endpoint: env
            .minio_endpoint
            .clone()
            .or_else(|| section.endpoint.clone())
            .unwrap_or(defaults.endpoint),
        port,
        use_ssl,
        access_key: env
            .minio_access_key
            .clone()
            .or_else(|| section.access_key.clone()),
        secret_key: env
            .minio_secret_key
            .clone()
            .or_else(|| section.secret_key.clone()),
        bucket: env.minio_bucket.clone().or_else(|| section.bucket.clone()),
        region: env
            .minio_region
            .clone()
            .or_else(|| section.region.clone())
            .unwrap_or(defaults.region),
    };

    match config.backend {
        ObjectBackend::S3 => {
            const REASON: &str = "the s3 object store backend is selected";
            if config.bucket.is_none() {
                return Err(ConfigLoadError::MissingSetting {
                    key: "MINIO_BUCKET",
                    reason: REASON,
                });
            }
            if config.access_key.is_none() {
                return Err(ConfigLoadError::MissingSetting {
                    key: "MINIO_ACCESS_KEY",
                    reason: REASON,
                });
            }
            if config.secret_key.is_none() {
                return Err(ConfigLoadError::MissingSetting {
                    key: "MINIO_SECRET_KEY",
                    reason: REASON,
                });
            }
            config.endpoint_url()?;
        }
        ObjectBackend::Memory => warnings.push(
            "object store backend is in-memory; documents are lost on exit",
            None,
        ),
    }

    Ok(config)
}

fn parse_value<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigLoadError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigLoadError::InvalidValue {
            key,
            value: raw.to_string(),
        })
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigLoadError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigLoadError::InvalidValue {
            key,
            value: raw.to_string(),
        }),
    }
}
