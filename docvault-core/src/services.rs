//! Startup wiring: builds the shared clients once and hands out the
//! services that use them.

use docvault_config::Config;
use object_store::ObjectStore;
use std::sync::Arc;
use tracing::{info, warn};

use crate::documents::{BlobStore, build_object_store};
use crate::error::{DocVaultError, Result};
use crate::identity::{
    Argon2PasswordHasher, Authenticator, CredentialStore, JwtTokenIssuer, LoginFailureMode,
    MemoryCredentialStore, PasswordHasher, PostgresCredentialStore, Registrar, TokenIssuer,
};

#[derive(Debug)]
pub struct DocVault {
    registrar: Registrar,
    authenticator: Authenticator,
    documents: BlobStore,
    postgres: Option<PostgresCredentialStore>,
}

impl DocVault {
    /// Connect to the configured database and object backend.
    ///
    /// Without `DATABASE_URL` credentials live in memory only.
    pub async fn connect(config: &Config) -> Result<Self> {
        let postgres = match config.database.url.as_deref() {
            Some(url) => Some(
                PostgresCredentialStore::connect(url, config.database.max_connections).await?,
            ),
            None => {
                warn!("DATABASE_URL not set; using in-memory credential store");
                None
            }
        };
        let store: Arc<dyn CredentialStore> = match &postgres {
            Some(pg) => Arc::new(pg.clone()),
            None => Arc::new(MemoryCredentialStore::new()),
        };

        let mut hasher = Argon2PasswordHasher::new()?;
        if let Some(pepper) = config.auth.password_pepper.as_ref().filter(|p| !p.is_empty()) {
            hasher = hasher.with_pepper(pepper.expose());
        }

        let secret = config
            .auth
            .jwt_secret
            .as_ref()
            .map(|secret| secret.expose().as_bytes());
        if secret.is_none() {
            warn!("JWT_SECRET not set; logins will fail");
        }
        let issuer = JwtTokenIssuer::new(secret);

        let mode = if config.auth.uniform_login_failures {
            LoginFailureMode::Uniform
        } else {
            LoginFailureMode::Distinct
        };

        let backend = build_object_store(&config.object_store)?;

        info!(
            persistent = postgres.is_some(),
            login_failures = ?mode,
            "docvault services ready"
        );
        let mut vault = Self::from_parts(store, Arc::new(hasher), Arc::new(issuer), mode, backend);
        vault.postgres = postgres;
        Ok(vault)
    }

    /// Assemble services from already-built collaborators.
    pub fn from_parts(
        store: Arc<dyn CredentialStore>,
        hasher: Arc<dyn PasswordHasher>,
        issuer: Arc<dyn TokenIssuer>,
        mode: LoginFailureMode,
        backend: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            registrar: Registrar::new(Arc::clone(&store), Arc::clone(&hasher)),
            authenticator: Authenticator::new(store, hasher, issuer).with_failure_mode(mode),
            documents: BlobStore::new(backend),
            postgres: None,
        }
    }

    pub fn registrar(&self) -> &Registrar {
        &self.registrar
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    pub fn documents(&self) -> &BlobStore {
        &self.documents
    }

    /// Apply database migrations. Fails when running without a database.
    pub async fn migrate(&self) -> Result<()> {
        match &self.postgres {
            Some(pg) => pg.migrate().await,
            None => Err(DocVaultError::Internal(
                "DATABASE_URL is required to run migrations".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use docvault_config::{
        AuthConfig, ConfigMetadata, DatabaseConfig, ObjectBackend, ObjectStoreConfig, Secret,
    };

    use crate::identity::{NewRegistration, Role};

    fn memory_config(jwt_secret: Option<&str>) -> Config {
        Config {
            database: DatabaseConfig {
                url: None,
                max_connections: DatabaseConfig::DEFAULT_MAX_CONNECTIONS,
            },
            auth: AuthConfig {
                jwt_secret: jwt_secret.map(Secret::new),
                password_pepper: Some(Secret::new("pepper")),
                uniform_login_failures: false,
            },
            object_store: ObjectStoreConfig {
                backend: ObjectBackend::Memory,
                ..ObjectStoreConfig::default()
            },
            metadata: ConfigMetadata::default(),
        }
    }

    #[tokio::test]
    async fn memory_mode_supports_the_full_flow() {
        let vault = DocVault::connect(&memory_config(Some("signing-key")))
            .await
            .unwrap();

        let identity = vault
            .registrar()
            .register(NewRegistration::new(
                "Ann",
                Role::Admin,
                "ann@example.com",
                "correct horse",
            ))
            .await
            .unwrap();
        let outcome = vault
            .authenticator()
            .login("ann@example.com", "correct horse")
            .await
            .unwrap();
        assert_eq!(outcome.subject_id, identity.id);

        let id = vault
            .documents()
            .put(Bytes::from_static(b"hello"), "text/plain")
            .await
            .unwrap();
        assert_eq!(vault.documents().get(&id).await.unwrap().bytes, "hello");
    }

    #[tokio::test]
    async fn missing_jwt_secret_fails_login_not_startup() {
        let vault = DocVault::connect(&memory_config(None)).await.unwrap();
        vault
            .registrar()
            .register(NewRegistration::new(
                "Ann",
                Role::User,
                "ann@example.com",
                "correct horse",
            ))
            .await
            .unwrap();

        let err = vault
            .authenticator()
            .login("ann@example.com", "correct horse")
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 500);
    }

    #[tokio::test]
    async fn migrate_requires_a_database() {
        let vault = DocVault::connect(&memory_config(Some("k"))).await.unwrap();
        assert!(matches!(
            vault.migrate().await,
            Err(DocVaultError::Internal(_))
        ));
    }
}
