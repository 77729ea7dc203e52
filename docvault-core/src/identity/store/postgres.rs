use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction, postgres::PgPoolOptions};
use tracing::info;
use uuid::Uuid;

use super::{CredentialStore, CredentialTransaction};
use crate::error::{DocVaultError, Result};
use crate::identity::model::{Identity, LoginRecord, PasswordDigest, Profile, Role};

const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL-backed implementation of the [`CredentialStore`] port.
#[derive(Clone, Debug)]
pub struct PostgresCredentialStore {
    pool: PgPool,
}

impl PostgresCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| {
                DocVaultError::Unavailable(format!("Failed to connect to PostgreSQL: {e}"))
            })?;
        Ok(Self::new(pool))
    }

    /// Apply pending schema migrations.
    pub async fn migrate(&self) -> Result<()> {
        crate::MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| DocVaultError::Internal(format!("Failed to run migrations: {e}")))?;
        info!("database migrations applied");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(sqlx::FromRow)]
struct IdentityRow {
    id: Uuid,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl From<IdentityRow> for Identity {
    fn from(row: IdentityRow) -> Self {
        Identity {
            id: row.id,
            email: row.email,
            password_hash: PasswordDigest::new(row.password_hash),
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct LoginRow {
    id: Uuid,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    role: Option<String>,
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    async fn find_identity_by_email(&self, email: &str) -> Result<Option<Identity>> {
        let row = sqlx::query_as::<_, IdentityRow>(
            r#"
            SELECT id, email, password_hash, created_at
            FROM identities
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Identity::from))
    }

    async fn find_login_record(&self, email: &str) -> Result<Option<LoginRecord>> {
        let row = sqlx::query_as::<_, LoginRow>(
            r#"
            SELECT i.id, i.email, i.password_hash, i.created_at, p.role
            FROM identities i
            LEFT JOIN profiles p ON p.identity_id = i.id
            WHERE i.email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let role = row
            .role
            .as_deref()
            .ok_or_else(|| {
                DocVaultError::Internal(format!("identity {} has no profile", row.id))
            })?
            .parse::<Role>()
            .map_err(|e| DocVaultError::Internal(e.to_string()))?;

        Ok(Some(LoginRecord {
            identity: Identity {
                id: row.id,
                email: row.email,
                password_hash: PasswordDigest::new(row.password_hash),
                created_at: row.created_at,
            },
            role,
        }))
    }

    async fn begin(&self) -> Result<Box<dyn CredentialTransaction>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DocVaultError::Unavailable(format!("Failed to start transaction: {e}")))?;
        Ok(Box::new(PostgresCredentialTransaction { tx }))
    }
}

/// Wraps a sqlx transaction; sqlx rolls back on drop when not committed.
struct PostgresCredentialTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl CredentialTransaction for PostgresCredentialTransaction {
    async fn insert_identity(&mut self, identity: &Identity) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO identities (id, email, password_hash, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(identity.id)
        .bind(&identity.email)
        .bind(identity.password_hash.as_str())
        .bind(identity.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_write_error(e, "Failed to create identity"))?;

        Ok(())
    }

    async fn insert_profile(&mut self, profile: &Profile) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO profiles (id, name, role, identity_id)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(profile.id)
        .bind(&profile.name)
        .bind(profile.role.as_str())
        .bind(profile.identity_id)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_write_error(e, "Failed to create profile"))?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_write_error(e, "Failed to commit transaction"))
    }
}

fn map_write_error(err: sqlx::Error, context: &str) -> DocVaultError {
    if let Some(db_err) = err.as_database_error()
        && db_err.code().as_deref() == Some(UNIQUE_VIOLATION)
    {
        return match db_err.constraint() {
            Some("identities_email_key") => {
                DocVaultError::Conflict("User already exists".to_string())
            }
            Some(constraint) => {
                DocVaultError::Conflict(format!("{context}: {constraint} violated"))
            }
            None => DocVaultError::Conflict(context.to_string()),
        };
    }

    match DocVaultError::from(err) {
        DocVaultError::Internal(msg) => DocVaultError::Internal(format!("{context}: {msg}")),
        other => other,
    }
}
