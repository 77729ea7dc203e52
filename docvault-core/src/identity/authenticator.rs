use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};
use tracing::{error, info, warn};
use uuid::Uuid;
use zeroize::Zeroizing;

use super::model::PasswordDigest;
use super::password::PasswordHasher;
use super::store::CredentialStore;
use super::token::{TokenError, TokenIssuer};
use crate::error::{DocVaultError, Result};

/// Plaintext hashed once to produce the digest that unknown emails are
/// verified against in [`LoginFailureMode::Uniform`].
const DECOY_PASSWORD: &str = "docvault-decoy-credential";

/// How a failed login is reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginFailureMode {
    /// Unknown email is `NotFound`, wrong password is `Forbidden`.
    #[default]
    Distinct,
    /// Both are `InvalidCredentials`, and unknown emails still pay for one
    /// hash verification.
    Uniform,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub token: String,
    pub subject_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

pub struct Authenticator {
    store: Arc<dyn CredentialStore>,
    hasher: Arc<dyn PasswordHasher>,
    issuer: Arc<dyn TokenIssuer>,
    mode: LoginFailureMode,
    decoy: OnceCell<PasswordDigest>,
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authenticator")
            .field("store", &self.store)
            .field("hasher_refs", &Arc::strong_count(&self.hasher))
            .field("issuer_refs", &Arc::strong_count(&self.issuer))
            .field("mode", &self.mode)
            .finish()
    }
}

impl Authenticator {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: Arc<dyn PasswordHasher>,
        issuer: Arc<dyn TokenIssuer>,
    ) -> Self {
        Self {
            store,
            hasher,
            issuer,
            mode: LoginFailureMode::default(),
            decoy: OnceCell::new(),
        }
    }

    pub fn with_failure_mode(mut self, mode: LoginFailureMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn failure_mode(&self) -> LoginFailureMode {
        self.mode
    }

    /// Verify `password` for `email` and issue an access token.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome> {
        let Some(record) = self.store.find_login_record(email).await? else {
            return Err(self.reject_unknown_email(password).await);
        };

        let subject_id = record.identity.id;
        if !self.verify(password, record.identity.password_hash).await? {
            warn!(%subject_id, "login rejected: password mismatch");
            return Err(match self.mode {
                LoginFailureMode::Distinct => {
                    DocVaultError::Forbidden("Invalid password".to_string())
                }
                LoginFailureMode::Uniform => DocVaultError::InvalidCredentials,
            });
        }

        let issued = self.issuer.issue(subject_id, record.role).map_err(|err| {
            if matches!(err, TokenError::MissingSigningKey) {
                error!("JWT_SECRET is not configured; cannot issue tokens");
            }
            DocVaultError::from(err)
        })?;

        info!(%subject_id, role = %record.role, "login succeeded");
        Ok(LoginOutcome {
            token: issued.token,
            subject_id,
            expires_at: issued.expires_at,
        })
    }

    async fn reject_unknown_email(&self, password: &str) -> DocVaultError {
        match self.mode {
            LoginFailureMode::Distinct => {
                warn!("login rejected: unknown email");
                DocVaultError::NotFound("User not found".to_string())
            }
            LoginFailureMode::Uniform => {
                // Spend the same work as a real mismatch. The match result is
                // ignored, a hasher failure is not.
                let decoy = match self.decoy_digest().await {
                    Ok(decoy) => decoy,
                    Err(err) => {
                        error!("decoy digest unavailable: {err}");
                        return err;
                    }
                };
                if let Err(err) = self.verify(password, decoy).await {
                    error!("decoy verification failed: {err}");
                    return err;
                }
                warn!("login rejected: invalid credentials");
                DocVaultError::InvalidCredentials
            }
        }
    }

    async fn decoy_digest(&self) -> Result<PasswordDigest> {
        if let Some(decoy) = self.decoy.get() {
            return Ok(decoy.clone());
        }

        let hasher = Arc::clone(&self.hasher);
        let digest = tokio::task::spawn_blocking(move || hasher.hash(DECOY_PASSWORD))
            .await
            .map_err(|err| {
                DocVaultError::Internal(format!("Failed to join hashing task: {err}"))
            })??;

        Ok(self.decoy.get_or_init(|| digest).clone())
    }

    async fn verify(&self, password: &str, digest: PasswordDigest) -> Result<bool> {
        let hasher = Arc::clone(&self.hasher);
        let password = Zeroizing::new(password.to_owned());
        let verified = tokio::task::spawn_blocking(move || hasher.verify(&password, &digest))
            .await
            .map_err(|err| {
                DocVaultError::Internal(format!("Failed to join verification task: {err}"))
            })??;
        Ok(verified)
    }
}
