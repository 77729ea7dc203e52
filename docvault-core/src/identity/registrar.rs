use chrono::Utc;
use std::{fmt, sync::Arc};
use tracing::{info, warn};
use uuid::Uuid;

use super::model::{Identity, NewRegistration, Profile};
use super::password::PasswordHasher;
use super::store::{CredentialStore, run_atomic};
use crate::error::{DocVaultError, Result};

/// Creates an identity and its profile as one unit.
pub struct Registrar {
    store: Arc<dyn CredentialStore>,
    hasher: Arc<dyn PasswordHasher>,
}

impl fmt::Debug for Registrar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registrar")
            .field("store", &self.store)
            .field("hasher_refs", &Arc::strong_count(&self.hasher))
            .finish()
    }
}

impl Registrar {
    pub fn new(store: Arc<dyn CredentialStore>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { store, hasher }
    }

    /// Register a new identity.
    ///
    /// Fails with [`DocVaultError::Conflict`] when the email is already
    /// registered, whether that is seen up front or only when the write
    /// commits. On any failure nothing is persisted.
    pub async fn register(&self, registration: NewRegistration) -> Result<Identity> {
        let NewRegistration {
            name,
            role,
            email,
            password,
        } = registration;

        if self.store.find_identity_by_email(&email).await?.is_some() {
            warn!(%role, "registration rejected: email already registered");
            return Err(DocVaultError::Conflict("User already exists".to_string()));
        }

        let hasher = Arc::clone(&self.hasher);
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|err| {
                DocVaultError::Internal(format!("Failed to join hashing task: {err}"))
            })??;

        let identity = Identity {
            id: Uuid::new_v4(),
            email,
            password_hash,
            created_at: Utc::now(),
        };
        let profile = Profile {
            id: Uuid::new_v4(),
            name,
            role,
            identity_id: identity.id,
        };

        let identity = run_atomic(self.store.as_ref(), move |tx| {
            Box::pin(async move {
                tx.insert_identity(&identity).await?;
                tx.insert_profile(&profile).await?;
                Ok(identity)
            })
        })
        .await
        .inspect_err(|err| {
            if matches!(err, DocVaultError::Conflict(_)) {
                warn!("registration lost a race for the same email");
            }
        })?;

        info!(identity_id = %identity.id, %role, "identity registered");
        Ok(identity)
    }
}
