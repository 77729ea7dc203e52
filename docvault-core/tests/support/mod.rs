#![allow(dead_code)]

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD_NO_PAD};
use constant_time_eq::constant_time_eq;
use std::sync::Arc;
use tokio::sync::Barrier;
use uuid::Uuid;

use docvault_core::Result;
use docvault_core::identity::{
    CredentialStore, CredentialTransaction, Identity, LoginRecord, MemoryCredentialStore,
    PasswordDigest, PasswordHashError, PasswordHasher,
};

/// Salted but unhardened hasher so tests don't pay for Argon2.
#[derive(Debug, Default)]
pub struct InsecureHasher;

impl InsecureHasher {
    fn encode(salt: &str, plaintext: &str) -> String {
        STANDARD_NO_PAD.encode(format!("{salt}:{plaintext}"))
    }
}

impl PasswordHasher for InsecureHasher {
    fn hash(&self, plaintext: &str) -> std::result::Result<PasswordDigest, PasswordHashError> {
        let salt = Uuid::new_v4().simple().to_string();
        let encoded = Self::encode(&salt, plaintext);
        Ok(PasswordDigest::new(format!("$insecure${salt}${encoded}")))
    }

    fn verify(
        &self,
        plaintext: &str,
        digest: &PasswordDigest,
    ) -> std::result::Result<bool, PasswordHashError> {
        let mut parts = digest
            .as_str()
            .strip_prefix("$insecure$")
            .ok_or(PasswordHashError::MalformedHash)?
            .splitn(2, '$');
        let (Some(salt), Some(expected)) = (parts.next(), parts.next()) else {
            return Err(PasswordHashError::MalformedHash);
        };
        let actual = Self::encode(salt, plaintext);
        Ok(constant_time_eq(actual.as_bytes(), expected.as_bytes()))
    }
}

/// Holds every caller at the email pre-check until `parties` callers have
/// arrived, so all of them see the email as free before anyone commits.
#[derive(Debug)]
pub struct RacingStore {
    inner: MemoryCredentialStore,
    barrier: Arc<Barrier>,
}

impl RacingStore {
    pub fn new(inner: MemoryCredentialStore, parties: usize) -> Self {
        Self {
            inner,
            barrier: Arc::new(Barrier::new(parties)),
        }
    }
}

#[async_trait]
impl CredentialStore for RacingStore {
    async fn find_identity_by_email(&self, email: &str) -> Result<Option<Identity>> {
        let found = self.inner.find_identity_by_email(email).await?;
        self.barrier.wait().await;
        Ok(found)
    }

    async fn find_login_record(&self, email: &str) -> Result<Option<LoginRecord>> {
        self.inner.find_login_record(email).await
    }

    async fn begin(&self) -> Result<Box<dyn CredentialTransaction>> {
        self.inner.begin().await
    }
}
