use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::{CredentialStore, CredentialTransaction};
use crate::error::{DocVaultError, Result};
use crate::identity::model::{Identity, LoginRecord, Profile};

#[derive(Debug, Default)]
struct State {
    identities: HashMap<Uuid, Identity>,
    emails: HashMap<String, Uuid>,
    /// Keyed by identity id.
    profiles: HashMap<Uuid, Profile>,
}

impl State {
    fn check_identity(&self, identity: &Identity) -> Result<()> {
        if self.emails.contains_key(&identity.email) {
            return Err(email_taken());
        }
        if self.identities.contains_key(&identity.id) {
            return Err(DocVaultError::Conflict(format!(
                "identity {} already exists",
                identity.id
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Inner {
    state: RwLock<State>,
}

/// Process-local credential store with the same uniqueness and atomicity
/// guarantees as the Postgres schema.
///
/// Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    inner: Arc<Inner>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn identity_count(&self) -> usize {
        self.inner.state.read().identities.len()
    }

    pub fn profile_count(&self) -> usize {
        self.inner.state.read().profiles.len()
    }

    pub fn profile_for(&self, identity_id: Uuid) -> Option<Profile> {
        self.inner.state.read().profiles.get(&identity_id).cloned()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_identity_by_email(&self, email: &str) -> Result<Option<Identity>> {
        let state = self.inner.state.read();
        Ok(state
            .emails
            .get(email)
            .and_then(|id| state.identities.get(id))
            .cloned())
    }

    async fn find_login_record(&self, email: &str) -> Result<Option<LoginRecord>> {
        let state = self.inner.state.read();
        let Some(identity) = state
            .emails
            .get(email)
            .and_then(|id| state.identities.get(id))
        else {
            return Ok(None);
        };

        let profile = state.profiles.get(&identity.id).ok_or_else(|| {
            DocVaultError::Internal(format!("identity {} has no profile", identity.id))
        })?;

        Ok(Some(LoginRecord {
            identity: identity.clone(),
            role: profile.role,
        }))
    }

    async fn begin(&self) -> Result<Box<dyn CredentialTransaction>> {
        Ok(Box::new(MemoryTransaction {
            inner: Arc::clone(&self.inner),
            identities: Vec::new(),
            profiles: Vec::new(),
        }))
    }
}

/// Buffered writes; applied under a single write lock on commit.
#[derive(Debug)]
struct MemoryTransaction {
    inner: Arc<Inner>,
    identities: Vec<Identity>,
    profiles: Vec<Profile>,
}

impl MemoryTransaction {
    fn pending_identity(&self, id: Uuid) -> bool {
        self.identities.iter().any(|identity| identity.id == id)
    }
}

#[async_trait]
impl CredentialTransaction for MemoryTransaction {
    async fn insert_identity(&mut self, identity: &Identity) -> Result<()> {
        self.inner.state.read().check_identity(identity)?;
        if self
            .identities
            .iter()
            .any(|pending| pending.email == identity.email || pending.id == identity.id)
        {
            return Err(email_taken());
        }

        self.identities.push(identity.clone());
        Ok(())
    }

    async fn insert_profile(&mut self, profile: &Profile) -> Result<()> {
        let state = self.inner.state.read();
        if !self.pending_identity(profile.identity_id)
            && !state.identities.contains_key(&profile.identity_id)
        {
            return Err(DocVaultError::Internal(format!(
                "profile references unknown identity {}",
                profile.identity_id
            )));
        }
        if state.profiles.contains_key(&profile.identity_id)
            || self
                .profiles
                .iter()
                .any(|pending| pending.identity_id == profile.identity_id)
        {
            return Err(DocVaultError::Conflict(format!(
                "identity {} already has a profile",
                profile.identity_id
            )));
        }
        drop(state);

        self.profiles.push(profile.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let MemoryTransaction {
            inner,
            identities,
            profiles,
        } = *self;
        let mut state = inner.state.write();

        // Re-check under the write lock: another transaction may have
        // committed the same email since our inserts were validated.
        for identity in &identities {
            state.check_identity(identity)?;
        }
        for profile in &profiles {
            if state.profiles.contains_key(&profile.identity_id) {
                return Err(DocVaultError::Conflict(format!(
                    "identity {} already has a profile",
                    profile.identity_id
                )));
            }
        }

        for identity in identities {
            state.emails.insert(identity.email.clone(), identity.id);
            state.identities.insert(identity.id, identity);
        }
        for profile in profiles {
            state.profiles.insert(profile.identity_id, profile);
        }
        Ok(())
    }
}

fn email_taken() -> DocVaultError {
    DocVaultError::Conflict("User already exists".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::model::{PasswordDigest, Role};
    use chrono::Utc;

    fn identity(email: &str) -> Identity {
        Identity {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: PasswordDigest::new("$stub$hash"),
            created_at: Utc::now(),
        }
    }

    fn profile_for(identity: &Identity) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            name: "Test".into(),
            role: Role::User,
            identity_id: identity.id,
        }
    }

    #[tokio::test]
    async fn writes_are_invisible_until_commit() {
        let store = MemoryCredentialStore::new();
        let ann = identity("ann@example.com");

        let mut tx = store.begin().await.unwrap();
        tx.insert_identity(&ann).await.unwrap();
        tx.insert_profile(&profile_for(&ann)).await.unwrap();
        assert!(store.find_identity_by_email(&ann.email).await.unwrap().is_none());

        tx.commit().await.unwrap();
        let found = store.find_login_record(&ann.email).await.unwrap().unwrap();
        assert_eq!(found.identity.id, ann.id);
        assert_eq!(found.role, Role::User);
    }

    #[tokio::test]
    async fn dropped_transaction_leaves_no_trace() {
        let store = MemoryCredentialStore::new();
        let ann = identity("ann@example.com");

        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_identity(&ann).await.unwrap();
        }

        assert_eq!(store.identity_count(), 0);
        assert!(store.find_identity_by_email(&ann.email).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn commit_detects_an_email_taken_in_the_meantime() {
        let store = MemoryCredentialStore::new();
        let first = identity("race@example.com");
        let second = identity("race@example.com");

        let mut tx_a = store.begin().await.unwrap();
        let mut tx_b = store.begin().await.unwrap();
        tx_a.insert_identity(&first).await.unwrap();
        tx_b.insert_identity(&second).await.unwrap();
        tx_a.insert_profile(&profile_for(&first)).await.unwrap();
        tx_b.insert_profile(&profile_for(&second)).await.unwrap();

        tx_a.commit().await.unwrap();
        let err = tx_b.commit().await.unwrap_err();

        assert!(matches!(err, DocVaultError::Conflict(_)));
        assert_eq!(store.identity_count(), 1);
        assert_eq!(store.profile_count(), 1);
    }

    #[tokio::test]
    async fn emails_are_case_sensitive() {
        let store = MemoryCredentialStore::new();
        for email in ["Ann@example.com", "ann@example.com"] {
            let ann = identity(email);
            let mut tx = store.begin().await.unwrap();
            tx.insert_identity(&ann).await.unwrap();
            tx.insert_profile(&profile_for(&ann)).await.unwrap();
            tx.commit().await.unwrap();
        }
        assert_eq!(store.identity_count(), 2);
    }

    #[tokio::test]
    async fn profile_must_reference_a_known_identity() {
        let store = MemoryCredentialStore::new();
        let orphan = identity("ghost@example.com");

        let mut tx = store.begin().await.unwrap();
        let err = tx.insert_profile(&profile_for(&orphan)).await.unwrap_err();
        assert!(matches!(err, DocVaultError::Internal(_)));
    }
}
