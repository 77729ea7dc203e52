//! Persistence port for identities and profiles.
//!
//! Writes go through a [`CredentialTransaction`]: everything inserted through
//! one transaction becomes visible on [`CredentialTransaction::commit`], and
//! dropping an uncommitted transaction discards all of it. Email uniqueness
//! is enforced by the store at write/commit time, so a caller that lost a
//! race still gets [`DocVaultError::Conflict`](crate::DocVaultError::Conflict).

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use futures::future::BoxFuture;
use std::fmt;

use super::model::{Identity, LoginRecord, Profile};
use crate::error::Result;

pub use memory::MemoryCredentialStore;
pub use postgres::PostgresCredentialStore;

#[async_trait]
pub trait CredentialStore: Send + Sync + fmt::Debug {
    async fn find_identity_by_email(&self, email: &str) -> Result<Option<Identity>>;

    /// Identity joined with its profile's role.
    async fn find_login_record(&self, email: &str) -> Result<Option<LoginRecord>>;

    async fn begin(&self) -> Result<Box<dyn CredentialTransaction>>;
}

#[async_trait]
pub trait CredentialTransaction: Send {
    /// Fails with `Conflict` when the email or id is already taken.
    async fn insert_identity(&mut self, identity: &Identity) -> Result<()>;

    async fn insert_profile(&mut self, profile: &Profile) -> Result<()>;

    async fn commit(self: Box<Self>) -> Result<()>;
}

/// Run `work` inside one transaction: commit if it returns `Ok`, roll back
/// (by dropping the transaction) otherwise.
pub async fn run_atomic<T, F>(store: &dyn CredentialStore, work: F) -> Result<T>
where
    T: Send,
    F: for<'t> FnOnce(
            &'t mut Box<dyn CredentialTransaction>,
        ) -> BoxFuture<'t, Result<T>>
        + Send,
{
    let mut tx = store.begin().await?;
    let value = work(&mut tx).await?;
    tx.commit().await?;
    Ok(value)
}
