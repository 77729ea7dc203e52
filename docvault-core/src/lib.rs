//! # DocVault Core
//!
//! Identity and document storage for the DocVault backend.
//!
//! ## Overview
//!
//! - **Identity**: atomic registration of an identity plus its profile,
//!   Argon2id password verification and HS256 access tokens
//!   ([`identity::Registrar`], [`identity::Authenticator`]).
//! - **Documents**: opaque byte payloads with a content type, stored in an
//!   S3-compatible or in-memory object backend ([`documents::BlobStore`]).
//!
//! HTTP routing and request validation live outside this crate; operations
//! return [`DocVaultError`], whose [`DocVaultError::status_code`] gives the
//! status a request layer should answer with.
//!
//! ## Examples
//!
//! ```no_run
//! use docvault_core::{DocVault, identity::{NewRegistration, Role}};
//!
//! async fn signup(
//!     vault: &DocVault,
//! ) -> Result<(), Box<dyn std::error::Error>> {
//!     let identity = vault
//!         .registrar()
//!         .register(NewRegistration::new(
//!             "Alice",
//!             Role::User,
//!             "alice@example.com",
//!             "secure_password",
//!         ))
//!         .await?;
//!     let login = vault
//!         .authenticator()
//!         .login("alice@example.com", "secure_password")
//!         .await?;
//!     assert_eq!(login.subject_id, identity.id);
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

/// Request and response payloads for a transport layer
pub mod api_types;

/// Injectable time source
pub mod clock;

/// Document blob storage
pub mod documents;

/// Error types and the status code mapping
pub mod error;

/// Registration, login and token issuance
pub mod identity;

/// Startup wiring
pub mod services;

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub use error::{DocVaultError, Result};
pub use services::DocVault;
