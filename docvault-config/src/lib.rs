//! Shared configuration library for DocVault.
//!
//! Configuration is composed from built-in defaults, an optional TOML file,
//! an optional `.env` file and the process environment (highest precedence).
//! The core library and `docvaultctl` both consume the resulting [`Config`].

pub mod error;
pub mod loader;
pub mod models;
pub mod secret;
pub mod sources;

pub use error::ConfigLoadError;
pub use loader::{ConfigLoad, ConfigLoader, compose};
pub use models::{
    AuthConfig, Config, ConfigMetadata, ConfigWarning, ConfigWarnings,
    DatabaseConfig, ObjectBackend, ObjectStoreConfig,
};
pub use secret::Secret;
pub use sources::{EnvConfig, FileConfig};
