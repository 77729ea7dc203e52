use thiserror::Error;

use crate::identity::password::PasswordHashError;
use crate::identity::token::TokenError;

#[derive(Error, Debug)]
pub enum DocVaultError {
    /// A uniqueness rule was violated (an email is already registered).
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The supplied password did not match the stored hash.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Login failed without saying whether the email or the password was
    /// wrong. Only produced in uniform login failure mode.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Internal error: {0}")]
    Internal(String),

    /// The database or the object backend could not be reached.
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl DocVaultError {
    /// HTTP status a request layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            DocVaultError::Conflict(_) => 409,
            DocVaultError::NotFound(_) => 404,
            DocVaultError::Forbidden(_) => 403,
            DocVaultError::InvalidCredentials => 401,
            DocVaultError::Internal(_) => 500,
            DocVaultError::Unavailable(_) => 503,
        }
    }

    /// Message that is safe to hand back to a caller.
    ///
    /// Internal and backend failures are reduced to a generic text so that
    /// configuration and infrastructure details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            DocVaultError::Internal(_) => "Internal server error".to_string(),
            DocVaultError::Unavailable(_) => {
                "Service temporarily unavailable".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<sqlx::Error> for DocVaultError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => {
                DocVaultError::Unavailable(format!("database: {err}"))
            }
            other => DocVaultError::Internal(format!("database: {other}")),
        }
    }
}

impl From<PasswordHashError> for DocVaultError {
    fn from(err: PasswordHashError) -> Self {
        DocVaultError::Internal(err.to_string())
    }
}

impl From<TokenError> for DocVaultError {
    fn from(err: TokenError) -> Self {
        DocVaultError::Internal(err.to_string())
    }
}

impl From<object_store::Error> for DocVaultError {
    fn from(err: object_store::Error) -> Self {
        match err {
            object_store::Error::NotFound { path, .. } => {
                DocVaultError::NotFound(format!("document {path}"))
            }
            other => DocVaultError::Unavailable(format!("object store: {other}")),
        }
    }
}

pub type Result<T> = std::result::Result<T, DocVaultError>;
