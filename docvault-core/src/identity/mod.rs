//! Credential lifecycle: registration, password verification and token
//! issuance.

pub mod authenticator;
pub mod model;
pub mod password;
pub mod registrar;
pub mod store;
pub mod token;

pub use authenticator::{Authenticator, LoginFailureMode, LoginOutcome};
pub use model::{Identity, LoginRecord, NewRegistration, PasswordDigest, Profile, Role};
pub use password::{Argon2PasswordHasher, PasswordHashError, PasswordHasher};
pub use registrar::Registrar;
pub use store::{
    CredentialStore, CredentialTransaction, MemoryCredentialStore, PostgresCredentialStore,
    run_atomic,
};
pub use token::{Claims, IssuedToken, JwtTokenIssuer, TOKEN_TTL_SECONDS, TokenError, TokenIssuer};
