use argon2::{
    Algorithm, Argon2, Params, ParamsBuilder, Version,
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString},
};
use password_hash::Error as PhcError;
use rand::{TryRngCore, rngs::OsRng};
use std::fmt;
use thiserror::Error;
use zeroize::Zeroizing;

use super::model::PasswordDigest;

#[derive(Debug, Error)]
pub enum PasswordHashError {
    #[error("invalid Argon2 parameters: {0}")]
    InvalidParams(String),
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("stored password hash is malformed")]
    MalformedHash,
}

impl From<PhcError> for PasswordHashError {
    fn from(err: PhcError) -> Self {
        PasswordHashError::Hashing(err.to_string())
    }
}

/// One-way salted password hashing.
///
/// Implementations hold no per-call state; the same plaintext hashed twice
/// must give different digests that both verify.
#[cfg_attr(test, mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<PasswordDigest, PasswordHashError>;

    fn verify(&self, plaintext: &str, digest: &PasswordDigest) -> Result<bool, PasswordHashError>;
}

/// Argon2id hasher with a random salt per call and an optional server-side
/// pepper.
pub struct Argon2PasswordHasher {
    argon2: Argon2<'static>,
    pepper: Zeroizing<Vec<u8>>,
}

impl fmt::Debug for Argon2PasswordHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Argon2PasswordHasher")
            .field("params", self.argon2.params())
            .field("peppered", &!self.pepper.is_empty())
            .finish()
    }
}

impl Argon2PasswordHasher {
    /// ~64 MiB and 3 passes, a reasonable server baseline.
    const DEFAULT_MEMORY_KIB: u32 = 64 * 1024;
    const DEFAULT_ITERATIONS: u32 = 3;
    const DEFAULT_PARALLELISM: u32 = 1;
    const SALT_LENGTH: usize = password_hash::Salt::RECOMMENDED_LENGTH;

    pub fn new() -> Result<Self, PasswordHashError> {
        let params = ParamsBuilder::new()
            .m_cost(Self::DEFAULT_MEMORY_KIB)
            .t_cost(Self::DEFAULT_ITERATIONS)
            .p_cost(Self::DEFAULT_PARALLELISM)
            .output_len(32)
            .build()
            .map_err(|err| PasswordHashError::InvalidParams(err.to_string()))?;
        Ok(Self::with_params(params))
    }

    /// Caller-specified cost parameters (cheap settings for tests or
    /// constrained hosts).
    pub fn with_params(params: Params) -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::default(), params),
            pepper: Zeroizing::new(Vec::new()),
        }
    }

    /// Append a secret pepper to every password before hashing. Changing it
    /// invalidates all stored digests.
    pub fn with_pepper(mut self, pepper: impl AsRef<[u8]>) -> Self {
        self.pepper = Zeroizing::new(pepper.as_ref().to_vec());
        self
    }

    fn material(&self, plaintext: &str) -> Zeroizing<Vec<u8>> {
        let mut material = Zeroizing::new(Vec::with_capacity(plaintext.len() + self.pepper.len()));
        material.extend_from_slice(plaintext.as_bytes());
        material.extend_from_slice(&self.pepper);
        material
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, plaintext: &str) -> Result<PasswordDigest, PasswordHashError> {
        let material = self.material(plaintext);

        let mut salt_bytes = [0u8; Self::SALT_LENGTH];
        OsRng
            .try_fill_bytes(&mut salt_bytes)
            .map_err(|err| PasswordHashError::Hashing(err.to_string()))?;
        let salt = SaltString::encode_b64(&salt_bytes)?;

        let hash = self.argon2.hash_password(&material, &salt)?.to_string();
        Ok(PasswordDigest::new(hash))
    }

    fn verify(&self, plaintext: &str, digest: &PasswordDigest) -> Result<bool, PasswordHashError> {
        let parsed = PasswordHash::new(digest.as_str())
            .map_err(|_| PasswordHashError::MalformedHash)?;
        let material = self.material(plaintext);

        // Output comparison inside `verify_password` is constant time.
        match self.argon2.verify_password(&material, &parsed) {
            Ok(()) => Ok(true),
            Err(PhcError::Password) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> Argon2PasswordHasher {
        Argon2PasswordHasher::with_params(Params::new(8, 1, 1, None).unwrap())
    }

    #[test]
    fn hashes_passwords_and_verifies() {
        let hasher = cheap();
        let digest = hasher.hash("correct horse").unwrap();
        assert!(digest.as_str().starts_with("$argon2id$"));
        assert!(hasher.verify("correct horse", &digest).unwrap());
        assert!(!hasher.verify("battery staple", &digest).unwrap());
    }

    #[test]
    fn same_password_gets_a_fresh_salt_each_time() {
        let hasher = cheap();
        let first = hasher.hash("same-password").unwrap();
        let second = hasher.hash("same-password").unwrap();

        assert_ne!(first, second);
        assert!(hasher.verify("same-password", &first).unwrap());
        assert!(hasher.verify("same-password", &second).unwrap());
    }

    #[test]
    fn pepper_is_part_of_the_hashed_material() {
        let peppered = cheap().with_pepper("pepper");
        let digest = peppered.hash("secret-pass").unwrap();

        assert!(peppered.verify("secret-pass", &digest).unwrap());
        assert!(!cheap().verify("secret-pass", &digest).unwrap());
    }

    #[test]
    fn malformed_digest_is_an_error_not_a_mismatch() {
        let result = cheap().verify("whatever", &PasswordDigest::new("plain"));
        assert!(matches!(result, Err(PasswordHashError::MalformedHash)));
    }
}
