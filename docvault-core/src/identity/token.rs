use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};
use thiserror::Error;
use uuid::Uuid;
use zeroize::Zeroizing;

use super::model::Role;
use crate::clock::{Clock, SystemClock};

/// Lifetime of every issued access token, in seconds (two hours).
pub const TOKEN_TTL_SECONDS: i64 = 2 * 60 * 60;

#[derive(Debug, Error)]
pub enum TokenError {
    /// No signing secret is configured. Fatal for the request, never retried.
    #[error("token signing key is not configured")]
    MissingSigningKey,
    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
    #[error("token rejected: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
    #[error("token expired")]
    Expired,
}

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Signs bounded-lifetime subject/role assertions.
#[cfg_attr(test, mockall::automock)]
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, subject_id: Uuid, role: Role) -> Result<IssuedToken, TokenError>;
}

/// HS256 JWT issuer.
///
/// Output is a pure function of key, subject, role and the clock reading:
/// there is no random `jti`.
pub struct JwtTokenIssuer {
    secret: Option<Zeroizing<Vec<u8>>>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for JwtTokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtTokenIssuer")
            .field("configured", &self.secret.is_some())
            .field("clock", &self.clock)
            .finish()
    }
}

impl JwtTokenIssuer {
    /// An empty secret counts as unset.
    pub fn new(secret: Option<&[u8]>) -> Self {
        Self::with_clock(secret, Arc::new(SystemClock))
    }

    pub fn with_clock(secret: Option<&[u8]>, clock: Arc<dyn Clock>) -> Self {
        Self {
            secret: secret
                .filter(|key| !key.is_empty())
                .map(|key| Zeroizing::new(key.to_vec())),
            clock,
        }
    }

    fn key(&self) -> Result<&[u8], TokenError> {
        self.secret
            .as_deref()
            .map(Vec::as_slice)
            .ok_or(TokenError::MissingSigningKey)
    }

    /// Verify signature and expiry (against this issuer's clock) and return
    /// the claims.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let key = self.key()?;

        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked below against the injected clock instead of the
        // system time jsonwebtoken would use.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<Claims>(token, &DecodingKey::from_secret(key), &validation)
            .map_err(TokenError::Invalid)?;

        if data.claims.exp <= self.clock.now().timestamp() {
            return Err(TokenError::Expired);
        }
        Ok(data.claims)
    }
}

impl TokenIssuer for JwtTokenIssuer {
    fn issue(&self, subject_id: Uuid, role: Role) -> Result<IssuedToken, TokenError> {
        let key = self.key()?;

        // Whole seconds, so the returned timestamps match the claims.
        let now = self.clock.now().timestamp();
        let claims = Claims {
            sub: subject_id,
            role,
            iat: now,
            exp: now + TOKEN_TTL_SECONDS,
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(key),
        )
        .map_err(TokenError::Signing)?;

        Ok(IssuedToken {
            token,
            issued_at: timestamp(claims.iat),
            expires_at: timestamp(claims.exp),
        })
    }
}

fn timestamp(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_default()
}
