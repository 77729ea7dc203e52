use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::documents::DocumentId;
use crate::error::DocVaultError;
use crate::identity::{Identity, LoginOutcome, NewRegistration, Role};

pub const REGISTERED_MESSAGE: &str = "User registered successfully";

// ===== Request Types =====

#[derive(Clone, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub role: Role,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("name", &self.name)
            .field("role", &self.role)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl From<RegisterRequest> for NewRegistration {
    fn from(req: RegisterRequest) -> Self {
        NewRegistration::new(req.name, req.role, req.email, req.password)
    }
}

#[derive(Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ===== Response Types =====

/// Body of a successful registration (HTTP 201).
#[derive(Debug, Clone, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub identity: Identity,
}

impl RegisterResponse {
    pub fn new(identity: Identity) -> Self {
        Self {
            message: REGISTERED_MESSAGE.to_string(),
            identity,
        }
    }
}

/// Body of a successful login (HTTP 200).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub subject_id: Uuid,
}

impl From<LoginOutcome> for LoginResponse {
    fn from(outcome: LoginOutcome) -> Self {
        Self {
            token: outcome.token,
            subject_id: outcome.subject_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentCreatedResponse {
    pub id: DocumentId,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub status: u16,
    pub message: String,
}

impl From<&DocVaultError> for ErrorResponse {
    fn from(err: &DocVaultError) -> Self {
        Self {
            status: err.status_code(),
            message: err.public_message(),
        }
    }
}
