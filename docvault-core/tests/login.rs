mod support;

use argon2::Params;
use chrono::{TimeZone, Utc};
use std::sync::Arc;

use docvault_core::DocVaultError;
use docvault_core::api_types::LoginResponse;
use docvault_core::clock::FixedClock;
use docvault_core::identity::{
    Argon2PasswordHasher, Authenticator, JwtTokenIssuer, MemoryCredentialStore,
    NewRegistration, PasswordHasher, Registrar, Role, TOKEN_TTL_SECONDS,
};
use support::InsecureHasher;

const SECRET: &[u8] = b"integration-signing-key";

struct Harness {
    registrar: Registrar,
    authenticator: Authenticator,
    issuer: Arc<JwtTokenIssuer>,
}

fn harness(hasher: Arc<dyn PasswordHasher>) -> Harness {
    let store = Arc::new(MemoryCredentialStore::new());
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2032, 7, 1, 8, 0, 0).unwrap(),
    ));
    let issuer = Arc::new(JwtTokenIssuer::with_clock(Some(SECRET), clock));
    Harness {
        registrar: Registrar::new(store.clone(), hasher.clone()),
        authenticator: Authenticator::new(store, hasher, issuer.clone()),
        issuer,
    }
}

#[tokio::test]
async fn registered_user_can_log_in_with_argon2() {
    let hasher = Argon2PasswordHasher::with_params(Params::new(8, 1, 1, None).unwrap());
    let h = harness(Arc::new(hasher));

    let identity = h
        .registrar
        .register(NewRegistration::new(
            "Ann",
            Role::Admin,
            "ann@example.com",
            "correct horse battery",
        ))
        .await
        .unwrap();
    assert!(identity.password_hash.as_str().starts_with("$argon2id$"));

    let outcome = h
        .authenticator
        .login("ann@example.com", "correct horse battery")
        .await
        .unwrap();
    let claims = h.issuer.decode(&outcome.token).unwrap();

    assert_eq!(claims.sub, identity.id);
    assert_eq!(claims.role, Role::Admin);
    assert_eq!(claims.exp, claims.iat + TOKEN_TTL_SECONDS);

    let body = serde_json::to_value(LoginResponse::from(outcome)).unwrap();
    assert_eq!(body["subjectId"], identity.id.to_string());
}

#[tokio::test]
async fn wrong_password_is_forbidden() {
    let h = harness(Arc::new(InsecureHasher));
    h.registrar
        .register(NewRegistration::new("Bo", Role::User, "bo@example.com", "password-one"))
        .await
        .unwrap();

    let err = h
        .authenticator
        .login("bo@example.com", "password-two")
        .await
        .unwrap_err();
    assert!(matches!(err, DocVaultError::Forbidden(_)));
}

#[tokio::test]
async fn unknown_email_is_not_found() {
    let h = harness(Arc::new(InsecureHasher));
    let err = h
        .authenticator
        .login("nobody@example.com", "password-one")
        .await
        .unwrap_err();
    assert!(matches!(err, DocVaultError::NotFound(_)));
}
