//! Identity verification for the `/auth` routes.
//!
//! Verification methods are variants of [`CredentialVerifier`]. The only
//! method today is password verification, which asks an [`IdentityStore`]
//! (the persistence layer) whether a login/password pair is valid.
mod routes;

pub use routes::*;

use {
    crate::{AuthConfig, Error, ErrorKind, Result, Sensitive, graphql::BoxFuture},
    serde::{Deserialize, Serialize},
    std::{collections::HashMap, sync::Arc},
    thiserror::Error,
};

/// Session key under which the signed-in [`Identity`] is stored.
pub const IDENTITY_KEY: &str = "auth.identity";

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub login: String,
    pub password: Sensitive<String>,
}

impl Credentials {
    pub fn new(login: impl Into<String>, password: &str) -> Self {
        Credentials {
            login: login.into(),
            password: Sensitive::from(password),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub login: String,
    pub provider: String,
}

#[derive(Debug, Error)]
pub enum AuthFailure {
    #[error("invalid login or password")]
    InvalidCredentials,

    #[error("identity store unavailable")]
    Store(#[source] Error),
}

impl From<AuthFailure> for Error {
    fn from(failure: AuthFailure) -> Self {
        match failure {
            AuthFailure::InvalidCredentials => Error::authentication(failure.to_string()),
            AuthFailure::Store(err) => Error::new(ErrorKind::Internal, err),
        }
    }
}

/// Persistence collaborator that knows the accounts.
pub trait IdentityStore: Send + Sync + 'static {
    /// `Ok(None)` when the pair does not match an account.
    fn verify_password<'a>(
        &'a self,
        login: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, Result<Option<Identity>>>;
}

pub enum CredentialVerifier {
    Password(PasswordVerifier),
}

impl CredentialVerifier {
    pub fn password(store: Arc<dyn IdentityStore>) -> Self {
        CredentialVerifier::Password(PasswordVerifier::new(store))
    }

    pub async fn verify(
        &self,
        credentials: &Credentials,
    ) -> std::result::Result<Identity, AuthFailure> {
        match self {
            CredentialVerifier::Password(verifier) => verifier.verify(credentials).await,
        }
    }
}

pub struct PasswordVerifier {
    store: Arc<dyn IdentityStore>,
}

impl PasswordVerifier {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        PasswordVerifier { store }
    }

    pub async fn verify(
        &self,
        credentials: &Credentials,
    ) -> std::result::Result<Identity, AuthFailure> {
        if credentials.login.is_empty() || credentials.password.as_str().is_empty() {
            return Err(AuthFailure::InvalidCredentials);
        }
        match self
            .store
            .verify_password(&credentials.login, credentials.password.as_str())
            .await
        {
            Ok(Some(identity)) => Ok(identity),
            Ok(None) => Err(AuthFailure::InvalidCredentials),
            Err(err) => Err(AuthFailure::Store(err)),
        }
    }
}

/// Accounts held in memory, loaded from `[auth.users]`. Meant for local
/// development and tests.
#[derive(Default)]
pub struct InMemoryIdentityStore {
    users: HashMap<String, Sensitive<String>>,
}

impl InMemoryIdentityStore {
    pub fn from_config(config: &AuthConfig) -> Self {
        InMemoryIdentityStore {
            users: config
                .users
                .iter()
                .map(|user| (user.login.clone(), user.password.clone()))
                .collect(),
        }
    }

    #[must_use]
    pub fn with_user(mut self, login: &str, password: &str) -> Self {
        self.users.insert(login.to_owned(), Sensitive::from(password));
        self
    }
}

impl IdentityStore for InMemoryIdentityStore {
    fn verify_password<'a>(
        &'a self,
        login: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, Result<Option<Identity>>> {
        let identity = self
            .users
            .get(login)
            .filter(|expected| {
                constant_time_compare(password.as_bytes(), expected.as_str().as_bytes())
            })
            .map(|_| Identity {
                login: login.to_owned(),
                provider: "password".to_owned(),
            });
        Box::pin(std::future::ready(Ok(identity)))
    }
}

fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenStore;

    impl IdentityStore for BrokenStore {
        fn verify_password<'a>(
            &'a self,
            _login: &'a str,
            _password: &'a str,
        ) -> BoxFuture<'a, Result<Option<Identity>>> {
            Box::pin(async { Err(Error::io("connection refused")) })
        }
    }

    fn verifier() -> CredentialVerifier {
        CredentialVerifier::password(Arc::new(
            InMemoryIdentityStore::default().with_user("ada", "lovelace"),
        ))
    }

    #[tokio::test]
    async fn test_valid_password() {
        let identity = verifier()
            .verify(&Credentials::new("ada", "lovelace"))
            .await
            .unwrap();
        assert_eq!(identity.login, "ada");
        assert_eq!(identity.provider, "password");
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_login() {
        let verifier = verifier();
        assert!(matches!(
            verifier.verify(&Credentials::new("ada", "babbage")).await,
            Err(AuthFailure::InvalidCredentials)
        ));
        assert!(matches!(
            verifier.verify(&Credentials::new("charles", "lovelace")).await,
            Err(AuthFailure::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_empty_credentials_never_reach_store() {
        let verifier = CredentialVerifier::password(Arc::new(BrokenStore));
        assert!(matches!(
            verifier.verify(&Credentials::new("", "")).await,
            Err(AuthFailure::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_store_failure_is_internal() {
        let verifier = CredentialVerifier::password(Arc::new(BrokenStore));
        let failure = verifier
            .verify(&Credentials::new("ada", "lovelace"))
            .await
            .unwrap_err();
        let err: Error = failure.into();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_store_from_config() {
        let config: crate::Config = r#"
[[auth.users]]
login = "admin"
password = "s3cret"
        "#
        .parse()
        .unwrap();
        let store = InMemoryIdentityStore::from_config(&config.auth);
        assert!(store.users.contains_key("admin"));
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare(b"secret", b"secret"));
        assert!(!constant_time_compare(b"secret", b"secreT"));
        assert!(!constant_time_compare(b"short", b"longer"));
    }
}
