//! Credentials for web-backed assistants.
//!
//! The engine never talks to a browser. A [`CredentialProvider`] is asked to
//! authenticate and either hands back a [`Credential`] or explains why it
//! could not.

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use tracing::{debug, info};

use crate::error::CredentialError;

/// An opaque secret such as a session cookie. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Boxed future returned by [`CredentialProvider::authenticate`].
pub type CredentialFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Credential, CredentialError>> + Send + 'a>>;

/// Source of a [`Credential`].
///
/// Uses a boxed future so that the trait is dyn-compatible.
pub trait CredentialProvider: Send + Sync {
    fn authenticate(&self) -> CredentialFuture<'_>;
}

/// Provider used when nothing is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableCredentials;

impl CredentialProvider for UnavailableCredentials {
    fn authenticate(&self) -> CredentialFuture<'_> {
        Box::pin(async { Err(CredentialError::Unavailable) })
    }
}

/// A credential known up front, e.g. from the environment.
#[derive(Debug, Clone)]
pub struct StaticCredential(Credential);

impl StaticCredential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(Credential::new(secret))
    }
}

impl CredentialProvider for StaticCredential {
    fn authenticate(&self) -> CredentialFuture<'_> {
        let credential = self.0.clone();
        Box::pin(async move { Ok(credential) })
    }
}

/// Reads a cookie from a file on every authentication attempt.
#[derive(Debug, Clone)]
pub struct CookieFile {
    path: PathBuf,
}

impl CookieFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialProvider for CookieFile {
    fn authenticate(&self) -> CredentialFuture<'_> {
        Box::pin(async move {
            debug!(path = %self.path.display(), "Reading cookie file");
            let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
                CredentialError::Failed(format!("cannot read '{}': {e}", self.path.display()))
            })?;
            let cookie = raw.trim();
            if cookie.is_empty() {
                return Err(CredentialError::Failed(format!(
                    "cookie file '{}' is empty",
                    self.path.display()
                )));
            }
            info!(path = %self.path.display(), "Loaded cookie");
            Ok(Credential::new(cookie))
        })
    }
}
