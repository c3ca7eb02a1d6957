//! Credential providers for the `Authorization` header.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Supplies the authorization value attached to every upstream request.
///
/// Implementations are consulted per request, so a provider backed by
/// mutable storage picks up credential changes without rebuilding clients.
pub trait CredentialProvider: Send + Sync {
    /// Full header value (e.g. `Basic dXNlcjpwYXNz`), or `None` to send the
    /// request unauthenticated.
    fn authorization(&self) -> Option<String>;
}

/// HTTP Basic credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    encoded: String,
}

impl BasicCredentials {
    /// Wrap an already base64-encoded `user:password` value.
    pub fn new(encoded: impl Into<String>) -> Self {
        Self {
            encoded: encoded.into(),
        }
    }

    pub fn from_user_password(user: &str, password: &str) -> Self {
        Self::new(STANDARD.encode(format!("{}:{}", user, password)))
    }

    pub fn encoded(&self) -> &str {
        &self.encoded
    }
}

impl CredentialProvider for BasicCredentials {
    fn authorization(&self) -> Option<String> {
        Some(format!("Basic {}", self.encoded))
    }
}

/// Sends requests without an `Authorization` header.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

impl CredentialProvider for NoCredentials {
    fn authorization(&self) -> Option<String> {
        None
    }
}
