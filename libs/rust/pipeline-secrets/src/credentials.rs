//! Client credentials for the identity provider.
//!
//! Credentials are looked up again for every resolution and dropped when it
//! finishes.

use crate::error::{SecretsError, SecretsResult};
use secrecy::SecretString;
use std::fmt;

/// Default environment variable holding the client id.
pub const CLIENT_ID_VAR: &str = "CLIENT_ID";
/// Default environment variable holding the client secret.
pub const CLIENT_SECRET_VAR: &str = "CLIENT_SECRET";

/// A client id and secret pair.
#[derive(Clone)]
pub struct ClientCredentials {
    client_id: String,
    client_secret: SecretString,
}

impl ClientCredentials {
    /// Create credentials from explicit values.
    #[must_use]
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: SecretString::from(client_secret.into()),
        }
    }

    /// Client id.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Client secret.
    #[must_use]
    pub const fn client_secret(&self) -> &SecretString {
        &self.client_secret
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Where a resolver obtains its client credentials.
pub trait CredentialSource: Send + Sync {
    /// Load the credentials for one resolution.
    ///
    /// # Errors
    ///
    /// Returns [`SecretsError::Configuration`] if they are unavailable.
    fn load(&self) -> SecretsResult<ClientCredentials>;
}

/// Reads credentials from process environment variables on every call.
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    id_var: String,
    secret_var: String,
}

impl Default for EnvCredentials {
    fn default() -> Self {
        Self::with_vars(CLIENT_ID_VAR, CLIENT_SECRET_VAR)
    }
}

impl EnvCredentials {
    /// Read from custom variable names.
    #[must_use]
    pub fn with_vars(id_var: impl Into<String>, secret_var: impl Into<String>) -> Self {
        Self {
            id_var: id_var.into(),
            secret_var: secret_var.into(),
        }
    }

    /// Build credentials through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`SecretsError::Configuration`] naming every missing variable.
    pub fn load_with<F>(&self, lookup: F) -> SecretsResult<ClientCredentials>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        match (non_empty(self.id_var.as_str()), non_empty(self.secret_var.as_str())) {
            (Some(id), Some(secret)) => Ok(ClientCredentials::new(id, secret)),
            (id, secret) => {
                let missing: Vec<&str> = [
                    id.is_none().then_some(self.id_var.as_str()),
                    secret.is_none().then_some(self.secret_var.as_str()),
                ]
                .into_iter()
                .flatten()
                .collect();
                Err(SecretsError::config(format!(
                    "missing client credentials: {} not set",
                    missing.join(", ")
                )))
            }
        }
    }
}

impl CredentialSource for EnvCredentials {
    fn load(&self) -> SecretsResult<ClientCredentials> {
        self.load_with(|var| std::env::var(var).ok())
    }
}

impl CredentialSource for ClientCredentials {
    fn load(&self) -> SecretsResult<ClientCredentials> {
        Ok(self.clone())
    }
}
