//! Resolution of a logical secret name to its newest stored value.

use crate::{
    client::{AuthSession, KeyVaultClient},
    config::KeyVaultConfig,
    credentials::{CredentialSource, EnvCredentials},
    error::{SecretsError, SecretsResult},
    names::SecretName,
    provider::SecretProvider,
    secrets::{SecretVersion, newest, sort_newest_first},
};
use async_trait::async_trait;
use secrecy::SecretString;
use tracing::{debug, info, instrument};

/// Resolves [`SecretName`]s against a key vault.
///
/// Credentials are loaded from `C` at the start of every call, and each call
/// authenticates on its own.
pub struct SecretResolver<C = EnvCredentials> {
    client: KeyVaultClient,
    credentials: C,
}

impl SecretResolver<EnvCredentials> {
    /// Resolver reading `CLIENT_ID` and `CLIENT_SECRET` from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: KeyVaultConfig) -> SecretsResult<Self> {
        Self::with_credentials(config, EnvCredentials::default())
    }

    /// Resolver configured entirely from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`SecretsError::Configuration`] if the vault configuration is
    /// missing or invalid.
    pub fn from_env() -> SecretsResult<Self> {
        Self::new(KeyVaultConfig::from_env()?)
    }
}

impl<C: CredentialSource> SecretResolver<C> {
    /// Resolver with a custom credential source.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_credentials(config: KeyVaultConfig, credentials: C) -> SecretsResult<Self> {
        Ok(Self {
            client: KeyVaultClient::new(config)?,
            credentials,
        })
    }

    /// Underlying vault client.
    #[must_use]
    pub const fn client(&self) -> &KeyVaultClient {
        &self.client
    }

    /// Value of the most recently created version of `name`.
    ///
    /// # Errors
    ///
    /// - [`SecretsError::Configuration`] if credentials are missing; no
    ///   request is sent in that case
    /// - [`SecretsError::Authentication`] if the credentials are rejected
    /// - [`SecretsError::NotFound`] if the secret has no versions
    /// - [`SecretsError::Transport`] for network and service faults
    #[instrument(skip(self), fields(secret = %name))]
    pub async fn resolve(&self, name: SecretName) -> SecretsResult<SecretString> {
        let (mut session, vault_name, versions) = self.list(name).await?;

        let latest = newest(versions)
            .ok_or_else(|| SecretsError::not_found(format!("{vault_name} has no versions")))?;
        let version = latest.version_id()?;
        debug!(version, created = %latest.created, "Selected newest version");

        let value = self
            .client
            .get_secret_value(&mut session, &vault_name, version)
            .await?;
        info!(vault_name = %vault_name, version, "Resolved secret");
        Ok(value)
    }

    /// All stored versions of `name`, newest first.
    ///
    /// # Errors
    ///
    /// As [`Self::resolve`], except that an empty list is not an error.
    #[instrument(skip(self), fields(secret = %name))]
    pub async fn versions(&self, name: SecretName) -> SecretsResult<Vec<SecretVersion>> {
        let (_, _, mut versions) = self.list(name).await?;
        sort_newest_first(&mut versions);
        Ok(versions)
    }

    /// Resolve every known secret, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// The first error returned by [`Self::resolve`].
    pub async fn resolve_all(&self) -> SecretsResult<Vec<(SecretName, SecretString)>> {
        let mut resolved = Vec::with_capacity(SecretName::ALL.len());
        for name in SecretName::ALL {
            resolved.push((name, self.resolve(name).await?));
        }
        Ok(resolved)
    }

    async fn list(
        &self,
        name: SecretName,
    ) -> SecretsResult<(AuthSession, String, Vec<SecretVersion>)> {
        let mut session = AuthSession::new(self.credentials.load()?);
        let vault_name = name.vault_name();
        let versions = self.client.list_versions(&mut session, &vault_name).await?;
        Ok((session, vault_name, versions))
    }
}

#[async_trait]
impl<C: CredentialSource> SecretProvider for SecretResolver<C> {
    async fn get_secret(&self, name: SecretName) -> SecretsResult<SecretString> {
        self.resolve(name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_config() -> KeyVaultConfig {
        // Discard port: any request that got this far would fail as Transport
        KeyVaultConfig::new("http://127.0.0.1:9").unwrap()
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_before_network() {
        let resolver = SecretResolver::with_credentials(
            unreachable_config(),
            EnvCredentials::with_vars(
                "PIPELINE_SECRETS_RESOLVER_TEST_UNSET_ID",
                "PIPELINE_SECRETS_RESOLVER_TEST_UNSET_SECRET",
            ),
        )
        .unwrap();

        let err = resolver.resolve(SecretName::StorageAccessKey).await.unwrap_err();
        assert!(matches!(err, SecretsError::Configuration(_)));

        let err = resolver.versions(SecretName::StorageAccessKey).await.unwrap_err();
        assert!(matches!(err, SecretsError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_resolve_all_stops_at_first_error() {
        let resolver = SecretResolver::with_credentials(
            unreachable_config(),
            EnvCredentials::with_vars(
                "PIPELINE_SECRETS_RESOLVER_TEST_UNSET_ID",
                "PIPELINE_SECRETS_RESOLVER_TEST_UNSET_SECRET",
            ),
        )
        .unwrap();
        assert!(matches!(
            resolver.resolve_all().await,
            Err(SecretsError::Configuration(_))
        ));
    }
}
