//! Key vault client configuration.

use crate::error::{SecretsError, SecretsResult};
use pipeline_common::HttpConfig;
use std::time::Duration;
use url::Url;

/// Environment variable holding the vault base URL.
pub const VAULT_URL_VAR: &str = "KEY_VAULT_URL";
/// Environment variable overriding the REST API version.
pub const API_VERSION_VAR: &str = "KEY_VAULT_API_VERSION";
/// Environment variable overriding the request timeout, in seconds.
pub const TIMEOUT_VAR: &str = "KEY_VAULT_TIMEOUT_SECS";

/// Key vault REST API version sent with every request.
pub const DEFAULT_API_VERSION: &str = "7.4";

/// Key vault client configuration.
#[derive(Debug, Clone)]
pub struct KeyVaultConfig {
    /// Vault base URL, e.g. `https://pipeline.vault.azure.net/`
    pub vault_url: Url,
    /// `api-version` query parameter
    pub api_version: String,
    /// HTTP client settings
    pub http: HttpConfig,
}

impl KeyVaultConfig {
    /// Create a configuration for the given vault.
    ///
    /// # Errors
    ///
    /// Returns [`SecretsError::Configuration`] if `vault_url` is not an
    /// absolute http(s) URL.
    pub fn new(vault_url: &str) -> SecretsResult<Self> {
        Ok(Self {
            vault_url: parse_vault_url(vault_url)?,
            api_version: DEFAULT_API_VERSION.to_string(),
            http: HttpConfig::default()
                .with_user_agent(concat!("pipeline-secrets/", env!("CARGO_PKG_VERSION"))),
        })
    }

    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`SecretsError::Configuration`] if `KEY_VAULT_URL` is missing
    /// or any variable is invalid.
    pub fn from_env() -> SecretsResult<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`Self::from_env`].
    pub fn from_lookup<F>(lookup: F) -> SecretsResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vault_url = lookup(VAULT_URL_VAR)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| SecretsError::config(format!("{VAULT_URL_VAR} is not set")))?;
        let mut config = Self::new(&vault_url)?;

        if let Some(version) = lookup(API_VERSION_VAR).filter(|v| !v.trim().is_empty()) {
            config = config.with_api_version(version.trim());
        }

        if let Some(raw) = lookup(TIMEOUT_VAR) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                SecretsError::config(format!("{TIMEOUT_VAR} must be a whole number of seconds, got {raw:?}"))
            })?;
            config = config.with_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// Set the REST API version.
    #[must_use]
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http = self.http.with_timeout(timeout);
        self
    }

    /// Replace the HTTP client settings.
    #[must_use]
    pub fn with_http(mut self, http: HttpConfig) -> Self {
        self.http = http;
        self
    }
}

fn parse_vault_url(raw: &str) -> SecretsResult<Url> {
    let mut url = Url::parse(raw.trim())?;
    if !matches!(url.scheme(), "https" | "http") || url.cannot_be_a_base() {
        return Err(SecretsError::config(format!(
            "vault URL must be an absolute http(s) URL, got {raw:?}"
        )));
    }
    // Directory-style base, so request paths are appended below it
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |var: &str| map.get(var).cloned()
    }

    #[test]
    fn test_new_defaults() {
        let config = KeyVaultConfig::new("https://pipeline.vault.azure.net").unwrap();
        assert_eq!(config.vault_url.as_str(), "https://pipeline.vault.azure.net/");
        assert_eq!(config.api_version, DEFAULT_API_VERSION);
        assert_eq!(config.http.timeout, Some(Duration::from_secs(30)));
        assert!(config.http.user_agent.starts_with("pipeline-secrets/"));
    }

    #[test]
    fn test_path_gets_trailing_slash() {
        let config = KeyVaultConfig::new("http://127.0.0.1:8200/vault").unwrap();
        assert_eq!(config.vault_url.path(), "/vault/");
    }

    #[test]
    fn test_rejects_bad_urls() {
        assert!(matches!(
            KeyVaultConfig::new("vault.azure.net"),
            Err(SecretsError::Configuration(_))
        ));
        assert!(matches!(
            KeyVaultConfig::new("ftp://vault.example"),
            Err(SecretsError::Configuration(_))
        ));
    }

    #[test]
    fn test_from_lookup() {
        let config = KeyVaultConfig::from_lookup(lookup(&[
            (VAULT_URL_VAR, "https://pipeline.vault.azure.net/"),
            (API_VERSION_VAR, "7.5"),
            (TIMEOUT_VAR, "5"),
        ]))
        .unwrap();
        assert_eq!(config.api_version, "7.5");
        assert_eq!(config.http.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_from_lookup_requires_url() {
        let err = KeyVaultConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(err.to_string().contains(VAULT_URL_VAR));
    }

    #[test]
    fn test_from_lookup_rejects_bad_timeout() {
        let err = KeyVaultConfig::from_lookup(lookup(&[
            (VAULT_URL_VAR, "https://v.example"),
            (TIMEOUT_VAR, "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, SecretsError::Configuration(_)));
    }
}
