//! The fixed set of secrets the pipeline may request.

use crate::error::SecretsError;
use std::{fmt, str::FromStr};

/// Logical identifier of a pipeline secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecretName {
    /// Access key for the artifact storage account
    StorageAccessKey,
    /// API token for the issue tracker
    IssueTrackerToken,
    /// Shared secret used to sign release webhooks
    WebhookSharedSecret,
    /// Publish token for the package registry
    PackageRegistryToken,
}

/// Display keys, one entry per member in declaration order.
const KEYS: [(SecretName, &str); 4] = [
    (SecretName::StorageAccessKey, "AZURE_STORAGE_ACCESS_KEY"),
    (SecretName::IssueTrackerToken, "ISSUE_TRACKER_TOKEN"),
    (SecretName::WebhookSharedSecret, "WEBHOOK_SHARED_SECRET"),
    (SecretName::PackageRegistryToken, "PACKAGE_REGISTRY_TOKEN"),
];

impl SecretName {
    /// Every member, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::StorageAccessKey,
        Self::IssueTrackerToken,
        Self::WebhookSharedSecret,
        Self::PackageRegistryToken,
    ];

    /// Display key, e.g. `AZURE_STORAGE_ACCESS_KEY`.
    #[must_use]
    pub const fn key(self) -> &'static str {
        KEYS[self as usize].1
    }

    /// Name of the secret inside the vault.
    ///
    /// Vault names may not contain underscores, so the key is lowercased and
    /// every `_` becomes `-`.
    #[must_use]
    pub fn vault_name(self) -> String {
        derive_vault_name(self.key())
    }
}

/// Lowercase `key` and replace every underscore with a hyphen.
#[must_use]
pub fn derive_vault_name(key: &str) -> String {
    key.to_lowercase().replace('_', "-")
}

impl fmt::Display for SecretName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for SecretName {
    type Err = SecretsError;

    /// Accepts either the display key or the vault name, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = derive_vault_name(s.trim());
        KEYS.iter()
            .find(|(_, key)| derive_vault_name(key) == wanted)
            .map(|(name, _)| *name)
            .ok_or_else(|| SecretsError::config(format!("unknown secret name: {s}")))
    }
}
