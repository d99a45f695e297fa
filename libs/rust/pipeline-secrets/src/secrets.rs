//! Secret types and vault wire structures

use crate::error::{SecretsError, SecretsResult};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;

/// One stored version of a vault secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretVersion {
    /// Opaque reference, `https://<vault>/secrets/<name>/<version>`
    pub id: String,
    /// Creation time
    pub created: DateTime<Utc>,
    /// Last attribute update
    pub updated: Option<DateTime<Utc>>,
    /// Whether the version may be read
    pub enabled: bool,
}

impl SecretVersion {
    /// Version identifier: the terminal path segment of [`Self::id`].
    ///
    /// # Errors
    ///
    /// Returns [`SecretsError::Transport`] if the id has no usable segment.
    pub fn version_id(&self) -> SecretsResult<&str> {
        self.id
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|segment| !segment.is_empty() && !segment.contains(':'))
            .ok_or_else(|| {
                SecretsError::transport(format!("malformed secret version id: {:?}", self.id))
            })
    }
}

impl From<SecretItem> for SecretVersion {
    fn from(item: SecretItem) -> Self {
        Self {
            id: item.id,
            created: item.attributes.created,
            updated: item.attributes.updated,
            enabled: item.attributes.enabled,
        }
    }
}

/// Order versions newest first. Order among equal timestamps is unspecified.
pub fn sort_newest_first(versions: &mut [SecretVersion]) {
    versions.sort_unstable_by(|a, b| b.created.cmp(&a.created));
}

/// The version with the latest creation time, if any.
#[must_use]
pub fn newest(mut versions: Vec<SecretVersion>) -> Option<SecretVersion> {
    sort_newest_first(&mut versions);
    versions.into_iter().next()
}

/// One page of `GET /secrets/{name}/versions`
#[derive(Debug, Deserialize)]
pub struct SecretListPage {
    #[serde(default)]
    pub value: Vec<SecretItem>,
    #[serde(rename = "nextLink", default)]
    pub next_link: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SecretItem {
    pub id: String,
    pub attributes: SecretAttributes,
}

#[derive(Debug, Deserialize)]
pub struct SecretAttributes {
    #[serde(default = "enabled_default")]
    pub enabled: bool,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds_option", default)]
    pub updated: Option<DateTime<Utc>>,
}

const fn enabled_default() -> bool {
    true
}

/// `GET /secrets/{name}/{version}` response
#[derive(Debug, Deserialize)]
pub struct SecretBundle {
    pub value: String,
    pub id: String,
}

/// Vault error envelope
#[derive(Debug, Deserialize)]
pub struct VaultErrorBody {
    pub error: VaultErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct VaultErrorDetail {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

impl fmt::Display for VaultErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error.code, self.error.message)
    }
}

/// Identity provider token response
#[derive(Deserialize)]
pub struct TokenResponse {
    pub token_type: String,
    pub access_token: String,
}

/// Identity provider error response
#[derive(Debug, Deserialize)]
pub struct IdentityErrorBody {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl fmt::Display for IdentityErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_description {
            Some(description) => write!(f, "{}: {description}", self.error),
            None => f.write_str(&self.error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn version(id: &str, created: i64) -> SecretVersion {
        SecretVersion {
            id: id.to_string(),
            created: Utc.timestamp_opt(created, 0).unwrap(),
            updated: None,
            enabled: true,
        }
    }

    #[test]
    fn test_version_id_is_terminal_segment() {
        let v = version("https://vault.example/secrets/azure-storage-access-key/4387e9f3", 1);
        assert_eq!(v.version_id().unwrap(), "4387e9f3");

        let v = version("https://vault.example/secrets/name/v2/", 1);
        assert_eq!(v.version_id().unwrap(), "v2");
    }

    #[test]
    fn test_version_id_rejects_empty() {
        assert!(version("", 1).version_id().is_err());
        assert!(version("https://", 1).version_id().is_err());
    }

    #[test]
    fn test_newest_picks_latest_created() {
        let picked = newest(vec![
            version(".../v1", 100),
            version(".../v3", 300),
            version(".../v2", 200),
        ])
        .unwrap();
        assert_eq!(picked.version_id().unwrap(), "v3");
    }

    #[test]
    fn test_newest_of_nothing() {
        assert!(newest(Vec::new()).is_none());
    }

    #[test]
    fn test_deserialize_list_page() {
        let json = r#"{
            "value": [
                {"id": "https://v/secrets/n/a", "attributes": {"enabled": true, "created": 1493938410, "updated": 1493938411, "recoveryLevel": "Purgeable"}},
                {"id": "https://v/secrets/n/b", "attributes": {"created": 1493938500}}
            ],
            "nextLink": null
        }"#;
        let page: SecretListPage = serde_json::from_str(json).unwrap();
        assert!(page.next_link.is_none());

        let versions: Vec<SecretVersion> = page.value.into_iter().map(Into::into).collect();
        assert_eq!(versions[0].created.timestamp(), 1_493_938_410);
        assert_eq!(versions[0].updated.map(|t| t.timestamp()), Some(1_493_938_411));
        assert!(versions[1].enabled);
        assert!(versions[1].updated.is_none());
    }

    #[test]
    fn test_error_bodies_display() {
        let body: VaultErrorBody = serde_json::from_str(
            r#"{"error":{"code":"SecretNotFound","message":"A secret with (name/id) x was not found"}}"#,
        )
        .unwrap();
        assert_eq!(
            body.to_string(),
            "SecretNotFound: A secret with (name/id) x was not found"
        );

        let body: IdentityErrorBody = serde_json::from_str(
            r#"{"error":"invalid_client","error_description":"AADSTS7000215: Invalid client secret"}"#,
        )
        .unwrap();
        assert_eq!(
            body.to_string(),
            "invalid_client: AADSTS7000215: Invalid client secret"
        );
    }
}
