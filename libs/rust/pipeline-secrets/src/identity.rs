//! Client-credential token exchange with the identity provider.

use crate::{
    challenge::AuthChallenge,
    credentials::ClientCredentials,
    error::{SecretsError, SecretsResult},
    secrets::{IdentityErrorBody, TokenResponse},
};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use tracing::{debug, instrument};

/// A bearer token issued by the identity provider.
#[derive(Clone)]
pub struct AccessToken {
    token_type: String,
    access_token: SecretString,
}

impl AccessToken {
    /// Create a token from its parts.
    #[must_use]
    pub fn new(token_type: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            token_type: token_type.into(),
            access_token: SecretString::from(access_token.into()),
        }
    }

    /// Token type, normally `Bearer`.
    #[must_use]
    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// Value for the `Authorization` header: `<tokenType> <accessToken>`.
    #[must_use]
    pub fn authorization_header(&self) -> SecretString {
        SecretString::from(format!(
            "{} {}",
            self.token_type,
            self.access_token.expose_secret()
        ))
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token_type", &self.token_type)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

impl From<TokenResponse> for AccessToken {
    fn from(response: TokenResponse) -> Self {
        Self {
            token_type: response.token_type,
            access_token: SecretString::from(response.access_token),
        }
    }
}

/// Exchange client credentials for a token scoped to the challenge's resource.
///
/// # Errors
///
/// - [`SecretsError::Authentication`] if the provider answers with a 4xx
/// - [`SecretsError::Transport`] on network failures, 5xx or malformed bodies
#[instrument(skip(http, challenge, credentials), fields(resource = %challenge.resource, client_id = %credentials.client_id()))]
pub async fn acquire_token(
    http: &Client,
    challenge: &AuthChallenge,
    credentials: &ClientCredentials,
) -> SecretsResult<AccessToken> {
    let endpoint = challenge.token_endpoint()?;
    let form = [
        ("grant_type", "client_credentials"),
        ("client_id", credentials.client_id()),
        ("client_secret", credentials.client_secret().expose_secret()),
        ("resource", challenge.resource.as_str()),
    ];

    let response = http.post(endpoint).form(&form).send().await?;
    let status = response.status();

    if status.is_client_error() {
        let text = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<IdentityErrorBody>(&text)
            .map_or_else(|_| text, |body| body.to_string());
        return Err(SecretsError::auth_failed(format!(
            "identity provider rejected client credentials (status {status}): {detail}"
        )));
    }
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(SecretsError::transport(format!(
            "identity provider returned status {status}: {text}"
        )));
    }

    let body = response.bytes().await?;
    let token: TokenResponse = serde_json::from_slice(&body)?;
    if token.token_type.trim().is_empty() {
        return Err(SecretsError::transport("identity provider returned an empty token type"));
    }
    if token.access_token.trim().is_empty() {
        return Err(SecretsError::transport("identity provider returned an empty access token"));
    }

    debug!(token_type = %token.token_type, "Acquired access token");
    Ok(token.into())
}
