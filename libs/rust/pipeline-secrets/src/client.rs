//! Key vault HTTP client with challenge-driven authentication.

use crate::{
    challenge::AuthChallenge,
    config::KeyVaultConfig,
    credentials::ClientCredentials,
    error::{SecretsError, SecretsResult},
    identity::acquire_token,
    secrets::{SecretBundle, SecretListPage, SecretVersion, VaultErrorBody},
};
use pipeline_common::build_http_client;
use reqwest::{
    Client, Response, StatusCode,
    header::{AUTHORIZATION, HeaderValue, WWW_AUTHENTICATE},
};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use tracing::{debug, instrument, warn};
use url::Url;
use uuid::Uuid;

const REQUEST_ID_HEADER: &str = "x-ms-client-request-id";
const RETURN_REQUEST_ID_HEADER: &str = "return-client-request-id";
const MAX_PAGES: usize = 1000;

/// Authentication state for a single resolution.
///
/// Holds the client credentials and, once the vault has challenged, the
/// `Authorization` header value. Dropped at the end of the call.
#[derive(Debug)]
pub struct AuthSession {
    credentials: ClientCredentials,
    authorization: Option<SecretString>,
}

impl AuthSession {
    /// Start an unauthenticated session.
    #[must_use]
    pub const fn new(credentials: ClientCredentials) -> Self {
        Self {
            credentials,
            authorization: None,
        }
    }

    /// Whether a bearer token has been obtained.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.authorization.is_some()
    }

    fn authorization_value(&self) -> SecretsResult<Option<HeaderValue>> {
        self.authorization
            .as_ref()
            .map(|auth| {
                let mut value = HeaderValue::from_str(auth.expose_secret()).map_err(|_| {
                    SecretsError::transport("access token is not a valid header value")
                })?;
                value.set_sensitive(true);
                Ok(value)
            })
            .transpose()
    }
}

/// Key vault REST client.
pub struct KeyVaultClient {
    config: KeyVaultConfig,
    http: Client,
}

impl KeyVaultClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns [`SecretsError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: KeyVaultConfig) -> SecretsResult<Self> {
        let http = build_http_client(&config.http)?;
        Ok(Self { config, http })
    }

    /// Vault base URL.
    #[must_use]
    pub const fn vault_url(&self) -> &Url {
        &self.config.vault_url
    }

    /// List every stored version of `secret_name`, following `nextLink`.
    ///
    /// # Errors
    ///
    /// [`SecretsError::NotFound`] if the vault does not know the secret;
    /// [`SecretsError::Transport`] if a `nextLink` repeats or the listing
    /// runs past the page limit; authentication and transport errors
    /// otherwise.
    #[instrument(skip(self, session), fields(vault = %self.config.vault_url))]
    pub async fn list_versions(
        &self,
        session: &mut AuthSession,
        secret_name: &str,
    ) -> SecretsResult<Vec<SecretVersion>> {
        let mut versions = Vec::new();
        let mut next = Some(self.secret_url(&[secret_name, "versions"])?);
        let mut visited = HashSet::new();

        while let Some(url) = next.take() {
            if !visited.insert(url.clone()) {
                return Err(SecretsError::transport(format!(
                    "version listing of {secret_name} loops back to {url}"
                )));
            }
            if visited.len() > MAX_PAGES {
                return Err(SecretsError::transport(format!(
                    "version listing of {secret_name} exceeds {MAX_PAGES} pages"
                )));
            }

            let page: SecretListPage = self.request(session, url, secret_name).await?;
            versions.extend(page.value.into_iter().map(SecretVersion::from));

            if let Some(link) = page.next_link.filter(|l| !l.is_empty()) {
                next = Some(self.next_page_url(&link)?);
            }
        }

        let pages = visited.len();

        debug!(count = versions.len(), pages, "Listed secret versions");
        Ok(versions)
    }

    /// Fetch the value of one version of `secret_name`.
    ///
    /// # Errors
    ///
    /// [`SecretsError::NotFound`] if the version does not exist;
    /// authentication and transport errors otherwise.
    #[instrument(skip(self, session), fields(vault = %self.config.vault_url))]
    pub async fn get_secret_value(
        &self,
        session: &mut AuthSession,
        secret_name: &str,
        version: &str,
    ) -> SecretsResult<SecretString> {
        let url = self.secret_url(&[secret_name, version])?;
        let bundle: SecretBundle = self.request(session, url, secret_name).await?;
        debug!(id = %bundle.id, "Fetched secret value");
        Ok(SecretString::from(bundle.value))
    }

    fn secret_url(&self, segments: &[&str]) -> SecretsResult<Url> {
        let mut url = self.config.vault_url.clone();
        url.path_segments_mut()
            .map_err(|()| SecretsError::config("vault URL cannot be a base"))?
            .pop_if_empty()
            .push("secrets")
            .extend(segments);
        url.query_pairs_mut()
            .append_pair("api-version", &self.config.api_version);
        Ok(url)
    }

    /// Parse a `nextLink`, refusing to send the token to another origin.
    fn next_page_url(&self, link: &str) -> SecretsResult<Url> {
        let url = Url::parse(link)
            .map_err(|e| SecretsError::transport(format!("malformed nextLink {link:?}: {e}")))?;
        if url.origin() != self.config.vault_url.origin() {
            return Err(SecretsError::transport(format!(
                "nextLink {link:?} points outside the vault"
            )));
        }
        Ok(url)
    }

    /// GET `url`, answering at most one authorization challenge.
    async fn request<T: DeserializeOwned>(
        &self,
        session: &mut AuthSession,
        url: Url,
        secret_name: &str,
    ) -> SecretsResult<T> {
        let mut answered_challenge = false;

        loop {
            let response = self.send(session, url.clone()).await?;

            if response.status() != StatusCode::UNAUTHORIZED {
                return decode(response, secret_name).await;
            }
            if answered_challenge {
                return Err(SecretsError::auth_failed(format!(
                    "vault rejected a freshly issued token for {secret_name}"
                )));
            }

            let challenge = response
                .headers()
                .get(WWW_AUTHENTICATE)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| {
                    SecretsError::transport("vault returned 401 without an authorization challenge")
                })
                .and_then(AuthChallenge::parse)?;
            challenge.verify(&self.config.vault_url)?;

            if session.is_authenticated() {
                warn!("Vault challenged an authenticated request, re-authenticating");
            }

            let token = acquire_token(&self.http, &challenge, &session.credentials).await?;
            session.authorization = Some(token.authorization_header());
            answered_challenge = true;
        }
    }

    async fn send(&self, session: &AuthSession, url: Url) -> SecretsResult<Response> {
        let request_id = Uuid::new_v4();
        let mut request = self
            .http
            .get(url)
            .header(REQUEST_ID_HEADER, request_id.to_string())
            .header(RETURN_REQUEST_ID_HEADER, "true");

        if let Some(value) = session.authorization_value()? {
            request = request.header(AUTHORIZATION, value);
        }

        let response = request.send().await?;
        debug!(%request_id, status = %response.status(), "Vault responded");
        Ok(response)
    }
}

async fn decode<T: DeserializeOwned>(response: Response, secret_name: &str) -> SecretsResult<T> {
    let status = response.status();
    if status.is_success() {
        let body = response.bytes().await?;
        return Ok(serde_json::from_slice(&body)?);
    }

    let text = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<VaultErrorBody>(&text)
        .map_or_else(|_| text, |body| body.to_string());

    Err(match status {
        StatusCode::NOT_FOUND => SecretsError::not_found(format!("{secret_name} ({detail})")),
        StatusCode::FORBIDDEN => SecretsError::auth_failed(format!(
            "access to {secret_name} denied (status {status}): {detail}"
        )),
        _ => SecretsError::transport(format!("vault returned status {status}: {detail}")),
    })
}
