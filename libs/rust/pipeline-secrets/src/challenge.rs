//! Parsing of the vault's `WWW-Authenticate` bearer challenge.
//!
//! An unauthenticated vault request is answered with `401` and a header of
//! the form
//!
//! ```text
//! Bearer authorization="https://login.example.net/<tenant>", resource="https://vault.example.net"
//! ```
//!
//! which names the identity-provider authority and the resource to request
//! a token for. A challenge is only answered once [`AuthChallenge::verify`]
//! has tied it to the vault that sent it.

use crate::error::{SecretsError, SecretsResult};
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

#[allow(clippy::expect_used)]
static PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_]+)\s*=\s*"([^"]*)""#).expect("challenge parameter pattern")
});

/// A parsed bearer challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthChallenge {
    /// Identity-provider authority URL, usually ending in the tenant id
    pub authorization: String,
    /// Resource the token must be issued for
    pub resource: String,
}

impl AuthChallenge {
    /// Parse a `WWW-Authenticate` header value.
    ///
    /// `authorization_uri` is accepted in place of `authorization`, and a
    /// `scope` of the form `<resource>/.default` in place of `resource`.
    ///
    /// # Errors
    ///
    /// Returns [`SecretsError::Transport`] if the header is not a bearer
    /// challenge or lacks the authority or resource.
    pub fn parse(header: &str) -> SecretsResult<Self> {
        let header = header.trim();
        let Some((scheme, params)) = header.split_once(char::is_whitespace) else {
            return Err(malformed(header));
        };
        if !scheme.eq_ignore_ascii_case("bearer") {
            return Err(malformed(header));
        }

        let mut authorization = None;
        let mut resource = None;
        let mut scope = None;

        for cap in PARAM.captures_iter(params) {
            let value = cap[2].trim().to_string();
            match cap[1].to_ascii_lowercase().as_str() {
                "authorization" | "authorization_uri" => authorization = Some(value),
                "resource" => resource = Some(value),
                "scope" => scope = Some(value),
                _ => {}
            }
        }

        let resource = resource
            .or_else(|| scope.map(|s| s.strip_suffix("/.default").unwrap_or(&s).to_string()));

        match (authorization, resource) {
            (Some(authorization), Some(resource))
                if !authorization.is_empty() && !resource.is_empty() =>
            {
                Ok(Self {
                    authorization,
                    resource,
                })
            }
            _ => Err(malformed(header)),
        }
    }

    /// Check that the challenge may be answered for a request to `vault_url`.
    ///
    /// The authority must be https unless the vault itself is plain http, and
    /// the resource host must be the vault host or one of its parent domains.
    ///
    /// # Errors
    ///
    /// Returns [`SecretsError::Transport`] if either check fails.
    pub fn verify(&self, vault_url: &Url) -> SecretsResult<()> {
        let authority = self.token_endpoint()?;
        let allowed_scheme = authority.scheme() == "https"
            || (authority.scheme() == "http" && vault_url.scheme() == "http");
        if !allowed_scheme {
            return Err(SecretsError::transport(format!(
                "challenge authority {:?} is not https",
                self.authorization
            )));
        }

        let resource_host = Url::parse(&self.resource)
            .ok()
            .and_then(|url| url.host_str().map(str::to_ascii_lowercase))
            .filter(|host| !host.is_empty())
            .ok_or_else(|| {
                SecretsError::transport(format!(
                    "challenge resource {:?} is not a URL",
                    self.resource
                ))
            })?;
        let vault_host = vault_url.host_str().unwrap_or_default().to_ascii_lowercase();

        let matches = vault_host == resource_host
            || vault_host
                .strip_suffix(resource_host.as_str())
                .is_some_and(|prefix| prefix.ends_with('.'));
        if !matches {
            return Err(SecretsError::transport(format!(
                "challenge resource {:?} does not match vault host {vault_host:?}",
                self.resource
            )));
        }
        Ok(())
    }

    /// OAuth token endpoint of the challenge's authority.
    ///
    /// # Errors
    ///
    /// Returns [`SecretsError::Transport`] if the authority is not a URL.
    pub fn token_endpoint(&self) -> SecretsResult<Url> {
        let base = format!("{}/oauth2/token", self.authorization.trim_end_matches('/'));
        Url::parse(&base).map_err(|e| {
            SecretsError::transport(format!(
                "challenge authority {:?} is not a URL: {e}",
                self.authorization
            ))
        })
    }
}

fn malformed(header: &str) -> SecretsError {
    SecretsError::transport(format!("malformed authorization challenge: {header:?}"))
}
