//! Secret resolution error types using thiserror 2.0.
//!
//! Every failure falls into one of four categories. None of them are
//! retried locally; they propagate to the caller of `resolve`.

use thiserror::Error;

/// Secret resolution errors.
#[derive(Error, Debug)]
pub enum SecretsError {
    /// Missing or invalid local configuration (credentials, vault URL)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Identity provider or vault rejected the client credentials
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The vault holds no versions for the secret
    #[error("Secret not found: {0}")]
    NotFound(String),

    /// Network or service fault, including malformed responses
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Coarse error category, for callers that branch without matching messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// See [`SecretsError::Configuration`]
    Configuration,
    /// See [`SecretsError::Authentication`]
    Authentication,
    /// See [`SecretsError::NotFound`]
    NotFound,
    /// See [`SecretsError::Transport`]
    Transport,
}

/// Result type for secret operations.
pub type SecretsResult<T> = Result<T, SecretsError>;

impl SecretsError {
    /// Category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Authentication(_) => ErrorKind::Authentication,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Transport(_) => ErrorKind::Transport,
        }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an authentication failed error.
    #[must_use]
    pub fn auth_failed(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a secret not found error.
    #[must_use]
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Create a transport error.
    #[must_use]
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }
}

impl From<reqwest::Error> for SecretsError {
    fn from(err: reqwest::Error) -> Self {
        // reqwest renders the URL, never headers or bodies
        Self::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for SecretsError {
    fn from(err: serde_json::Error) -> Self {
        Self::Transport(format!("malformed response body: {err}"))
    }
}

impl From<url::ParseError> for SecretsError {
    fn from(err: url::ParseError) -> Self {
        Self::Configuration(format!("invalid URL: {err}"))
    }
}
