//! Generic secret provider trait

use crate::{error::SecretsResult, names::SecretName};
use async_trait::async_trait;
use secrecy::SecretString;

/// Source of pipeline secret values.
///
/// Pipeline steps depend on this trait rather than on the resolver so they
/// can be exercised with in-memory providers.
#[async_trait]
pub trait SecretProvider: Send + Sync {
    /// Current value of `name`.
    async fn get_secret(&self, name: SecretName) -> SecretsResult<SecretString>;
}
