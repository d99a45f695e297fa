//! Key vault secret resolver for the publishing pipeline.
//!
//! Resolves a fixed set of logical secret names to the value of their most
//! recently created version. Authentication follows the vault's bearer
//! challenge with a client-credential token exchange; credentials are read
//! from the environment on every call and nothing is cached.

pub mod challenge;
pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod identity;
pub mod names;
pub mod provider;
pub mod resolver;
pub mod secrets;

pub use client::{AuthSession, KeyVaultClient};
pub use config::KeyVaultConfig;
pub use credentials::{ClientCredentials, CredentialSource, EnvCredentials};
pub use error::{ErrorKind, SecretsError, SecretsResult};
pub use names::SecretName;
pub use provider::SecretProvider;
pub use resolver::SecretResolver;
pub use secrets::SecretVersion;
