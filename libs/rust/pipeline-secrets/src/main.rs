//! `pipeline-secrets` command line: list secret names and resolve their
//! newest values from the key vault.

use anyhow::Context;
use clap::{Parser, Subcommand};
use pipeline_common::{TracingConfig, init_tracing};
use pipeline_secrets::{KeyVaultConfig, SecretName, SecretResolver};
use secrecy::ExposeSecret;

/// Look up publishing pipeline secrets in the key vault.
#[derive(Parser)]
#[command(name = "pipeline-secrets", version)]
struct Cli {
    /// Vault base URL
    #[arg(long, env = "KEY_VAULT_URL", global = true)]
    vault_url: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the known secret names and their vault names
    Names,
    /// Print the newest value of a secret
    Get {
        /// Secret key or vault name, e.g. AZURE_STORAGE_ACCESS_KEY
        name: SecretName,
    },
    /// List stored versions of a secret, newest first
    Versions {
        /// Secret key or vault name
        name: SecretName,
    },
}

fn vault_config(vault_url: Option<&str>) -> anyhow::Result<KeyVaultConfig> {
    let config = match vault_url {
        Some(url) => KeyVaultConfig::new(url)?,
        None => KeyVaultConfig::from_env()?,
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_tracing(
        &TracingConfig::default()
            .with_log_level(&cli.log_level)
            .with_json_output(cli.json_logs),
    )
    .context("failed to initialize tracing")?;

    match cli.command {
        Command::Names => {
            for name in SecretName::ALL {
                println!("{name}\t{}", name.vault_name());
            }
        }
        Command::Get { name } => {
            let resolver = SecretResolver::new(vault_config(cli.vault_url.as_deref())?)?;
            let value = resolver
                .resolve(name)
                .await
                .with_context(|| format!("failed to resolve {name}"))?;
            println!("{}", value.expose_secret());
        }
        Command::Versions { name } => {
            let resolver = SecretResolver::new(vault_config(cli.vault_url.as_deref())?)?;
            let versions = resolver
                .versions(name)
                .await
                .with_context(|| format!("failed to list versions of {name}"))?;
            for version in versions {
                let id = version.version_id()?;
                println!(
                    "{id}\t{}\t{}",
                    version.created.to_rfc3339(),
                    if version.enabled { "enabled" } else { "disabled" }
                );
            }
        }
    }

    Ok(())
}
