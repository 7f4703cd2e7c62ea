//! Indexgate CLI entry point

mod cli;

use crate::cli::{Cli, Commands};
use anyhow::{bail, Context, Result};
use clap::Parser;
use indexgate::{GrantRegistry, PlatformId, RegistryConfig};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> Result<ExitCode> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Logs go to stderr so command output stays scriptable
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = RegistryConfig::from_env();
    if let Some(path) = cli.index_file {
        config = config.index_file(path);
    }
    if let Some(length) = cli.token_length {
        config = config.token_length(length);
    }
    if let Commands::Generate { length: Some(length) } = cli.command {
        config = config.token_length(length);
    }

    let registry = config
        .open_registry()
        .context("Invalid registry configuration")?;

    match cli.command {
        Commands::Create { channel, role } => create(&registry, &config, &channel, &role),
        Commands::Lookup { index } => Ok(lookup(&registry, &index)),
        Commands::List => {
            list(&registry);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Generate { .. } => {
            println!("{}", registry.preview_token());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn create(registry: &GrantRegistry, config: &RegistryConfig, channel: &str, role: &str) -> Result<ExitCode> {
    let grant = registry.issue_grant(PlatformId::parse(channel), PlatformId::parse(role));

    // A one-shot process loses anything that did not reach the file
    if !registry.is_persisted() {
        bail!(
            "Index {} could not be saved to {}",
            grant.token,
            config.index_file.display()
        );
    }

    info!(token = %grant.token, "Index created");
    println!("{}", grant.token);
    println!();
    println!("Channel: {}", grant.resource_id);
    println!("Role: {}", grant.role_id);
    Ok(ExitCode::SUCCESS)
}

fn lookup(registry: &GrantRegistry, index: &str) -> ExitCode {
    match registry.lookup(index) {
        Ok(grant) => {
            println!("Index: {}", grant.token);
            println!("Channel: {}", grant.resource_id);
            println!("Role: {}", grant.role_id);
            ExitCode::SUCCESS
        }
        Err(_) => {
            println!("Invalid index");
            ExitCode::FAILURE
        }
    }
}

fn list(registry: &GrantRegistry) {
    let grants = registry.grants();

    println!("Indexes ({})", grants.len());
    if grants.is_empty() {
        println!("  (none)");
        return;
    }

    for grant in grants {
        println!("  {}  channel={}  role={}", grant.token, grant.resource_id, grant.role_id);
    }
}
