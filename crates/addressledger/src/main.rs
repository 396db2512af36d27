//! `AddressLedger` - postal address verification from the command line.
//!
//! Verifies addresses against the Melissa Global Address service and keeps
//! every attempt in a local `SQLite` ledger.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod args;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use addressledger_core::{Config, SqliteRecordStore, VerificationService};
use args::{Args, Commands, VerifyArgs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "addressledger=info,addressledger_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let Args { config, command } = Args::parse();
    let config_path = config.unwrap_or_else(Config::default_path);
    let config = Config::load(&config_path).await.map_err(with_kind)?;
    debug!(path = %config_path.display(), "Configuration loaded");

    let store = open_store(&config).await?;

    match command {
        Commands::Verify(args) => verify(&config, store, &args).await?,
        Commands::Show { id } => {
            let record = store
                .get(id)
                .await
                .map_err(with_kind)?
                .with_context(|| format!("no verification record with id {id}"))?;
            print_json(&record)?;
        }
        Commands::History { limit } => {
            let records = store.list_recent(limit).await.map_err(with_kind)?;
            print_json(&records)?;
        }
    }

    Ok(())
}

async fn verify(config: &Config, store: SqliteRecordStore, args: &VerifyArgs) -> anyhow::Result<()> {
    let client = config.client().map_err(with_kind)?;
    let service = VerificationService::new(store, client);

    let result = service.verify(&args.to_input()).await.map_err(with_kind)?;
    info!(valid = result.valid, duplicate = result.duplicate, "Verification finished");
    print_json(&result)
}

async fn open_store(config: &Config) -> anyhow::Result<SqliteRecordStore> {
    let path = &config.database_path;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    SqliteRecordStore::open(&path.to_string_lossy(), config.busy_timeout())
        .await
        .map_err(with_kind)
        .with_context(|| format!("failed to open database {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prefixes a core error with its category.
fn with_kind(err: addressledger_core::Error) -> anyhow::Error {
    let kind = err.kind();
    anyhow::Error::new(err).context(format!("{kind} error"))
}
