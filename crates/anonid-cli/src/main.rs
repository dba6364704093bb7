//! AnonID CLI: manage and verify locally cached DIDs.
//!
//! Subcommands: init, derive, validate, create, attr, deactivate, list,
//! show, register, verify, export, import, serve-ledger.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use anonid_core::config::LoggingConfig;
use anonid_core::AnonidConfig;

/// AnonID: encrypted DID record cache with ledger verification.
#[derive(Parser, Debug)]
#[command(name = "anonid", version, about, long_about = None)]
struct Cli {
    /// TOML config file; defaults apply when it is missing.
    #[arg(short, long, global = true, default_value = "anonid.toml")]
    config: PathBuf,

    /// Directory for the file or RocksDB backend.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Override the ledger gateway endpoint.
    #[arg(long, global = true)]
    ledger_endpoint: Option<String>,

    /// Tracing filter, e.g. `debug` or `anonid_identity=trace`.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default configuration file.
    Init(commands::init::InitArgs),
    /// Derive the DID for an identity.
    Derive(commands::derive::DeriveArgs),
    /// Check whether a string is a well-formed DID.
    Validate(commands::validate::ValidateArgs),
    /// Create (or reactivate) a local DID record.
    Create(commands::create::CreateArgs),
    /// Merge attributes into a DID record.
    Attr(commands::attr::AttrArgs),
    /// Deactivate a DID record.
    Deactivate(commands::deactivate::DeactivateArgs),
    /// List the DID records of an owner.
    List(commands::list::ListArgs),
    /// Show a DID record with its history.
    Show(commands::show::ShowArgs),
    /// Register a DID on the ledger and cache it locally.
    Register(commands::register::RegisterArgs),
    /// Verify a DID against the ledger and the local cache.
    Verify(commands::verify::VerifyArgs),
    /// Export the cached records as plaintext JSON.
    Export(commands::export::ExportArgs),
    /// Import records from a JSON export.
    Import(commands::import::ImportArgs),
    /// Run an in-memory ledger gateway for local development.
    ServeLedger(commands::serve::ServeArgs),
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AnonidConfig::load(&cli.config)?;

    if let Some(data_dir) = cli.data_dir {
        config.storage.data_dir = data_dir;
    }
    if let Some(endpoint) = cli.ledger_endpoint {
        config.ledger.endpoint = Some(endpoint);
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    init_tracing(&config.logging);

    match &cli.command {
        Commands::Init(args) => commands::init::run(args, &cli.config, &config),
        Commands::Derive(args) => commands::derive::run(args, &config),
        Commands::Validate(args) => commands::validate::run(args, &config),
        Commands::Create(args) => commands::create::run(args, &config),
        Commands::Attr(args) => commands::attr::run(args, &config).await,
        Commands::Deactivate(args) => commands::deactivate::run(args, &config).await,
        Commands::List(args) => commands::list::run(args, &config),
        Commands::Show(args) => commands::show::run(args, &config),
        Commands::Register(args) => commands::register::run(args, &config).await,
        Commands::Verify(args) => commands::verify::run(args, &config).await,
        Commands::Export(args) => commands::export::run(args, &config),
        Commands::Import(args) => commands::import::run(args, &config),
        Commands::ServeLedger(args) => commands::serve::run(args, &config).await,
    }
}
