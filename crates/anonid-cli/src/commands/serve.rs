//! `anonid serve-ledger`: in-memory ledger gateway for local development.

use clap::Args;
use std::sync::Arc;

use anonid_core::AnonidConfig;
use anonid_identity::{gateway, InMemoryLedger};

use super::resolve_owner;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on.
    #[arg(short, long, default_value = "127.0.0.1:8545")]
    pub listen: String,

    /// Account that owns registrations. Defaults to `[ledger].account`.
    #[arg(short, long)]
    pub account: Option<String>,
}

pub async fn run(args: &ServeArgs, config: &AnonidConfig) -> anyhow::Result<()> {
    let account = resolve_owner(args.account.as_deref(), config)?;
    let ledger = Arc::new(InMemoryLedger::new(account.clone()));

    let listener = tokio::net::TcpListener::bind(&args.listen).await?;
    println!("Ledger gateway for {} on http://{}", account, listener.local_addr()?);

    tokio::select! {
        result = gateway::serve(ledger, listener) => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down ledger gateway");
        }
    }
    Ok(())
}
