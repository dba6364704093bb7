//! `anonid deactivate`: deactivate a DID record.

use clap::Args;

use anonid_core::AnonidConfig;
use anonid_identity::DidRegistrar;

use super::{open_manager, print_json, require_ledger, resolve_owner};

#[derive(Args, Debug)]
pub struct DeactivateArgs {
    pub did: String,

    /// Owner identity. Defaults to `[ledger].account`.
    #[arg(short, long)]
    pub owner: Option<String>,

    /// Deactivate on the ledger before updating the cache.
    #[arg(long)]
    pub on_ledger: bool,
}

pub async fn run(args: &DeactivateArgs, config: &AnonidConfig) -> anyhow::Result<()> {
    let owner = resolve_owner(args.owner.as_deref(), config)?;
    let manager = open_manager(config)?;

    let record = if args.on_ledger {
        DidRegistrar::new(manager, require_ledger(config)?)
            .deactivate(&owner, &args.did)
            .await?
    } else {
        manager.deactivate(&args.did, &owner)?
    };

    print_json(&record)
}
