//! `anonid register`: register a DID on the ledger and cache it locally.

use clap::Args;

use anonid_core::AnonidConfig;
use anonid_identity::DidRegistrar;

use super::{open_manager, print_json, require_ledger, resolve_owner};

#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Owner identity. Defaults to `[ledger].account`.
    #[arg(short, long)]
    pub owner: Option<String>,

    /// DID to register. Derived from the owner when omitted.
    #[arg(short, long)]
    pub did: Option<String>,
}

pub async fn run(args: &RegisterArgs, config: &AnonidConfig) -> anyhow::Result<()> {
    let owner = resolve_owner(args.owner.as_deref(), config)?;
    let did = match &args.did {
        Some(did) => did.clone(),
        None => config.did_format().derive(&owner)?,
    };

    let registrar = DidRegistrar::new(open_manager(config)?, require_ledger(config)?);
    let record = registrar.register(&owner, &did).await?;
    print_json(&record)
}
