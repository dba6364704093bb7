//! `anonid create`: create or reactivate a local DID record.

use clap::Args;

use anonid_core::AnonidConfig;

use super::{open_manager, parse_attributes, print_json, resolve_owner};

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// DID to create. Derived from the owner when omitted.
    pub did: Option<String>,

    /// Owner identity. Defaults to `[ledger].account`.
    #[arg(short, long)]
    pub owner: Option<String>,

    /// Attributes as key=value, repeatable.
    #[arg(short, long = "attr")]
    pub attrs: Vec<String>,
}

pub fn run(args: &CreateArgs, config: &AnonidConfig) -> anyhow::Result<()> {
    let owner = resolve_owner(args.owner.as_deref(), config)?;
    let did = match &args.did {
        Some(did) => did.clone(),
        None => config.did_format().derive(&owner)?,
    };
    let attributes = parse_attributes(&args.attrs)?;

    let manager = open_manager(config)?;
    let record = manager.create(&did, &owner, attributes)?;
    print_json(&record)
}
