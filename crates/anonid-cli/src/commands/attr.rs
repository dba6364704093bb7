//! `anonid attr`: merge attributes into a DID record.

use clap::Args;

use anonid_core::AnonidConfig;
use anonid_identity::DidRegistrar;

use super::{open_manager, parse_attributes, print_json, require_ledger, resolve_owner};

#[derive(Args, Debug)]
pub struct AttrArgs {
    pub did: String,

    /// Owner identity. Defaults to `[ledger].account`.
    #[arg(short, long)]
    pub owner: Option<String>,

    /// Attributes as key=value, repeatable.
    #[arg(short, long = "attr", required = true)]
    pub attrs: Vec<String>,

    /// Write each attribute to the ledger before updating the cache.
    #[arg(long)]
    pub on_ledger: bool,
}

pub async fn run(args: &AttrArgs, config: &AnonidConfig) -> anyhow::Result<()> {
    let owner = resolve_owner(args.owner.as_deref(), config)?;
    let attributes = parse_attributes(&args.attrs)?;
    let manager = open_manager(config)?;

    let record = if args.on_ledger {
        let registrar = DidRegistrar::new(manager, require_ledger(config)?);
        let mut latest = None;
        for (key, value) in &attributes {
            latest = Some(registrar.set_attribute(&owner, &args.did, key, value).await?);
        }
        match latest {
            Some(record) => record,
            None => anyhow::bail!("no attributes given"),
        }
    } else {
        manager.add_attributes(&args.did, &owner, attributes)?
    };

    print_json(&record)
}
