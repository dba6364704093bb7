//! `anonid list`: list the DID records of an owner.

use clap::Args;

use anonid_core::AnonidConfig;

use super::{open_manager, print_json, resolve_owner};

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Owner identity. Defaults to `[ledger].account`.
    #[arg(short, long)]
    pub owner: Option<String>,

    /// Print full records as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: &ListArgs, config: &AnonidConfig) -> anyhow::Result<()> {
    let owner = resolve_owner(args.owner.as_deref(), config)?;
    let records = open_manager(config)?.list_by_owner(&owner)?;

    if args.json {
        return print_json(&records);
    }

    println!("DIDs for {} ({}):", owner, records.len());
    if records.is_empty() {
        println!("  (none)");
    }
    for record in &records {
        let status = if record.is_active { "active" } else { "inactive" };
        println!(
            "  {}  {:<8}  {} attributes, modified {}",
            record.did,
            status,
            record.attributes.len(),
            record.last_modified.to_rfc3339()
        );
    }
    Ok(())
}
