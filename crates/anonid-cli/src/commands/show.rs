//! `anonid show`: print one cached DID record.

use clap::Args;

use anonid_core::AnonidConfig;

use super::{open_manager, print_json};

#[derive(Args, Debug)]
pub struct ShowArgs {
    pub did: String,
}

pub fn run(args: &ShowArgs, config: &AnonidConfig) -> anyhow::Result<()> {
    match open_manager(config)?.find_by_did(&args.did)? {
        Some(record) => print_json(&record),
        None => anyhow::bail!("no local record for {}", args.did),
    }
}
