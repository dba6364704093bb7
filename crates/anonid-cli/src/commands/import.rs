//! `anonid import`: load records from a JSON export.

use clap::Args;
use std::path::PathBuf;

use anonid_core::AnonidConfig;
use anonid_store::ImportMode;

use super::open_store;

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Export file to read.
    pub file: PathBuf,

    /// Replace all cached records instead of merging by owner.
    #[arg(long)]
    pub replace: bool,
}

pub fn run(args: &ImportArgs, config: &AnonidConfig) -> anyhow::Result<()> {
    let data = std::fs::read_to_string(&args.file)?;
    let mode = if args.replace {
        ImportMode::Replace
    } else {
        ImportMode::Merge
    };

    let identities = open_store(config)?.import(&data, mode)?;
    println!("Imported {} ({} identities stored)", args.file.display(), identities);
    Ok(())
}
