//! `anonid export`: dump cached records as plaintext JSON.

use clap::Args;
use std::path::PathBuf;

use anonid_core::AnonidConfig;

use super::open_store;

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Export only this owner's records.
    #[arg(short, long)]
    pub owner: Option<String>,

    /// Write to a file instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: &ExportArgs, config: &AnonidConfig) -> anyhow::Result<()> {
    let dump = open_store(config)?.export(args.owner.as_deref())?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, &dump)?;
            eprintln!("Exported to {} (unencrypted)", path.display());
        }
        None => println!("{}", dump),
    }
    Ok(())
}
