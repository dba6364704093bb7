//! `anonid init`: write a default configuration file.

use clap::Args;
use std::path::Path;

use anonid_core::AnonidConfig;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing configuration file.
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: &InitArgs, path: &Path, config: &AnonidConfig) -> anyhow::Result<()> {
    if path.exists() && !args.force {
        anyhow::bail!(
            "{} already exists; pass --force to overwrite",
            path.display()
        );
    }

    config.save(path)?;
    std::fs::create_dir_all(&config.storage.data_dir)?;
    tracing::info!(path = %path.display(), "wrote config");

    println!("Configuration written to {}", path.display());
    println!("  Data dir:  {}", config.storage.data_dir.display());
    println!("  DID shape: {}", config.did_format().expected_shape());
    Ok(())
}
