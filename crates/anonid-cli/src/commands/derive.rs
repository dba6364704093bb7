//! `anonid derive`: derive the DID for an identity.

use clap::Args;

use anonid_core::AnonidConfig;

#[derive(Args, Debug)]
pub struct DeriveArgs {
    /// Hex identity, e.g. a wallet address.
    pub identity: String,
}

pub fn run(args: &DeriveArgs, config: &AnonidConfig) -> anyhow::Result<()> {
    let did = config.did_format().derive(&args.identity)?;
    println!("{}", did);
    Ok(())
}
