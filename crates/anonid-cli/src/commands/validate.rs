//! `anonid validate`: check a DID string.

use clap::Args;

use anonid_core::AnonidConfig;

#[derive(Args, Debug)]
pub struct ValidateArgs {
    pub did: String,
}

pub fn run(args: &ValidateArgs, config: &AnonidConfig) -> anyhow::Result<()> {
    let format = config.did_format();
    match format.extract_identity(&args.did) {
        Some(identity) => {
            println!("valid");
            println!("  Identity prefix: {}", identity);
            Ok(())
        }
        None => anyhow::bail!(
            "invalid DID {:?}, expected {}",
            args.did,
            format.expected_shape()
        ),
    }
}
