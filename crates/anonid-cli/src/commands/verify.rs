//! `anonid verify`: verify a DID against the ledger and the local cache.

use clap::Args;
use std::time::Duration;

use anonid_core::AnonidConfig;
use anonid_identity::{LocalView, ReconciliationEngine, Verdict, VerificationResult};

use super::{open_manager, print_json, require_ledger};

#[derive(Args, Debug)]
pub struct VerifyArgs {
    pub did: String,

    /// Print the full result as JSON.
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: &VerifyArgs, config: &AnonidConfig) -> anyhow::Result<()> {
    let engine = ReconciliationEngine::new(open_manager(config)?, require_ledger(config)?)
        .with_read_deadline(config.ledger.read_timeout_ms.map(Duration::from_millis));
    let result = engine.verify(&args.did).await?;

    if args.json {
        return print_json(&result);
    }
    print_summary(&result);
    Ok(())
}

fn print_summary(result: &VerificationResult) {
    let mark = if result.is_valid { "VALID" } else { "NOT VALID" };
    println!("{}: {} ({})", result.did, mark, result.reason);

    match &result.verdict {
        Verdict::InvalidFormat { expected, .. } => {
            println!("  Expected: {}", expected);
            return;
        }
        Verdict::LedgerUnreachable { error, .. } => println!("  Ledger error: {}", error),
        Verdict::NotFoundOnLedger { .. } => {}
        Verdict::OnLedger { ledger, .. } => {
            println!("Ledger:");
            println!("  Owner:      {}", ledger.owner);
            println!("  Active:     {}", ledger.is_active);
            match ledger.created_at() {
                Some(created) => println!("  Created:    {}", created.to_rfc3339()),
                None => println!("  Created:    unknown"),
            }
            println!("  Attributes: {}", ledger.attribute_count);
            for (key, value) in &ledger.attributes {
                println!("    {} = {}", key, value);
            }
            for key in &ledger.missing_attributes {
                println!("    {} = (read failed)", key);
            }
            for field in &ledger.degraded {
                println!("  Degraded:   {}", field);
            }
        }
    }

    match result.verdict.local() {
        Some(LocalView::Present { record }) => {
            println!("Local cache:");
            println!("  Owner:      {}", record.owner);
            println!("  Active:     {}", record.is_active);
            println!("  Created:    {}", record.created_at.to_rfc3339());
            println!("  Modified:   {}", record.last_modified.to_rfc3339());
            println!("  History:    {} events", record.history.len());
        }
        Some(LocalView::Unreadable { error }) => println!("Local cache unreadable: {}", error),
        _ => println!("Local cache: no record"),
    }

    let divergences = result.divergences();
    if !divergences.is_empty() {
        println!("Divergences:");
        for divergence in divergences {
            println!("  {:?}", divergence);
        }
    }
}
