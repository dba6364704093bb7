//! AnonID Identity Layer
//!
//! Record-level operations and ledger reconciliation for cached DIDs:
//! - DID record manager (create, attribute merge, deactivate, lookups)
//! - Ledger client interface with in-memory and HTTP gateway clients
//! - REST gateway serving any ledger client over HTTP
//! - Reconciliation engine producing one merged verification verdict
//! - Registrar for ledger-first writes mirrored into the local cache

pub mod error;
pub mod gateway;
pub mod http_ledger;
pub mod ledger;
pub mod manager;
pub mod memory_ledger;
pub mod reconcile;
pub mod registrar;
pub mod verdict;

pub use error::{IdentityError, LedgerError};
pub use http_ledger::HttpLedgerClient;
pub use ledger::{is_unset_owner, LedgerClient, LedgerField, Receipt, TxHandle, ZERO_ADDRESS};
pub use manager::DidRecordManager;
pub use memory_ledger::InMemoryLedger;
pub use reconcile::ReconciliationEngine;
pub use registrar::DidRegistrar;
pub use verdict::{
    Divergence, LedgerSnapshot, LocalSnapshot, LocalView, VerdictReason, Verdict,
    VerificationResult,
};
