use std::time::Duration;

use anonid_core::CoreError;
use anonid_store::StoreError;

/// Failures talking to the ledger.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LedgerError {
    #[error("ledger unreachable: {0}")]
    Transport(String),

    #[error("could not decode ledger response: {0}")]
    Decode(String),

    #[error("ledger rejected the request: {0}")]
    Rejected(String),

    #[error("ledger read timed out after {0:?}")]
    Timeout(Duration),
}

/// Identity-layer errors.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("DID record not found: {did} (owner {owner})")]
    RecordNotFound { did: String, owner: String },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("no ledger client configured")]
    LedgerNotConfigured,

    #[error("DID already registered on the ledger: {0}")]
    AlreadyRegistered(String),

    #[error("ledger transaction failed: {0}")]
    TransactionFailed(String),
}
