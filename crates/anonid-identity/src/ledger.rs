use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use anonid_core::Identity;

use crate::error::LedgerError;

/// Owner value the ledger reports for a DID that was never registered.
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Whether an owner value means "no owner".
///
/// Empty strings and any all-zero hex address (with or without `0x`) count
/// as unset.
pub fn is_unset_owner(owner: &str) -> bool {
    let digits = owner
        .strip_prefix("0x")
        .or_else(|| owner.strip_prefix("0X"))
        .unwrap_or(owner);
    digits.is_empty() || digits.chars().all(|c| c == '0')
}

/// Handle to a submitted ledger transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxHandle(pub String);

impl TxHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of a confirmed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub tx_hash: TxHandle,
    pub success: bool,
    pub block_number: u64,
}

/// The four primary per-DID fields read during verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerField {
    Owner,
    IsActive,
    AttributeKeys,
    CreationTime,
}

impl fmt::Display for LedgerField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Owner => write!(f, "owner"),
            Self::IsActive => write!(f, "is_active"),
            Self::AttributeKeys => write!(f, "attribute_keys"),
            Self::CreationTime => write!(f, "creation_time"),
        }
    }
}

/// Client of the authoritative DID ledger.
///
/// Reads report what the ledger currently holds for a DID. Writes submit a
/// transaction and return its handle; [`confirm`](Self::confirm) waits for
/// the receipt.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Registered owner of the DID. `None` (or a zero address) means the DID
    /// is not on the ledger.
    async fn get_owner(&self, did: &str) -> Result<Option<Identity>, LedgerError>;

    /// Ledger-side active flag.
    async fn is_active(&self, did: &str) -> Result<bool, LedgerError>;

    /// Attribute keys in ledger order.
    async fn get_attribute_keys(&self, did: &str) -> Result<Vec<String>, LedgerError>;

    async fn get_attribute(&self, did: &str, key: &str) -> Result<Option<String>, LedgerError>;

    /// Creation time in unix seconds, 0 if unknown.
    async fn get_creation_time(&self, did: &str) -> Result<u64, LedgerError>;

    /// Submit a registration for `did` from the client's account.
    async fn create_record(&self, did: &str) -> Result<TxHandle, LedgerError>;

    async fn set_attribute(&self, did: &str, key: &str, value: &str)
        -> Result<TxHandle, LedgerError>;

    async fn deactivate_record(&self, did: &str) -> Result<TxHandle, LedgerError>;

    /// Wait for a submitted transaction and return its receipt.
    async fn confirm(&self, tx: &TxHandle) -> Result<Receipt, LedgerError>;
}
