use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;

use anonid_core::DidRecord;

use crate::error::IdentityError;
use crate::ledger::{is_unset_owner, LedgerClient, Receipt, TxHandle};
use crate::manager::DidRecordManager;

/// Ledger-first writes mirrored into the local cache.
///
/// Each operation submits a transaction, waits for its receipt and only then
/// applies the matching local mutation. Ledger errors propagate.
pub struct DidRegistrar {
    manager: Arc<DidRecordManager>,
    ledger: Arc<dyn LedgerClient>,
}

impl DidRegistrar {
    pub fn new(manager: Arc<DidRecordManager>, ledger: Arc<dyn LedgerClient>) -> Self {
        Self { manager, ledger }
    }

    /// Register `did` on the ledger and record it locally for `owner`.
    ///
    /// The local record carries `transactionHash`, `blockNumber` and
    /// `timestamp` attributes from the confirmed transaction.
    pub async fn register(&self, owner: &str, did: &str) -> Result<DidRecord, IdentityError> {
        let format = self.manager.format();
        format.check(did)?;
        let normalized = format.normalize(did);
        let did: &str = &normalized;

        if let Some(existing) = self.ledger.get_owner(did).await? {
            if !is_unset_owner(&existing) {
                tracing::warn!(did = %did, owner = %existing, "DID already registered on ledger");
                return Err(IdentityError::AlreadyRegistered(did.to_string()));
            }
        }

        let tx = self.ledger.create_record(did).await?;
        tracing::info!(did = %did, tx = %tx, "registration submitted");
        let receipt = self.confirm(&tx).await?;

        let mut attributes = BTreeMap::new();
        attributes.insert("transactionHash".to_string(), receipt.tx_hash.to_string());
        attributes.insert("blockNumber".to_string(), receipt.block_number.to_string());
        attributes.insert("timestamp".to_string(), Utc::now().to_rfc3339());

        self.manager.create(did, owner, attributes)
    }

    /// Set one attribute on the ledger, then merge it locally.
    pub async fn set_attribute(
        &self,
        owner: &str,
        did: &str,
        key: &str,
        value: &str,
    ) -> Result<DidRecord, IdentityError> {
        let normalized = self.manager.format().normalize(did);
        let did: &str = &normalized;
        let tx = self.ledger.set_attribute(did, key, value).await?;
        tracing::info!(did = %did, key = %key, tx = %tx, "attribute update submitted");
        self.confirm(&tx).await?;

        let mut attributes = BTreeMap::new();
        attributes.insert(key.to_string(), value.to_string());
        self.manager.add_attributes(did, owner, attributes)
    }

    /// Deactivate on the ledger, then locally.
    pub async fn deactivate(&self, owner: &str, did: &str) -> Result<DidRecord, IdentityError> {
        let normalized = self.manager.format().normalize(did);
        let did: &str = &normalized;
        let tx = self.ledger.deactivate_record(did).await?;
        tracing::info!(did = %did, tx = %tx, "deactivation submitted");
        self.confirm(&tx).await?;
        self.manager.deactivate(did, owner)
    }

    async fn confirm(&self, tx: &TxHandle) -> Result<Receipt, IdentityError> {
        let receipt = self.ledger.confirm(tx).await?;
        if !receipt.success {
            tracing::warn!(tx = %tx, block = receipt.block_number, "transaction failed");
            return Err(IdentityError::TransactionFailed(tx.to_string()));
        }
        tracing::debug!(tx = %tx, block = receipt.block_number, "transaction confirmed");
        Ok(receipt)
    }
}
