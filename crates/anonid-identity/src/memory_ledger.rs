use async_trait::async_trait;
use chrono::Utc;
use dashmap::{DashMap, DashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use uuid::Uuid;

use anonid_core::Identity;

use crate::error::LedgerError;
use crate::ledger::{is_unset_owner, LedgerClient, LedgerField, Receipt, TxHandle};

/// Ledger-side state for one DID.
#[derive(Debug, Clone)]
struct LedgerEntry {
    owner: Identity,
    active: bool,
    /// Attribute pairs in the order they were first set.
    attributes: Vec<(String, String)>,
    created_at: u64,
}

/// In-process ledger for tests and local development.
///
/// Holds registrations in memory, answers reads immediately and confirms
/// transactions on submission. Faults can be injected per field, per
/// attribute key or for the whole ledger.
pub struct InMemoryLedger {
    /// Account that submits writes.
    account: Identity,
    records: DashMap<String, LedgerEntry>,
    receipts: DashMap<String, Receipt>,
    block_height: AtomicU64,
    unreachable: AtomicBool,
    fail_transactions: AtomicBool,
    failing_fields: DashSet<LedgerField>,
    failing_attributes: DashSet<String>,
    read_delay_ms: AtomicU64,
}

impl InMemoryLedger {
    /// Create an empty ledger whose writes come from `account`.
    pub fn new(account: impl Into<Identity>) -> Self {
        Self {
            account: account.into(),
            records: DashMap::new(),
            receipts: DashMap::new(),
            block_height: AtomicU64::new(0),
            unreachable: AtomicBool::new(false),
            fail_transactions: AtomicBool::new(false),
            failing_fields: DashSet::new(),
            failing_attributes: DashSet::new(),
            read_delay_ms: AtomicU64::new(0),
        }
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    /// Current block height.
    pub fn block_height(&self) -> u64 {
        self.block_height.load(Ordering::SeqCst)
    }

    /// Seed a registration directly, bypassing transactions.
    pub fn insert_record(&self, did: &str, owner: impl Into<Identity>, active: bool) {
        self.records.insert(
            did.to_string(),
            LedgerEntry {
                owner: owner.into(),
                active,
                attributes: Vec::new(),
                created_at: Utc::now().timestamp().max(0) as u64,
            },
        );
    }

    /// Seed an attribute on an existing registration. Returns false if the
    /// DID is not registered.
    pub fn insert_attribute(&self, did: &str, key: &str, value: &str) -> bool {
        match self.records.get_mut(did) {
            Some(mut entry) => {
                upsert(&mut entry.attributes, key, value);
                true
            }
            None => false,
        }
    }

    /// Make every call fail with a transport error.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Make reads of one primary field fail.
    pub fn fail_field(&self, field: LedgerField) {
        self.failing_fields.insert(field);
    }

    /// Make reads of one attribute value fail.
    pub fn fail_attribute(&self, key: &str) {
        self.failing_attributes.insert(key.to_string());
    }

    /// Confirm subsequent transactions as failed without applying them.
    pub fn set_fail_transactions(&self, fail: bool) {
        self.fail_transactions.store(fail, Ordering::SeqCst);
    }

    /// Delay every read by `delay`.
    pub fn set_read_delay(&self, delay: Duration) {
        self.read_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Clear all injected faults.
    pub fn heal(&self) {
        self.set_unreachable(false);
        self.set_fail_transactions(false);
        self.failing_fields.clear();
        self.failing_attributes.clear();
        self.read_delay_ms.store(0, Ordering::SeqCst);
    }

    async fn before_read(&self, field: Option<LedgerField>) -> Result<(), LedgerError> {
        let delay = self.read_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(LedgerError::Transport("ledger is unreachable".into()));
        }
        if let Some(field) = field {
            if self.failing_fields.contains(&field) {
                return Err(LedgerError::Transport(format!("read of {} failed", field)));
            }
        }
        Ok(())
    }

    fn before_write(&self) -> Result<(), LedgerError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(LedgerError::Transport("ledger is unreachable".into()));
        }
        Ok(())
    }

    fn require_owned(&self, did: &str) -> Result<(), LedgerError> {
        let entry = self
            .records
            .get(did)
            .ok_or_else(|| LedgerError::Rejected(format!("{} is not registered", did)))?;
        if !entry.owner.eq_ignore_ascii_case(&self.account) {
            return Err(LedgerError::Rejected(format!(
                "{} is not owned by {}",
                did, self.account
            )));
        }
        Ok(())
    }

    /// Mint a receipt, applying `change` only when transactions succeed.
    fn submit<F>(&self, change: F) -> TxHandle
    where
        F: FnOnce(&Self),
    {
        let success = !self.fail_transactions.load(Ordering::SeqCst);
        if success {
            change(self);
        }

        let block_number = self.block_height.fetch_add(1, Ordering::SeqCst) + 1;
        let tx = TxHandle(format!("0x{}", Uuid::now_v7().simple()));
        self.receipts.insert(
            tx.0.clone(),
            Receipt {
                tx_hash: tx.clone(),
                success,
                block_number,
            },
        );

        tracing::debug!(tx = %tx, block = block_number, success, "transaction mined");
        tx
    }
}

fn upsert(attributes: &mut Vec<(String, String)>, key: &str, value: &str) {
    match attributes.iter_mut().find(|(k, _)| k == key) {
        Some(slot) => slot.1 = value.to_string(),
        None => attributes.push((key.to_string(), value.to_string())),
    }
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    async fn get_owner(&self, did: &str) -> Result<Option<Identity>, LedgerError> {
        self.before_read(Some(LedgerField::Owner)).await?;
        Ok(self.records.get(did).map(|e| e.owner.clone()))
    }

    async fn is_active(&self, did: &str) -> Result<bool, LedgerError> {
        self.before_read(Some(LedgerField::IsActive)).await?;
        Ok(self.records.get(did).map(|e| e.active).unwrap_or(false))
    }

    async fn get_attribute_keys(&self, did: &str) -> Result<Vec<String>, LedgerError> {
        self.before_read(Some(LedgerField::AttributeKeys)).await?;
        Ok(self
            .records
            .get(did)
            .map(|e| e.attributes.iter().map(|(k, _)| k.clone()).collect())
            .unwrap_or_default())
    }

    async fn get_attribute(&self, did: &str, key: &str) -> Result<Option<String>, LedgerError> {
        self.before_read(None).await?;
        if self.failing_attributes.contains(key) {
            return Err(LedgerError::Transport(format!(
                "read of attribute {} failed",
                key
            )));
        }
        Ok(self.records.get(did).and_then(|e| {
            e.attributes
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        }))
    }

    async fn get_creation_time(&self, did: &str) -> Result<u64, LedgerError> {
        self.before_read(Some(LedgerField::CreationTime)).await?;
        Ok(self.records.get(did).map(|e| e.created_at).unwrap_or(0))
    }

    async fn create_record(&self, did: &str) -> Result<TxHandle, LedgerError> {
        self.before_write()?;
        if let Some(entry) = self.records.get(did) {
            if !is_unset_owner(&entry.owner) {
                return Err(LedgerError::Rejected(format!("{} already registered", did)));
            }
        }

        let did = did.to_string();
        Ok(self.submit(move |ledger| {
            ledger.insert_record(&did, ledger.account.clone(), true);
        }))
    }

    async fn set_attribute(
        &self,
        did: &str,
        key: &str,
        value: &str,
    ) -> Result<TxHandle, LedgerError> {
        self.before_write()?;
        self.require_owned(did)?;
        Ok(self.submit(|ledger| {
            ledger.insert_attribute(did, key, value);
        }))
    }

    async fn deactivate_record(&self, did: &str) -> Result<TxHandle, LedgerError> {
        self.before_write()?;
        self.require_owned(did)?;
        Ok(self.submit(|ledger| {
            if let Some(mut entry) = ledger.records.get_mut(did) {
                entry.active = false;
            }
        }))
    }

    async fn confirm(&self, tx: &TxHandle) -> Result<Receipt, LedgerError> {
        self.before_write()?;
        self.receipts
            .get(tx.as_str())
            .map(|r| r.value().clone())
            .ok_or_else(|| LedgerError::Rejected(format!("unknown transaction {}", tx)))
    }
}
