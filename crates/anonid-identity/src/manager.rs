use std::collections::BTreeMap;
use std::sync::Arc;

use anonid_core::{DidFormat, DidRecord, HistoryAction};
use anonid_store::EncryptedRecordStore;
use chrono::Utc;

use crate::error::IdentityError;

/// Record-level operations over the encrypted store.
///
/// Every mutation is a full load -> modify -> save cycle against the store
/// handle. Two managers (or two tasks) mutating concurrently race at the
/// store and the last save wins.
pub struct DidRecordManager {
    store: Arc<EncryptedRecordStore>,
    format: DidFormat,
}

impl DidRecordManager {
    /// Create a manager using the default DID format.
    pub fn new(store: Arc<EncryptedRecordStore>) -> Self {
        Self::with_format(store, DidFormat::default())
    }

    pub fn with_format(store: Arc<EncryptedRecordStore>, format: DidFormat) -> Self {
        Self { store, format }
    }

    pub fn format(&self) -> &DidFormat {
        &self.format
    }

    pub fn store(&self) -> &Arc<EncryptedRecordStore> {
        &self.store
    }

    /// Create a record, or reactivate an existing one for the same owner.
    ///
    /// Existing records get the attributes merged, `is_active` set and an
    /// `Update` event noting the reactivation. Replaying with identical
    /// attributes leaves attributes and the active flag unchanged.
    pub fn create(
        &self,
        did: &str,
        owner: &str,
        attributes: BTreeMap<String, String>,
    ) -> Result<DidRecord, IdentityError> {
        let normalized = self.format.normalize(did);
        let did: &str = &normalized;
        let mut map = self.store.load()?;
        let now = Utc::now();
        let records = map.entry(owner.to_string()).or_default();

        let record = match records.iter_mut().find(|r| self.same_did(&r.did, did)) {
            Some(existing) => {
                existing.merge_attributes(&attributes);
                existing.is_active = true;
                existing.record_event(
                    HistoryAction::Update,
                    "Updated attributes and reactivated",
                    now,
                );
                tracing::info!(did = %did, owner = %owner, "DID reactivated");
                existing.clone()
            }
            None => {
                self.format.check(did)?;
                let record = DidRecord::new(did, owner, attributes, now);
                records.push(record.clone());
                tracing::info!(did = %did, owner = %owner, "DID created");
                record
            }
        };

        self.store.save(&map)?;
        Ok(record)
    }

    /// Merge attributes into an existing record, last write wins per key.
    pub fn add_attributes(
        &self,
        did: &str,
        owner: &str,
        attributes: BTreeMap<String, String>,
    ) -> Result<DidRecord, IdentityError> {
        self.mutate(did, owner, |record| {
            let changed = record.merge_attributes(&attributes);
            let details = if changed.is_empty() {
                "Updated attributes: (no changes)".to_string()
            } else {
                format!("Updated attributes: {}", changed.join(", "))
            };
            record.record_event(HistoryAction::Update, details, Utc::now());
            tracing::info!(did = %record.did, changed = changed.len(), "DID attributes updated");
        })
    }

    /// Mark a record inactive.
    ///
    /// Deactivating twice is accepted and appends a second `Deactivate`
    /// event.
    pub fn deactivate(&self, did: &str, owner: &str) -> Result<DidRecord, IdentityError> {
        self.mutate(did, owner, |record| {
            record.is_active = false;
            record.record_event(HistoryAction::Deactivate, "DID deactivated", Utc::now());
            tracing::info!(did = %record.did, "DID deactivated");
        })
    }

    /// Records owned by `owner`, in insertion order.
    pub fn list_by_owner(&self, owner: &str) -> Result<Vec<DidRecord>, IdentityError> {
        let mut map = self.store.load()?;
        let records = map.swap_remove(owner).unwrap_or_default();
        tracing::debug!(owner = %owner, count = records.len(), "listed DIDs for owner");
        Ok(records)
    }

    /// First record with this DID across all owners.
    ///
    /// Owners are searched in the order they were first stored, so when
    /// several owners hold the same DID the earliest one wins. The hex
    /// suffix is matched case-insensitively.
    pub fn find_by_did(&self, did: &str) -> Result<Option<DidRecord>, IdentityError> {
        let wanted = self.format.normalize(did);
        let map = self.store.load()?;
        let found = map
            .values()
            .flatten()
            .find(|r| self.same_did(&r.did, &wanted))
            .cloned();
        if found.is_none() {
            tracing::debug!(did = %did, "DID record not found locally");
        }
        Ok(found)
    }

    fn mutate<F>(&self, did: &str, owner: &str, apply: F) -> Result<DidRecord, IdentityError>
    where
        F: FnOnce(&mut DidRecord),
    {
        let wanted = self.format.normalize(did);
        let mut map = self.store.load()?;
        let record = map
            .get_mut(owner)
            .and_then(|records| records.iter_mut().find(|r| self.same_did(&r.did, &wanted)))
            .ok_or_else(|| IdentityError::RecordNotFound {
                did: did.to_string(),
                owner: owner.to_string(),
            })?;

        apply(record);
        let updated = record.clone();
        self.store.save(&map)?;
        Ok(updated)
    }

    /// `wanted` must already be normalized.
    fn same_did(&self, stored: &str, wanted: &str) -> bool {
        self.format.normalize(stored) == wanted
    }
}
