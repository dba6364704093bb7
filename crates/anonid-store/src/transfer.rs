//! Plaintext export and import of the record mapping.

use std::collections::HashSet;

use anonid_core::RecordMap;

use crate::error::StoreError;
use crate::store::EncryptedRecordStore;

/// How imported data combines with what is already stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    /// Imported identities overwrite stored ones; others are kept.
    Merge,
    /// The import becomes the whole mapping.
    Replace,
}

impl EncryptedRecordStore {
    /// Pretty-printed JSON dump of the whole mapping, or of one identity.
    ///
    /// An identity with no records exports as an empty document.
    pub fn export(&self, identity: Option<&str>) -> Result<String, StoreError> {
        let mut map = self.load()?;
        if let Some(identity) = identity {
            map.retain(|owner, _| owner == identity);
        }

        let exported = serde_json::to_string_pretty(&map)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        tracing::info!(
            size = exported.len(),
            identities = map.len(),
            "store exported"
        );
        Ok(exported)
    }

    /// Import a dump produced by [`export`](Self::export).
    ///
    /// Every record must name the identity it is filed under as its owner.
    ///
    /// Returns the number of identities in the resulting mapping.
    pub fn import(&self, data: &str, mode: ImportMode) -> Result<usize, StoreError> {
        let imported: RecordMap = serde_json::from_str(data)
            .map_err(|e| StoreError::InvalidImport(format!("invalid data structure: {}", e)))?;
        validate_import(&imported)?;

        let merged = match mode {
            ImportMode::Replace => imported,
            ImportMode::Merge => {
                let mut existing = self.load()?;
                existing.extend(imported);
                existing
            }
        };

        self.save(&merged)?;
        tracing::info!(identities = merged.len(), mode = ?mode, "store imported");
        Ok(merged.len())
    }
}

fn validate_import(map: &RecordMap) -> Result<(), StoreError> {
    for (identity, records) in map {
        let mut seen = HashSet::new();
        for record in records {
            if !record.owner.eq_ignore_ascii_case(identity) {
                return Err(StoreError::InvalidImport(format!(
                    "record {} names owner {} but is filed under identity {}",
                    record.did, record.owner, identity
                )));
            }
            if !seen.insert(record.did.as_str()) {
                return Err(StoreError::InvalidImport(format!(
                    "duplicate record {} for identity {}",
                    record.did, identity
                )));
            }
            if !record.history_is_consistent() {
                return Err(StoreError::InvalidImport(format!(
                    "record {} has empty or unordered history",
                    record.did
                )));
            }
        }
    }
    Ok(())
}
