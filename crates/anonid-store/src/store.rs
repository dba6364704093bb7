use anonid_core::config::StorageConfig;
use anonid_core::RecordMap;
use anonid_crypto::{open_base64, seal_base64, KeyProvider, StoreKey};

use crate::backend::BlobBackend;
use crate::error::StoreError;

/// Storage key and size ceiling for a store.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Key under which the sealed blob is written.
    pub storage_key: String,
    /// Maximum serialized size of the mapping, in bytes.
    pub max_bytes: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            storage_key: "anonid_dids".into(),
            max_bytes: 5 * 1024 * 1024,
        }
    }
}

impl From<&StorageConfig> for StoreOptions {
    fn from(config: &StorageConfig) -> Self {
        Self {
            storage_key: config.storage_key.clone(),
            max_bytes: config.max_bytes,
        }
    }
}

/// Encrypted persistence of the full identity -> records mapping.
///
/// Every `save` rewrites the entire blob with a fresh nonce. There is no
/// write serialization between handles or calls.
pub struct EncryptedRecordStore {
    backend: Box<dyn BlobBackend>,
    key: StoreKey,
    options: StoreOptions,
}

impl EncryptedRecordStore {
    pub fn new(backend: Box<dyn BlobBackend>, key: StoreKey, options: StoreOptions) -> Self {
        Self {
            backend,
            key,
            options,
        }
    }

    /// Build a store, asking the provider for the key once.
    pub fn with_provider(
        backend: Box<dyn BlobBackend>,
        provider: &dyn KeyProvider,
        options: StoreOptions,
    ) -> Result<Self, StoreError> {
        let key = provider.store_key()?;
        Ok(Self::new(backend, key, options))
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Load the mapping. Nothing persisted yields an empty mapping.
    ///
    /// A blob that cannot be decoded, decrypted or parsed is reported as
    /// [`StoreError::Corruption`] and left untouched.
    pub fn load(&self) -> Result<RecordMap, StoreError> {
        let stored = match self.backend.read(&self.options.storage_key)? {
            Some(blob) => blob,
            None => {
                tracing::debug!(backend = self.backend.name(), "no stored records, starting empty");
                return Ok(RecordMap::new());
            }
        };

        let plaintext = open_base64(&self.key, &stored).map_err(|e| {
            tracing::error!(backend = self.backend.name(), error = %e, "failed to decrypt store");
            StoreError::Corruption(e.to_string())
        })?;

        let map: RecordMap = serde_json::from_slice(&plaintext).map_err(|e| {
            tracing::error!(backend = self.backend.name(), error = %e, "failed to parse store");
            StoreError::Corruption(format!("invalid record document: {}", e))
        })?;

        tracing::debug!(
            size = stored.len(),
            identities = map.len(),
            "store loaded"
        );
        Ok(map)
    }

    /// Serialize, seal and write the whole mapping.
    ///
    /// Fails with [`StoreError::Capacity`] when the serialized mapping is
    /// larger than `max_bytes`; nothing is evicted.
    pub fn save(&self, map: &RecordMap) -> Result<(), StoreError> {
        let serialized =
            serde_json::to_vec(map).map_err(|e| StoreError::Serialization(e.to_string()))?;

        if serialized.len() > self.options.max_bytes {
            tracing::warn!(
                size = serialized.len(),
                limit = self.options.max_bytes,
                "store size limit exceeded"
            );
            return Err(StoreError::Capacity {
                size: serialized.len(),
                limit: self.options.max_bytes,
            });
        }

        let sealed = seal_base64(&self.key, &serialized)?;
        self.backend.write(&self.options.storage_key, &sealed)?;

        tracing::info!(
            size = sealed.len(),
            identities = map.len(),
            "store saved"
        );
        Ok(())
    }
}
