pub mod attr;
pub mod create;
pub mod deactivate;
pub mod derive;
pub mod export;
pub mod import;
pub mod init;
pub mod list;
pub mod register;
pub mod serve;
pub mod show;
pub mod validate;
pub mod verify;

use anyhow::Context;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use anonid_core::config::{KeyConfig, KeyProviderKind, StorageBackendKind, StorageConfig};
use anonid_core::AnonidConfig;
use anonid_crypto::{KeyProvider, PassphraseKeyProvider, StaticKeyProvider};
use anonid_identity::{DidRecordManager, HttpLedgerClient, LedgerClient};
use anonid_store::{BlobBackend, EncryptedRecordStore, FileBackend, MemoryBackend, StoreOptions};

/// Open the blob backend named in `[storage]`.
pub fn open_backend(config: &StorageConfig) -> anyhow::Result<Box<dyn BlobBackend>> {
    match config.backend {
        StorageBackendKind::File => {
            let backend = FileBackend::open(&config.data_dir).with_context(|| {
                format!("cannot open data directory {}", config.data_dir.display())
            })?;
            Ok(Box::new(backend))
        }
        StorageBackendKind::Memory => {
            tracing::warn!("memory backend selected, records will not outlive this process");
            Ok(Box::new(MemoryBackend::new()))
        }
        #[cfg(feature = "rocksdb")]
        StorageBackendKind::Rocksdb => {
            let path = config.data_dir.join("rocksdb");
            let backend = anonid_store::RocksBackend::open(&path)
                .with_context(|| format!("cannot open RocksDB at {}", path.display()))?;
            Ok(Box::new(backend))
        }
        #[cfg(not(feature = "rocksdb"))]
        StorageBackendKind::Rocksdb => {
            anyhow::bail!("this build has no RocksDB support; rebuild with --features rocksdb")
        }
    }
}

/// Build the key provider named in `[key]`.
pub fn key_provider(config: &KeyConfig) -> anyhow::Result<Box<dyn KeyProvider>> {
    match config.provider {
        KeyProviderKind::Static => {
            tracing::debug!("using static application key");
            Ok(Box::new(StaticKeyProvider::new(config.app_secret.clone())))
        }
        KeyProviderKind::Passphrase => {
            let provider =
                PassphraseKeyProvider::from_env(&config.passphrase_env, config.salt.as_bytes())
                    .with_context(|| {
                        format!("set {} to the store passphrase", config.passphrase_env)
                    })?;
            Ok(Box::new(provider))
        }
    }
}

pub fn open_store(config: &AnonidConfig) -> anyhow::Result<Arc<EncryptedRecordStore>> {
    let backend = open_backend(&config.storage)?;
    let provider = key_provider(&config.key)?;
    let store = EncryptedRecordStore::with_provider(
        backend,
        &*provider,
        StoreOptions::from(&config.storage),
    )?;
    Ok(Arc::new(store))
}

pub fn open_manager(config: &AnonidConfig) -> anyhow::Result<Arc<DidRecordManager>> {
    let store = open_store(config)?;
    Ok(Arc::new(DidRecordManager::with_format(
        store,
        config.did_format(),
    )))
}

/// HTTP client for the configured ledger gateway, if any.
pub fn ledger_client(config: &AnonidConfig) -> anyhow::Result<Option<Arc<dyn LedgerClient>>> {
    match &config.ledger.endpoint {
        Some(endpoint) => {
            let client: Arc<dyn LedgerClient> = Arc::new(HttpLedgerClient::new(endpoint)?);
            Ok(Some(client))
        }
        None => Ok(None),
    }
}

/// Like [`ledger_client`] but failing when no endpoint is configured.
pub fn require_ledger(config: &AnonidConfig) -> anyhow::Result<Arc<dyn LedgerClient>> {
    match ledger_client(config)? {
        Some(client) => Ok(client),
        None => anyhow::bail!(
            "no ledger endpoint configured; set [ledger].endpoint or pass --ledger-endpoint"
        ),
    }
}

/// The owner named on the command line, else `[ledger].account`.
pub fn resolve_owner(owner: Option<&str>, config: &AnonidConfig) -> anyhow::Result<String> {
    match owner.or(config.ledger.account.as_deref()) {
        Some(owner) => Ok(owner.to_string()),
        None => anyhow::bail!("no owner given; pass --owner or set [ledger].account"),
    }
}

/// Parse `key=value` pairs.
pub fn parse_attributes(pairs: &[String]) -> anyhow::Result<BTreeMap<String, String>> {
    let mut attributes = BTreeMap::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            anyhow::bail!("invalid attribute {:?}, expected key=value", pair);
        };
        if key.is_empty() {
            anyhow::bail!("invalid attribute {:?}, key is empty", pair);
        }
        attributes.insert(key.to_string(), value.to_string());
    }
    Ok(attributes)
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
