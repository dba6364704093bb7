//! Fixtures shared by the integration tests.

use std::path::PathBuf;
use std::sync::Arc;

use anonid_crypto::StaticKeyProvider;
use anonid_identity::DidRecordManager;
use anonid_store::{BlobBackend, EncryptedRecordStore, FileBackend, MemoryBackend, StoreOptions};

/// Identity used throughout the reference scenarios.
pub const OWNER: &str = "0xAB12CD34EF00000000000000000000000000000";
/// The DID derived from [`OWNER`].
pub const DID: &str = "did:edu:testnet:ab12cd34";

pub const APP_SECRET: &str = "anonid-demo-key";

/// Unique scratch directory under the system temp dir.
pub fn temp_dir(label: &str) -> PathBuf {
    std::env::temp_dir().join(format!("anonid-it-{}-{}", label, rand::random::<u64>()))
}

pub fn store_on(backend: Box<dyn BlobBackend>) -> Arc<EncryptedRecordStore> {
    let store = EncryptedRecordStore::with_provider(
        backend,
        &StaticKeyProvider::new(APP_SECRET),
        StoreOptions::default(),
    )
    .expect("static key provider never fails");
    Arc::new(store)
}

pub fn memory_manager() -> Arc<DidRecordManager> {
    Arc::new(DidRecordManager::new(store_on(Box::new(MemoryBackend::new()))))
}

pub fn file_manager(dir: &std::path::Path) -> Arc<DidRecordManager> {
    let backend = FileBackend::open(dir).expect("temp dir is writable");
    Arc::new(DidRecordManager::new(store_on(Box::new(backend))))
}
