//! Integration test: encrypted persistence, export and import.

use std::collections::BTreeMap;

use anonid_core::{DidRecord, RecordMap};
use anonid_crypto::{PassphraseKeyProvider, StoreKey};
use anonid_integration_tests::{file_manager, store_on, temp_dir, DID, OWNER};
use anonid_store::{EncryptedRecordStore, FileBackend, ImportMode, StoreError, StoreOptions};
use chrono::Utc;

fn sample_map() -> RecordMap {
    let mut attributes = BTreeMap::new();
    attributes.insert("name".to_string(), "Alice".to_string());
    let mut map = RecordMap::new();
    map.insert(
        OWNER.to_string(),
        vec![DidRecord::new(DID, OWNER, attributes, Utc::now())],
    );
    map
}

#[test]
fn test_save_then_load_on_disk() {
    let dir = temp_dir("roundtrip");
    let store = store_on(Box::new(FileBackend::open(&dir).unwrap()));

    let map = sample_map();
    store.save(&map).unwrap();

    let reopened = store_on(Box::new(FileBackend::open(&dir).unwrap()));
    assert_eq!(reopened.load().unwrap(), map);

    let on_disk = std::fs::read_to_string(dir.join("anonid_dids.blob")).unwrap();
    assert!(!on_disk.contains("Alice"));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_manager_state_survives_restart() {
    let dir = temp_dir("restart");
    {
        let manager = file_manager(&dir);
        manager.create(DID, OWNER, BTreeMap::new()).unwrap();
        manager.deactivate(DID, OWNER).unwrap();
    }

    let manager = file_manager(&dir);
    let records = manager.list_by_owner(OWNER).unwrap();
    assert_eq!(records.len(), 1);
    assert!(!records[0].is_active);
    assert_eq!(records[0].history.len(), 2);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_passphrase_key_mismatch_is_corruption() {
    let dir = temp_dir("passphrase");
    let salt = b"anonid-store-salt-v1".to_vec();

    let right = PassphraseKeyProvider::new("correct horse", salt.clone());
    let store = EncryptedRecordStore::with_provider(
        Box::new(FileBackend::open(&dir).unwrap()),
        &right,
        StoreOptions::default(),
    )
    .unwrap();
    store.save(&sample_map()).unwrap();

    let wrong = PassphraseKeyProvider::new("battery staple", salt);
    let other = EncryptedRecordStore::with_provider(
        Box::new(FileBackend::open(&dir).unwrap()),
        &wrong,
        StoreOptions::default(),
    )
    .unwrap();
    assert!(matches!(other.load(), Err(StoreError::Corruption(_))));

    // the original key still opens it
    assert_eq!(store.load().unwrap()[OWNER][0].did, DID);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_store_key_is_fixed_length() {
    assert!(StoreKey::from_bytes(&[0u8; 16]).is_err());
    assert!(StoreKey::from_bytes(&[0u8; 32]).is_ok());
}

#[test]
fn test_export_import_between_devices() {
    let source_dir = temp_dir("export-src");
    let target_dir = temp_dir("export-dst");

    let source = file_manager(&source_dir);
    source.create(DID, OWNER, BTreeMap::new()).unwrap();
    source
        .create("did:edu:testnet:ffff0000", "0xffff0000", BTreeMap::new())
        .unwrap();
    let dump = source.store().export(Some(OWNER)).unwrap();

    let target = file_manager(&target_dir);
    target
        .create("did:edu:testnet:12345678", "0x12345678", BTreeMap::new())
        .unwrap();
    let identities = target.store().import(&dump, ImportMode::Merge).unwrap();
    assert_eq!(identities, 2);

    assert!(target.find_by_did(DID).unwrap().is_some());
    assert!(target.find_by_did("did:edu:testnet:12345678").unwrap().is_some());
    assert!(target.find_by_did("did:edu:testnet:ffff0000").unwrap().is_none());

    std::fs::remove_dir_all(&source_dir).ok();
    std::fs::remove_dir_all(&target_dir).ok();
}

#[test]
fn test_import_accepts_legacy_owner_field() {
    let store = store_on(Box::new(anonid_store::MemoryBackend::new()));
    let legacy = serde_json::json!({
        "0xab12cd34": [{
            "did": "did:edu:testnet:ab12cd34",
            "address": "0xab12cd34",
            "createdAt": "2024-05-01T10:00:00Z",
            "lastModified": "2024-05-01T10:00:00Z",
            "attributes": {"name": "Alice"},
            "isActive": true,
            "history": [
                {"action": "create", "timestamp": "2024-05-01T10:00:00Z", "details": "Initial creation"}
            ]
        }]
    });

    store
        .import(&legacy.to_string(), ImportMode::Replace)
        .unwrap();
    let map = store.load().unwrap();
    assert_eq!(map["0xab12cd34"][0].owner, "0xab12cd34");
}

#[test]
fn test_capacity_ceiling_blocks_save() {
    let store = EncryptedRecordStore::new(
        Box::new(anonid_store::MemoryBackend::new()),
        StoreKey::from_array([7u8; 32]),
        StoreOptions {
            max_bytes: 128,
            ..Default::default()
        },
    );

    let mut map = sample_map();
    map.get_mut(OWNER).unwrap()[0]
        .attributes
        .insert("bio".into(), "x".repeat(512));
    assert!(matches!(
        store.save(&map),
        Err(StoreError::Capacity { limit: 128, .. })
    ));
    assert!(store.load().unwrap().is_empty());
}
