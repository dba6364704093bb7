//! Integration test: DID derivation and record lifecycle across crates.

use std::collections::BTreeMap;

use anonid_core::{derive, extract_identity, validate, DidFormat, HistoryAction};
use anonid_identity::IdentityError;
use anonid_integration_tests::{memory_manager, DID, OWNER};

fn attrs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// =========================================================================
// DID codec
// =========================================================================

#[test]
fn test_reference_derivation() {
    assert_eq!(derive(OWNER).unwrap(), DID);
    assert!(validate(DID));
    assert!(!validate("did:edu:testnet:ab12cd3"));
    assert_eq!(extract_identity(DID).as_deref(), Some("0xab12cd34"));
}

#[test]
fn test_derived_dids_always_validate() {
    for _ in 0..64 {
        let identity = format!("0x{:040x}", rand::random::<u128>());
        let did = derive(&identity).unwrap();
        assert!(validate(&did), "{} from {}", did, identity);
    }
}

#[test]
fn test_custom_network_format() {
    let format = DidFormat::new("edu", "mainnet");
    let did = format.derive(OWNER).unwrap();
    assert_eq!(did, "did:edu:mainnet:ab12cd34");
    assert!(format.validate(&did));
    assert!(!validate(&did));
}

// =========================================================================
// Record lifecycle
// =========================================================================

#[test]
fn test_create_update_deactivate_replay() {
    let manager = memory_manager();
    let did = derive(OWNER).unwrap();

    manager
        .create(&did, OWNER, attrs(&[("name", "Alice"), ("university", "UFSC")]))
        .unwrap();
    manager
        .add_attributes(&did, OWNER, attrs(&[("email", "alice@ufsc.br")]))
        .unwrap();
    manager.deactivate(&did, OWNER).unwrap();
    let record = manager
        .create(&did, OWNER, attrs(&[("name", "Alice")]))
        .unwrap();

    assert!(record.is_active);
    let actions: Vec<HistoryAction> = record.history.iter().map(|e| e.action).collect();
    assert_eq!(
        actions,
        vec![
            HistoryAction::Create,
            HistoryAction::Update,
            HistoryAction::Deactivate,
            HistoryAction::Update,
        ]
    );
    assert!(record.history[3].details.contains("reactivated"));
    assert!(record.history_is_consistent());
    assert_eq!(record.attributes.len(), 3);
}

#[test]
fn test_history_never_shrinks() {
    let manager = memory_manager();
    manager.create(DID, OWNER, attrs(&[])).unwrap();

    let mut previous = 1;
    for i in 0..5 {
        let round = i.to_string();
        let record = if i % 2 == 0 {
            manager.deactivate(DID, OWNER).unwrap()
        } else {
            manager
                .add_attributes(DID, OWNER, attrs(&[("round", round.as_str())]))
                .unwrap()
        };
        assert_eq!(record.history.len(), previous + 1);
        previous = record.history.len();
    }
}

#[test]
fn test_deactivate_then_find() {
    let manager = memory_manager();
    manager.create(DID, OWNER, attrs(&[])).unwrap();

    manager.deactivate(DID, OWNER).unwrap();
    let found = manager.find_by_did(DID).unwrap().unwrap();

    assert!(!found.is_active);
    assert_eq!(found.history.len(), 2);
    assert_eq!(found.last_event().unwrap().action, HistoryAction::Deactivate);
}

#[test]
fn test_mutations_require_matching_owner() {
    let manager = memory_manager();
    manager.create(DID, OWNER, attrs(&[])).unwrap();

    let result = manager.deactivate(DID, "0x9999999999");
    assert!(matches!(result, Err(IdentityError::RecordNotFound { .. })));
    assert!(manager.find_by_did(DID).unwrap().unwrap().is_active);
}
