//! Integration test: verification against in-memory and HTTP ledgers.

use std::collections::BTreeMap;
use std::sync::Arc;

use anonid_identity::{
    gateway, DidRegistrar, Divergence, HttpLedgerClient, InMemoryLedger, LedgerClient,
    ReconciliationEngine, VerdictReason,
};
use anonid_integration_tests::{memory_manager, DID, OWNER};

async fn spawn_gateway(ledger: Arc<InMemoryLedger>) -> Arc<HttpLedgerClient> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(gateway::serve(ledger, listener));
    Arc::new(HttpLedgerClient::new(&format!("http://{}", addr)).unwrap())
}

#[tokio::test]
async fn test_unreachable_ledger_never_errors() {
    let manager = memory_manager();
    manager.create(DID, OWNER, BTreeMap::new()).unwrap();

    let client = Arc::new(HttpLedgerClient::new("http://127.0.0.1:1").unwrap());
    let engine = ReconciliationEngine::new(manager, client);

    let result = engine.verify(DID).await.unwrap();
    assert!(!result.is_valid);
    assert_eq!(result.reason, VerdictReason::LedgerUnreachable);
    assert_eq!(result.local().unwrap().owner, OWNER);
}

#[tokio::test]
async fn test_local_only_record_is_not_found_on_ledger() {
    let manager = memory_manager();
    manager.create(DID, OWNER, BTreeMap::new()).unwrap();
    let ledger = Arc::new(InMemoryLedger::new(OWNER));
    let engine = ReconciliationEngine::new(manager, ledger);

    let result = engine.verify(DID).await.unwrap();
    assert!(!result.is_valid);
    assert_eq!(result.reason, VerdictReason::NotFoundOnLedger);
    assert!(result.local().is_some());
    assert_eq!(
        result.divergences(),
        vec![Divergence::UnconfirmedLocal { local_active: true }]
    );
}

#[tokio::test]
async fn test_malformed_did_never_reaches_ledger() {
    let ledger = Arc::new(InMemoryLedger::new(OWNER));
    ledger.set_unreachable(true);
    let engine = ReconciliationEngine::new(memory_manager(), ledger);

    let result = engine.verify("did:edu:testnet:ab12cd3").await.unwrap();
    assert_eq!(result.reason, VerdictReason::InvalidFormat);
}

#[tokio::test]
async fn test_register_and_verify_over_http() {
    let ledger = Arc::new(InMemoryLedger::new(OWNER));
    let client = spawn_gateway(Arc::clone(&ledger)).await;
    let manager = memory_manager();

    let registrar = DidRegistrar::new(Arc::clone(&manager), client.clone());
    registrar.register(OWNER, DID).await.unwrap();
    registrar
        .set_attribute(OWNER, DID, "email", "alice@ufsc.br")
        .await
        .unwrap();

    let engine = ReconciliationEngine::new(Arc::clone(&manager), client.clone());
    let result = engine.verify(DID).await.unwrap();
    assert!(result.is_valid);
    assert_eq!(result.reason, VerdictReason::Active);
    let snapshot = result.ledger().unwrap();
    assert_eq!(snapshot.attribute_count, 1);
    assert_eq!(snapshot.attributes["email"], "alice@ufsc.br");
    assert!(result.divergences().is_empty());

    registrar.deactivate(OWNER, DID).await.unwrap();
    let result = engine.verify(DID).await.unwrap();
    assert!(!result.is_valid);
    assert_eq!(result.reason, VerdictReason::Inactive);
    assert!(!result.local().unwrap().is_active);
}

#[tokio::test]
async fn test_optimistic_local_change_shows_as_divergence() {
    let ledger = Arc::new(InMemoryLedger::new(OWNER));
    let manager = memory_manager();
    let registrar = DidRegistrar::new(Arc::clone(&manager), ledger.clone());
    registrar.register(OWNER, DID).await.unwrap();

    // local-only deactivation, never sent to the ledger
    manager.deactivate(DID, OWNER).unwrap();

    let engine = ReconciliationEngine::new(manager, ledger.clone());
    let result = engine.verify(DID).await.unwrap();
    assert!(result.is_valid);
    assert_eq!(
        result.divergences(),
        vec![Divergence::ActiveMismatch {
            local: false,
            ledger: true
        }]
    );
    assert!(ledger.is_active(DID).await.unwrap());
}
