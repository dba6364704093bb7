use futures::future::join_all;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{IdentityError, LedgerError};
use crate::ledger::{is_unset_owner, LedgerClient, LedgerField};
use crate::manager::DidRecordManager;
use crate::verdict::{LedgerSnapshot, LocalView, Verdict, VerificationResult};

/// Merges the local cache with ledger reads into one verdict.
///
/// The engine only reads: it never mutates the cache or the ledger. Ledger
/// faults degrade individual fields instead of failing the call.
pub struct ReconciliationEngine {
    manager: Arc<DidRecordManager>,
    ledger: Option<Arc<dyn LedgerClient>>,
    read_deadline: Option<Duration>,
}

impl ReconciliationEngine {
    pub fn new(manager: Arc<DidRecordManager>, ledger: Arc<dyn LedgerClient>) -> Self {
        Self {
            manager,
            ledger: Some(ledger),
            read_deadline: None,
        }
    }

    /// An engine with no ledger. `verify` fails with
    /// [`IdentityError::LedgerNotConfigured`] for well-formed DIDs.
    pub fn without_ledger(manager: Arc<DidRecordManager>) -> Self {
        Self {
            manager,
            ledger: None,
            read_deadline: None,
        }
    }

    /// Bound every individual ledger read. An elapsed deadline counts as a
    /// failed read.
    pub fn with_read_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.read_deadline = deadline;
        self
    }

    /// Verify a DID against the ledger and the local cache.
    pub async fn verify(&self, did: &str) -> Result<VerificationResult, IdentityError> {
        let format = self.manager.format();
        if !format.validate(did) {
            tracing::debug!(did = %did, "rejected malformed DID");
            return Ok(VerificationResult::new(
                did,
                Verdict::InvalidFormat {
                    received: did.to_string(),
                    expected: format.expected_shape(),
                },
            ));
        }

        let ledger = self
            .ledger
            .as_ref()
            .ok_or(IdentityError::LedgerNotConfigured)?;
        let normalized = format.normalize(did);
        let did: &str = &normalized;

        let (local, owner, active, keys, created) = tokio::join!(
            self.local_view(did),
            self.guarded(did, LedgerField::Owner, ledger.get_owner(did)),
            self.guarded(did, LedgerField::IsActive, ledger.is_active(did)),
            self.guarded(did, LedgerField::AttributeKeys, ledger.get_attribute_keys(did)),
            self.guarded(did, LedgerField::CreationTime, ledger.get_creation_time(did)),
        );

        let owner = match owner {
            Ok(owner) => owner.filter(|o| !is_unset_owner(o)),
            Err(e) => {
                return Ok(self.finish(
                    did,
                    Verdict::LedgerUnreachable {
                        error: e.to_string(),
                        local,
                    },
                ));
            }
        };
        let Some(owner) = owner else {
            return Ok(self.finish(did, Verdict::NotFoundOnLedger { local }));
        };

        let mut degraded = Vec::new();
        let is_active = settle(active, LedgerField::IsActive, &mut degraded);
        let keys: Vec<String> = settle(keys, LedgerField::AttributeKeys, &mut degraded);
        let creation_time = settle(created, LedgerField::CreationTime, &mut degraded);

        let values = join_all(
            keys.iter()
                .map(|key| self.guarded(did, key, ledger.get_attribute(did, key))),
        )
        .await;

        let mut attributes = BTreeMap::new();
        let mut missing_attributes = Vec::new();
        for (key, value) in keys.iter().zip(values) {
            match value {
                Ok(Some(value)) if !value.is_empty() => {
                    attributes.insert(key.clone(), value);
                }
                Ok(_) => {}
                Err(_) => missing_attributes.push(key.clone()),
            }
        }

        let snapshot = LedgerSnapshot {
            owner,
            is_active,
            creation_time,
            attribute_count: keys.len(),
            attributes,
            missing_attributes,
            degraded,
        };
        Ok(self.finish(
            did,
            Verdict::OnLedger {
                ledger: snapshot,
                local,
            },
        ))
    }

    /// The store does synchronous I/O and decryption, so the lookup runs on
    /// the blocking pool while the ledger reads proceed.
    async fn local_view(&self, did: &str) -> LocalView {
        let manager = Arc::clone(&self.manager);
        let wanted = did.to_string();
        let lookup = tokio::task::spawn_blocking(move || manager.find_by_did(&wanted)).await;

        let error = match lookup {
            Ok(Ok(Some(record))) => {
                return LocalView::Present {
                    record: record.into(),
                }
            }
            Ok(Ok(None)) => return LocalView::Absent,
            Ok(Err(e)) => e.to_string(),
            Err(e) => format!("local lookup task failed: {}", e),
        };
        tracing::warn!(did = %did, error = %error, "local cache unreadable during verification");
        LocalView::Unreadable { error }
    }

    async fn guarded<T, F>(
        &self,
        did: &str,
        what: impl Display,
        read: F,
    ) -> Result<T, LedgerError>
    where
        F: Future<Output = Result<T, LedgerError>>,
    {
        let outcome = match self.read_deadline {
            Some(deadline) => tokio::time::timeout(deadline, read)
                .await
                .unwrap_or(Err(LedgerError::Timeout(deadline))),
            None => read.await,
        };
        if let Err(e) = &outcome {
            tracing::warn!(did = %did, field = %what, error = %e, "ledger read degraded");
        }
        outcome
    }

    fn finish(&self, did: &str, verdict: Verdict) -> VerificationResult {
        let result = VerificationResult::new(did, verdict);
        tracing::info!(
            did = %did,
            valid = result.is_valid,
            reason = ?result.reason,
            "DID verified"
        );
        result
    }
}

fn settle<T: Default>(
    read: Result<T, LedgerError>,
    field: LedgerField,
    degraded: &mut Vec<LedgerField>,
) -> T {
    read.unwrap_or_else(|_| {
        degraded.push(field);
        T::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_ledger::InMemoryLedger;
    use crate::verdict::{Divergence, VerdictReason};
    use anonid_core::HistoryAction;
    use anonid_crypto::StaticKeyProvider;
    use anonid_store::{BlobBackend, EncryptedRecordStore, MemoryBackend, StoreError, StoreOptions};

    const ACCOUNT: &str = "0xab12cd34ef00000000000000000000000000000";
    const DID: &str = "did:edu:testnet:ab12cd34";

    fn manager_on(backend: Box<dyn BlobBackend>) -> Arc<DidRecordManager> {
        let store = EncryptedRecordStore::with_provider(
            backend,
            &StaticKeyProvider::new("anonid-demo-key"),
            StoreOptions::default(),
        )
        .unwrap();
        Arc::new(DidRecordManager::new(Arc::new(store)))
    }

    fn setup() -> (Arc<DidRecordManager>, Arc<InMemoryLedger>, ReconciliationEngine) {
        let manager = manager_on(Box::new(MemoryBackend::new()));
        let ledger = Arc::new(InMemoryLedger::new(ACCOUNT));
        let engine = ReconciliationEngine::new(Arc::clone(&manager), ledger.clone());
        (manager, ledger, engine)
    }

    fn attrs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_invalid_format_skips_ledger() {
        let (_, ledger, engine) = setup();
        ledger.set_unreachable(true);

        let result = engine.verify("did:edu:testnet:ab12cd3").await.unwrap();
        assert!(!result.is_valid);
        assert_eq!(result.reason, VerdictReason::InvalidFormat);
        match result.verdict {
            Verdict::InvalidFormat { received, expected } => {
                assert_eq!(received, "did:edu:testnet:ab12cd3");
                assert!(expected.starts_with("did:edu:testnet:"));
            }
            other => panic!("unexpected verdict: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_format_without_ledger() {
        let manager = manager_on(Box::new(MemoryBackend::new()));
        let engine = ReconciliationEngine::without_ledger(manager);
        let result = engine.verify("nope").await.unwrap();
        assert_eq!(result.reason, VerdictReason::InvalidFormat);
    }

    #[tokio::test]
    async fn test_no_ledger_configured() {
        let manager = manager_on(Box::new(MemoryBackend::new()));
        let engine = ReconciliationEngine::without_ledger(manager);
        assert!(matches!(
            engine.verify(DID).await,
            Err(IdentityError::LedgerNotConfigured)
        ));
    }

    #[tokio::test]
    async fn test_active_on_ledger() {
        let (manager, ledger, engine) = setup();
        ledger.insert_record(DID, ACCOUNT, true);
        ledger.insert_attribute(DID, "name", "alice");
        ledger.insert_attribute(DID, "email", "alice@uni.edu");
        manager
            .create(DID, ACCOUNT, attrs(&[("name", "alice"), ("email", "alice@uni.edu")]))
            .unwrap();

        let result = engine.verify(DID).await.unwrap();
        assert!(result.is_valid);
        assert_eq!(result.reason, VerdictReason::Active);

        let snapshot = result.ledger().unwrap();
        assert_eq!(snapshot.owner, ACCOUNT);
        assert_eq!(snapshot.attribute_count, 2);
        assert_eq!(snapshot.attributes, attrs(&[("name", "alice"), ("email", "alice@uni.edu")]));
        assert!(snapshot.is_complete());
        assert!(snapshot.created_at().is_some());

        let local = result.local().unwrap();
        assert_eq!(local.history[0].action, HistoryAction::Create);
        assert!(result.divergences().is_empty());
    }

    #[tokio::test]
    async fn test_validity_follows_ledger_flag() {
        let (manager, ledger, engine) = setup();
        ledger.insert_record(DID, ACCOUNT, false);
        manager.create(DID, ACCOUNT, attrs(&[])).unwrap();

        let result = engine.verify(DID).await.unwrap();
        assert!(!result.is_valid);
        assert_eq!(result.reason, VerdictReason::Inactive);
        assert!(result.local().unwrap().is_active);
        assert_eq!(
            result.divergences(),
            vec![Divergence::ActiveMismatch {
                local: true,
                ledger: false
            }]
        );
    }

    #[tokio::test]
    async fn test_unreachable_ledger_keeps_local_details() {
        let (manager, ledger, engine) = setup();
        manager.create(DID, ACCOUNT, attrs(&[("name", "alice")])).unwrap();
        ledger.set_unreachable(true);

        let result = engine.verify(DID).await.unwrap();
        assert!(!result.is_valid);
        assert_eq!(result.reason, VerdictReason::LedgerUnreachable);
        assert_eq!(
            result.local().unwrap().attributes.get("name").map(String::as_str),
            Some("alice")
        );
    }

    #[tokio::test]
    async fn test_not_found_on_ledger_keeps_local_details() {
        let (manager, _ledger, engine) = setup();
        manager.create(DID, ACCOUNT, attrs(&[])).unwrap();

        let result = engine.verify(DID).await.unwrap();
        assert_eq!(result.reason, VerdictReason::NotFoundOnLedger);
        assert_eq!(result.local().unwrap().owner, ACCOUNT);
        assert_eq!(
            result.divergences(),
            vec![Divergence::UnconfirmedLocal { local_active: true }]
        );
    }

    #[tokio::test]
    async fn test_zero_address_owner_is_not_found() {
        let (_, ledger, engine) = setup();
        ledger.insert_record(DID, crate::ledger::ZERO_ADDRESS, true);

        let result = engine.verify(DID).await.unwrap();
        assert_eq!(result.reason, VerdictReason::NotFoundOnLedger);
        assert!(result.local().is_none());
    }

    #[tokio::test]
    async fn test_degraded_fields_use_sentinels() {
        let (_, ledger, engine) = setup();
        ledger.insert_record(DID, ACCOUNT, true);
        ledger.insert_attribute(DID, "name", "alice");
        ledger.fail_field(LedgerField::IsActive);
        ledger.fail_field(LedgerField::CreationTime);

        let result = engine.verify(DID).await.unwrap();
        assert_eq!(result.reason, VerdictReason::Inactive);
        let snapshot = result.ledger().unwrap();
        assert!(!snapshot.is_active);
        assert_eq!(snapshot.creation_time, 0);
        assert_eq!(
            snapshot.degraded,
            vec![LedgerField::IsActive, LedgerField::CreationTime]
        );
        assert_eq!(snapshot.attributes.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_keys_read_yields_no_attributes() {
        let (_, ledger, engine) = setup();
        ledger.insert_record(DID, ACCOUNT, true);
        ledger.insert_attribute(DID, "name", "alice");
        ledger.fail_field(LedgerField::AttributeKeys);

        let result = engine.verify(DID).await.unwrap();
        assert!(result.is_valid);
        let snapshot = result.ledger().unwrap();
        assert_eq!(snapshot.attribute_count, 0);
        assert!(snapshot.attributes.is_empty());
        assert_eq!(snapshot.degraded, vec![LedgerField::AttributeKeys]);
    }

    #[tokio::test]
    async fn test_partial_attribute_failure() {
        let (_, ledger, engine) = setup();
        ledger.insert_record(DID, ACCOUNT, true);
        ledger.insert_attribute(DID, "name", "alice");
        ledger.insert_attribute(DID, "email", "alice@uni.edu");
        ledger.insert_attribute(DID, "blank", "");
        ledger.fail_attribute("email");

        let result = engine.verify(DID).await.unwrap();
        assert!(result.is_valid);
        let snapshot = result.ledger().unwrap();
        assert_eq!(snapshot.attribute_count, 3);
        assert_eq!(snapshot.attributes, attrs(&[("name", "alice")]));
        assert_eq!(snapshot.missing_attributes, vec!["email".to_string()]);
        assert!(!snapshot.is_complete());
    }

    #[tokio::test]
    async fn test_read_deadline_degrades_to_unreachable() {
        let (manager, ledger, _) = setup();
        ledger.insert_record(DID, ACCOUNT, true);
        ledger.set_read_delay(Duration::from_millis(500));
        let engine = ReconciliationEngine::new(manager, ledger.clone())
            .with_read_deadline(Some(Duration::from_millis(20)));

        let result = engine.verify(DID).await.unwrap();
        assert_eq!(result.reason, VerdictReason::LedgerUnreachable);
        match result.verdict {
            Verdict::LedgerUnreachable { error, .. } => assert!(error.contains("timed out")),
            other => panic!("unexpected verdict: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreadable_store_degrades_local_view() {
        let backend = MemoryBackend::new();
        backend.write("anonid_dids", "not a sealed blob").unwrap();
        let manager = manager_on(Box::new(backend));
        let ledger = Arc::new(InMemoryLedger::new(ACCOUNT));
        ledger.insert_record(DID, ACCOUNT, true);
        let engine = ReconciliationEngine::new(manager, ledger);

        let result = engine.verify(DID).await.unwrap();
        assert!(result.is_valid);
        assert!(matches!(
            result.verdict.local(),
            Some(LocalView::Unreadable { .. })
        ));
        assert!(result.local().is_none());
    }

    /// Memory backend whose reads block the calling thread.
    struct SlowBackend {
        inner: MemoryBackend,
        delay: Duration,
    }

    impl BlobBackend for SlowBackend {
        fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
            std::thread::sleep(self.delay);
            self.inner.read(key)
        }

        fn write(&self, key: &str, blob: &str) -> Result<(), StoreError> {
            self.inner.write(key, blob)
        }

        fn name(&self) -> &'static str {
            "slow"
        }
    }

    #[tokio::test]
    async fn test_local_lookup_overlaps_ledger_reads() {
        let manager = manager_on(Box::new(SlowBackend {
            inner: MemoryBackend::new(),
            delay: Duration::from_millis(300),
        }));
        manager.create(DID, ACCOUNT, attrs(&[])).unwrap();
        let ledger = Arc::new(InMemoryLedger::new(ACCOUNT));
        ledger.insert_record(DID, ACCOUNT, true);
        ledger.set_read_delay(Duration::from_millis(300));
        let engine = ReconciliationEngine::new(manager, ledger);

        let started = std::time::Instant::now();
        let result = engine.verify(DID).await.unwrap();
        let elapsed = started.elapsed();

        assert!(result.is_valid);
        assert!(result.local().is_some());
        // store read and ledger reads run side by side, not back to back
        assert!(elapsed < Duration::from_millis(550), "took {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_uppercase_suffix_finds_local_record() {
        let (manager, ledger, engine) = setup();
        ledger.insert_record(DID, ACCOUNT, true);
        manager.create(DID, ACCOUNT, attrs(&[("name", "alice")])).unwrap();

        let result = engine.verify("did:edu:testnet:AB12CD34").await.unwrap();
        assert!(result.is_valid);
        assert_eq!(result.did, DID);
        assert_eq!(result.local().map(|l| l.owner.as_str()), Some(ACCOUNT));
        assert!(result.divergences().is_empty());
    }

    #[tokio::test]
    async fn test_verify_does_not_mutate() {
        let (manager, ledger, engine) = setup();
        ledger.insert_record(DID, ACCOUNT, false);
        manager.create(DID, ACCOUNT, attrs(&[])).unwrap();
        let before = manager.find_by_did(DID).unwrap();
        let height = ledger.block_height();

        engine.verify(DID).await.unwrap();

        assert_eq!(manager.find_by_did(DID).unwrap(), before);
        assert_eq!(ledger.block_height(), height);
    }
}
