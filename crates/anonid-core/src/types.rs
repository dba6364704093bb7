use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Opaque owner token, typically a hex wallet address.
pub type Identity = String;

/// The full persisted mapping: identity -> records.
///
/// Identities keep the order in which they were first inserted (or the
/// document order of an imported dump), and so do their records.
pub type RecordMap = IndexMap<Identity, Vec<DidRecord>>;

/// Kinds of history events recorded against a DID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryAction {
    Create,
    Update,
    Deactivate,
    Reactivate,
}

impl fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Deactivate => write!(f, "deactivate"),
            Self::Reactivate => write!(f, "reactivate"),
        }
    }
}

/// One entry in a record's audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEvent {
    pub action: HistoryAction,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub details: String,
}

/// Locally cached representation of a DID.
///
/// Records are never removed: deactivation is the terminal visible state and
/// the history keeps every mutation in timestamp order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidRecord {
    pub did: String,
    #[serde(alias = "address")]
    pub owner: Identity,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    pub is_active: bool,
    #[serde(default)]
    pub history: Vec<HistoryEvent>,
}

impl DidRecord {
    /// Create an active record with its initial `Create` event.
    pub fn new(
        did: impl Into<String>,
        owner: impl Into<Identity>,
        attributes: BTreeMap<String, String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            did: did.into(),
            owner: owner.into(),
            created_at: now,
            last_modified: now,
            attributes,
            is_active: true,
            history: vec![HistoryEvent {
                action: HistoryAction::Create,
                timestamp: now,
                details: "Initial creation".into(),
            }],
        }
    }

    /// The most recent history event.
    pub fn last_event(&self) -> Option<&HistoryEvent> {
        self.history.last()
    }

    /// Append a history event and refresh `last_modified`.
    ///
    /// The timestamp is clamped so it never precedes the previous event,
    /// keeping the history ordered even if the wall clock steps back.
    pub fn record_event(
        &mut self,
        action: HistoryAction,
        details: impl Into<String>,
        now: DateTime<Utc>,
    ) -> &HistoryEvent {
        let timestamp = match self.history.last() {
            Some(prev) if prev.timestamp > now => prev.timestamp,
            _ => now,
        };
        self.last_modified = timestamp;
        self.history.push(HistoryEvent {
            action,
            timestamp,
            details: details.into(),
        });
        &self.history[self.history.len() - 1]
    }

    /// Merge attributes, last write wins per key.
    ///
    /// Returns the keys whose value was added or changed.
    pub fn merge_attributes(&mut self, attributes: &BTreeMap<String, String>) -> Vec<String> {
        let mut changed = Vec::new();
        for (key, value) in attributes {
            if self.attributes.get(key) != Some(value) {
                self.attributes.insert(key.clone(), value.clone());
                changed.push(key.clone());
            }
        }
        changed
    }

    /// Number of history events of the given kind.
    pub fn count_events(&self, action: HistoryAction) -> usize {
        self.history.iter().filter(|e| e.action == action).count()
    }

    /// Whether the history satisfies the record rules: non-empty and
    /// ordered by timestamp.
    pub fn history_is_consistent(&self) -> bool {
        !self.history.is_empty()
            && self
                .history
                .windows(2)
                .all(|pair| pair[0].timestamp <= pair[1].timestamp)
    }
}
