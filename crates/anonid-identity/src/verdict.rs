//! Verification results.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use anonid_core::{DidRecord, HistoryEvent, Identity};

use crate::ledger::LedgerField;

/// Local cache fields carried in a verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalSnapshot {
    pub owner: Identity,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub is_active: bool,
    pub attributes: BTreeMap<String, String>,
    pub history: Vec<HistoryEvent>,
}

impl From<DidRecord> for LocalSnapshot {
    fn from(record: DidRecord) -> Self {
        Self {
            owner: record.owner,
            created_at: record.created_at,
            last_modified: record.last_modified,
            is_active: record.is_active,
            attributes: record.attributes,
            history: record.history,
        }
    }
}

/// What the local cache had to say about a DID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LocalView {
    /// No local record for the DID.
    Absent,
    Present { record: LocalSnapshot },
    /// The store could not be read; verification went ahead without it.
    Unreadable { error: String },
}

impl LocalView {
    pub fn snapshot(&self) -> Option<&LocalSnapshot> {
        match self {
            Self::Present { record } => Some(record),
            _ => None,
        }
    }
}

/// Ledger fields observed during verification.
///
/// Fields whose read failed hold their sentinel value and are listed in
/// `degraded`. Attribute keys whose value read failed are listed in
/// `missing_attributes` and absent from `attributes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub owner: Identity,
    pub is_active: bool,
    /// Unix seconds, 0 if unknown.
    pub creation_time: u64,
    /// Number of keys the ledger reported.
    pub attribute_count: usize,
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub missing_attributes: Vec<String>,
    #[serde(default)]
    pub degraded: Vec<LedgerField>,
}

impl LedgerSnapshot {
    /// Creation time as a timestamp, if the ledger reported one.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        if self.creation_time == 0 {
            return None;
        }
        i64::try_from(self.creation_time)
            .ok()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
    }

    /// True when every read succeeded.
    pub fn is_complete(&self) -> bool {
        self.degraded.is_empty() && self.missing_attributes.is_empty()
    }
}

/// Outcome of verifying one DID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    /// Rejected before any ledger call.
    InvalidFormat { received: String, expected: String },
    /// The owner could not be read from the ledger.
    LedgerUnreachable { error: String, local: LocalView },
    /// The ledger has no owner for the DID.
    NotFoundOnLedger { local: LocalView },
    /// The DID is registered on the ledger.
    OnLedger {
        ledger: LedgerSnapshot,
        local: LocalView,
    },
}

impl Verdict {
    pub fn reason(&self) -> VerdictReason {
        match self {
            Self::InvalidFormat { .. } => VerdictReason::InvalidFormat,
            Self::LedgerUnreachable { .. } => VerdictReason::LedgerUnreachable,
            Self::NotFoundOnLedger { .. } => VerdictReason::NotFoundOnLedger,
            Self::OnLedger { ledger, .. } if ledger.is_active => VerdictReason::Active,
            Self::OnLedger { .. } => VerdictReason::Inactive,
        }
    }

    /// Valid only when the ledger reports the DID active.
    pub fn is_valid(&self) -> bool {
        self.reason() == VerdictReason::Active
    }

    pub fn local(&self) -> Option<&LocalView> {
        match self {
            Self::InvalidFormat { .. } => None,
            Self::LedgerUnreachable { local, .. }
            | Self::NotFoundOnLedger { local }
            | Self::OnLedger { local, .. } => Some(local),
        }
    }

    pub fn ledger(&self) -> Option<&LedgerSnapshot> {
        match self {
            Self::OnLedger { ledger, .. } => Some(ledger),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerdictReason {
    InvalidFormat,
    LedgerUnreachable,
    NotFoundOnLedger,
    Active,
    Inactive,
}

impl fmt::Display for VerdictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFormat => write!(f, "Invalid DID format"),
            Self::LedgerUnreachable => write!(f, "Ledger unreachable"),
            Self::NotFoundOnLedger => write!(f, "DID not found on ledger"),
            Self::Active => write!(f, "DID is active"),
            Self::Inactive => write!(f, "DID is inactive"),
        }
    }
}

/// A difference between the optimistic local cache and the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Divergence {
    /// A local record exists but the ledger has no registration.
    UnconfirmedLocal { local_active: bool },
    OwnerMismatch { local: Identity, ledger: Identity },
    ActiveMismatch { local: bool, ledger: bool },
    /// A ledger attribute whose local value differs or is missing.
    AttributeMismatch {
        key: String,
        local: Option<String>,
        ledger: String,
    },
}

/// Merged verification verdict for one DID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub did: String,
    pub is_valid: bool,
    pub reason: VerdictReason,
    pub verdict: Verdict,
    pub verified_at: DateTime<Utc>,
}

impl VerificationResult {
    pub fn new(did: impl Into<String>, verdict: Verdict) -> Self {
        Self {
            did: did.into(),
            is_valid: verdict.is_valid(),
            reason: verdict.reason(),
            verdict,
            verified_at: Utc::now(),
        }
    }

    /// The local record, if one was found.
    pub fn local(&self) -> Option<&LocalSnapshot> {
        self.verdict.local().and_then(LocalView::snapshot)
    }

    pub fn ledger(&self) -> Option<&LedgerSnapshot> {
        self.verdict.ledger()
    }

    /// Differences between local and confirmed ledger state.
    ///
    /// Only fields the ledger actually answered are compared. Attributes held
    /// only locally are not reported since the cache also keeps transaction
    /// bookkeeping there.
    pub fn divergences(&self) -> Vec<Divergence> {
        let Some(local) = self.local() else {
            return Vec::new();
        };

        match &self.verdict {
            Verdict::NotFoundOnLedger { .. } => vec![Divergence::UnconfirmedLocal {
                local_active: local.is_active,
            }],
            Verdict::OnLedger { ledger, .. } => ledger_divergences(local, ledger),
            _ => Vec::new(),
        }
    }
}

fn ledger_divergences(local: &LocalSnapshot, ledger: &LedgerSnapshot) -> Vec<Divergence> {
    let mut found = Vec::new();

    if !local.owner.eq_ignore_ascii_case(&ledger.owner) {
        found.push(Divergence::OwnerMismatch {
            local: local.owner.clone(),
            ledger: ledger.owner.clone(),
        });
    }

    if !ledger.degraded.contains(&LedgerField::IsActive) && local.is_active != ledger.is_active {
        found.push(Divergence::ActiveMismatch {
            local: local.is_active,
            ledger: ledger.is_active,
        });
    }

    for (key, value) in &ledger.attributes {
        let local_value = local.attributes.get(key);
        if local_value != Some(value) {
            found.push(Divergence::AttributeMismatch {
                key: key.clone(),
                local: local_value.cloned(),
                ledger: value.clone(),
            });
        }
    }

    found
}
