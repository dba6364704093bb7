//! DID codec: derivation, validation and identity extraction.
//!
//! DIDs take the form `did:<method>:<network>:<8 hex chars>`, where the
//! suffix is the first eight hex digits of the owning identity. With the
//! default format (`edu` / `testnet`) every valid DID is 24 characters long.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::error::CoreError;

/// Number of identity hex digits carried in a DID.
pub const SUFFIX_LEN: usize = 8;

pub const DEFAULT_METHOD: &str = "edu";
pub const DEFAULT_NETWORK: &str = "testnet";

/// Method and network segments used to compose and check DIDs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DidFormat {
    pub method: String,
    pub network: String,
}

impl DidFormat {
    pub fn new(method: impl Into<String>, network: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            network: network.into(),
        }
    }

    /// The fixed part of every DID, e.g. `did:edu:testnet:`.
    pub fn prefix(&self) -> String {
        format!("did:{}:{}:", self.method, self.network)
    }

    /// Total length of a valid DID in this format.
    pub fn did_len(&self) -> usize {
        self.prefix().len() + SUFFIX_LEN
    }

    /// Human-readable shape, used in verdicts and error messages.
    pub fn expected_shape(&self) -> String {
        format!("{}<{} hex characters>", self.prefix(), SUFFIX_LEN)
    }

    /// Derive a DID from an owner identity.
    ///
    /// The `0x` marker is stripped, the remainder must be hex with at least
    /// eight digits, and the first eight (lowercased) become the suffix.
    pub fn derive(&self, identity: &str) -> Result<String, CoreError> {
        let hex_part = strip_hex_marker(identity.trim());

        if hex_part.is_empty() || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(CoreError::InvalidIdentity(format!(
                "identity must be a hex string, got: {}",
                identity
            )));
        }
        if hex_part.len() < SUFFIX_LEN {
            return Err(CoreError::InvalidIdentity(format!(
                "identity must carry at least {} hex digits, got: {}",
                SUFFIX_LEN, identity
            )));
        }

        let suffix = hex_part[..SUFFIX_LEN].to_ascii_lowercase();
        Ok(format!("{}{}", self.prefix(), suffix))
    }

    /// True iff `did` is exactly `did:<method>:<network>:<8 hex chars>`.
    pub fn validate(&self, did: &str) -> bool {
        if did.len() != self.did_len() {
            return false;
        }
        match did.strip_prefix(self.prefix().as_str()) {
            Some(suffix) => {
                suffix.len() == SUFFIX_LEN && suffix.chars().all(|c| c.is_ascii_hexdigit())
            }
            None => false,
        }
    }

    /// Like [`validate`](Self::validate), but as a `Result` for call chains
    /// that propagate format failures.
    pub fn check(&self, did: &str) -> Result<(), CoreError> {
        if self.validate(did) {
            Ok(())
        } else {
            Err(CoreError::InvalidDid(format!(
                "expected {}, got: {}",
                self.expected_shape(),
                did
            )))
        }
    }

    /// Canonical spelling of a valid DID: the hex suffix in lower case.
    ///
    /// Validation accepts either case but derivation always emits lower
    /// case, so lookups compare normalized DIDs. Invalid input is returned
    /// unchanged.
    pub fn normalize<'a>(&self, did: &'a str) -> Cow<'a, str> {
        if self.validate(did) && did.bytes().any(|b| b.is_ascii_uppercase()) {
            let split = did.len() - SUFFIX_LEN;
            Cow::Owned(format!("{}{}", &did[..split], did[split..].to_ascii_lowercase()))
        } else {
            Cow::Borrowed(did)
        }
    }

    /// Recover the (truncated) identity a DID was derived from: `0x<suffix>`.
    pub fn extract_identity(&self, did: &str) -> Option<String> {
        if !self.validate(did) {
            return None;
        }
        did.rsplit(':').next().map(|suffix| format!("0x{}", suffix))
    }
}

impl Default for DidFormat {
    fn default() -> Self {
        Self::new(DEFAULT_METHOD, DEFAULT_NETWORK)
    }
}

fn strip_hex_marker(identity: &str) -> &str {
    identity
        .strip_prefix("0x")
        .or_else(|| identity.strip_prefix("0X"))
        .unwrap_or(identity)
}

/// [`DidFormat::derive`] with the default format.
pub fn derive(identity: &str) -> Result<String, CoreError> {
    DidFormat::default().derive(identity)
}

/// [`DidFormat::validate`] with the default format.
pub fn validate(did: &str) -> bool {
    DidFormat::default().validate(did)
}

/// [`DidFormat::extract_identity`] with the default format.
pub fn extract_identity(did: &str) -> Option<String> {
    DidFormat::default().extract_identity(did)
}
