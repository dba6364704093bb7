//! AnonID Core: Fundamental types, errors, and configuration for the
//! AnonID off-chain DID record cache.

pub mod config;
pub mod did;
pub mod error;
pub mod types;

pub use config::AnonidConfig;
pub use did::{derive, extract_identity, validate, DidFormat};
pub use error::CoreError;
pub use types::{DidRecord, HistoryAction, HistoryEvent, Identity, RecordMap};
