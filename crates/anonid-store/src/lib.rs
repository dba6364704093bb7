//! AnonID Store: durable, confidential persistence of the
//! identity -> DID records mapping.
//!
//! The whole mapping is serialized to JSON, sealed with ChaCha20-Poly1305 and
//! written as one opaque base64 blob under a single storage key. Saves are not
//! serialized against each other: two concurrent load/mutate/save cycles race
//! and the last write wins. Callers serving several writers must add their
//! own per-identity locking.

pub mod backend;
pub mod error;
pub mod store;
pub mod transfer;

#[cfg(feature = "rocksdb")]
pub use backend::RocksBackend;
pub use backend::{BlobBackend, FileBackend, MemoryBackend};
pub use error::StoreError;
pub use store::{EncryptedRecordStore, StoreOptions};
pub use transfer::ImportMode;
