//! AnonID Crypto: confidentiality at rest for the record store.
//!
//! - ChaCha20-Poly1305 sealing with a fresh nonce per call
//! - Pluggable store key providers (static placeholder, Argon2id passphrase)

pub mod encryption;
pub mod error;
pub mod kdf;
pub mod keys;

pub use encryption::{open, open_base64, seal, seal_base64, SealedBlob, NONCE_LEN};
pub use error::CryptoError;
pub use keys::{KeyProvider, PassphraseKeyProvider, StaticKeyProvider, StoreKey, KEY_LEN};
