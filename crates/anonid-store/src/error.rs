use anonid_crypto::CryptoError;

/// Store-layer errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The persisted blob could not be decoded, decrypted or parsed.
    /// Never repaired automatically.
    #[error("store corrupted: {0}")]
    Corruption(String),

    /// The serialized mapping exceeds the configured ceiling.
    #[error("store capacity exceeded: {size} bytes (limit {limit})")]
    Capacity { size: usize, limit: usize },

    #[error("invalid import data: {0}")]
    InvalidImport(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
