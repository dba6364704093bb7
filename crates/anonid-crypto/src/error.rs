/// Failures while deriving the store key or sealing and opening blobs.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("store key must be {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("cannot seal payload: {0}")]
    Seal(String),

    /// Authentication failed: wrong key or tampered ciphertext.
    #[error("cannot open sealed payload: {0}")]
    Open(String),

    #[error("malformed sealed blob: {0}")]
    MalformedBlob(String),

    #[error("cannot derive store key: {0}")]
    KeyDerivation(String),

    #[error("secret not available: {0}")]
    MissingSecret(String),
}
