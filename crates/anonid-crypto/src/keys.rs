use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::CryptoError;
use crate::kdf;

/// Length of the symmetric store key in bytes.
pub const KEY_LEN: usize = 32;

/// Symmetric key protecting the record store.
/// Key material is zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct StoreKey([u8; KEY_LEN]);

impl StoreKey {
    pub fn from_array(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Create a key from raw bytes (32 bytes).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != KEY_LEN {
            return Err(CryptoError::InvalidKeyLength {
                expected: KEY_LEN,
                actual: bytes.len(),
            });
        }
        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(bytes);
        Ok(Self(key))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StoreKey(<redacted>)")
    }
}

/// Source of the store key.
///
/// Key management lives outside this crate; providers only turn whatever
/// secret the host supplies into a [`StoreKey`].
pub trait KeyProvider: Send + Sync {
    fn store_key(&self) -> Result<StoreKey, CryptoError>;
}

/// Derives the key from a fixed application secret.
///
/// This is a placeholder: anyone holding the binary can recompute the key.
/// Production deployments should use [`PassphraseKeyProvider`] or a
/// hardware-backed provider.
pub struct StaticKeyProvider {
    secret: Zeroizing<String>,
}

impl StaticKeyProvider {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: Zeroizing::new(secret.into()),
        }
    }
}

impl KeyProvider for StaticKeyProvider {
    fn store_key(&self) -> Result<StoreKey, CryptoError> {
        Ok(StoreKey(kdf::derive_app_key(self.secret.as_bytes())))
    }
}

/// Derives the key from a user passphrase with Argon2id.
pub struct PassphraseKeyProvider {
    passphrase: Zeroizing<String>,
    salt: Vec<u8>,
}

impl PassphraseKeyProvider {
    pub fn new(passphrase: impl Into<String>, salt: impl Into<Vec<u8>>) -> Self {
        Self {
            passphrase: Zeroizing::new(passphrase.into()),
            salt: salt.into(),
        }
    }

    /// Read the passphrase from an environment variable.
    pub fn from_env(var: &str, salt: impl Into<Vec<u8>>) -> Result<Self, CryptoError> {
        let passphrase = std::env::var(var).map_err(|_| {
            CryptoError::MissingSecret(format!("environment variable {} is not set", var))
        })?;
        Ok(Self::new(passphrase, salt))
    }
}

impl KeyProvider for PassphraseKeyProvider {
    fn store_key(&self) -> Result<StoreKey, CryptoError> {
        let key = kdf::derive_key_with_salt(self.passphrase.as_bytes(), &self.salt)?;
        Ok(StoreKey(key))
    }
}
