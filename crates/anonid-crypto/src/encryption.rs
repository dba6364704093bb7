use base64::{engine::general_purpose::STANDARD, Engine as _};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use rand::RngCore;

use crate::error::CryptoError;
use crate::keys::StoreKey;

/// Nonce length for ChaCha20-Poly1305.
pub const NONCE_LEN: usize = 12;

/// Poly1305 tag appended to every ciphertext.
const TAG_LEN: usize = 16;

/// Sealed payload: nonce plus ciphertext (with tag).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedBlob {
    /// 12-byte nonce, fresh for every seal.
    pub nonce: [u8; NONCE_LEN],
    /// Ciphertext followed by the Poly1305 tag.
    pub ciphertext: Vec<u8>,
}

impl SealedBlob {
    /// `nonce || ciphertext`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(NONCE_LEN + self.ciphertext.len());
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Split a raw `nonce || ciphertext` buffer.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() < NONCE_LEN + TAG_LEN {
            return Err(CryptoError::MalformedBlob(format!(
                "{} bytes is shorter than nonce and tag",
                bytes.len()
            )));
        }
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&bytes[..NONCE_LEN]);
        Ok(Self {
            nonce,
            ciphertext: bytes[NONCE_LEN..].to_vec(),
        })
    }

    /// `base64(nonce || ciphertext)`, the persisted text form.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.to_bytes())
    }

    pub fn from_base64(encoded: &str) -> Result<Self, CryptoError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| CryptoError::MalformedBlob(format!("invalid base64: {}", e)))?;
        Self::from_bytes(&bytes)
    }
}

fn cipher(key: &StoreKey) -> Result<ChaCha20Poly1305, CryptoError> {
    ChaCha20Poly1305::new_from_slice(key.as_bytes())
        .map_err(|e| CryptoError::Seal(format!("cipher init: {}", e)))
}

/// Encrypt plaintext under the store key with a random nonce.
pub fn seal(key: &StoreKey, plaintext: &[u8]) -> Result<SealedBlob, CryptoError> {
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher(key)?
        .encrypt(nonce, plaintext)
        .map_err(|e| CryptoError::Seal(e.to_string()))?;

    Ok(SealedBlob {
        nonce: nonce_bytes,
        ciphertext,
    })
}

/// Decrypt and authenticate a sealed blob.
pub fn open(key: &StoreKey, blob: &SealedBlob) -> Result<Vec<u8>, CryptoError> {
    let nonce = Nonce::from_slice(&blob.nonce);
    cipher(key)?
        .decrypt(nonce, blob.ciphertext.as_slice())
        .map_err(|e| CryptoError::Open(e.to_string()))
}

/// [`seal`] straight to the persisted text form.
pub fn seal_base64(key: &StoreKey, plaintext: &[u8]) -> Result<String, CryptoError> {
    Ok(seal(key, plaintext)?.to_base64())
}

/// [`open`] from the persisted text form.
pub fn open_base64(key: &StoreKey, encoded: &str) -> Result<Vec<u8>, CryptoError> {
    open(key, &SealedBlob::from_base64(encoded)?)
}
