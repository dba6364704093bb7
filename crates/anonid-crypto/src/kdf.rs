use argon2::Argon2;

use crate::error::CryptoError;
use crate::keys::KEY_LEN;

/// Shortest salt accepted for passphrase derivation.
pub const MIN_SALT_LEN: usize = 8;

const APP_KEY_CONTEXT: &str = "AnonID-store-key-v1";

/// Derive a 32-byte key from a password and a fixed salt using Argon2id.
///
/// The same password and salt always yield the same key, so the salt must be
/// persisted alongside the configuration.
pub fn derive_key_with_salt(password: &[u8], salt: &[u8]) -> Result<[u8; KEY_LEN], CryptoError> {
    if salt.len() < MIN_SALT_LEN {
        return Err(CryptoError::KeyDerivation(format!(
            "salt must be at least {} bytes, got {}",
            MIN_SALT_LEN,
            salt.len()
        )));
    }

    let mut output = [0u8; KEY_LEN];
    Argon2::default()
        .hash_password_into(password, salt, &mut output)
        .map_err(|e| CryptoError::KeyDerivation(format!("argon2 failed: {}", e)))?;
    Ok(output)
}

/// Derive the store key from an application secret with BLAKE3 for domain
/// separation.
pub fn derive_app_key(secret: &[u8]) -> [u8; KEY_LEN] {
    blake3::derive_key(APP_KEY_CONTEXT, secret)
}
