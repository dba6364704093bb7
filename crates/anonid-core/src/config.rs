//! TOML configuration for the CLI and embedding hosts.

use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::did::{DidFormat, DEFAULT_METHOD, DEFAULT_NETWORK};
use crate::error::CoreError;

/// Everything an AnonID client reads from `anonid.toml`.
///
/// Every section and field is optional; absent ones take the values of the
/// matching `Default` impl.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnonidConfig {
    pub did: DidConfig,
    pub storage: StorageConfig,
    pub key: KeyConfig,
    pub ledger: LedgerConfig,
    pub logging: LoggingConfig,
}

/// `did:<method>:<network>:` prefix used when deriving and checking DIDs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DidConfig {
    pub method: String,
    pub network: String,
}

impl Default for DidConfig {
    fn default() -> Self {
        Self {
            method: DEFAULT_METHOD.to_string(),
            network: DEFAULT_NETWORK.to_string(),
        }
    }
}

/// Where the encrypted blob lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
    File,
    Memory,
    Rocksdb,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackendKind,
    /// Directory for the file and RocksDB backends.
    pub data_dir: PathBuf,
    /// Key under which the blob is stored.
    pub storage_key: String,
    /// Ceiling for the serialized mapping, in bytes.
    pub max_bytes: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackendKind::File,
            data_dir: PathBuf::from("./anonid-data"),
            storage_key: "anonid_dids".to_string(),
            max_bytes: 5 * 1024 * 1024,
        }
    }
}

/// How the store key is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyProviderKind {
    /// Fixed application secret. Placeholder only.
    Static,
    /// Argon2id over a passphrase read from the environment.
    Passphrase,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyConfig {
    pub provider: KeyProviderKind,
    pub app_secret: String,
    /// Environment variable holding the passphrase.
    pub passphrase_env: String,
    /// At least 8 bytes.
    pub salt: String,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            provider: KeyProviderKind::Static,
            app_secret: "anonid-demo-key".to_string(),
            passphrase_env: "ANONID_PASSPHRASE".to_string(),
            salt: "anonid-store-salt-v1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Base URL of the ledger gateway. Verification requires one.
    pub endpoint: Option<String>,
    /// Account used for ledger writes and as the default owner.
    pub account: Option<String>,
    /// Per-read deadline during verification. Unbounded when unset.
    pub read_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, overridden by `RUST_LOG`.
    pub level: String,
    /// `text` or `json`.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl AnonidConfig {
    /// Read `path`, or return the defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        let config = toml::from_str(&text)
            .map_err(|e| CoreError::Config(format!("{}: {}", path.display(), e)))?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Write the config as TOML, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), CoreError> {
        let text = toml::to_string_pretty(self).map_err(|e| CoreError::Config(e.to_string()))?;
        match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir)?,
            _ => {}
        }
        std::fs::write(path, text)?;
        Ok(())
    }

    pub fn did_format(&self) -> DidFormat {
        DidFormat::new(self.did.method.clone(), self.did.network.clone())
    }
}
