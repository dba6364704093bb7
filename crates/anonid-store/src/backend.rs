//! Persistence backends holding opaque text blobs by key.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::NamedTempFile;

use crate::error::StoreError;

/// Key -> blob persistence boundary.
///
/// Backends see only sealed text and never interpret it. Writes replace the
/// whole blob.
pub trait BlobBackend: Send + Sync {
    /// Read the blob stored under `key`, or `None` if nothing was written.
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replace the blob stored under `key`.
    fn write(&self, key: &str, blob: &str) -> Result<(), StoreError>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}

/// Process-local backend. Contents vanish with the process.
#[derive(Default)]
pub struct MemoryBackend {
    blobs: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let blobs = self
            .blobs
            .lock()
            .map_err(|_| StoreError::Backend("memory backend lock poisoned".into()))?;
        Ok(blobs.get(key).cloned())
    }

    fn write(&self, key: &str, blob: &str) -> Result<(), StoreError> {
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|_| StoreError::Backend("memory backend lock poisoned".into()))?;
        blobs.insert(key.to_string(), blob.to_string());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// One file per key inside a data directory.
///
/// Writes go to a fresh temporary file in the same directory and are
/// renamed into place, so a crash mid-write leaves the previous blob intact
/// and concurrent writers resolve to whichever rename lands last.
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Open (and create if needed) a data directory.
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
            || key.starts_with('.')
        {
            return Err(StoreError::Backend(format!("invalid storage key: {:?}", key)));
        }
        Ok(self.dir.join(format!("{}.blob", key)))
    }
}

impl BlobBackend for FileBackend {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, blob: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        // Each write gets its own temp file; concurrent writers never share one.
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(blob.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

#[cfg(feature = "rocksdb")]
mod rocks {
    use rocksdb::{ColumnFamilyDescriptor, Options, DB};
    use std::path::Path;

    use super::BlobBackend;
    use crate::error::StoreError;

    const CF_BLOBS: &str = "blobs";

    /// RocksDB-backed blob storage.
    pub struct RocksBackend {
        db: DB,
    }

    impl RocksBackend {
        /// Open or create a RocksDB database at the given path.
        pub fn open(path: &Path) -> Result<Self, StoreError> {
            std::fs::create_dir_all(path)?;

            let mut opts = Options::default();
            opts.create_if_missing(true);
            opts.create_missing_column_families(true);

            let cf_descriptors = vec![ColumnFamilyDescriptor::new(CF_BLOBS, Options::default())];
            let db = DB::open_cf_descriptors(&opts, path, cf_descriptors)
                .map_err(|e| StoreError::Backend(e.to_string()))?;

            Ok(Self { db })
        }
    }

    impl BlobBackend for RocksBackend {
        fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
            let cf = self
                .db
                .cf_handle(CF_BLOBS)
                .ok_or_else(|| StoreError::Backend("column family 'blobs' not found".into()))?;
            let value = self
                .db
                .get_cf(&cf, key.as_bytes())
                .map_err(|e| StoreError::Backend(e.to_string()))?;
            value
                .map(|bytes| {
                    String::from_utf8(bytes)
                        .map_err(|e| StoreError::Corruption(format!("blob is not UTF-8: {}", e)))
                })
                .transpose()
        }

        fn write(&self, key: &str, blob: &str) -> Result<(), StoreError> {
            let cf = self
                .db
                .cf_handle(CF_BLOBS)
                .ok_or_else(|| StoreError::Backend("column family 'blobs' not found".into()))?;
            self.db
                .put_cf(&cf, key.as_bytes(), blob.as_bytes())
                .map_err(|e| StoreError::Backend(e.to_string()))
        }

        fn name(&self) -> &'static str {
            "rocksdb"
        }
    }
}

#[cfg(feature = "rocksdb")]
pub use rocks::RocksBackend;
