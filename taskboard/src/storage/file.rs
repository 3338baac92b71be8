//! File-backed [`KeyValueStore`]: one `<key>.json` file per key.
//!
//! Key characters outside `[A-Za-z0-9._@-]` are percent-escaped so that any
//! key maps to a single file name inside the data directory. Writes go to a
//! temporary sibling first and are renamed into place, so a crash mid-write
//! leaves the previous value intact.

use std::fmt::Write as _;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{KeyValueStore, StorageError};

/// Extension appended to every stored key.
const FILE_EXTENSION: &str = "json";

/// Stores each key as a file inside `root`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Opens (and creates if needed) a storage directory.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unavailable`] if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| {
            StorageError::Unavailable(format!("cannot create {}: {e}", root.display()))
        })?;
        tracing::debug!(path = %root.display(), "opened file storage");
        Ok(Self { root })
    }

    /// The directory holding the stored files.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file backing `key`.
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root
            .join(format!("{}.{FILE_EXTENSION}", escape_key(key)))
    }
}

impl KeyValueStore for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::ReadFailed(format!(
                "{}: {e}",
                path.display()
            ))),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let tmp = path.with_extension(format!("{FILE_EXTENSION}.tmp"));
        std::fs::write(&tmp, value)
            .map_err(|e| StorageError::WriteFailed(format!("{}: {e}", tmp.display())))?;
        std::fs::rename(&tmp, &path)
            .map_err(|e| StorageError::WriteFailed(format!("{}: {e}", path.display())))
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::WriteFailed(format!(
                "{}: {e}",
                path.display()
            ))),
        }
    }
}

/// Maps a storage key onto a file-name-safe string.
fn escape_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for c in key.chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '@' | '-') {
            out.push(c);
        } else {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                let _ = write!(out, "%{byte:02X}");
            }
        }
    }
    out
}
