//! Keyed persistence for board state and the current-user record.
//!
//! Defines the [`KeyValueStore`] trait the board and session depend on,
//! plus two implementations:
//! - [`InMemoryStorage`] — a process-local map, used by tests
//! - [`FileStorage`] — one file per key inside a data directory
//!
//! Values are opaque text blobs; encoding lives in `taskboard_proto::codec`.

pub mod file;
pub mod memory;

pub use file::FileStorage;
pub use memory::InMemoryStorage;

use std::sync::Arc;

use taskboard_proto::user::UserId;

/// Storage key holding the signed-in user's profile.
pub const CURRENT_USER_KEY: &str = "currentUser";

/// Prefix of the per-user list snapshot key.
pub const LISTS_KEY_PREFIX: &str = "taskLists_";

/// Returns the storage key of a user's list snapshot.
#[must_use]
pub fn lists_key(user: &UserId) -> String {
    format!("{LISTS_KEY_PREFIX}{user}")
}

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The underlying storage is unavailable.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A write operation failed.
    #[error("write failed: {0}")]
    WriteFailed(String),

    /// A read operation failed.
    #[error("read failed: {0}")]
    ReadFailed(String),
}

/// Synchronous keyed text storage.
///
/// A missing key is not an error: `read` returns `Ok(None)` and `remove`
/// succeeds.
pub trait KeyValueStore {
    /// Reads the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ReadFailed`] if the value exists but cannot be read.
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::WriteFailed`] if the value could not be stored.
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Deletes the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::WriteFailed`] if the value could not be deleted.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).write(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}
