//! Key-value storage backends.
//!
//! The store persists its whole state as one JSON string under a single key.
//! Backends only need to hold strings by key, the same contract a browser's
//! `localStorage` offers:
//!
//! - [`MemoryStorage`]: in-process map, optionally with a byte quota
//! - [`FileStorage`]: one JSON file per key in a directory

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::Result;

/// Synchronous string key-value storage.
pub trait KeyValueStorage {
    /// Read the value stored under `key`.
    ///
    /// Returns `Ok(None)` if the key has never been written.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the write.
    fn set_item(&mut self, key: &str, value: &str) -> Result<()>;

    /// Remove the value stored under `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove_item(&mut self, key: &str) -> Result<()>;
}
