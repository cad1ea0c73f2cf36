//! File-backed storage.
//!
//! Each key is stored as `<key>.json` inside one directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::KeyValueStorage;
use crate::{Error, Result};

/// Directory name used under the platform data directory.
const APP_DIR: &str = "acctstore";

/// Storage that keeps one file per key in a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Creates a storage rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Creates a storage in the platform data directory
    /// (e.g. `~/.local/share/acctstore` on Linux), falling back to `./acctstore`.
    #[must_use]
    pub fn default_location() -> Self {
        let dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);
        Self::new(dir)
    }

    /// Directory holding the files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(Error::Config(format!("invalid storage key: {key:?}")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir)?;

        // Readers only ever see a complete file
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;

        debug!("Wrote {} bytes to {:?}", value.len(), path);
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_missing_key_is_none() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path().join("missing"));
        assert_eq!(storage.get_item("accounts-data").unwrap(), None);
    }

    #[test]
    fn test_write_read_remove() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("data");
        let mut storage = FileStorage::new(&dir);

        storage.set_item("accounts-data", "{\"accounts\":[]}").unwrap();
        assert!(dir.join("accounts-data.json").exists());
        assert!(!dir.join("accounts-data.json.tmp").exists());
        assert_eq!(
            storage.get_item("accounts-data").unwrap().as_deref(),
            Some("{\"accounts\":[]}")
        );

        storage.remove_item("accounts-data").unwrap();
        storage.remove_item("accounts-data").unwrap();
        assert_eq!(storage.get_item("accounts-data").unwrap(), None);
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let dir = TempDir::new().unwrap();
        let mut storage = FileStorage::new(dir.path());
        assert!(matches!(
            storage.set_item("../escape", "x"),
            Err(Error::Config(_))
        ));
        assert!(matches!(storage.get_item(""), Err(Error::Config(_))));
        assert!(!dir.path().parent().unwrap().join("escape.json").exists());
    }

    #[test]
    fn test_default_location_ends_with_app_dir() {
        let storage = FileStorage::default_location();
        assert!(storage.dir().ends_with(APP_DIR));
    }
}
