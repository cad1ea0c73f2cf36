//! In-memory storage backend.

use std::collections::HashMap;

use super::KeyValueStorage;
use crate::{Error, Result};

/// Storage held in a `HashMap`.
///
/// Usable as a scratch backend and in tests. A byte quota and an
/// availability switch let callers reproduce the failures a browser store
/// reports when it is full or disabled.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
    quota: Option<usize>,
    available: bool,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    /// Creates an empty storage without a quota.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: HashMap::new(),
            quota: None,
            available: true,
        }
    }

    /// Creates an empty storage limited to `quota` bytes of keys and values.
    #[must_use]
    pub fn with_quota(quota: usize) -> Self {
        Self {
            quota: Some(quota),
            ..Self::new()
        }
    }

    /// Makes every subsequent operation fail with [`Error::Unavailable`] (or succeed again).
    pub const fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Bytes used by keys and values, excluding `skip_key`.
    fn used_bytes(&self, skip_key: &str) -> usize {
        self.items
            .iter()
            .filter(|(k, _)| k.as_str() != skip_key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }

    fn check_available(&self) -> Result<()> {
        if self.available {
            Ok(())
        } else {
            Err(Error::Unavailable("memory storage disabled".to_string()))
        }
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.check_available()?;
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        self.check_available()?;
        if let Some(quota) = self.quota {
            let needed = self.used_bytes(key) + key.len() + value.len();
            if needed > quota {
                return Err(Error::QuotaExceeded { needed, quota });
            }
        }
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        self.check_available()?;
        self.items.remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let mut storage = MemoryStorage::new();
        assert_eq!(storage.get_item("k").unwrap(), None);

        storage.set_item("k", "v1").unwrap();
        storage.set_item("k", "v2").unwrap();
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("v2"));
        assert_eq!(storage.len(), 1);

        storage.remove_item("k").unwrap();
        storage.remove_item("k").unwrap();
        assert!(storage.is_empty());
    }

    #[test]
    fn test_quota_exceeded() {
        let mut storage = MemoryStorage::with_quota(10);
        storage.set_item("k", "123456789").unwrap();
        // Overwriting the same key only counts the new value
        storage.set_item("k", "987654321").unwrap();

        let err = storage.set_item("k", "1234567890").unwrap_err();
        assert!(matches!(err, Error::QuotaExceeded { needed: 11, quota: 10 }));
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("987654321"));
    }

    #[test]
    fn test_unavailable() {
        let mut storage = MemoryStorage::new();
        storage.set_available(false);
        assert!(matches!(storage.get_item("k"), Err(Error::Unavailable(_))));
        assert!(matches!(storage.set_item("k", "v"), Err(Error::Unavailable(_))));

        storage.set_available(true);
        storage.set_item("k", "v").unwrap();
    }
}
