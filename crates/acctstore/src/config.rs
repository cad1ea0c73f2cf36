//! Store configuration types.

/// Storage key used when none is configured.
pub const DEFAULT_STORAGE_KEY: &str = "accounts-data";

/// Account store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Key the whole store state is persisted under.
    pub storage_key: String,
    /// Persist after every mutation.
    pub autosave: bool,
    /// Revalidate an account after every update of it.
    pub revalidate_on_update: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            autosave: true,
            revalidate_on_update: false,
        }
    }
}

impl StoreConfig {
    /// Creates the default configuration.
    ///
    /// State is saved under `accounts-data` after every mutation and
    /// updates are not revalidated automatically.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration builder.
    #[must_use]
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::new()
    }
}

/// Builder for store configuration.
#[derive(Debug, Clone, Default)]
pub struct StoreConfigBuilder {
    config: StoreConfig,
}

impl StoreConfigBuilder {
    /// Creates a builder starting from the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the storage key.
    #[must_use]
    pub fn storage_key(mut self, key: impl Into<String>) -> Self {
        self.config.storage_key = key.into();
        self
    }

    /// Sets whether mutations persist immediately.
    #[must_use]
    pub const fn autosave(mut self, autosave: bool) -> Self {
        self.config.autosave = autosave;
        self
    }

    /// Sets whether updates revalidate the account.
    #[must_use]
    pub const fn revalidate_on_update(mut self, revalidate: bool) -> Self {
        self.config.revalidate_on_update = revalidate;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage key is empty or whitespace.
    pub fn build(self) -> crate::Result<StoreConfig> {
        if self.config.storage_key.trim().is_empty() {
            return Err(crate::Error::Config("storage key must not be empty".to_string()));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::new();
        assert_eq!(config.storage_key, "accounts-data");
        assert!(config.autosave);
        assert!(!config.revalidate_on_update);
    }

    #[test]
    fn test_builder() {
        let config = StoreConfig::builder()
            .storage_key("team-accounts")
            .autosave(false)
            .revalidate_on_update(true)
            .build()
            .unwrap();
        assert_eq!(config.storage_key, "team-accounts");
        assert!(!config.autosave);
        assert!(config.revalidate_on_update);
    }

    #[test]
    fn test_builder_rejects_empty_key() {
        let result = StoreConfig::builder().storage_key("  ").build();
        assert!(matches!(result, Err(crate::Error::Config(_))));
    }
}
