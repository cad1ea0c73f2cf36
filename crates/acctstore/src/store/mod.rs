//! Account store.
//!
//! Owns the account list and the per-account validation errors, and
//! persists both as one JSON document under a single storage key:
//!
//! ```json
//! {
//!   "accounts": [{"id": "...", "labels": [{"text": "ops"}], "accountType": "LDAP",
//!                 "login": "ivanov", "password": null}],
//!   "validationErrors": {"...": {"login": "Логин обязателен"}}
//! }
//! ```
//!
//! Persistence failures never reach the caller. They are logged and the
//! in-memory state stays authoritative.

mod observer;

pub use observer::{
    CollectingObserver, LoggingObserver, NoopObserver, StoreEvent, StoreObserver, SubscriptionId,
};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::Result;
use crate::account::{
    Account, AccountId, AccountUpdate, ValidationErrors, generate_id, validate_account,
};
use crate::config::StoreConfig;
use crate::storage::{KeyValueStorage, MemoryStorage};

/// Validation errors of all accounts, keyed by account ID.
pub type ValidationErrorMap = BTreeMap<AccountId, ValidationErrors>;

/// Persisted document, borrowed from the store for writing.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StoredState<'a> {
    accounts: &'a [Account],
    validation_errors: &'a ValidationErrorMap,
}

/// Persisted document as read back. Either part may be missing.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoadedState {
    #[serde(default)]
    accounts: Option<Vec<Account>>,
    #[serde(default)]
    validation_errors: Option<ValidationErrorMap>,
}

type Observers = Vec<(SubscriptionId, Box<dyn StoreObserver>)>;

fn notify(observers: &mut Observers, mut f: impl FnMut(&mut Box<dyn StoreObserver>)) {
    for (_, observer) in observers.iter_mut() {
        f(observer);
    }
}

/// In-memory account collection backed by a key-value storage.
pub struct AccountStore<S = MemoryStorage> {
    accounts: Vec<Account>,
    validation_errors: ValidationErrorMap,
    storage: S,
    config: StoreConfig,
    observers: Observers,
    next_subscription: u64,
}

impl<S> std::fmt::Debug for AccountStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountStore")
            .field("accounts", &self.accounts)
            .field("validation_errors", &self.validation_errors)
            .field("config", &self.config)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl Default for AccountStore<MemoryStorage> {
    fn default() -> Self {
        Self::new(MemoryStorage::new())
    }
}

impl<S: KeyValueStorage> AccountStore<S> {
    /// Create an empty store with the default configuration.
    ///
    /// Nothing is read from `storage`; call [`load_from_storage`](Self::load_from_storage)
    /// or use [`open`](Self::open) to restore saved state.
    #[must_use]
    pub fn new(storage: S) -> Self {
        Self::with_config(storage, StoreConfig::default())
    }

    /// Create an empty store with the given configuration.
    #[must_use]
    pub fn with_config(storage: S, config: StoreConfig) -> Self {
        Self {
            accounts: Vec::new(),
            validation_errors: ValidationErrorMap::new(),
            storage,
            config,
            observers: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Create a store and restore the state saved in `storage`.
    #[must_use]
    pub fn open(storage: S, config: StoreConfig) -> Self {
        let mut store = Self::with_config(storage, config);
        store.load_from_storage();
        store
    }

    /// Store configuration.
    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Underlying storage.
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Underlying storage, mutably.
    pub const fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Consume the store and return its storage.
    #[must_use]
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// All accounts in creation order.
    #[must_use]
    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    /// Get an account by ID.
    #[must_use]
    pub fn account(&self, id: &AccountId) -> Option<&Account> {
        self.accounts.iter().find(|account| &account.id == id)
    }

    /// Validation errors of all accounts that have any.
    #[must_use]
    pub const fn validation_errors(&self) -> &ValidationErrorMap {
        &self.validation_errors
    }

    /// Validation errors of one account, if it has any.
    #[must_use]
    pub fn errors_for(&self, id: &AccountId) -> Option<&ValidationErrors> {
        self.validation_errors.get(id)
    }

    /// Returns true if the account has validation errors.
    #[must_use]
    pub fn has_errors(&self, id: &AccountId) -> bool {
        self.validation_errors.contains_key(id)
    }

    /// Number of accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Returns true if the store holds no accounts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Register an observer for store changes.
    pub fn subscribe(&mut self, observer: impl StoreObserver + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Remove an observer. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sub, _)| *sub != id);
        self.observers.len() != before
    }

    fn position(&self, id: &AccountId) -> Option<usize> {
        self.accounts.iter().position(|account| &account.id == id)
    }

    /// Append a new empty LDAP account and return its ID.
    pub fn add_account(&mut self) -> AccountId {
        let mut id = generate_id();
        while self.position(&id).is_some() {
            id = generate_id();
        }

        self.accounts.push(Account::new(id.clone()));
        debug!("Added account {id}");
        if let Some(account) = self.accounts.last() {
            notify(&mut self.observers, |o| o.on_account_added(account));
        }

        self.after_mutation();
        id
    }

    /// Remove an account and its validation errors.
    ///
    /// Unknown IDs are ignored.
    pub fn delete_account(&mut self, id: &AccountId) {
        let Some(index) = self.position(id) else {
            debug!("Delete ignored, no account {id}");
            return;
        };

        self.accounts.remove(index);
        self.validation_errors.remove(id);
        debug!("Deleted account {id}");
        notify(&mut self.observers, |o| o.on_account_deleted(id));

        self.after_mutation();
    }

    /// Merge field values into an account.
    ///
    /// Unknown IDs are ignored. The account is not revalidated unless
    /// [`StoreConfig::revalidate_on_update`] is set, so errors shown for it
    /// may be stale until [`validate_account`](Self::validate_account) runs.
    pub fn update_account(&mut self, id: &AccountId, update: AccountUpdate) {
        let Some(index) = self.position(id) else {
            debug!("Update ignored, no account {id}");
            return;
        };

        let account = &mut self.accounts[index];
        update.apply_to(account);
        debug!("Updated account {id}");
        notify(&mut self.observers, |o| o.on_account_updated(account));

        if self.config.revalidate_on_update {
            self.validate_account(id);
        }
        self.after_mutation();
    }

    /// Replace the validation errors of an account.
    ///
    /// An empty set removes the entry, so [`has_errors`](Self::has_errors)
    /// can be answered by key presence.
    pub fn set_validation_errors(&mut self, id: &AccountId, errors: ValidationErrors) {
        if errors.is_empty() {
            self.validation_errors.remove(id);
        } else {
            self.validation_errors.insert(id.clone(), errors);
        }
        let current = self.validation_errors.get(id);
        notify(&mut self.observers, |o| o.on_validation_changed(id, current));
    }

    /// Validate an account and store the result. Unknown IDs are ignored.
    pub fn validate_account(&mut self, id: &AccountId) {
        let Some(account) = self.account(id) else {
            return;
        };
        let errors = validate_account(account);
        debug!("Validated account {id}: {} invalid field(s)", errors.len());
        self.set_validation_errors(id, errors);
    }

    /// Validate every account. Returns the number of accounts with errors.
    pub fn validate_all(&mut self) -> usize {
        let ids: Vec<AccountId> = self.accounts.iter().map(|a| a.id.clone()).collect();
        for id in &ids {
            self.validate_account(id);
        }
        ids.iter().filter(|id| self.has_errors(id)).count()
    }

    fn after_mutation(&mut self) {
        if self.config.autosave {
            self.save_to_storage();
        }
    }

    fn try_save(&mut self) -> Result<()> {
        let state = StoredState {
            accounts: &self.accounts,
            validation_errors: &self.validation_errors,
        };
        let json = serde_json::to_string(&state)?;
        self.storage.set_item(&self.config.storage_key, &json)
    }

    /// Persist accounts and validation errors.
    ///
    /// Failures are logged and otherwise ignored; the in-memory state is
    /// unaffected.
    pub fn save_to_storage(&mut self) {
        match self.try_save() {
            Ok(()) => debug!(
                "Saved {} account(s) under {:?}",
                self.accounts.len(),
                self.config.storage_key
            ),
            Err(e) => warn!("Failed to save accounts to storage: {e}"),
        }
    }

    /// Replace the in-memory state with the saved state.
    ///
    /// - No saved state: nothing changes.
    /// - Saved state readable: each of `accounts` and `validationErrors`
    ///   that is present replaces its in-memory counterpart.
    /// - Saved state unreadable or malformed: both are cleared.
    pub fn load_from_storage(&mut self) {
        let state = match self.read_stored() {
            Ok(Some(state)) => state,
            Ok(None) => {
                debug!("No saved accounts under {:?}", self.config.storage_key);
                return;
            }
            Err(e) => {
                warn!("Failed to load accounts from storage: {e}");
                self.accounts.clear();
                self.validation_errors.clear();
                notify(&mut self.observers, |o| o.on_reset());
                return;
            }
        };

        if let Some(accounts) = state.accounts {
            self.accounts = normalize_loaded(accounts);
        }
        if let Some(errors) = state.validation_errors {
            self.validation_errors = errors;
        }
        info!("Loaded {} account(s) from storage", self.accounts.len());
        let accounts = &self.accounts;
        notify(&mut self.observers, |o| o.on_loaded(accounts));
    }

    fn read_stored(&self) -> Result<Option<LoadedState>> {
        match self.storage.get_item(&self.config.storage_key)? {
            Some(json) if !json.is_empty() => Ok(Some(serde_json::from_str(&json)?)),
            _ => Ok(None),
        }
    }
}

/// Drop accounts whose ID already appeared earlier in the list, and strip
/// passwords from accounts that are not local.
fn normalize_loaded(accounts: Vec<Account>) -> Vec<Account> {
    let mut seen = std::collections::HashSet::new();
    accounts
        .into_iter()
        .filter(|account| {
            let first = seen.insert(account.id.clone());
            if !first {
                warn!("Dropping stored account with duplicate id {}", account.id);
            }
            first
        })
        .map(|mut account| {
            if !account.account_type.is_local() && account.password.take().is_some() {
                debug!("Cleared stored password of non-local account {}", account.id);
            }
            account
        })
        .collect()
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::account::{AccountLabel, AccountType, Field};
    use crate::storage::FileStorage;

    fn store() -> AccountStore {
        AccountStore::default()
    }

    fn stored_json(store: &AccountStore) -> serde_json::Value {
        let json = store.storage().get_item("accounts-data").unwrap().unwrap();
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn test_add_account_defaults() {
        let mut store = store();
        let id = store.add_account();

        assert_eq!(store.len(), 1);
        let account = store.account(&id).unwrap();
        assert_eq!(account.account_type, AccountType::Ldap);
        assert_eq!(account.login, "");
        assert!(account.password.is_none());
        assert!(account.labels.is_empty());
    }

    #[test]
    fn test_add_account_persists() {
        let mut store = store();
        let id = store.add_account();

        let json = stored_json(&store);
        assert_eq!(json["accounts"][0]["id"], id.as_str());
        assert_eq!(json["accounts"][0]["accountType"], "LDAP");
        assert_eq!(json["validationErrors"], serde_json::json!({}));
    }

    #[test]
    fn test_delete_removes_account_and_errors() {
        let mut store = store();
        let keep = store.add_account();
        let id = store.add_account();
        store.validate_account(&id);
        assert!(store.has_errors(&id));

        store.delete_account(&id);
        assert_eq!(store.len(), 1);
        assert!(store.account(&id).is_none());
        assert!(!store.has_errors(&id));
        assert!(store.account(&keep).is_some());
    }

    #[test]
    fn test_delete_unknown_is_noop() {
        let mut store = store();
        store.add_account();
        store.delete_account(&AccountId::new("missing"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_update_does_not_revalidate() {
        let mut store = store();
        let id = store.add_account();
        store.validate_account(&id);

        store.update_account(&id, AccountUpdate::new().login("ivanov"));
        assert_eq!(store.account(&id).unwrap().login, "ivanov");
        // Still the error computed for the empty login
        assert_eq!(
            store.errors_for(&id).unwrap().get(Field::Login),
            Some("Логин обязателен")
        );

        store.validate_account(&id);
        assert!(store.errors_for(&id).is_none());
    }

    #[test]
    fn test_update_revalidates_when_configured() {
        let config = StoreConfig::builder()
            .revalidate_on_update(true)
            .build()
            .unwrap();
        let mut store = AccountStore::with_config(MemoryStorage::new(), config);
        let id = store.add_account();

        store.update_account(&id, AccountUpdate::new().account_type(AccountType::Local));
        let errors = store.errors_for(&id).unwrap();
        assert!(errors.contains(Field::Login));
        assert!(errors.contains(Field::Password));

        store.update_account(
            &id,
            AccountUpdate::new().login("ivanov").password("secret"),
        );
        assert!(!store.has_errors(&id));
    }

    #[test]
    fn test_update_unknown_is_noop() {
        let mut store = store();
        store.update_account(&AccountId::new("missing"), AccountUpdate::new().login("x"));
        assert!(store.is_empty());
        assert!(store.storage().is_empty());
    }

    #[test]
    fn test_set_empty_errors_removes_entry() {
        let mut store = store();
        let id = store.add_account();

        let mut errors = ValidationErrors::new();
        errors.insert_message(Field::Login, "bad");
        store.set_validation_errors(&id, errors);
        assert!(store.has_errors(&id));

        store.set_validation_errors(&id, ValidationErrors::new());
        assert!(!store.has_errors(&id));
        assert!(store.validation_errors().is_empty());
    }

    #[test]
    fn test_store_validation_checks_labels() {
        let mut store = store();
        let id = store.add_account();
        store.update_account(
            &id,
            AccountUpdate::new()
                .login("ivanov")
                .labels(vec![AccountLabel::new("x".repeat(51))]),
        );

        store.validate_account(&id);
        let errors = store.errors_for(&id).unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors.contains(Field::Labels));
    }

    #[test]
    fn test_validate_all() {
        let mut store = store();
        let a = store.add_account();
        store.add_account();
        store.update_account(&a, AccountUpdate::new().login("ok"));

        assert_eq!(store.validate_all(), 1);
        assert!(!store.has_errors(&a));
    }

    #[test]
    fn test_save_failure_is_swallowed() {
        let mut store = AccountStore::new(MemoryStorage::with_quota(16));
        let id = store.add_account();
        store.update_account(&id, AccountUpdate::new().login("ivanov"));

        assert_eq!(store.account(&id).unwrap().login, "ivanov");
        assert!(store.storage().is_empty());
    }

    #[test]
    fn test_autosave_disabled() {
        let config = StoreConfig::builder().autosave(false).build().unwrap();
        let mut store = AccountStore::with_config(MemoryStorage::new(), config);
        store.add_account();
        assert!(store.storage().is_empty());

        store.save_to_storage();
        assert_eq!(store.storage().len(), 1);
    }

    #[test]
    fn test_load_missing_key_keeps_state() {
        let mut store = AccountStore::new(MemoryStorage::new());
        store.load_from_storage();
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_malformed_resets() {
        let mut storage = MemoryStorage::new();
        storage.set_item("accounts-data", "{not json").unwrap();
        let config = StoreConfig::builder().autosave(false).build().unwrap();
        let mut store = AccountStore::with_config(storage, config);
        store.add_account();

        store.load_from_storage();
        assert!(store.is_empty());
        assert!(store.validation_errors().is_empty());
    }

    #[test]
    fn test_load_unavailable_storage_resets() {
        let mut store = store();
        store.add_account();
        store.storage_mut().set_available(false);

        store.load_from_storage();
        assert!(store.is_empty());
        assert!(matches!(
            store.storage().get_item("accounts-data"),
            Err(Error::Unavailable(_))
        ));
    }

    #[test]
    fn test_load_partial_document() {
        let mut storage = MemoryStorage::new();
        storage
            .set_item(
                "accounts-data",
                r#"{"accounts":[{"id":"a1","labels":[],"accountType":"Локальная","login":"root","password":"pw"}]}"#,
            )
            .unwrap();
        let mut store = AccountStore::new(storage);
        let mut errors = ValidationErrors::new();
        errors.insert_message(Field::Login, "kept");
        store.set_validation_errors(&AccountId::new("a1"), errors);

        store.load_from_storage();
        let account = store.account(&AccountId::new("a1")).unwrap();
        assert_eq!(account.account_type, AccountType::Local);
        assert_eq!(account.password.as_deref(), Some("pw"));
        // validationErrors was absent, so the in-memory map is untouched
        assert!(store.has_errors(&AccountId::new("a1")));
    }

    #[test]
    fn test_load_drops_duplicate_ids() {
        let mut storage = MemoryStorage::new();
        storage
            .set_item(
                "accounts-data",
                r#"{"accounts":[{"id":"a","login":"first"},{"id":"a","login":"second"}],"validationErrors":{}}"#,
            )
            .unwrap();
        let store = AccountStore::open(storage, StoreConfig::default());
        assert_eq!(store.len(), 1);
        assert_eq!(store.accounts()[0].login, "first");
    }

    #[test]
    fn test_load_clears_password_of_ldap_account() {
        let mut storage = MemoryStorage::new();
        storage
            .set_item(
                "accounts-data",
                r#"{"accounts":[{"id":"a","accountType":"LDAP","login":"x","password":"leak"}]}"#,
            )
            .unwrap();
        let store = AccountStore::open(storage, StoreConfig::default());
        assert_eq!(store.account(&AccountId::new("a")).unwrap().password, None);
    }

    #[test]
    fn test_load_skips_unknown_error_fields() {
        let mut storage = MemoryStorage::new();
        storage
            .set_item(
                "accounts-data",
                r#"{"accounts":[{"id":"a","login":"x"}],"validationErrors":{"a":{"email":"x","login":"bad"}}}"#,
            )
            .unwrap();
        let store = AccountStore::open(storage, StoreConfig::default());
        assert_eq!(store.len(), 1);
        let errors = store.errors_for(&AccountId::new("a")).unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get(Field::Login), Some("bad"));
    }

    #[test]
    fn test_load_notifies_observers() {
        let mut storage = MemoryStorage::new();
        storage
            .set_item(
                "accounts-data",
                r#"{"accounts":[{"id":"a"},{"id":"b"},{"id":"a"}]}"#,
            )
            .unwrap();
        let events = CollectingObserver::shared();
        let mut store = AccountStore::new(storage);
        store.subscribe(std::rc::Rc::clone(&events));

        store.load_from_storage();
        assert_eq!(events.borrow_mut().take(), vec![StoreEvent::Loaded(2)]);
    }

    #[test]
    fn test_file_save_failure_is_swallowed() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = StoreConfig::builder()
            .storage_key("../bad")
            .build()
            .unwrap();
        let mut store = AccountStore::with_config(FileStorage::new(dir.path()), config);

        let id = store.add_account();
        store.update_account(&id, AccountUpdate::new().login("ivanov"));

        assert_eq!(store.account(&id).unwrap().login, "ivanov");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        assert!(!dir.path().parent().unwrap().join("bad.json").exists());
    }

    #[test]
    fn test_logging_observer_sees_every_operation() {
        let mut store = store();
        store.subscribe(LoggingObserver);

        let id = store.add_account();
        store.update_account(&id, AccountUpdate::new().login("x"));
        store.validate_account(&id);
        store.delete_account(&id);
        store.load_from_storage();
        store.storage_mut().set_available(false);
        store.load_from_storage();
        assert!(store.is_empty());
    }

    #[test]
    fn test_custom_storage_key() {
        let config = StoreConfig::builder()
            .storage_key("other-key")
            .build()
            .unwrap();
        let mut store = AccountStore::with_config(MemoryStorage::new(), config);
        store.add_account();
        assert!(store.storage().get_item("other-key").unwrap().is_some());
        assert!(store.storage().get_item("accounts-data").unwrap().is_none());
    }

    #[test]
    fn test_observers_receive_events() {
        let events = CollectingObserver::shared();
        let mut store = store();
        let sub = store.subscribe(std::rc::Rc::clone(&events));

        let id = store.add_account();
        store.update_account(&id, AccountUpdate::new().login("x"));
        store.validate_account(&id);
        store.delete_account(&id);

        assert_eq!(
            events.borrow_mut().take(),
            vec![
                StoreEvent::Added(id.clone()),
                StoreEvent::Updated(id.clone()),
                StoreEvent::ValidationChanged(id.clone(), false),
                StoreEvent::Deleted(id),
            ]
        );

        assert!(store.unsubscribe(sub));
        assert!(!store.unsubscribe(sub));
        store.add_account();
        assert!(events.borrow().events.is_empty());
    }
}
