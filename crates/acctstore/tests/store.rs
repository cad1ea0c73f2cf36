//! Integration tests for the account store.
//!
//! Each reload is simulated by handing the storage of one store to a fresh
//! store, the way a page reload hands `localStorage` to a new session.

#![allow(clippy::unwrap_used, clippy::expect_used, missing_docs)]

use acctstore::{
    AccountId, AccountLabel, AccountStore, AccountType, AccountUpdate, CollectingObserver, Field,
    FileStorage, KeyValueStorage, MemoryStorage, StoreConfig, StoreEvent, ValidationErrors,
    validate_labels,
};
use tempfile::TempDir;

fn reload<S: KeyValueStorage>(store: AccountStore<S>) -> AccountStore<S> {
    let config = store.config().clone();
    AccountStore::open(store.into_storage(), config)
}

#[test]
fn test_new_account_scenario() {
    let mut store = AccountStore::new(MemoryStorage::new());
    assert!(store.is_empty());

    let id = store.add_account();
    assert_eq!(store.len(), 1);
    let account = &store.accounts()[0];
    assert_eq!(account.id, id);
    assert_eq!(account.account_type, AccountType::Ldap);
    assert_eq!(account.login, "");
    assert_eq!(account.password, None);
    assert!(account.labels.is_empty());

    store.validate_account(&id);
    let errors = store.errors_for(&id).unwrap();
    assert_eq!(errors.get(Field::Login), Some("Логин обязателен"));
    assert!(!errors.contains(Field::Password));
}

#[test]
fn test_add_then_delete_restores_size() {
    let mut store = AccountStore::new(MemoryStorage::new());
    store.add_account();
    let before = store.len();

    let id = store.add_account();
    store.validate_account(&id);
    store.delete_account(&id);

    assert_eq!(store.len(), before);
    assert!(store.errors_for(&id).is_none());
}

#[test]
fn test_validation_reflects_latest_update() {
    let mut store = AccountStore::new(MemoryStorage::new());
    let id = store.add_account();
    store.update_account(&id, AccountUpdate::new().login("a".repeat(101)));
    store.validate_account(&id);
    assert_eq!(
        store.errors_for(&id).unwrap().get(Field::Login),
        Some("Логин не должен превышать 100 символов")
    );

    store.update_account(&id, AccountUpdate::new().login("x"));
    store.validate_account(&id);
    assert!(store.errors_for(&id).is_none());
}

#[test]
fn test_local_account_requires_password() {
    let mut store = AccountStore::new(MemoryStorage::new());
    let id = store.add_account();
    store.update_account(
        &id,
        AccountUpdate::new()
            .login("admin")
            .account_type(AccountType::Local),
    );
    store.validate_account(&id);
    assert_eq!(
        store.errors_for(&id).unwrap().get(Field::Password),
        Some("Пароль обязателен для локальных учетных записей")
    );

    store.update_account(&id, AccountUpdate::new().password("hunter2"));
    store.validate_account(&id);
    assert!(!store.has_errors(&id));
}

#[test]
fn test_labels_limit_at_boundary() {
    let mut store = AccountStore::new(MemoryStorage::new());
    let id = store.add_account();

    // "aaaa...;bbbb..." with 25 + 1 + 25 = 51 characters
    let labels = vec![
        AccountLabel::new("a".repeat(25)),
        AccountLabel::new("b".repeat(25)),
    ];
    store.update_account(&id, AccountUpdate::new().login("ops").labels(labels));
    let joined = store.account(&id).unwrap().labels_text();
    assert_eq!(joined.chars().count(), 51);
    assert!(validate_labels(&joined).is_some());
    store.validate_account(&id);
    assert!(store.errors_for(&id).unwrap().contains(Field::Labels));

    let labels = vec![
        AccountLabel::new("a".repeat(25)),
        AccountLabel::new("b".repeat(24)),
    ];
    store.update_account(&id, AccountUpdate::new().labels(labels));
    assert!(validate_labels(&store.account(&id).unwrap().labels_text()).is_none());
    store.validate_account(&id);
    assert!(!store.has_errors(&id));
}

#[test]
fn test_round_trip_through_memory_storage() {
    let mut store = AccountStore::new(MemoryStorage::new());
    let first = store.add_account();
    let second = store.add_account();
    let third = store.add_account();
    store.update_account(
        &second,
        AccountUpdate::new()
            .login("петров")
            .account_type(AccountType::Local)
            .password("pw")
            .labels_text("dev;ops"),
    );
    store.validate_account(&first);
    store.validate_account(&second);
    store.save_to_storage();

    let accounts = store.accounts().to_vec();
    let errors = store.validation_errors().clone();

    let reloaded = reload(store);
    assert_eq!(reloaded.accounts(), accounts.as_slice());
    assert_eq!(
        reloaded.accounts().iter().map(|a| &a.id).collect::<Vec<_>>(),
        vec![&first, &second, &third]
    );
    assert_eq!(
        reloaded.validation_errors().keys().collect::<Vec<_>>(),
        errors.keys().collect::<Vec<_>>()
    );
    assert_eq!(reloaded.validation_errors(), &errors);
}

#[test]
fn test_round_trip_through_file_storage() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("roundtrip");
    let mut store = AccountStore::open(FileStorage::new(&dir), StoreConfig::default());
    assert!(store.is_empty());

    let id = store.add_account();
    store.update_account(&id, AccountUpdate::new().login("ivanov"));
    assert!(dir.join("accounts-data.json").exists());

    let reloaded = AccountStore::open(FileStorage::new(&dir), StoreConfig::default());
    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded.account(&id).unwrap().login, "ivanov");
}

#[test]
fn test_reads_document_written_by_browser_build() {
    let json = r#"{
        "accounts": [
            {"id": "1718031337000k3j9x0q2m", "labels": [{"text": "hr"}],
             "accountType": "Локальная", "login": "", "password": null}
        ],
        "validationErrors": {
            "1718031337000k3j9x0q2m": {
                "login": "Логин обязателен",
                "password": "Пароль обязателен для локальных учетных записей"
            }
        }
    }"#;
    let mut storage = MemoryStorage::new();
    storage.set_item("accounts-data", json).unwrap();

    let store = AccountStore::open(storage, StoreConfig::default());
    let id = AccountId::new("1718031337000k3j9x0q2m");
    let account = store.account(&id).unwrap();
    assert_eq!(account.account_type, AccountType::Local);
    assert_eq!(account.labels, vec![AccountLabel::new("hr")]);

    let mut expected = ValidationErrors::new();
    expected.insert_message(Field::Login, "Логин обязателен");
    expected.insert_message(
        Field::Password,
        "Пароль обязателен для локальных учетных записей",
    );
    assert_eq!(store.errors_for(&id), Some(&expected));
}

#[test]
fn test_malformed_document_starts_empty() {
    let mut storage = MemoryStorage::new();
    storage
        .set_item("accounts-data", r#"{"accounts": [{"login": "no id"}]}"#)
        .unwrap();

    let events = CollectingObserver::shared();
    let mut store = AccountStore::with_config(storage, StoreConfig::default());
    store.subscribe(std::rc::Rc::clone(&events));
    store.load_from_storage();

    assert!(store.is_empty());
    assert!(store.validation_errors().is_empty());
    assert_eq!(events.borrow().events, vec![StoreEvent::Reset]);
}

#[test]
fn test_quota_failure_keeps_memory_state() {
    let mut store = AccountStore::new(MemoryStorage::with_quota(200));
    let ids: Vec<_> = (0..5).map(|_| store.add_account()).collect();

    assert_eq!(store.len(), 5);
    for id in &ids {
        assert!(store.account(id).is_some());
    }

    // Only the last write that fit is in storage
    let saved = reload(store);
    assert!(saved.len() < 5);
}
