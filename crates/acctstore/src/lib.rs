//! # acctstore
//!
//! Account records for an account editor.
//!
//! This crate provides:
//! - Account model (LDAP and local accounts with labels)
//! - Field validation with user-facing messages
//! - An account store that persists to a key-value storage
//! - Memory and file storage backends
//! - Change observers for presentation layers
//!
//! # Example
//!
//! ```
//! use acctstore::{AccountStore, AccountUpdate, Field, MemoryStorage, StoreConfig};
//!
//! let mut store = AccountStore::open(MemoryStorage::new(), StoreConfig::default());
//! let id = store.add_account();
//! store.update_account(&id, AccountUpdate::new().labels_text("ops; admin"));
//! store.validate_account(&id);
//!
//! let errors = store.errors_for(&id).unwrap();
//! assert_eq!(errors.get(Field::Login), Some("Логин обязателен"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod account;
pub mod config;
mod error;
pub mod storage;
pub mod store;

pub use account::{
    Account, AccountId, AccountLabel, AccountType, AccountUpdate, Field, ValidationError,
    ValidationErrors, parse_labels, validate_account, validate_labels, validate_login,
    validate_password,
};
pub use config::{StoreConfig, StoreConfigBuilder};
pub use error::{Error, Result};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
pub use store::{
    AccountStore, CollectingObserver, LoggingObserver, NoopObserver, StoreEvent, StoreObserver,
    SubscriptionId, ValidationErrorMap,
};
