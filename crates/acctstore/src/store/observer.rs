//! Change notifications for the account store.
//!
//! A presentation layer registers an observer to re-render whenever the
//! store changes, instead of polling it.
//!
//! # Example
//!
//! ```ignore
//! use acctstore::Account;
//! use acctstore::store::StoreObserver;
//!
//! struct Redraw {
//!     dirty: bool,
//! }
//!
//! impl StoreObserver for Redraw {
//!     fn on_account_updated(&mut self, _account: &Account) {
//!         self.dirty = true;
//!     }
//! }
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use crate::account::{Account, AccountId, ValidationErrors};

/// Handle returned by `subscribe`, used to unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

/// Observer of store changes.
///
/// Every method has an empty default, so implementors only override the
/// notifications they care about. Notifications are delivered after the
/// in-memory state has changed and before it is persisted.
pub trait StoreObserver {
    /// Called after an account was appended.
    fn on_account_added(&mut self, account: &Account) {
        let _ = account;
    }

    /// Called after fields of an account were updated.
    fn on_account_updated(&mut self, account: &Account) {
        let _ = account;
    }

    /// Called after an account and its errors were removed.
    fn on_account_deleted(&mut self, id: &AccountId) {
        let _ = id;
    }

    /// Called after the error set of an account was replaced.
    ///
    /// `errors` is `None` when the account has no errors anymore.
    fn on_validation_changed(&mut self, id: &AccountId, errors: Option<&ValidationErrors>) {
        let _ = (id, errors);
    }

    /// Called after state was loaded from storage.
    fn on_loaded(&mut self, accounts: &[Account]) {
        let _ = accounts;
    }

    /// Called after malformed stored data caused the state to be cleared.
    fn on_reset(&mut self) {}
}

impl<T: StoreObserver + ?Sized> StoreObserver for Rc<RefCell<T>> {
    fn on_account_added(&mut self, account: &Account) {
        self.borrow_mut().on_account_added(account);
    }

    fn on_account_updated(&mut self, account: &Account) {
        self.borrow_mut().on_account_updated(account);
    }

    fn on_account_deleted(&mut self, id: &AccountId) {
        self.borrow_mut().on_account_deleted(id);
    }

    fn on_validation_changed(&mut self, id: &AccountId, errors: Option<&ValidationErrors>) {
        self.borrow_mut().on_validation_changed(id, errors);
    }

    fn on_loaded(&mut self, accounts: &[Account]) {
        self.borrow_mut().on_loaded(accounts);
    }

    fn on_reset(&mut self) {
        self.borrow_mut().on_reset();
    }
}

/// An observer that ignores all notifications.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl StoreObserver for NoopObserver {}

/// An observer that logs notifications using tracing.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl StoreObserver for LoggingObserver {
    fn on_account_added(&mut self, account: &Account) {
        tracing::debug!(id = %account.id, "account added");
    }

    fn on_account_updated(&mut self, account: &Account) {
        tracing::debug!(id = %account.id, login = %account.login, "account updated");
    }

    fn on_account_deleted(&mut self, id: &AccountId) {
        tracing::debug!(%id, "account deleted");
    }

    fn on_validation_changed(&mut self, id: &AccountId, errors: Option<&ValidationErrors>) {
        let invalid_fields = errors.map_or(0, ValidationErrors::len);
        tracing::debug!(%id, invalid_fields, "validation changed");
    }

    fn on_loaded(&mut self, accounts: &[Account]) {
        tracing::info!(count = accounts.len(), "accounts loaded");
    }

    fn on_reset(&mut self) {
        tracing::warn!("account state reset");
    }
}

/// Store change, as recorded by [`CollectingObserver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// Account appended.
    Added(AccountId),
    /// Account fields updated.
    Updated(AccountId),
    /// Account removed.
    Deleted(AccountId),
    /// Error set replaced; `true` if the account now has errors.
    ValidationChanged(AccountId, bool),
    /// State loaded with this many accounts.
    Loaded(usize),
    /// State cleared after a failed load.
    Reset,
}

/// An observer that collects events for later processing.
///
/// Useful for testing or for batching UI refreshes.
#[derive(Debug, Default, Clone)]
pub struct CollectingObserver {
    /// Collected events.
    pub events: Vec<StoreEvent>,
}

impl CollectingObserver {
    /// Creates a new collecting observer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a collecting observer that can be shared with the store.
    #[must_use]
    pub fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Takes all collected events, leaving the observer empty.
    pub fn take(&mut self) -> Vec<StoreEvent> {
        std::mem::take(&mut self.events)
    }
}

impl StoreObserver for CollectingObserver {
    fn on_account_added(&mut self, account: &Account) {
        self.events.push(StoreEvent::Added(account.id.clone()));
    }

    fn on_account_updated(&mut self, account: &Account) {
        self.events.push(StoreEvent::Updated(account.id.clone()));
    }

    fn on_account_deleted(&mut self, id: &AccountId) {
        self.events.push(StoreEvent::Deleted(id.clone()));
    }

    fn on_validation_changed(&mut self, id: &AccountId, errors: Option<&ValidationErrors>) {
        self.events
            .push(StoreEvent::ValidationChanged(id.clone(), errors.is_some()));
    }

    fn on_loaded(&mut self, accounts: &[Account]) {
        self.events.push(StoreEvent::Loaded(accounts.len()));
    }

    fn on_reset(&mut self) {
        self.events.push(StoreEvent::Reset);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_take() {
        let mut observer = CollectingObserver::new();
        let id = AccountId::new("a");
        observer.on_account_deleted(&id);
        observer.on_reset();

        assert_eq!(
            observer.take(),
            vec![StoreEvent::Deleted(id), StoreEvent::Reset]
        );
        assert!(observer.events.is_empty());
    }

    #[test]
    fn test_shared_observer_forwards() {
        let shared = CollectingObserver::shared();
        let mut handle = Rc::clone(&shared);
        handle.on_account_added(&Account::new(AccountId::new("a")));

        assert_eq!(
            shared.borrow().events,
            vec![StoreEvent::Added(AccountId::new("a"))]
        );
    }

    #[test]
    fn test_noop_defaults() {
        let mut observer = NoopObserver;
        observer.on_loaded(&[]);
        observer.on_validation_changed(&AccountId::new("a"), None);
    }
}
