//! Account model types.

use serde::{Deserialize, Serialize};

/// Separator between label texts in the joined labels string.
pub const LABEL_SEPARATOR: &str = ";";

/// Unique identifier for an account.
///
/// Opaque to callers; generated by the store when an account is created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Create an account ID from an existing string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Kind of account, which decides whether a password is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AccountType {
    /// Directory account; the password lives in the directory.
    #[default]
    #[serde(rename = "LDAP")]
    Ldap,
    /// Local account with its own password.
    #[serde(rename = "Локальная")]
    Local,
}

impl AccountType {
    /// Get display name for the account type.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Ldap => "LDAP",
            Self::Local => "Локальная",
        }
    }

    /// Returns true if accounts of this type carry a password.
    #[must_use]
    pub const fn is_local(self) -> bool {
        matches!(self, Self::Local)
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A free-form tag attached to an account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AccountLabel {
    /// Label text.
    pub text: String,
}

impl AccountLabel {
    /// Create a label with the given text.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Split `;`-separated input into labels.
///
/// Pieces are trimmed and empty pieces are dropped, so `"a; b;;"` yields
/// the labels `a` and `b`.
#[must_use]
pub fn parse_labels(text: &str) -> Vec<AccountLabel> {
    text.split(LABEL_SEPARATOR)
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(AccountLabel::new)
        .collect()
}

/// Join label texts with the label separator.
#[must_use]
pub fn join_labels(labels: &[AccountLabel]) -> String {
    labels
        .iter()
        .map(|label| label.text.as_str())
        .collect::<Vec<_>>()
        .join(LABEL_SEPARATOR)
}

/// Account record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Unique identifier, immutable after creation.
    pub id: AccountId,
    /// Ordered labels.
    #[serde(default)]
    pub labels: Vec<AccountLabel>,
    /// Account type.
    #[serde(default)]
    pub account_type: AccountType,
    /// Login name.
    #[serde(default)]
    pub login: String,
    /// Password, only present for local accounts.
    #[serde(default)]
    pub password: Option<String>,
}

impl Account {
    /// Create an empty LDAP account with the given ID.
    #[must_use]
    pub fn new(id: AccountId) -> Self {
        Self {
            id,
            labels: Vec::new(),
            account_type: AccountType::Ldap,
            login: String::new(),
            password: None,
        }
    }

    /// Label texts joined with `;`.
    #[must_use]
    pub fn labels_text(&self) -> String {
        join_labels(&self.labels)
    }
}

/// Partial update of an account's editable fields.
///
/// Fields left as `None` are not touched. The ID cannot be updated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountUpdate {
    /// Replacement labels.
    pub labels: Option<Vec<AccountLabel>>,
    /// Replacement account type.
    pub account_type: Option<AccountType>,
    /// Replacement login.
    pub login: Option<String>,
    /// Replacement password; `Some(None)` clears it.
    pub password: Option<Option<String>>,
}

impl AccountUpdate {
    /// Create an empty update.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the labels.
    #[must_use]
    pub fn labels(mut self, labels: Vec<AccountLabel>) -> Self {
        self.labels = Some(labels);
        self
    }

    /// Set the labels from `;`-separated input.
    #[must_use]
    pub fn labels_text(self, text: &str) -> Self {
        self.labels(parse_labels(text))
    }

    /// Set the account type.
    #[must_use]
    pub const fn account_type(mut self, account_type: AccountType) -> Self {
        self.account_type = Some(account_type);
        self
    }

    /// Set the login.
    #[must_use]
    pub fn login(mut self, login: impl Into<String>) -> Self {
        self.login = Some(login.into());
        self
    }

    /// Set the password.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(Some(password.into()));
        self
    }

    /// Clear the password.
    #[must_use]
    pub fn clear_password(mut self) -> Self {
        self.password = Some(None);
        self
    }

    /// Returns true if the update changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.labels.is_none()
            && self.account_type.is_none()
            && self.login.is_none()
            && self.password.is_none()
    }

    /// Merge the update into an account.
    ///
    /// Non-local accounts never keep a password, so switching to LDAP drops it.
    pub fn apply_to(self, account: &mut Account) {
        if let Some(labels) = self.labels {
            account.labels = labels;
        }
        if let Some(account_type) = self.account_type {
            account.account_type = account_type;
        }
        if let Some(login) = self.login {
            account.login = login;
        }
        if let Some(password) = self.password {
            account.password = password;
        }
        if !account.account_type.is_local() {
            account.password = None;
        }
    }
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

    mod account_id_tests {
        use super::*;

        #[test]
        fn display() {
            let id = AccountId::new("1700000000000abc");
            assert_eq!(format!("{id}"), "1700000000000abc");
        }

        #[test]
        fn serializes_as_plain_string() {
            let id = AccountId::new("abc");
            assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
        }
    }

    mod account_type_tests {
        use super::*;

        #[test]
        fn default_is_ldap() {
            assert_eq!(AccountType::default(), AccountType::Ldap);
        }

        #[test]
        fn wire_values() {
            assert_eq!(
                serde_json::to_string(&AccountType::Ldap).unwrap(),
                "\"LDAP\""
            );
            assert_eq!(
                serde_json::to_string(&AccountType::Local).unwrap(),
                "\"Локальная\""
            );
            let parsed: AccountType = serde_json::from_str("\"Локальная\"").unwrap();
            assert_eq!(parsed, AccountType::Local);
        }

        #[test]
        fn display_names() {
            assert_eq!(AccountType::Ldap.display_name(), "LDAP");
            assert_eq!(AccountType::Local.to_string(), "Локальная");
        }
    }

    mod label_tests {
        use super::*;

        #[test]
        fn parse_trims_and_drops_empty() {
            let labels = parse_labels(" admin; ops ;; ");
            assert_eq!(
                labels,
                vec![AccountLabel::new("admin"), AccountLabel::new("ops")]
            );
        }

        #[test]
        fn parse_empty_input() {
            assert!(parse_labels("").is_empty());
        }

        #[test]
        fn join_uses_semicolon() {
            let labels = vec![AccountLabel::new("a"), AccountLabel::new("bc")];
            assert_eq!(join_labels(&labels), "a;bc");
            assert_eq!(join_labels(&[]), "");
        }
    }

    mod account_tests {
        use super::*;

        #[test]
        fn new_creates_empty_ldap() {
            let account = Account::new(AccountId::new("x"));
            assert_eq!(account.account_type, AccountType::Ldap);
            assert!(account.login.is_empty());
            assert!(account.password.is_none());
            assert!(account.labels.is_empty());
        }

        #[test]
        fn json_shape() {
            let account = Account::new(AccountId::new("x"));
            let value = serde_json::to_value(&account).unwrap();
            assert_eq!(
                value,
                serde_json::json!({
                    "id": "x",
                    "labels": [],
                    "accountType": "LDAP",
                    "login": "",
                    "password": null,
                })
            );
        }
    }

    mod update_tests {
        use super::*;

        #[test]
        fn merges_only_given_fields() {
            let mut account = Account::new(AccountId::new("x"));
            account.login = "old".to_string();
            AccountUpdate::new().labels_text("a;b").apply_to(&mut account);
            assert_eq!(account.login, "old");
            assert_eq!(account.labels_text(), "a;b");
        }

        #[test]
        fn local_keeps_password() {
            let mut account = Account::new(AccountId::new("x"));
            AccountUpdate::new()
                .account_type(AccountType::Local)
                .password("secret")
                .apply_to(&mut account);
            assert_eq!(account.password.as_deref(), Some("secret"));
        }

        #[test]
        fn switching_to_ldap_drops_password() {
            let mut account = Account::new(AccountId::new("x"));
            account.account_type = AccountType::Local;
            account.password = Some("secret".to_string());
            AccountUpdate::new()
                .account_type(AccountType::Ldap)
                .apply_to(&mut account);
            assert!(account.password.is_none());
        }

        #[test]
        fn empty_update() {
            assert!(AccountUpdate::new().is_empty());
            assert!(!AccountUpdate::new().clear_password().is_empty());
        }
    }
}
