//! Account validation.
//!
//! Lengths are counted in characters, not bytes, so Cyrillic logins get the
//! same limits as ASCII ones.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use super::model::{Account, AccountType, join_labels};

/// Maximum login length in characters.
pub const MAX_LOGIN_LEN: usize = 100;

/// Maximum password length in characters.
pub const MAX_PASSWORD_LEN: usize = 100;

/// Maximum length of the `;`-joined label text in characters.
pub const MAX_LABELS_LEN: usize = 50;

/// Account field that can carry a validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    /// The login field.
    Login,
    /// The password field.
    Password,
    /// The labels field.
    Labels,
}

impl Field {
    /// Get the field name as used in persisted data.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Password => "password",
            Self::Labels => "labels",
        }
    }

    /// Look up a field by its persisted name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "login" => Some(Self::Login),
            "password" => Some(Self::Password),
            "labels" => Some(Self::Labels),
            _ => None,
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Validation error for an account field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Login is empty or whitespace.
    LoginRequired,
    /// Login exceeds the maximum length.
    LoginTooLong,
    /// Local account without a password.
    PasswordRequired,
    /// Password exceeds the maximum length.
    PasswordTooLong,
    /// Joined labels exceed the maximum length.
    LabelsTooLong,
}

impl ValidationError {
    /// Get human-readable error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::LoginRequired => "Логин обязателен",
            Self::LoginTooLong => "Логин не должен превышать 100 символов",
            Self::PasswordRequired => "Пароль обязателен для локальных учетных записей",
            Self::PasswordTooLong => "Пароль не должен превышать 100 символов",
            Self::LabelsTooLong => "Метки не должны превышать 50 символов",
        }
    }

    /// Get the field this error relates to.
    #[must_use]
    pub const fn field(&self) -> Field {
        match self {
            Self::LoginRequired | Self::LoginTooLong => Field::Login,
            Self::PasswordRequired | Self::PasswordTooLong => Field::Password,
            Self::LabelsTooLong => Field::Labels,
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Field-level error messages for one account.
///
/// A field without an entry is valid. Serialized as a JSON object such as
/// `{"login": "Логин обязателен"}`. Unknown field names in stored data are
/// skipped when deserializing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<Field, String>);

impl<'de> Deserialize<'de> for ValidationErrors {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, String>::deserialize(deserializer)?;
        let mut errors = Self::new();
        for (name, message) in raw {
            match Field::from_name(&name) {
                Some(field) => errors.insert_message(field, message),
                None => tracing::debug!(field = %name, "Skipping unknown validation field"),
            }
        }
        Ok(errors)
    }
}

impl ValidationErrors {
    /// Create an empty error set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error, replacing any message already stored for its field.
    pub fn insert(&mut self, error: ValidationError) {
        self.0.insert(error.field(), error.message().to_string());
    }

    /// Record an arbitrary message for a field.
    pub fn insert_message(&mut self, field: Field, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    /// Get the message for a field, if the field is invalid.
    #[must_use]
    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    /// Returns true if the field has an error.
    #[must_use]
    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    /// Returns true if no field has an error.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of invalid fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over invalid fields and their messages.
    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }
}

impl FromIterator<ValidationError> for ValidationErrors {
    fn from_iter<I: IntoIterator<Item = ValidationError>>(iter: I) -> Self {
        let mut errors = Self::new();
        for error in iter {
            errors.insert(error);
        }
        errors
    }
}

/// Validate a login.
#[must_use]
pub fn validate_login(login: &str) -> Option<ValidationError> {
    if login.trim().is_empty() {
        Some(ValidationError::LoginRequired)
    } else if login.chars().count() > MAX_LOGIN_LEN {
        Some(ValidationError::LoginTooLong)
    } else {
        None
    }
}

/// Validate a password for the given account type.
///
/// Only local accounts are checked; any password passes for LDAP.
#[must_use]
pub fn validate_password(
    password: Option<&str>,
    account_type: AccountType,
) -> Option<ValidationError> {
    if !account_type.is_local() {
        return None;
    }
    match password {
        None => Some(ValidationError::PasswordRequired),
        Some(p) if p.trim().is_empty() => Some(ValidationError::PasswordRequired),
        Some(p) if p.chars().count() > MAX_PASSWORD_LEN => Some(ValidationError::PasswordTooLong),
        Some(_) => None,
    }
}

/// Validate the `;`-joined label text.
#[must_use]
pub fn validate_labels(labels_text: &str) -> Option<ValidationError> {
    (labels_text.chars().count() > MAX_LABELS_LEN).then_some(ValidationError::LabelsTooLong)
}

/// Validate every field of an account.
///
/// Returns only the failing fields; an empty result means the account is valid.
#[must_use]
pub fn validate_account(account: &Account) -> ValidationErrors {
    [
        validate_login(&account.login),
        validate_password(account.password.as_deref(), account.account_type),
        validate_labels(&join_labels(&account.labels)),
    ]
    .into_iter()
    .flatten()
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
    use proptest::prelude::*;

    use super::*;
    use crate::account::model::{AccountId, AccountLabel};

    fn account() -> Account {
        Account::new(AccountId::new("test"))
    }

    #[test]
    fn test_login_required() {
        assert_eq!(validate_login(""), Some(ValidationError::LoginRequired));
        assert_eq!(validate_login("   \t"), Some(ValidationError::LoginRequired));
    }

    #[test]
    fn test_login_length_boundary() {
        assert_eq!(validate_login(&"a".repeat(100)), None);
        assert_eq!(
            validate_login(&"a".repeat(101)),
            Some(ValidationError::LoginTooLong)
        );
    }

    #[test]
    fn test_login_counts_chars() {
        // 100 Cyrillic letters are 200 bytes
        assert_eq!(validate_login(&"ж".repeat(100)), None);
    }

    #[test]
    fn test_password_required_for_local() {
        assert_eq!(
            validate_password(None, AccountType::Local),
            Some(ValidationError::PasswordRequired)
        );
        assert_eq!(
            validate_password(Some(""), AccountType::Local),
            Some(ValidationError::PasswordRequired)
        );
        assert_eq!(
            validate_password(Some("  "), AccountType::Local),
            Some(ValidationError::PasswordRequired)
        );
        assert_eq!(validate_password(Some("secret"), AccountType::Local), None);
    }

    #[test]
    fn test_password_too_long() {
        assert_eq!(
            validate_password(Some("p".repeat(101).as_str()), AccountType::Local),
            Some(ValidationError::PasswordTooLong)
        );
        assert_eq!(
            validate_password(Some("p".repeat(100).as_str()), AccountType::Local),
            None
        );
    }

    #[test]
    fn test_ldap_password_never_checked() {
        assert_eq!(validate_password(None, AccountType::Ldap), None);
        assert_eq!(validate_password(Some(""), AccountType::Ldap), None);
        assert_eq!(
            validate_password(Some("p".repeat(500).as_str()), AccountType::Ldap),
            None
        );
    }

    #[test]
    fn test_labels_boundary() {
        assert_eq!(validate_labels(&"x".repeat(50)), None);
        assert_eq!(
            validate_labels(&"x".repeat(51)),
            Some(ValidationError::LabelsTooLong)
        );
    }

    #[test]
    fn test_validate_empty_account() {
        let errors = validate_account(&account());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get(Field::Login), Some("Логин обязателен"));
        assert!(!errors.contains(Field::Password));
    }

    #[test]
    fn test_validate_complete_local_account() {
        let mut account = account();
        account.login = "ivanov".to_string();
        account.account_type = AccountType::Local;
        account.password = Some("secret".to_string());
        assert!(validate_account(&account).is_empty());
    }

    #[test]
    fn test_validate_account_checks_labels() {
        let mut account = account();
        account.login = "ivanov".to_string();
        // 25 + 1 + 25 = 51 characters once joined
        account.labels = vec![
            AccountLabel::new("a".repeat(25)),
            AccountLabel::new("b".repeat(25)),
        ];
        let errors = validate_account(&account);
        assert_eq!(
            errors.get(Field::Labels),
            Some("Метки не должны превышать 50 символов")
        );

        account.labels[1].text.pop();
        assert!(validate_account(&account).is_empty());
    }

    #[test]
    fn test_errors_json_shape() {
        let errors: ValidationErrors = [
            ValidationError::LoginRequired,
            ValidationError::PasswordRequired,
        ]
        .into_iter()
        .collect();
        let value = serde_json::to_value(&errors).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "login": "Логин обязателен",
                "password": "Пароль обязателен для локальных учетных записей",
            })
        );
    }

    #[test]
    fn test_unknown_error_fields_are_skipped() {
        let errors: ValidationErrors = serde_json::from_str(
            r#"{"email": "x", "login": "Логин обязателен", "Password": "y"}"#,
        )
        .unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get(Field::Login), Some("Логин обязателен"));
    }

    #[test]
    fn test_non_object_errors_are_rejected() {
        assert!(serde_json::from_str::<ValidationErrors>(r#"["login"]"#).is_err());
    }

    #[test]
    fn test_iter_in_field_order() {
        let errors: ValidationErrors = [
            ValidationError::LabelsTooLong,
            ValidationError::LoginTooLong,
        ]
        .into_iter()
        .collect();
        assert_eq!(
            errors.iter().collect::<Vec<_>>(),
            vec![
                (Field::Login, "Логин не должен превышать 100 символов"),
                (Field::Labels, "Метки не должны превышать 50 символов"),
            ]
        );
    }

    #[test]
    fn test_field_of_each_error() {
        assert_eq!(ValidationError::LoginTooLong.field(), Field::Login);
        assert_eq!(ValidationError::PasswordTooLong.field(), Field::Password);
        assert_eq!(ValidationError::LabelsTooLong.field(), Field::Labels);
        assert_eq!(Field::Labels.to_string(), "labels");
    }

    proptest! {
        #[test]
        fn login_within_limit_is_valid(login in "[a-zA-Z0-9._-]{1,100}") {
            prop_assert_eq!(validate_login(&login), None);
        }

        #[test]
        fn login_over_limit_is_too_long(login in "[a-z]{101,200}") {
            prop_assert_eq!(validate_login(&login), Some(ValidationError::LoginTooLong));
        }

        #[test]
        fn whitespace_login_is_required(login in "[ \t\n]{0,20}") {
            prop_assert_eq!(validate_login(&login), Some(ValidationError::LoginRequired));
        }

        #[test]
        fn ldap_never_reports_password(password in proptest::option::of(".{0,200}")) {
            prop_assert_eq!(validate_password(password.as_deref(), AccountType::Ldap), None);
        }
    }
}
