//! Account management module.
//!
//! Provides the account model, ID generation, and field validation.

mod id;
mod model;
mod validation;

pub use id::generate_id;
pub use model::{
    Account, AccountId, AccountLabel, AccountType, AccountUpdate, LABEL_SEPARATOR, join_labels,
    parse_labels,
};
pub use validation::{
    Field, MAX_LABELS_LEN, MAX_LOGIN_LEN, MAX_PASSWORD_LEN, ValidationError, ValidationErrors,
    validate_account, validate_labels, validate_login, validate_password,
};
