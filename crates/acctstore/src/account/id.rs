//! Account ID generation.
//!
//! IDs are the creation time in milliseconds followed by a random base-36
//! suffix, e.g. `1718031337000k3j9x0q2m`. They are unique within a session
//! with overwhelming probability; the store also rejects collisions.

use chrono::Utc;
use rand::Rng;

use super::model::AccountId;

/// Length of the random suffix.
const SUFFIX_LEN: usize = 9;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generates a new account ID.
#[must_use]
pub fn generate_id() -> AccountId {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| char::from(BASE36[rng.gen_range(0..BASE36.len())]))
        .collect();
    AccountId::new(format!("{}{suffix}", Utc::now().timestamp_millis()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_id_shape() {
        let id = generate_id();
        let (millis, suffix) = id.as_str().split_at(id.as_str().len() - SUFFIX_LEN);
        assert!(millis.parse::<i64>().unwrap() > 0);
        assert!(suffix.bytes().all(|b| BASE36.contains(&b)));
    }

    #[test]
    fn test_ids_are_unique() {
        let ids: HashSet<_> = (0..1000).map(|_| generate_id()).collect();
        assert_eq!(ids.len(), 1000);
    }
}
