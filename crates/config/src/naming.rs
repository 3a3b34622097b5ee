//! Field naming convention.
//!
//! spread.yaml keys are hyphenated (`kill-timeout`); Rust field identifiers
//! are underscored (`kill_timeout`). Both forms are accepted on input and
//! canonical output always uses the hyphenated form.

/// Translate an internal field identifier into its external YAML key.
#[must_use]
pub fn to_external(identifier: &str) -> String {
    identifier.replace('_', "-")
}

/// Translate an external YAML key into its internal field identifier.
#[must_use]
pub fn to_internal(key: &str) -> String {
    key.replace('-', "_")
}

/// Returns true when `key` names `identifier` in either form.
#[must_use]
pub fn matches_field(key: &str, identifier: &str) -> bool {
    key.len() == identifier.len()
        && key
            .bytes()
            .zip(identifier.bytes())
            .all(|(left, right)| left == right || (left == b'-' && right == b'_'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn underscores_become_hyphens() {
        assert_eq!(to_external("kill_timeout"), "kill-timeout");
        assert_eq!(to_external("prepare_each"), "prepare-each");
        assert_eq!(to_external("summary"), "summary");
    }

    #[test]
    fn case_and_digits_are_preserved() {
        assert_eq!(to_external("Secure_Boot2"), "Secure-Boot2");
    }

    #[test]
    fn both_forms_match() {
        assert!(matches_field("kill-timeout", "kill_timeout"));
        assert!(matches_field("kill_timeout", "kill_timeout"));
        assert!(!matches_field("kill-timeouts", "kill_timeout"));
        assert!(!matches_field("warn-timeout", "kill_timeout"));
    }

    proptest! {
        #[test]
        fn internal_external_internal_is_identity(name in "[a-z][a-z0-9]{0,8}(_[a-z0-9]{1,8}){0,4}") {
            prop_assert_eq!(to_internal(&to_external(&name)), name.clone());
            prop_assert!(matches_field(&to_external(&name), &name));
        }
    }
}
