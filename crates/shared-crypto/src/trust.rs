//! Operator-configured key allow-lists.

use std::collections::HashSet;

/// Set of trusted public keys, compared as the exact text nodes send.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrustedKeys(HashSet<String>);

impl TrustedKeys {
    /// Build from individual keys; blank entries are ignored.
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            keys.into_iter()
                .map(|k| k.as_ref().trim().to_string())
                .filter(|k| !k.is_empty())
                .collect(),
        )
    }

    /// Parse a comma-separated list.
    pub fn from_csv(list: &str) -> Self {
        Self::new(list.split(','))
    }

    /// Whether `key` is in the set.
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains(key)
    }

    /// Whether no keys are configured.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of configured keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Enforcement rule shared by every allow-list: a configured list is
    /// always enforced; an empty list rejects only when `required`.
    pub fn admits(&self, key: &str, required: bool) -> bool {
        if self.is_empty() {
            !required
        } else {
            self.contains(key)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_parsing() {
        let keys = TrustedKeys::from_csv(" aa, ,bb,aa ");
        assert_eq!(keys.len(), 2);
        assert!(keys.contains("aa"));
        assert!(keys.contains("bb"));
        assert!(!keys.contains(" aa"));
    }

    #[test]
    fn test_admits() {
        let empty = TrustedKeys::default();
        assert!(empty.admits("x", false));
        assert!(!empty.admits("x", true));

        let keys = TrustedKeys::new(["k1"]);
        assert!(keys.admits("k1", false));
        assert!(!keys.admits("k2", false));
    }
}
