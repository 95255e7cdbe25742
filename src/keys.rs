use serde::{Deserialize, Serialize};

use crate::channel::js_literal;
use crate::error::KeyupError;

pub(crate) const EMPTY_KEYS: &str = "at least one key required";

/// Ordered, non-empty list of key identifiers as reported by `KeyboardEvent.key`.
///
/// Matching is an exact, case-sensitive string comparison. Duplicates are kept
/// as supplied; only membership is ever asked of the set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct KeySet {
    keys: Vec<String>,
}

impl KeySet {
    pub fn new<I, S>(keys: I) -> Result<Self, KeyupError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        if keys.is_empty() {
            return Err(KeyupError::InvalidArgument(EMPTY_KEYS));
        }
        Ok(Self { keys })
    }

    /// Build a set from a guaranteed first key and any further keys.
    pub fn from_parts<S, I, T>(first: S, rest: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut keys = vec![first.into()];
        keys.extend(rest.into_iter().map(Into::into));
        Self { keys }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.iter().any(|candidate| candidate == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Always false: a `KeySet` is never empty.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Render the keys as a JavaScript array literal with every key escaped.
    pub fn to_js_array(&self) -> String {
        js_literal(&self.keys)
    }
}

impl TryFrom<Vec<String>> for KeySet {
    type Error = KeyupError;

    fn try_from(keys: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(keys)
    }
}

impl From<KeySet> for Vec<String> {
    fn from(set: KeySet) -> Self {
        set.keys
    }
}
