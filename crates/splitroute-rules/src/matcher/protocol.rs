//! Transport protocol matcher.

use rustc_hash::FxHashSet;

/// Case-insensitive protocol set. Empty means "any protocol".
#[derive(Debug, Default)]
pub struct ProtocolMatcher {
    set: FxHashSet<String>,
}

impl ProtocolMatcher {
    /// Build from protocol names; entries are trimmed and lowercased.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        Self {
            set: names
                .iter()
                .map(|n| n.as_ref().trim().to_ascii_lowercase())
                .collect(),
        }
    }

    /// Check if a request protocol is allowed.
    pub fn matches(&self, protocol: &str) -> bool {
        self.set.is_empty() || self.set.contains(&protocol.to_ascii_lowercase())
    }

    /// Returns true if every protocol is allowed.
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }
}
