//! Destination port matcher.

use std::ops::RangeInclusive;

use tracing::debug;

use crate::error::RulesError;

/// Parse a port token: a single port (`443`) or an inclusive range
/// (`10000-20000`). Reversed ranges are swapped.
pub fn parse_port_token(token: &str) -> Result<RangeInclusive<u16>, RulesError> {
    let invalid = || RulesError::InvalidPortToken(token.to_string());

    match token.split_once('-') {
        Some((a, b)) => {
            let a = parse_port_number(a).ok_or_else(invalid)?;
            let b = parse_port_number(b).ok_or_else(invalid)?;
            Ok(a.min(b)..=a.max(b))
        }
        None => {
            let port = parse_port_number(token).ok_or_else(invalid)?;
            Ok(port..=port)
        }
    }
}

fn parse_port_number(s: &str) -> Option<u16> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Matcher for a rule's port list.
///
/// An empty matcher places no restriction. A non-empty one never matches
/// port 0, which stands for "port unknown".
#[derive(Debug, Default)]
pub struct PortMatcher {
    ranges: Vec<RangeInclusive<u16>>,
}

impl PortMatcher {
    /// Create a matcher from already-parsed ranges.
    pub fn new(ranges: Vec<RangeInclusive<u16>>) -> Self {
        Self { ranges }
    }

    /// Build a matcher from textual tokens.
    ///
    /// Tokens are trimmed; blank tokens are ignored and malformed ones
    /// dropped. If every token is dropped the matcher is empty and
    /// therefore unrestricted.
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Self {
        let ranges = tokens
            .iter()
            .map(|t| t.as_ref().trim())
            .filter(|t| !t.is_empty())
            .filter_map(|t| {
                parse_port_token(t)
                    .inspect_err(|e| debug!(error = %e, "dropping port token"))
                    .ok()
            })
            .collect();
        Self::new(ranges)
    }

    /// Check if a port is allowed.
    pub fn matches(&self, port: u16) -> bool {
        if self.ranges.is_empty() {
            return true;
        }
        port != 0 && self.ranges.iter().any(|r| r.contains(&port))
    }

    /// Returns true if no ranges are registered.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Number of ranges.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }
}
