//! Domain name matchers.
//!
//! Three pattern forms are recognised:
//!
//! - `.example.com`: suffix rule, matches `example.com` and any subdomain
//! - `example.com`: exact match only
//! - `*.example.com`, `api-?.example.com`: glob, `*` matches any run of
//!   characters (including none) and `?` exactly one
//!
//! All comparisons are ASCII case-insensitive and ignore one trailing dot
//! on the host.

use rustc_hash::FxHashSet;

/// Returns true if the pattern contains glob metacharacters.
fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?'])
}

/// Lowercase a host and strip one trailing dot.
///
/// Returns `None` for an empty host, which never matches any pattern.
pub fn normalize_host(host: &str) -> Option<String> {
    if host.is_empty() {
        return None;
    }
    let lower = host.to_ascii_lowercase();
    Some(match lower.strip_suffix('.') {
        Some(stripped) => stripped.to_string(),
        None => lower,
    })
}

/// Match a single domain pattern against a host.
pub fn match_domain(pattern: &str, host: &str) -> bool {
    if pattern.is_empty() {
        return false;
    }
    let Some(host) = normalize_host(host) else {
        return false;
    };
    let pattern = pattern.to_ascii_lowercase();

    if is_glob(&pattern) {
        return glob_match(&pattern, &host);
    }
    match pattern.strip_prefix('.') {
        Some(root) => host == root || host.ends_with(&pattern),
        None => host == pattern,
    }
}

/// Backtracking glob match over characters.
///
/// On a mismatch after a `*`, the star is retried one character further
/// into the text than last time.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();

    let (mut pi, mut ti) = (0, 0);
    let mut star: Option<usize> = None;
    let mut mark = 0;

    while ti < t.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some(pi);
            pi += 1;
            mark = ti;
        } else if let Some(s) = star {
            pi = s + 1;
            mark += 1;
            ti = mark;
        } else {
            return false;
        }
    }

    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }
    pi == p.len()
}

/// Matcher for a rule's domain list.
///
/// Exact names (including the root of every suffix rule) live in one
/// hash set, dotted suffixes in another. Lookup tries the exact set, then
/// every dot-anchored tail of the host, then falls back to the globs.
#[derive(Debug, Default)]
pub struct DomainMatcher {
    exact: FxHashSet<String>,
    suffixes: FxHashSet<String>,
    globs: Vec<String>,
}

impl DomainMatcher {
    /// Create a new empty domain matcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a matcher from a rule's pattern list. Empty patterns are skipped.
    pub fn from_patterns<S: AsRef<str>>(patterns: &[S]) -> Self {
        let mut matcher = Self::new();
        for pattern in patterns {
            matcher.add_pattern(pattern.as_ref());
        }
        matcher
    }

    /// Classify and add one pattern. Returns false if it was empty.
    pub fn add_pattern(&mut self, pattern: &str) -> bool {
        if pattern.is_empty() {
            return false;
        }
        let lower = pattern.to_ascii_lowercase();
        if is_glob(&lower) {
            self.globs.push(lower);
        } else if let Some(root) = lower.strip_prefix('.') {
            self.exact.insert(root.to_string());
            self.suffixes.insert(lower);
        } else {
            self.exact.insert(lower);
        }
        true
    }

    /// Check if a host matches any pattern.
    pub fn matches(&self, host: &str) -> bool {
        normalize_host(host).is_some_and(|h| self.matches_normalized(&h))
    }

    /// Same as [`matches`](Self::matches) for a host already passed
    /// through [`normalize_host`].
    pub(crate) fn matches_normalized(&self, host: &str) -> bool {
        if self.exact.contains(host) {
            return true;
        }
        if !self.suffixes.is_empty()
            && host
                .match_indices('.')
                .any(|(pos, _)| self.suffixes.contains(&host[pos..]))
        {
            return true;
        }
        self.globs.iter().any(|g| glob_match(g, host))
    }

    /// Returns true if the matcher has no patterns.
    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.globs.is_empty()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.exact.len() + self.suffixes.len() + self.globs.len()
    }
}
