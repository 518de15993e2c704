//! Default configuration values.
//!
//! Centralized default constants for use across all crates.

// ============================================================================
// Routing Defaults
// ============================================================================

/// Routing is evaluated unless explicitly disabled.
pub const DEFAULT_ROUTING_ENABLED: bool = true;
/// Prepend the built-in private-network rule.
pub const DEFAULT_USE_PRIVATE: bool = true;

// ============================================================================
// Rule Defaults
// ============================================================================

/// Rules are enabled unless explicitly disabled.
pub const DEFAULT_RULE_ENABLED: bool = true;
/// Default numeric priority of a user rule.
pub const DEFAULT_RULE_PRIORITY: i64 = 0;
/// Protocols assumed when a rule omits the field entirely.
pub const DEFAULT_RULE_PROTOCOLS: &[&str] = &["tcp"];
/// Prefix for generated names of unnamed rules (`rule-1`, `rule-2`, ...).
pub const DEFAULT_RULE_NAME_PREFIX: &str = "rule-";

// ============================================================================
// Built-in Private Network Rule
// ============================================================================

/// Name of the implicit private-network rule.
pub const PRIVATE_RULE_NAME: &str = "default-private";
/// Fixed priority of the implicit private-network rule.
pub const PRIVATE_RULE_PRIORITY: i64 = 1000;
/// Action of the implicit private-network rule.
pub const PRIVATE_RULE_ACTION: &str = "direct";
/// RFC 1918, loopback and link-local IPv4 ranges.
pub const PRIVATE_CIDRS_V4: &[&str] = &[
    "10.0.0.0/8",
    "172.16.0.0/12",
    "192.168.0.0/16",
    "127.0.0.0/8",
    "169.254.0.0/16",
];
/// Unique-local, link-local and loopback IPv6 ranges.
pub const PRIVATE_CIDRS_V6: &[&str] = &["fc00::/7", "fe80::/10", "::1/128"];
/// Protocols covered by the implicit private-network rule.
pub const PRIVATE_RULE_PROTOCOLS: &[&str] = &["tcp"];

// ============================================================================
// Match Result Sentinels
// ============================================================================

/// Rule name reported when routing is disabled.
pub const DISABLED_RULE_NAME: &str = "(disabled)";
/// Rule name reported when no rule matched.
pub const FALLBACK_RULE_NAME: &str = "(default)";
