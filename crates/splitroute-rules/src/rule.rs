//! Rule, routing config and request/result types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use splitroute_core::defaults;

/// Action to take for a connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Send the connection through the proxy. Also the routing default.
    #[default]
    Proxy,
    /// Connect directly to the target.
    Direct,
    /// Refuse the connection.
    Block,
    /// An action name understood only by the dispatch layer.
    #[serde(untagged)]
    Other(String),
}

impl Action {
    /// Parse an action name, ignoring case and surrounding whitespace.
    ///
    /// Returns `None` for an empty name so callers can fall back to a default.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some(match name.to_ascii_lowercase().as_str() {
            "proxy" => Action::Proxy,
            "direct" => Action::Direct,
            "block" => Action::Block,
            _ => Action::Other(name.to_string()),
        })
    }

    /// The action's configuration name.
    pub fn as_str(&self) -> &str {
        match self {
            Action::Proxy => "proxy",
            Action::Direct => "direct",
            Action::Block => "block",
            Action::Other(name) => name,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the effective rule list is ordered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityMode {
    /// Stored list order is evaluation order.
    #[default]
    Order,
    /// Higher `priority` values are evaluated first; ties keep list order.
    Number,
}

impl FromStr for PriorityMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "order" => Ok(PriorityMode::Order),
            "number" => Ok(PriorityMode::Number),
            other => Err(format!("unknown priority mode: {other}")),
        }
    }
}

impl fmt::Display for PriorityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PriorityMode::Order => "order",
            PriorityMode::Number => "number",
        })
    }
}

/// One routing policy entry.
///
/// Domain and CIDR lists are alternative triggers: any single hit is
/// enough. Ports and protocols narrow what the rule applies to; empty
/// lists place no restriction. A rule declaring no domains and no CIDRs
/// never matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Used for result attribution only.
    pub name: String,
    pub enabled: bool,
    /// `None` inherits the routing default action.
    pub action: Option<Action>,
    /// Only meaningful in [`PriorityMode::Number`].
    pub priority: i64,
    pub ip_cidrs_v4: Vec<String>,
    pub ip_cidrs_v6: Vec<String>,
    pub domains: Vec<String>,
    pub ports: Vec<String>,
    pub protocols: Vec<String>,
}

impl Rule {
    /// An enabled rule with the given name and no criteria.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            action: None,
            priority: 0,
            ip_cidrs_v4: Vec::new(),
            ip_cidrs_v6: Vec::new(),
            domains: Vec::new(),
            ports: Vec::new(),
            protocols: Vec::new(),
        }
    }

    /// The built-in rule sending private, loopback and link-local
    /// destinations direct.
    pub fn default_private() -> Self {
        let strings = |list: &[&str]| list.iter().map(|s| s.to_string()).collect();
        Self {
            name: defaults::PRIVATE_RULE_NAME.to_string(),
            enabled: true,
            action: Action::parse(defaults::PRIVATE_RULE_ACTION),
            priority: defaults::PRIVATE_RULE_PRIORITY,
            ip_cidrs_v4: strings(defaults::PRIVATE_CIDRS_V4),
            ip_cidrs_v6: strings(defaults::PRIVATE_CIDRS_V6),
            domains: Vec::new(),
            ports: Vec::new(),
            protocols: strings(defaults::PRIVATE_RULE_PROTOCOLS),
        }
    }
}

/// Fully-resolved routing configuration.
///
/// Treated as an immutable snapshot: to change routing, build a new value
/// and publish it (see [`HotRuleEngine`](crate::HotRuleEngine)).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingConfig {
    /// When false every request is proxied without consulting rules.
    pub enabled: bool,
    pub priority_mode: PriorityMode,
    /// Used when no rule matches and for rules without an action.
    pub default_action: Action,
    /// Prepend [`Rule::default_private`] to the rule list.
    pub use_default_private: bool,
    pub rules: Vec<Rule>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::DEFAULT_ROUTING_ENABLED,
            priority_mode: PriorityMode::default(),
            default_action: Action::default(),
            use_default_private: defaults::DEFAULT_USE_PRIVATE,
            rules: Vec::new(),
        }
    }
}

/// Destination tuple to route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchRequest<'a> {
    /// Domain name or IP literal.
    pub host: &'a str,
    /// Destination port; 0 when unknown.
    pub port: u16,
    /// Transport protocol name, e.g. `tcp`.
    pub protocol: &'a str,
}

impl<'a> MatchRequest<'a> {
    pub fn new(host: &'a str, port: u16, protocol: &'a str) -> Self {
        Self {
            host,
            port,
            protocol,
        }
    }
}

/// Routing decision for one request.
///
/// `rule` is diagnostic only: the matched rule's name, or one of the
/// sentinels `(disabled)` / `(default)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    pub action: Action,
    pub rule: String,
}

impl MatchResult {
    pub fn new(action: Action, rule: impl Into<String>) -> Self {
        Self {
            action,
            rule: rule.into(),
        }
    }

    /// Result when routing is switched off.
    pub fn disabled() -> Self {
        Self::new(Action::Proxy, defaults::DISABLED_RULE_NAME)
    }

    /// Result when no rule matched.
    pub fn fallback(action: Action) -> Self {
        Self::new(action, defaults::FALLBACK_RULE_NAME)
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "action={} rule={}", self.action, self.rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routing_defaults() {
        let config = RoutingConfig::default();
        assert!(config.enabled);
        assert_eq!(config.priority_mode, PriorityMode::Order);
        assert_eq!(config.default_action, Action::Proxy);
        assert!(config.use_default_private);
        assert!(config.rules.is_empty());
    }

    #[test]
    fn action_parse() {
        assert_eq!(Action::parse("proxy"), Some(Action::Proxy));
        assert_eq!(Action::parse(" DIRECT "), Some(Action::Direct));
        assert_eq!(Action::parse("Block"), Some(Action::Block));
        assert_eq!(Action::parse("hk-relay"), Some(Action::Other("hk-relay".into())));
        assert_eq!(Action::parse(""), None);
        assert_eq!(Action::parse("   "), None);
    }

    #[test]
    fn action_serde() {
        assert_eq!(serde_json::to_string(&Action::Direct).unwrap(), "\"direct\"");
        assert_eq!(
            serde_json::to_string(&Action::Other("hk".into())).unwrap(),
            "\"hk\""
        );
        let a: Action = serde_json::from_str("\"block\"").unwrap();
        assert_eq!(a, Action::Block);
        let a: Action = serde_json::from_str("\"hk\"").unwrap();
        assert_eq!(a, Action::Other("hk".into()));
    }

    #[test]
    fn priority_mode_from_str() {
        assert_eq!("order".parse(), Ok(PriorityMode::Order));
        assert_eq!("NUMBER".parse(), Ok(PriorityMode::Number));
        assert!("random".parse::<PriorityMode>().is_err());
    }

    #[test]
    fn default_private_rule_shape() {
        let rule = Rule::default_private();
        assert_eq!(rule.name, "default-private");
        assert_eq!(rule.action, Some(Action::Direct));
        assert_eq!(rule.priority, 1000);
        assert_eq!(rule.ip_cidrs_v4.len(), 5);
        assert_eq!(rule.ip_cidrs_v6, vec!["fc00::/7", "fe80::/10", "::1/128"]);
        assert!(rule.domains.is_empty());
    }

    #[test]
    fn sentinel_results() {
        assert_eq!(MatchResult::disabled().to_string(), "action=proxy rule=(disabled)");
        assert_eq!(
            MatchResult::fallback(Action::Block).to_string(),
            "action=block rule=(default)"
        );
    }
}
