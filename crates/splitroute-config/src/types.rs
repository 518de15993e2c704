//! Configuration document schema and resolution into engine types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use splitroute_rules::{Action, PriorityMode, Rule, RoutingConfig};
use tracing::warn;

use crate::defaults::{
    default_routing_enabled, default_rule_enabled, default_rule_name, default_rule_priority,
    default_rule_protocols, default_use_private,
};

/// The surrounding application document.
///
/// Only the parts splitroute understands are modelled; unknown fields are
/// ignored so the same file can carry the proxy's own settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppDocument {
    #[serde(default)]
    pub proxy_rules: ProxyRulesSection,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Legacy top-level log level, used when `logging.level` is unset.
    #[serde(default)]
    pub log_level: Option<String>,
}

impl AppDocument {
    /// The routing section, if the document has one.
    pub fn routing(&self) -> Option<&RoutingSection> {
        self.proxy_rules.routing.as_ref()
    }

    /// The routing section, or an all-defaults one when the document has none.
    pub fn routing_or_default(&self) -> RoutingSection {
        self.routing().cloned().unwrap_or_default()
    }

    /// Logging settings with the top-level `log_level` folded in.
    pub fn effective_logging(&self) -> LoggingConfig {
        let mut logging = self.logging.clone();
        if logging.level.is_none() {
            logging.level = self.log_level.clone();
        }
        logging
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProxyRulesSection {
    #[serde(default)]
    pub routing: Option<RoutingSection>,
}

/// Raw `proxy_rules.routing` section as written by the user.
///
/// Every field is optional so that both a missing field and an explicit
/// `null` take the default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoutingSection {
    #[serde(default)]
    pub enabled: Option<bool>,
    /// `order` or `number`, case-insensitive.
    #[serde(default)]
    pub priority_mode: Option<String>,
    /// Empty or absent means `proxy`.
    #[serde(default)]
    pub default_action: Option<String>,
    #[serde(default)]
    pub use_default_private: Option<bool>,
    #[serde(default)]
    pub rules: Vec<RuleSection>,
}

/// Raw rule entry.
///
/// Like [`RoutingSection`], a missing field and an explicit `null` both
/// take the default. For `protocols` that default is `["tcp"]`, while an
/// explicit empty list means every protocol.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleSection {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub ip_cidrs_v4: Option<Vec<String>>,
    #[serde(default)]
    pub ip_cidrs_v6: Option<Vec<String>>,
    #[serde(default)]
    pub domains: Option<Vec<String>>,
    #[serde(default)]
    pub ports: Option<Vec<String>>,
    #[serde(default)]
    pub protocols: Option<Vec<String>>,
}

impl RoutingSection {
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or_else(default_routing_enabled)
    }

    pub fn uses_default_private(&self) -> bool {
        self.use_default_private.unwrap_or_else(default_use_private)
    }

    /// Resolved priority mode; unknown values fall back to `order`.
    pub fn resolved_priority_mode(&self) -> PriorityMode {
        match self.priority_mode.as_deref().map(str::trim) {
            None | Some("") => PriorityMode::default(),
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                warn!(error = %e, "falling back to priority_mode=order");
                PriorityMode::Order
            }),
        }
    }

    /// Resolved default action; empty or absent means `proxy`.
    pub fn resolved_default_action(&self) -> Action {
        self.default_action
            .as_deref()
            .and_then(Action::parse)
            .unwrap_or_default()
    }

    /// Fill every default and produce the immutable engine config.
    pub fn resolve(&self) -> RoutingConfig {
        RoutingConfig {
            enabled: self.is_enabled(),
            priority_mode: self.resolved_priority_mode(),
            default_action: self.resolved_default_action(),
            use_default_private: self.uses_default_private(),
            rules: self
                .rules
                .iter()
                .enumerate()
                .map(|(index, rule)| rule.resolve(index))
                .collect(),
        }
    }
}

impl RuleSection {
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or_else(default_rule_enabled)
    }

    pub fn resolved_priority(&self) -> i64 {
        self.priority.unwrap_or_else(default_rule_priority)
    }

    /// Name used for this rule, generating `rule-<n>` when missing or blank.
    pub fn resolved_name(&self, index: usize) -> String {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => default_rule_name(index),
        }
    }

    /// Resolve into an engine rule; `index` is the rule's list position.
    pub fn resolve(&self, index: usize) -> Rule {
        Rule {
            enabled: self.is_enabled(),
            action: self.action.as_deref().and_then(Action::parse),
            priority: self.resolved_priority(),
            ip_cidrs_v4: self.ip_cidrs_v4.clone().unwrap_or_default(),
            ip_cidrs_v6: self.ip_cidrs_v6.clone().unwrap_or_default(),
            domains: self.domains.clone().unwrap_or_default(),
            ports: self.ports.clone().unwrap_or_default(),
            protocols: self
                .protocols
                .clone()
                .unwrap_or_else(default_rule_protocols),
            ..Rule::new(self.resolved_name(index))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: Option<String>,
    /// Log format: json, pretty, or compact. Default: pretty.
    pub format: Option<String>,
    /// Output target: stdout or stderr. Default: stderr.
    pub output: Option<String>,
    /// Per-module log level filters (e.g., {"splitroute_rules": "debug"}).
    #[serde(default)]
    pub filters: HashMap<String, String>,
}
